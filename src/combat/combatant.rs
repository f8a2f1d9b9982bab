//! Combatants: health, armor, initiative and conditions for one participant
//!
//! `is_alive` always equals `current_health > 0`; only the damage and heal
//! mutators move health, so they are the only place that flips it.

use rand::Rng;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use super::codec::{self, Record};
use super::conditions::{Condition, ConditionList, UNCONSCIOUS};
use super::dice::roll_d20_with;
use crate::error::TrackerError;

/// What sort of participant a combatant is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CombatantKind {
    Player,
    Npc,
    Monster,
}

impl FromStr for CombatantKind {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "player" | "pc" => Ok(CombatantKind::Player),
            "npc" => Ok(CombatantKind::Npc),
            "monster" | "enemy" => Ok(CombatantKind::Monster),
            other => Err(TrackerError::invalid(format!(
                "unknown combatant kind: {other}"
            ))),
        }
    }
}

impl fmt::Display for CombatantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CombatantKind::Player => "player",
            CombatantKind::Npc => "npc",
            CombatantKind::Monster => "monster",
        };
        write!(f, "{}", s)
    }
}

/// Full ability scores for combatants that carry a stat block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AbilityScores {
    pub strength: i32,
    pub dexterity: i32,
    pub constitution: i32,
    pub intelligence: i32,
    pub wisdom: i32,
    pub charisma: i32,
}

impl Default for AbilityScores {
    fn default() -> Self {
        Self {
            strength: 10,
            dexterity: 10,
            constitution: 10,
            intelligence: 10,
            wisdom: 10,
            charisma: 10,
        }
    }
}

impl AbilityScores {
    /// Standard ability modifier, rounding down: 8 -> -1, 15 -> +2
    pub fn modifier(score: i32) -> i32 {
        (score - 10).div_euclid(2)
    }

    pub fn initiative_modifier(&self) -> i32 {
        Self::modifier(self.dexterity)
    }

    fn from_record(rec: &Record) -> Self {
        let base = Self::default();
        Self {
            strength: codec::int_or(rec, "strength", base.strength),
            dexterity: codec::int_or(rec, "dexterity", base.dexterity),
            constitution: codec::int_or(rec, "constitution", base.constitution),
            intelligence: codec::int_or(rec, "intelligence", base.intelligence),
            wisdom: codec::int_or(rec, "wisdom", base.wisdom),
            charisma: codec::int_or(rec, "charisma", base.charisma),
        }
    }
}

/// Health bands used by display layers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Dead,
    Critical,
    Wounded,
    Injured,
    Healthy,
}

impl HealthStatus {
    pub fn from_percentage(pct: f64) -> Self {
        if pct <= 0.0 {
            HealthStatus::Dead
        } else if pct <= 25.0 {
            HealthStatus::Critical
        } else if pct <= 50.0 {
            HealthStatus::Wounded
        } else if pct <= 75.0 {
            HealthStatus::Injured
        } else {
            HealthStatus::Healthy
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            HealthStatus::Dead => "#6c757d",
            HealthStatus::Critical => "#dc3545",
            HealthStatus::Wounded => "#fd7e14",
            HealthStatus::Injured => "#ffc107",
            HealthStatus::Healthy => "#28a745",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HealthStatus::Dead => "Dead",
            HealthStatus::Critical => "Critical",
            HealthStatus::Wounded => "Wounded",
            HealthStatus::Injured => "Injured",
            HealthStatus::Healthy => "Healthy",
        }
    }
}

/// One participant in an encounter
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Combatant {
    id: String,
    name: String,
    kind: CombatantKind,
    max_health: i32,
    current_health: i32,
    armor_class: i32,
    initiative_modifier: i32,
    initiative_score: i32,
    conditions: ConditionList,
    is_alive: bool,
    /// Actions logged during the combatant's current turn
    actions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<AbilityScores>,
}

impl Combatant {
    /// Create a combatant at full health
    pub fn new(name: &str, kind: CombatantKind, max_health: i32) -> Result<Self, TrackerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TrackerError::invalid("combatant name must not be empty"));
        }
        if max_health <= 0 {
            return Err(TrackerError::invalid(format!(
                "max health must be positive, got {max_health}"
            )));
        }
        Ok(Self {
            id: codec::new_id(),
            name: name.to_string(),
            kind,
            max_health,
            current_health: max_health,
            armor_class: 10,
            initiative_modifier: 0,
            initiative_score: 0,
            conditions: ConditionList::new(),
            is_alive: true,
            actions: Vec::new(),
            stats: None,
        })
    }

    pub fn with_armor_class(mut self, armor_class: i32) -> Self {
        self.armor_class = armor_class;
        self
    }

    pub fn with_initiative_modifier(mut self, modifier: i32) -> Self {
        self.initiative_modifier = modifier;
        self
    }

    /// Attach a stat block; its dexterity modifier becomes the initiative modifier
    pub fn with_stats(mut self, stats: AbilityScores) -> Self {
        self.initiative_modifier = stats.initiative_modifier();
        self.stats = Some(stats);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> CombatantKind {
        self.kind
    }

    pub fn max_health(&self) -> i32 {
        self.max_health
    }

    pub fn current_health(&self) -> i32 {
        self.current_health
    }

    pub fn armor_class(&self) -> i32 {
        self.armor_class
    }

    pub fn set_armor_class(&mut self, armor_class: i32) {
        self.armor_class = armor_class;
    }

    pub fn initiative_modifier(&self) -> i32 {
        self.initiative_modifier
    }

    pub fn set_initiative_modifier(&mut self, modifier: i32) {
        self.initiative_modifier = modifier;
    }

    pub fn initiative_score(&self) -> i32 {
        self.initiative_score
    }

    pub fn is_alive(&self) -> bool {
        self.is_alive
    }

    pub fn stats(&self) -> Option<&AbilityScores> {
        self.stats.as_ref()
    }

    /// Roll d20 + modifier with the thread RNG and store the result
    pub fn roll_initiative(&mut self) -> i32 {
        self.roll_initiative_with(&mut rand::rng())
    }

    pub fn roll_initiative_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> i32 {
        self.initiative_score = roll_d20_with(rng) + self.initiative_modifier;
        self.initiative_score
    }

    pub fn set_initiative(&mut self, value: i32) {
        self.initiative_score = value;
    }

    /// Apply damage, returning the resulting health
    pub fn take_damage(&mut self, amount: i32) -> Result<i32, TrackerError> {
        if amount < 0 {
            return Err(TrackerError::invalid(format!(
                "damage must not be negative, got {amount}"
            )));
        }
        let health = self.current_health.saturating_sub(amount).max(0);
        let downed = self.is_alive && health == 0;
        let marker = if downed {
            Some(Condition::permanent(UNCONSCIOUS)?)
        } else {
            None
        };

        self.current_health = health;
        if let Some(marker) = marker {
            self.is_alive = false;
            self.conditions.push(marker);
            debug!(combatant = %self.name, "dropped to 0 health");
        }
        Ok(self.current_health)
    }

    /// Restore health up to the maximum, returning the resulting health
    pub fn heal(&mut self, amount: i32) -> Result<i32, TrackerError> {
        if amount < 0 {
            return Err(TrackerError::invalid(format!(
                "healing must not be negative, got {amount}"
            )));
        }
        let was_alive = self.is_alive;
        self.current_health = self.current_health.saturating_add(amount).min(self.max_health);

        if !was_alive && self.current_health > 0 {
            self.is_alive = true;
            self.conditions.remove_named(UNCONSCIOUS);
            debug!(combatant = %self.name, "revived");
        }
        Ok(self.current_health)
    }

    /// Add a condition applied outside any round
    pub fn add_condition(
        &mut self,
        name: &str,
        duration: i32,
        description: &str,
    ) -> Result<&Condition, TrackerError> {
        self.add_condition_at(name, duration, description, 0)
    }

    pub fn add_condition_at(
        &mut self,
        name: &str,
        duration: i32,
        description: &str,
        round: u32,
    ) -> Result<&Condition, TrackerError> {
        let condition = Condition::new(name, duration, description, round)?;
        Ok(self.conditions.push(condition))
    }

    pub fn remove_condition(&mut self, name: &str) -> bool {
        self.conditions.remove_named(name)
    }

    pub fn remove_condition_by_id(&mut self, id: &str) -> Option<Condition> {
        self.conditions.remove_by_id(id)
    }

    /// Tick condition durations; returns the conditions that expired
    pub fn update_conditions(&mut self) -> Vec<Condition> {
        self.conditions.tick_all()
    }

    pub fn has_condition(&self, name: &str) -> bool {
        self.conditions.has(name)
    }

    pub fn conditions(&self) -> Vec<Condition> {
        self.conditions.to_vec()
    }

    pub fn condition_list(&self) -> &ConditionList {
        &self.conditions
    }

    pub fn record_action(&mut self, description: &str) -> Result<(), TrackerError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(TrackerError::invalid("action description must not be empty"));
        }
        self.actions.push(description.to_string());
        Ok(())
    }

    pub fn actions(&self) -> &[String] {
        &self.actions
    }

    /// End-of-turn bookkeeping: the pending action log is cleared
    pub fn end_turn(&mut self) {
        self.actions.clear();
    }

    pub fn hp_percentage(&self) -> f64 {
        if self.max_health <= 0 {
            return 0.0;
        }
        f64::from(self.current_health) / f64::from(self.max_health) * 100.0
    }

    pub fn health_status(&self) -> HealthStatus {
        HealthStatus::from_percentage(self.hp_percentage())
    }

    /// Back to full health with no conditions, actions or initiative
    pub fn reset(&mut self) {
        self.current_health = self.max_health;
        self.is_alive = true;
        self.conditions.clear();
        self.actions.clear();
        self.initiative_score = 0;
    }

    pub fn to_json(&self) -> Value {
        serde_json::json!(self)
    }

    /// Rebuild from a stored record. Only a null/non-object record or an
    /// unknown kind tag is an error; everything else falls back to defaults.
    pub fn from_json(value: &Value) -> Result<Self, TrackerError> {
        let rec = codec::record(value, "combatant")?;

        let kind = match codec::str_opt(rec, "kind") {
            Some(tag) => tag.parse()?,
            None => CombatantKind::Npc,
        };
        let max_health = codec::int_or(rec, "maxHealth", 1).max(1);
        let current_health = codec::int_or(rec, "currentHealth", max_health).clamp(0, max_health);
        let name = codec::str_opt(rec, "name")
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or("Unnamed");

        Ok(Self {
            id: codec::str_opt(rec, "id")
                .map(str::to_string)
                .unwrap_or_else(codec::new_id),
            name: name.to_string(),
            kind,
            max_health,
            current_health,
            armor_class: codec::int_or(rec, "armorClass", 10),
            initiative_modifier: codec::int_or(rec, "initiativeModifier", 0),
            initiative_score: codec::int_or(rec, "initiativeScore", 0),
            conditions: ConditionList::from_values(codec::array(rec, "conditions")),
            is_alive: current_health > 0,
            actions: codec::array(rec, "actions")
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            stats: rec
                .get("stats")
                .and_then(Value::as_object)
                .map(AbilityScores::from_record),
        })
    }
}
