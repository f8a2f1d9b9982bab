//! Encounters: one turn order plus the operations a game master runs on it
//!
//! The roster lives inside the tracker, so adding or removing a combatant is
//! a single mutation and the two can never disagree. Lookups that miss come
//! back as `TrackerError::NotFound`; nothing is written before validation.

use rand::Rng;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use super::codec;
use super::combatant::{Combatant, CombatantKind};
use super::conditions::Condition;
use super::events::CombatEvent;
use super::order::{InitiativeTracker, TurnChange};
use crate::error::TrackerError;

/// Counts derived from the live roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncounterStats {
    pub total: usize,
    pub alive: usize,
    pub dead: usize,
    pub players: usize,
    pub npcs: usize,
    pub monsters: usize,
    pub round: u32,
    pub active: bool,
    pub current_combatant: Option<String>,
}

/// A condition together with the combatant carrying it
#[derive(Debug, Clone, Copy)]
pub struct ActiveCondition<'a> {
    pub combatant: &'a Combatant,
    pub condition: &'a Condition,
}

/// A named encounter and its turn order
///
/// Mutations buffer a `CombatEvent` for each observable change. The buffer is
/// only emptied by `drain_events`, so long-lived callers must drain it after
/// each call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Encounter {
    id: String,
    name: String,
    description: String,
    notes: String,
    /// Unix timestamp (ms)
    created_at: i64,
    updated_at: i64,
    tracker: InitiativeTracker,
    #[serde(skip)]
    events: Vec<CombatEvent>,
}

impl Encounter {
    pub fn new(name: &str) -> Self {
        let now = codec::now_ms();
        let name = name.trim();
        Self {
            id: codec::new_id(),
            name: if name.is_empty() { "Encounter" } else { name }.to_string(),
            description: String::new(),
            notes: String::new(),
            created_at: now,
            updated_at: now,
            tracker: InitiativeTracker::new(),
            events: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rename(&mut self, name: &str) -> Result<(), TrackerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TrackerError::invalid("encounter name must not be empty"));
        }
        self.name = name.to_string();
        self.touch();
        Ok(())
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn set_notes(&mut self, notes: &str) {
        self.notes = notes.to_string();
        self.touch();
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn updated_at(&self) -> i64 {
        self.updated_at
    }

    pub fn tracker(&self) -> &InitiativeTracker {
        &self.tracker
    }

    pub fn combatant(&self, id: &str) -> Option<&Combatant> {
        self.tracker.get(id)
    }

    /// Combatants in turn order
    pub fn combatants(&self) -> impl Iterator<Item = &Combatant> {
        self.tracker.iter()
    }

    /// Find a combatant by id, falling back to a case-insensitive name match
    pub fn find(&self, key: &str) -> Option<&Combatant> {
        self.tracker.get(key).or_else(|| {
            self.tracker
                .iter()
                .find(|c| c.name().eq_ignore_ascii_case(key.trim()))
        })
    }

    pub fn current(&self) -> Option<&Combatant> {
        self.tracker.current()
    }

    pub fn is_active(&self) -> bool {
        self.tracker.is_active()
    }

    pub fn round(&self) -> u32 {
        self.tracker.round()
    }

    /// Take every event recorded since the last drain
    pub fn drain_events(&mut self) -> Vec<CombatEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn add_combatant(&mut self, combatant: Combatant) -> Result<(), TrackerError> {
        let id = combatant.id().to_string();
        if !self.tracker.add(combatant) {
            return Err(TrackerError::precondition(format!(
                "combatant {id} is already in the encounter"
            )));
        }
        self.record(CombatEvent::CombatantAdded { combatant_id: id });
        Ok(())
    }

    pub fn remove_combatant(&mut self, id: &str) -> Result<Combatant, TrackerError> {
        let removed = self
            .tracker
            .remove(id)
            .ok_or_else(|| TrackerError::combatant_not_found(id))?;
        self.record(CombatEvent::CombatantRemoved {
            combatant_id: id.to_string(),
        });
        Ok(removed)
    }

    /// Roll initiative for everyone and begin at the top of the order
    pub fn start(&mut self) -> Result<&Combatant, TrackerError> {
        self.start_with(&mut rand::rng())
    }

    pub fn start_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<&Combatant, TrackerError> {
        if self.tracker.is_empty() {
            return Err(TrackerError::precondition(
                "cannot start an encounter with no combatants",
            ));
        }
        self.tracker.roll_all_initiative_with(rng);
        self.tracker.start();
        let first_id = self
            .tracker
            .current_id()
            .map(str::to_string)
            .unwrap_or_default();
        info!(encounter = %self.name, first = %first_id, "encounter started");
        self.record(CombatEvent::EncounterStarted { first_id });
        self.current()
            .ok_or_else(|| TrackerError::precondition("encounter has no current combatant"))
    }

    /// Start without rolling: keep whatever initiative is already set
    pub fn start_as_ordered(&mut self) -> Result<&Combatant, TrackerError> {
        if !self.tracker.start() {
            return Err(TrackerError::precondition(
                "cannot start an encounter with no combatants",
            ));
        }
        let first_id = self
            .tracker
            .current_id()
            .map(str::to_string)
            .unwrap_or_default();
        self.record(CombatEvent::EncounterStarted { first_id });
        self.current()
            .ok_or_else(|| TrackerError::precondition("encounter has no current combatant"))
    }

    pub fn end(&mut self) {
        self.tracker.end();
        info!(encounter = %self.name, "encounter ended");
        self.record(CombatEvent::EncounterEnded);
    }

    /// Pass the turn; `None` when the encounter is not running
    pub fn next_turn(&mut self) -> Option<&Combatant> {
        let change = self.tracker.advance_turn()?;
        self.record_turn_change(&change);
        self.tracker.get(&change.current_id)
    }

    pub fn previous_turn(&mut self) -> Option<&Combatant> {
        let id = self.tracker.retreat()?.id().to_string();
        let round = self.tracker.round();
        self.record(CombatEvent::TurnStarted {
            combatant_id: id.clone(),
            round,
        });
        self.tracker.get(&id)
    }

    pub fn roll_all_initiative(&mut self) {
        self.tracker.roll_all_initiative();
        self.record(CombatEvent::OrderChanged);
    }

    pub fn roll_initiative(&mut self, id: &str) -> Result<i32, TrackerError> {
        let score = self
            .tracker
            .roll_for_one(id)
            .ok_or_else(|| TrackerError::combatant_not_found(id))?;
        self.record(CombatEvent::InitiativeChanged {
            combatant_id: id.to_string(),
            score,
        });
        Ok(score)
    }

    pub fn set_initiative(&mut self, id: &str, value: i32) -> Result<i32, TrackerError> {
        let score = self
            .tracker
            .set_initiative(id, value)
            .ok_or_else(|| TrackerError::combatant_not_found(id))?;
        self.record(CombatEvent::InitiativeChanged {
            combatant_id: id.to_string(),
            score,
        });
        Ok(score)
    }

    pub fn sort_by_initiative(&mut self) {
        self.tracker.sort_by_initiative();
        self.record(CombatEvent::OrderChanged);
    }

    /// Replace the turn order; every combatant must be named exactly once
    pub fn reorder<S: AsRef<str>>(&mut self, ids: &[S]) -> Result<(), TrackerError> {
        if !self.tracker.reorder(ids) {
            return Err(TrackerError::precondition(format!(
                "reorder needs each of the {} combatants exactly once, got {} ids",
                self.tracker.len(),
                ids.len()
            )));
        }
        self.record(CombatEvent::OrderChanged);
        Ok(())
    }

    pub fn move_combatant(&mut self, from: usize, to: usize) -> Result<(), TrackerError> {
        if !self.tracker.move_combatant(from, to) {
            return Err(TrackerError::invalid(format!(
                "cannot move {from} -> {to} in an order of {}",
                self.tracker.len()
            )));
        }
        self.record(CombatEvent::OrderChanged);
        Ok(())
    }

    pub fn deal_damage(&mut self, id: &str, amount: i32) -> Result<i32, TrackerError> {
        let combatant = self
            .tracker
            .get_mut(id)
            .ok_or_else(|| TrackerError::combatant_not_found(id))?;
        let was_alive = combatant.is_alive();
        let health = combatant.take_damage(amount)?;
        let downed = was_alive && !combatant.is_alive();

        debug!(combatant = %id, amount, health, "damage dealt");
        self.record(CombatEvent::Damaged {
            combatant_id: id.to_string(),
            amount,
            health,
        });
        if downed {
            self.record(CombatEvent::Downed {
                combatant_id: id.to_string(),
            });
        }
        Ok(health)
    }

    /// Damage whoever is taking their turn
    pub fn deal_damage_to_current(&mut self, amount: i32) -> Result<i32, TrackerError> {
        let id = self
            .tracker
            .current_id()
            .map(str::to_string)
            .ok_or_else(|| TrackerError::precondition("no combatant is taking a turn"))?;
        self.deal_damage(&id, amount)
    }

    pub fn heal(&mut self, id: &str, amount: i32) -> Result<i32, TrackerError> {
        let combatant = self
            .tracker
            .get_mut(id)
            .ok_or_else(|| TrackerError::combatant_not_found(id))?;
        let was_alive = combatant.is_alive();
        let health = combatant.heal(amount)?;
        let revived = !was_alive && combatant.is_alive();

        debug!(combatant = %id, amount, health, "healed");
        self.record(CombatEvent::Healed {
            combatant_id: id.to_string(),
            amount,
            health,
        });
        if revived {
            self.record(CombatEvent::Revived {
                combatant_id: id.to_string(),
            });
        }
        Ok(health)
    }

    /// Apply a condition, stamped with the current round
    pub fn add_condition(
        &mut self,
        id: &str,
        name: &str,
        duration: i32,
        description: &str,
    ) -> Result<Condition, TrackerError> {
        let round = self.tracker.round();
        let combatant = self
            .tracker
            .get_mut(id)
            .ok_or_else(|| TrackerError::combatant_not_found(id))?;
        let condition = combatant
            .add_condition_at(name, duration, description, round)?
            .clone();
        self.record(CombatEvent::ConditionApplied {
            combatant_id: id.to_string(),
            condition: condition.name.clone(),
        });
        Ok(condition)
    }

    /// Remove every condition with this name; Ok(false) if there was none
    pub fn remove_condition(&mut self, id: &str, name: &str) -> Result<bool, TrackerError> {
        let combatant = self
            .tracker
            .get_mut(id)
            .ok_or_else(|| TrackerError::combatant_not_found(id))?;
        let removed = combatant.remove_condition(name);
        if removed {
            self.record(CombatEvent::ConditionRemoved {
                combatant_id: id.to_string(),
                condition: name.trim().to_string(),
            });
        }
        Ok(removed)
    }

    pub fn remove_condition_by_id(
        &mut self,
        id: &str,
        condition_id: &str,
    ) -> Result<Condition, TrackerError> {
        let combatant = self
            .tracker
            .get_mut(id)
            .ok_or_else(|| TrackerError::combatant_not_found(id))?;
        let removed = combatant
            .remove_condition_by_id(condition_id)
            .ok_or_else(|| TrackerError::NotFound {
                entity: "condition",
                id: condition_id.to_string(),
            })?;
        self.record(CombatEvent::ConditionRemoved {
            combatant_id: id.to_string(),
            condition: removed.name.clone(),
        });
        Ok(removed)
    }

    pub fn record_action(&mut self, id: &str, description: &str) -> Result<(), TrackerError> {
        self.tracker
            .get_mut(id)
            .ok_or_else(|| TrackerError::combatant_not_found(id))?
            .record_action(description)?;
        self.touch();
        Ok(())
    }

    /// Every condition currently on any combatant, in turn order
    pub fn active_conditions(&self) -> Vec<ActiveCondition<'_>> {
        self.tracker
            .iter()
            .flat_map(|combatant| {
                combatant
                    .condition_list()
                    .iter()
                    .map(move |condition| ActiveCondition {
                        combatant,
                        condition,
                    })
            })
            .collect()
    }

    pub fn stats(&self) -> EncounterStats {
        let count_kind =
            |kind: CombatantKind| self.tracker.iter().filter(|c| c.kind() == kind).count();
        let total = self.tracker.len();
        let alive = self.tracker.count_alive();
        EncounterStats {
            total,
            alive,
            dead: total - alive,
            players: count_kind(CombatantKind::Player),
            npcs: count_kind(CombatantKind::Npc),
            monsters: count_kind(CombatantKind::Monster),
            round: self.tracker.round(),
            active: self.tracker.is_active(),
            current_combatant: self.tracker.current_id().map(str::to_string),
        }
    }

    /// Restore every combatant to full and stop the encounter
    pub fn reset(&mut self) {
        for c in self.tracker.combatants_mut() {
            c.reset();
        }
        self.tracker.reset();
        info!(encounter = %self.name, "encounter reset");
        self.record(CombatEvent::EncounterReset);
    }

    pub fn to_json(&self) -> Value {
        serde_json::json!(self)
    }

    /// Rebuild from a stored record; only a null/non-object top level fails
    pub fn from_json(value: &Value) -> Result<Self, TrackerError> {
        let rec = codec::record(value, "encounter")?;
        let now = codec::now_ms();
        let tracker = match rec.get("tracker") {
            Some(t @ Value::Object(_)) => InitiativeTracker::from_json(t)?,
            _ => InitiativeTracker::new(),
        };
        let name = codec::string_or(rec, "name", "Encounter");

        Ok(Self {
            id: codec::str_opt(rec, "id")
                .map(str::to_string)
                .unwrap_or_else(codec::new_id),
            name: if name.trim().is_empty() {
                "Encounter".to_string()
            } else {
                name
            },
            description: codec::string_or(rec, "description", ""),
            notes: codec::string_or(rec, "notes", ""),
            created_at: codec::i64_or(rec, "createdAt", now),
            updated_at: codec::i64_or(rec, "updatedAt", now),
            tracker,
            events: Vec::new(),
        })
    }

    fn record_turn_change(&mut self, change: &TurnChange) {
        if change.new_round {
            self.record(CombatEvent::RoundStarted {
                round: change.round,
            });
        }
        for condition in &change.expired {
            self.record(CombatEvent::ConditionExpired {
                combatant_id: change.current_id.clone(),
                condition: condition.name.clone(),
            });
        }
        self.record(CombatEvent::TurnStarted {
            combatant_id: change.current_id.clone(),
            round: change.round,
        });
    }

    fn record(&mut self, event: CombatEvent) {
        self.events.push(event);
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = codec::now_ms();
    }
}
