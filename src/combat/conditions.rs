//! Conditions: named status effects with turn-based expiry
//!
//! A condition either lasts forever (`PERMANENT`) or carries a remaining
//! duration that ticks down once per turn-start of the combatant holding it.
//! A duration of `d` survives `d + 1` ticks, so a one-turn condition covers
//! the whole turn it was applied in.

use serde::Serialize;
use serde_json::Value;

use super::codec::{self, Record};
use crate::error::TrackerError;

/// Duration marker for conditions that never expire
pub const PERMANENT: i32 = -1;

/// Condition applied when a combatant drops to zero health
pub const UNCONSCIOUS: &str = "unconscious";

/// A condition instance on one combatant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub id: String,
    pub name: String,
    /// Turns left, or `PERMANENT`
    pub remaining_duration: i32,
    pub description: String,
    /// Round the condition was applied in
    pub applied_at_turn: u32,
}

impl Condition {
    /// Create a new condition with a fresh id
    pub fn new(
        name: &str,
        duration: i32,
        description: &str,
        applied_at_turn: u32,
    ) -> Result<Self, TrackerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TrackerError::invalid("condition name must not be empty"));
        }
        if duration < PERMANENT {
            return Err(TrackerError::invalid(format!(
                "condition duration must be {PERMANENT} (permanent) or non-negative, got {duration}"
            )));
        }
        Ok(Self {
            id: codec::new_id(),
            name: name.to_string(),
            remaining_duration: duration,
            description: description.to_string(),
            applied_at_turn,
        })
    }

    /// A permanent condition with no description
    pub fn permanent(name: &str) -> Result<Self, TrackerError> {
        Self::new(name, PERMANENT, "", 0)
    }

    pub fn is_permanent(&self) -> bool {
        self.remaining_duration == PERMANENT
    }

    pub fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name.trim())
    }

    /// Tick one turn off the duration; returns false once expired
    fn tick(&mut self) -> bool {
        if self.is_permanent() {
            return true;
        }
        self.remaining_duration -= 1;
        self.remaining_duration >= 0
    }

    pub(crate) fn from_record(rec: &Record) -> Option<Self> {
        let name = codec::str_opt(rec, "name")?.trim();
        if name.is_empty() {
            return None;
        }
        // Out-of-range timed durations expire at the next tick
        let remaining_duration = match codec::int_or(rec, "remainingDuration", PERMANENT) {
            d if d < PERMANENT => 0,
            d => d,
        };
        Some(Self {
            id: codec::str_opt(rec, "id")
                .map(str::to_string)
                .unwrap_or_else(codec::new_id),
            name: name.to_string(),
            remaining_duration,
            description: codec::string_or(rec, "description", ""),
            applied_at_turn: u32::try_from(codec::i64_or(rec, "appliedAtTurn", 0)).unwrap_or(0),
        })
    }
}

/// Ordered conditions held by one combatant; duplicates by name are allowed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ConditionList {
    entries: Vec<Condition>,
}

impl ConditionList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, condition: Condition) -> &Condition {
        self.entries.push(condition);
        &self.entries[self.entries.len() - 1]
    }

    /// Remove every entry with this name
    pub fn remove_named(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|c| !c.matches(name));
        self.entries.len() != before
    }

    /// Remove a single entry by id
    pub fn remove_by_id(&mut self, id: &str) -> Option<Condition> {
        let pos = self.entries.iter().position(|c| c.id == id)?;
        Some(self.entries.remove(pos))
    }

    pub fn has(&self, name: &str) -> bool {
        self.entries.iter().any(|c| c.matches(name))
    }

    pub fn get(&self, name: &str) -> Option<&Condition> {
        self.entries.iter().find(|c| c.matches(name))
    }

    /// Tick every timed condition and return the ones that expired
    pub fn tick_all(&mut self) -> Vec<Condition> {
        let mut expired = Vec::new();
        let mut kept = Vec::with_capacity(self.entries.len());
        for mut condition in self.entries.drain(..) {
            if condition.tick() {
                kept.push(condition);
            } else {
                expired.push(condition);
            }
        }
        self.entries = kept;
        expired
    }

    pub fn iter(&self) -> impl Iterator<Item = &Condition> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<Condition> {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Rebuild from a stored array, skipping entries that are not usable
    pub(crate) fn from_values(values: &[Value]) -> Self {
        let entries = values
            .iter()
            .filter_map(Value::as_object)
            .filter_map(Condition::from_record)
            .collect();
        Self { entries }
    }
}
