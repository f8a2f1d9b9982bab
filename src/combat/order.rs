//! Turn order tracking
//!
//! `InitiativeTracker` owns every combatant in one map keyed by id and keeps
//! the turn order as a list of ids. A pointer into that list marks whose turn
//! it is; every mutation of the list repairs the pointer so it keeps naming a
//! valid slot:
//! - removal before the pointer shifts it down one
//! - removal at the pointer hands the turn to whoever slides into the slot
//!   (wrapping to the top when the last slot was removed)
//! - re-sorting mid-encounter follows the current combatant to its new slot

use rand::Rng;
use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;
use serde_json::Value;
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

use super::codec;
use super::combatant::Combatant;
use super::conditions::Condition;
use crate::error::TrackerError;

/// One completed turn in the history log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnRecord {
    pub combatant_id: String,
    pub index: usize,
    pub round: u32,
    /// Unix timestamp (ms)
    pub timestamp: i64,
}

impl TurnRecord {
    fn from_value(value: &Value) -> Option<Self> {
        let rec = value.as_object()?;
        Some(Self {
            combatant_id: codec::str_opt(rec, "combatantId")?.to_string(),
            index: usize::try_from(codec::i64_or(rec, "index", 0)).unwrap_or(0),
            round: u32::try_from(codec::i64_or(rec, "round", 1)).unwrap_or(1).max(1),
            timestamp: codec::i64_or(rec, "timestamp", 0),
        })
    }
}

/// What happened when the turn passed
#[derive(Debug, Clone, PartialEq)]
pub struct TurnChange {
    /// Combatant whose turn just ended
    pub previous_id: String,
    /// Combatant whose turn just started
    pub current_id: String,
    pub round: u32,
    /// True when the pointer wrapped and a new round began
    pub new_round: bool,
    /// Conditions on the new current combatant that ran out
    pub expired: Vec<Condition>,
}

/// Ordered combatants plus the current-turn pointer
#[derive(Debug, Clone, PartialEq)]
pub struct InitiativeTracker {
    combatants: HashMap<String, Combatant>,
    order: Vec<String>,
    current_index: usize,
    round: u32,
    active: bool,
    history: Vec<TurnRecord>,
}

impl Default for InitiativeTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl InitiativeTracker {
    pub fn new() -> Self {
        Self {
            combatants: HashMap::new(),
            order: Vec::new(),
            current_index: 0,
            round: 1,
            active: false,
            history: Vec::new(),
        }
    }

    /// Append a combatant to the end of the order. Returns false if its id is
    /// already present.
    pub fn add(&mut self, combatant: Combatant) -> bool {
        if self.combatants.contains_key(combatant.id()) {
            return false;
        }
        let id = combatant.id().to_string();
        debug!(combatant = %combatant.name(), "added to turn order");
        self.order.push(id.clone());
        self.combatants.insert(id, combatant);
        true
    }

    /// Remove a combatant, repairing the turn pointer
    pub fn remove(&mut self, id: &str) -> Option<Combatant> {
        let pos = self.position(id)?;
        self.order.remove(pos);
        let removed = self.combatants.remove(id);

        if self.order.is_empty() {
            self.current_index = 0;
        } else if pos < self.current_index {
            self.current_index -= 1;
        } else if pos == self.current_index && self.current_index >= self.order.len() {
            self.current_index = 0;
        }
        self.clamp_index();

        if let Some(c) = &removed {
            debug!(combatant = %c.name(), index = self.current_index, "removed from turn order");
        }
        removed
    }

    /// Roll initiative for everyone with the thread RNG, then sort
    pub fn roll_all_initiative(&mut self) {
        self.roll_all_initiative_with(&mut rand::rng());
    }

    pub fn roll_all_initiative_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for id in &self.order {
            if let Some(c) = self.combatants.get_mut(id) {
                c.roll_initiative_with(rng);
            }
        }
        self.sort_by_initiative();
    }

    pub fn roll_for_one(&mut self, id: &str) -> Option<i32> {
        self.roll_for_one_with(id, &mut rand::rng())
    }

    pub fn roll_for_one_with<R: Rng + ?Sized>(&mut self, id: &str, rng: &mut R) -> Option<i32> {
        let score = self.combatants.get_mut(id)?.roll_initiative_with(rng);
        self.sort_by_initiative();
        Some(score)
    }

    pub fn set_initiative(&mut self, id: &str, value: i32) -> Option<i32> {
        self.combatants.get_mut(id)?.set_initiative(value);
        self.sort_by_initiative();
        Some(value)
    }

    /// Stable sort: highest score first, ties by highest modifier
    pub fn sort_by_initiative(&mut self) {
        let current_id = if self.active {
            self.current_id().map(str::to_string)
        } else {
            None
        };

        let combatants = &self.combatants;
        self.order.sort_by_key(|id| {
            combatants
                .get(id)
                .map(|c| Reverse((c.initiative_score(), c.initiative_modifier())))
        });

        if !self.active {
            self.current_index = 0;
        } else if let Some(pos) = current_id.and_then(|id| self.position(&id)) {
            self.current_index = pos;
        }
        self.clamp_index();
    }

    /// Begin the encounter at the top of the order. False when nobody is in it.
    pub fn start(&mut self) -> bool {
        if self.order.is_empty() {
            return false;
        }
        self.active = true;
        self.current_index = 0;
        self.round = 1;
        self.history.clear();
        info!(combatants = self.order.len(), "encounter started");
        true
    }

    /// Stop the encounter; combatants keep their state
    pub fn end(&mut self) {
        self.active = false;
        self.current_index = 0;
        self.round = 1;
        self.history.clear();
        info!("encounter ended");
    }

    /// End the encounter and clear every initiative score
    pub fn reset(&mut self) {
        self.end();
        for c in self.combatants.values_mut() {
            c.set_initiative(0);
        }
    }

    /// Pass the turn to the next combatant and return it
    pub fn advance(&mut self) -> Option<&Combatant> {
        let change = self.advance_turn()?;
        self.combatants.get(&change.current_id)
    }

    /// Pass the turn, reporting who it moved between and what expired
    pub fn advance_turn(&mut self) -> Option<TurnChange> {
        if !self.active || self.order.is_empty() {
            return None;
        }
        self.clamp_index();

        let previous_id = self.order[self.current_index].clone();
        self.history.push(TurnRecord {
            combatant_id: previous_id.clone(),
            index: self.current_index,
            round: self.round,
            timestamp: codec::now_ms(),
        });
        if let Some(c) = self.combatants.get_mut(&previous_id) {
            c.end_turn();
        }

        self.current_index += 1;
        let new_round = self.current_index >= self.order.len();
        if new_round {
            self.current_index = 0;
            self.round += 1;
            info!(round = self.round, "new round");
        }

        let current_id = self.order[self.current_index].clone();
        let expired = match self.combatants.get_mut(&current_id) {
            Some(c) => c.update_conditions(),
            None => Vec::new(),
        };
        for condition in &expired {
            debug!(combatant = %current_id, condition = %condition.name, "condition expired");
        }

        Some(TurnChange {
            previous_id,
            current_id,
            round: self.round,
            new_round,
            expired,
        })
    }

    /// Step back one turn. Only moves the pointer and round; decayed
    /// conditions and cleared actions stay as they are.
    pub fn retreat(&mut self) -> Option<&Combatant> {
        if !self.active || self.order.is_empty() {
            return None;
        }
        self.clamp_index();
        if self.current_index == 0 {
            self.current_index = self.order.len() - 1;
            self.round = self.round.saturating_sub(1).max(1);
        } else {
            self.current_index -= 1;
        }
        self.current()
    }

    /// Replace the order wholesale. Only accepted when `ids` names every
    /// current combatant exactly once.
    pub fn reorder<S: AsRef<str>>(&mut self, ids: &[S]) -> bool {
        if ids.len() != self.order.len() {
            return false;
        }
        let mut seen = HashSet::with_capacity(ids.len());
        for id in ids {
            let id = id.as_ref();
            if !self.combatants.contains_key(id) || !seen.insert(id) {
                return false;
            }
        }
        self.order = ids.iter().map(|id| id.as_ref().to_string()).collect();
        self.current_index = 0;
        true
    }

    /// Move the combatant at `from` to `to`, keeping the pointer on the same
    /// combatant unless it was the one moved.
    pub fn move_combatant(&mut self, from: usize, to: usize) -> bool {
        let len = self.order.len();
        if from >= len || to >= len {
            return false;
        }
        if from == to {
            return true;
        }

        let id = self.order.remove(from);
        self.order.insert(to, id);

        let current = self.current_index;
        if from == current {
            self.current_index = to;
        } else if from < current && to >= current {
            self.current_index -= 1;
        } else if from > current && to <= current {
            self.current_index += 1;
        }
        self.clamp_index();
        true
    }

    /// Whose turn it is, if the encounter is running
    pub fn current(&self) -> Option<&Combatant> {
        if !self.active || self.order.is_empty() {
            return None;
        }
        let index = self.current_index.min(self.order.len() - 1);
        self.combatants.get(&self.order[index])
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current().map(Combatant::id)
    }

    pub fn get(&self, id: &str) -> Option<&Combatant> {
        self.combatants.get(id)
    }

    /// Mutable access to one combatant. Call `sort_by_initiative` after
    /// changing initiative through this.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Combatant> {
        self.combatants.get_mut(id)
    }

    /// Combatants in turn order
    pub fn iter(&self) -> impl Iterator<Item = &Combatant> {
        self.order.iter().filter_map(|id| self.combatants.get(id))
    }

    pub fn order_snapshot(&self) -> Vec<Combatant> {
        self.iter().cloned().collect()
    }

    pub fn order_ids(&self) -> &[String] {
        &self.order
    }

    pub fn count_alive(&self) -> usize {
        self.iter().filter(|c| c.is_alive()).count()
    }

    pub fn with_condition(&self, name: &str) -> Vec<&Combatant> {
        self.iter().filter(|c| c.has_condition(name)).collect()
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.order.iter().position(|o| o == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.combatants.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn history(&self) -> &[TurnRecord] {
        &self.history
    }

    pub(crate) fn combatants_mut(&mut self) -> impl Iterator<Item = &mut Combatant> {
        self.combatants.values_mut()
    }

    fn clamp_index(&mut self) {
        if self.order.is_empty() {
            self.current_index = 0;
        } else if self.current_index >= self.order.len() {
            self.current_index = self.order.len() - 1;
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::json!(self)
    }

    /// Rebuild from a stored record. Unusable combatant entries are skipped
    /// and the pointer is clamped back into range.
    pub fn from_json(value: &Value) -> Result<Self, TrackerError> {
        let rec = codec::record(value, "turn order")?;
        let mut tracker = Self::new();

        for entry in codec::array(rec, "order") {
            match Combatant::from_json(entry) {
                Ok(c) => {
                    let id = c.id().to_string();
                    if !tracker.add(c) {
                        warn!(combatant = %id, "duplicate combatant in stored order, skipped");
                    }
                }
                Err(e) => warn!("skipping stored combatant: {}", e),
            }
        }

        tracker.current_index = usize::try_from(codec::i64_or(rec, "currentIndex", 0)).unwrap_or(0);
        tracker.round = u32::try_from(codec::i64_or(rec, "round", 1))
            .unwrap_or(1)
            .max(1);
        tracker.active = codec::bool_or(rec, "active", false);
        tracker.history = codec::array(rec, "history")
            .iter()
            .filter_map(TurnRecord::from_value)
            .collect();
        tracker.clamp_index();

        Ok(tracker)
    }
}

impl Serialize for InitiativeTracker {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let order: Vec<&Combatant> = self.iter().collect();
        let mut state = serializer.serialize_struct("InitiativeTracker", 5)?;
        state.serialize_field("order", &order)?;
        state.serialize_field("currentIndex", &self.current_index)?;
        state.serialize_field("round", &self.round)?;
        state.serialize_field("active", &self.active)?;
        state.serialize_field("history", &self.history)?;
        state.end()
    }
}
