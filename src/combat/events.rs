//! Events recorded by an encounter for the caller to drain after each call

use serde::Serialize;

/// Something observable that happened during an encounter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CombatEvent {
    CombatantAdded { combatant_id: String },
    CombatantRemoved { combatant_id: String },
    EncounterStarted { first_id: String },
    EncounterEnded,
    EncounterReset,
    TurnStarted { combatant_id: String, round: u32 },
    RoundStarted { round: u32 },
    Damaged { combatant_id: String, amount: i32, health: i32 },
    Healed { combatant_id: String, amount: i32, health: i32 },
    Downed { combatant_id: String },
    Revived { combatant_id: String },
    ConditionApplied { combatant_id: String, condition: String },
    ConditionRemoved { combatant_id: String, condition: String },
    ConditionExpired { combatant_id: String, condition: String },
    InitiativeChanged { combatant_id: String, score: i32 },
    OrderChanged,
}

impl CombatEvent {
    /// The combatant this event concerns, if any
    pub fn combatant_id(&self) -> Option<&str> {
        match self {
            CombatEvent::CombatantAdded { combatant_id }
            | CombatEvent::CombatantRemoved { combatant_id }
            | CombatEvent::TurnStarted { combatant_id, .. }
            | CombatEvent::Damaged { combatant_id, .. }
            | CombatEvent::Healed { combatant_id, .. }
            | CombatEvent::Downed { combatant_id }
            | CombatEvent::Revived { combatant_id }
            | CombatEvent::ConditionApplied { combatant_id, .. }
            | CombatEvent::ConditionRemoved { combatant_id, .. }
            | CombatEvent::ConditionExpired { combatant_id, .. }
            | CombatEvent::InitiativeChanged { combatant_id, .. } => Some(combatant_id.as_str()),
            CombatEvent::EncounterStarted { first_id } => Some(first_id.as_str()),
            CombatEvent::EncounterEnded
            | CombatEvent::EncounterReset
            | CombatEvent::RoundStarted { .. }
            | CombatEvent::OrderChanged => None,
        }
    }
}
