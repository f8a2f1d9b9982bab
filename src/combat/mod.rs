//! Combat tracking module
//!
//! Implements tabletop encounter tracking with:
//! - Combatants with health, armor and initiative
//! - Conditions that tick down at the start of their holder's turn
//! - Turn order with a pointer that survives insertion, removal and re-sorting
//! - Encounters that coordinate the above and record events
//! - Dice rolling (e.g., "2d6+3")

mod codec;
mod combatant;
mod conditions;
mod dice;
mod encounter;
mod events;
mod order;

pub use combatant::{AbilityScores, Combatant, CombatantKind, HealthStatus};
pub use conditions::{Condition, ConditionList, PERMANENT, UNCONSCIOUS};
pub use dice::{resolve_amount, roll_d20_with, DiceRoll};
pub use encounter::{ActiveCondition, Encounter, EncounterStats};
pub use events::CombatEvent;
pub use order::{InitiativeTracker, TurnChange, TurnRecord};
