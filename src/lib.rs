//! initrack - initiative and combat-state tracker
//!
//! Keeps the turn order for tabletop encounters: who acts next, how hurt
//! everyone is, and which conditions are about to wear off.

pub mod combat;
pub mod config;
pub mod db;
pub mod error;

pub use combat::{Combatant, CombatantKind, Encounter, InitiativeTracker};
pub use config::Config;
pub use error::TrackerError;
