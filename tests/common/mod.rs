//! Shared builders for integration tests

#![allow(dead_code)]

use initrack::combat::{Combatant, CombatantKind, Encounter, InitiativeTracker};

/// A player with a fixed initiative score
pub fn combatant(name: &str, initiative: i32) -> Combatant {
    let mut c = Combatant::new(name, CombatantKind::Player, 20).expect("valid combatant");
    c.set_initiative(initiative);
    c
}

pub fn monster(name: &str, hp: i32) -> Combatant {
    Combatant::new(name, CombatantKind::Monster, hp).expect("valid combatant")
}

/// A(20) B(15) C(10), added out of order and sorted, not yet started
pub fn abc_tracker() -> (InitiativeTracker, [String; 3]) {
    let a = combatant("A", 20);
    let b = combatant("B", 15);
    let c = combatant("C", 10);
    let ids = [a.id().to_string(), b.id().to_string(), c.id().to_string()];

    let mut tracker = InitiativeTracker::new();
    tracker.add(b);
    tracker.add(c);
    tracker.add(a);
    tracker.sort_by_initiative();
    (tracker, ids)
}

/// Same roster wrapped in an encounter, initiative already set
pub fn abc_encounter() -> (Encounter, [String; 3]) {
    let a = combatant("A", 20);
    let b = combatant("B", 15);
    let c = combatant("C", 10);
    let ids = [a.id().to_string(), b.id().to_string(), c.id().to_string()];

    let mut encounter = Encounter::new("Test encounter");
    for c in [c, a, b] {
        encounter.add_combatant(c).expect("fresh id");
    }
    encounter.sort_by_initiative();
    (encounter, ids)
}
