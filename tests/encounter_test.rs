//! Encounter scenarios: coordination, statistics and snapshot round trips

mod common;

use common::{abc_encounter, combatant, monster};
use initrack::combat::{CombatEvent, Encounter, UNCONSCIOUS};
use initrack::TrackerError;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value};

#[test]
fn test_round_trip_preserves_stats_and_current() {
    let (mut enc, [a, b, c]) = abc_encounter();
    enc.start_as_ordered().unwrap();
    enc.deal_damage(&a, 7).unwrap();
    enc.deal_damage(&c, 25).unwrap();
    enc.add_condition(&b, "poisoned", 2, "1d4 at turn start").unwrap();
    enc.add_condition(&a, "blessed", -1, "").unwrap();
    enc.next_turn();
    enc.next_turn();

    let restored = Encounter::from_json(&enc.to_json()).unwrap();

    assert_eq!(restored.stats(), enc.stats());
    assert_eq!(
        restored.current().map(|c| c.id().to_string()),
        enc.current().map(|c| c.id().to_string())
    );
    assert_eq!(restored.id(), enc.id());
    assert_eq!(restored.tracker(), enc.tracker());
    assert_eq!(restored.active_conditions().len(), enc.active_conditions().len());
}

#[test]
fn test_serialized_shape() {
    let (mut enc, [a, ..]) = abc_encounter();
    enc.start_as_ordered().unwrap();
    enc.deal_damage(&a, 3).unwrap();

    let value = enc.to_json();
    let tracker = &value["tracker"];
    assert_eq!(tracker["round"], 1);
    assert_eq!(tracker["active"], true);
    assert_eq!(tracker["currentIndex"], 0);

    let first = &tracker["order"][0];
    assert_eq!(first["id"], a.as_str());
    assert_eq!(first["currentHealth"], 17);
    assert_eq!(first["isAlive"], true);
    assert!(first.get("hpPercentage").is_none());
    assert!(value.get("events").is_none());
}

#[test]
fn test_deserialize_untrusted_snapshot() {
    let value = json!({
        "id": "enc-1",
        "name": "Hand edited",
        "tracker": {
            "order": [
                {"id": "p1", "name": "Lia", "kind": "player", "maxHealth": 30, "currentHealth": 12},
                {"id": "m1", "name": "Ogre", "kind": "monster", "maxHealth": 59, "currentHealth": 0,
                 "conditions": [{"name": "unconscious"}]}
            ],
            "currentIndex": 9,
            "round": "three",
            "active": true
        }
    });

    let enc = Encounter::from_json(&value).unwrap();
    assert_eq!(enc.round(), 1);
    assert_eq!(enc.tracker().current_index(), 1);
    assert_eq!(enc.current().unwrap().id(), "m1");

    let ogre = enc.combatant("m1").unwrap();
    assert!(!ogre.is_alive());
    assert!(ogre.has_condition(UNCONSCIOUS));

    let stats = enc.stats();
    assert_eq!((stats.alive, stats.dead, stats.players, stats.monsters), (1, 1, 1, 1));
}

#[test]
fn test_null_snapshot_fails() {
    assert!(matches!(
        Encounter::from_json(&Value::Null),
        Err(TrackerError::InvalidArgument(_))
    ));
}

#[test]
fn test_unconscious_toggles_at_crossing() {
    let mut enc = Encounter::new("Pit");
    let ogre = monster("Ogre", 10);
    let id = ogre.id().to_string();
    enc.add_combatant(ogre).unwrap();

    enc.deal_damage(&id, 9).unwrap();
    assert!(!enc.combatant(&id).unwrap().has_condition(UNCONSCIOUS));
    enc.deal_damage(&id, 9).unwrap();
    assert!(enc.combatant(&id).unwrap().has_condition(UNCONSCIOUS));
    assert_eq!(enc.combatant(&id).unwrap().current_health(), 0);

    enc.heal(&id, 50).unwrap();
    let ogre = enc.combatant(&id).unwrap();
    assert!(ogre.is_alive());
    assert!(!ogre.has_condition(UNCONSCIOUS));
    assert_eq!(ogre.current_health(), 10);
}

#[test]
fn test_stats_track_arbitrary_add_remove() {
    let mut enc = Encounter::new("Skirmish");
    let mut ids = Vec::new();
    for i in 0..6 {
        let c = if i % 2 == 0 {
            monster(&format!("M{i}"), 5)
        } else {
            combatant(&format!("P{i}"), i)
        };
        ids.push(c.id().to_string());
        enc.add_combatant(c).unwrap();
    }
    enc.deal_damage(&ids[0], 5).unwrap();
    enc.deal_damage(&ids[2], 5).unwrap();
    assert_eq!(enc.stats().dead, 2);

    enc.remove_combatant(&ids[0]).unwrap();
    enc.remove_combatant(&ids[1]).unwrap();
    let stats = enc.stats();
    assert_eq!(stats.total, 4);
    assert_eq!(stats.dead, 1);
    assert_eq!(stats.monsters, 2);
    assert_eq!(stats.players, 2);
}

#[test]
fn test_start_rolls_with_rng() {
    let (mut enc, _) = abc_encounter();
    let mut rng = StdRng::seed_from_u64(5);
    let first = enc.start_with(&mut rng).unwrap().id().to_string();

    assert!(enc.is_active());
    assert_eq!(enc.tracker().order_ids()[0], first);
    let events = enc.drain_events();
    assert!(events.contains(&CombatEvent::EncounterStarted { first_id: first }));
}

#[test]
fn test_end_keeps_combatant_state() {
    let (mut enc, [a, ..]) = abc_encounter();
    enc.start_as_ordered().unwrap();
    enc.deal_damage(&a, 5).unwrap();
    enc.next_turn();
    enc.end();

    assert!(!enc.is_active());
    assert!(enc.current().is_none());
    assert_eq!(enc.round(), 1);
    assert!(enc.tracker().history().is_empty());
    assert_eq!(enc.combatant(&a).unwrap().current_health(), 15);
    assert_eq!(enc.combatant(&a).unwrap().initiative_score(), 20);
}

#[test]
fn test_next_turn_when_inactive() {
    let (mut enc, _) = abc_encounter();
    assert!(enc.next_turn().is_none());
    assert!(enc.previous_turn().is_none());
    assert!(enc.drain_events().iter().all(|e| !matches!(e, CombatEvent::TurnStarted { .. })));
}
