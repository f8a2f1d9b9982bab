//! Turn order scenarios: pointer repair, round counting, condition decay

mod common;

use common::{abc_tracker, combatant};
use initrack::combat::InitiativeTracker;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[test]
fn test_abc_scenario() {
    let (mut tracker, [a, b, c]) = abc_tracker();
    assert!(tracker.start());

    assert_eq!(tracker.current().unwrap().id(), a);
    assert_eq!(tracker.advance().unwrap().id(), b);
    assert_eq!(tracker.advance().unwrap().id(), c);
    assert_eq!(tracker.round(), 1);
    assert_eq!(tracker.advance().unwrap().id(), a);
    assert_eq!(tracker.round(), 2);
}

#[test]
fn test_full_cycle_bumps_round_once() {
    let mut tracker = InitiativeTracker::new();
    for i in 0..7 {
        tracker.add(combatant(&format!("C{i}"), 20 - i));
    }
    tracker.sort_by_initiative();
    tracker.start();

    for _ in 0..tracker.len() {
        tracker.advance();
    }
    assert_eq!(tracker.current_index(), 0);
    assert_eq!(tracker.round(), 2);
    assert_eq!(tracker.history().len(), 7);
}

#[test]
fn test_remove_last_current_wraps_to_top() {
    let (mut tracker, [_, _, c]) = abc_tracker();
    tracker.start();
    tracker.advance();
    tracker.advance();
    assert_eq!(tracker.current_index(), 2);

    tracker.remove(&c);
    assert_eq!(tracker.current_index(), 0);
}

#[test]
fn test_remove_current_hands_turn_to_next_occupant() {
    let (mut tracker, [a, b, c]) = abc_tracker();
    tracker.start();
    assert_eq!(tracker.current_id(), Some(a.as_str()));

    tracker.remove(&a);
    assert_eq!(tracker.current_index(), 0);
    assert_eq!(tracker.current_id(), Some(b.as_str()));

    tracker.advance();
    assert_eq!(tracker.current_id(), Some(c.as_str()));
}

#[test]
fn test_partial_reorder_rejected() {
    let (mut tracker, [a, _, c]) = abc_tracker();
    let before = tracker.order_ids().to_vec();
    assert!(!tracker.reorder(&[c, a]));
    assert_eq!(tracker.order_ids(), before.as_slice());
}

#[test]
fn test_duration_one_spans_holders_turn() {
    let (mut tracker, [_, b, _]) = abc_tracker();
    tracker.start();
    tracker
        .get_mut(&b)
        .unwrap()
        .add_condition("frightened", 1, "")
        .unwrap();
    assert!(tracker.get(&b).unwrap().has_condition("frightened"));

    // First turn-start for B
    tracker.advance();
    assert!(tracker.get(&b).unwrap().has_condition("frightened"));

    // Turns of C and A do not touch B's conditions
    tracker.advance();
    tracker.advance();
    assert!(tracker.get(&b).unwrap().has_condition("frightened"));

    // Second turn-start for B
    tracker.advance();
    assert!(!tracker.get(&b).unwrap().has_condition("frightened"));
}

#[test]
fn test_retreat_does_not_undo_decay() {
    let (mut tracker, [_, b, _]) = abc_tracker();
    tracker.start();
    tracker
        .get_mut(&b)
        .unwrap()
        .add_condition("blinded", 3, "")
        .unwrap();
    tracker.advance();
    tracker.retreat();
    let remaining = tracker.get(&b).unwrap().conditions()[0].remaining_duration;
    assert_eq!(remaining, 2);
}

#[test]
fn test_pointer_stays_valid_under_random_mutation() {
    let mut rng = StdRng::seed_from_u64(0x1d20);
    let mut tracker = InitiativeTracker::new();
    let mut next_name = 0;

    for _ in 0..5 {
        tracker.add(combatant(&format!("seed{next_name}"), rng.random_range(1..=20)));
        next_name += 1;
    }
    tracker.sort_by_initiative();
    assert!(tracker.start());

    for step in 0..2_000 {
        match rng.random_range(0..6) {
            0 => {
                tracker.add(combatant(&format!("c{next_name}"), rng.random_range(1..=20)));
                next_name += 1;
            }
            1 if !tracker.is_empty() => {
                let pos = rng.random_range(0..tracker.len());
                let id = tracker.order_ids()[pos].clone();
                assert!(tracker.remove(&id).is_some());
            }
            2 if !tracker.is_empty() => {
                let from = rng.random_range(0..tracker.len());
                let to = rng.random_range(0..tracker.len());
                assert!(tracker.move_combatant(from, to));
            }
            3 => {
                tracker.advance();
            }
            4 => {
                tracker.retreat();
            }
            _ => {
                if let Some(id) = tracker.order_ids().first().cloned() {
                    tracker.set_initiative(&id, rng.random_range(1..=20));
                }
            }
        }

        if tracker.is_empty() {
            assert_eq!(tracker.current_index(), 0, "step {step}");
            assert!(tracker.current().is_none());
        } else {
            assert!(tracker.current_index() < tracker.len(), "step {step}");
            assert!(tracker.current().is_some(), "step {step}");
        }
        assert!(tracker.round() >= 1);
    }
}

#[test]
fn test_move_keeps_current_combatant() {
    let mut rng = StdRng::seed_from_u64(99);
    let (mut tracker, _) = abc_tracker();
    tracker.add(combatant("D", 5));
    tracker.add(combatant("E", 3));
    tracker.start();
    tracker.advance();
    tracker.advance();

    for _ in 0..200 {
        let before = tracker.current_id().unwrap().to_string();
        let from = rng.random_range(0..tracker.len());
        let to = rng.random_range(0..tracker.len());
        tracker.move_combatant(from, to);
        assert_eq!(tracker.current_id(), Some(before.as_str()));
    }
}
