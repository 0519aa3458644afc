//! Tests for the reputation system

use super::*;
use crate::domain::{Anomaly, AnomalyKind, Severity};
use proptest::prelude::*;

const DAY_MS: u64 = 86_400_000;

fn anomaly(severity: Severity, node: &str) -> Anomaly {
    Anomaly::new(
        AnomalyKind::ContradictoryMessages,
        severity,
        vec![node.to_string()],
        "test",
    )
}

// =============================================================================
// TEST GROUP 1: Lazy creation and decay
// =============================================================================

#[test]
fn test_unknown_node_starts_at_initial_score() {
    let mut system = ReputationSystem::default();
    assert!(system.peek("n1", 0).is_none());
    assert_eq!(system.get_score("n1", 0), 0.5);
    assert_eq!(system.peek("n1", 0), Some(0.5));
}

#[test]
fn test_decay_applies_per_full_period_only() {
    let mut system = ReputationSystem::default();
    system.get_score("n1", 0);

    assert_eq!(system.get_score("n1", DAY_MS - 1), 0.5);
    let after_one = system.get_score("n1", DAY_MS);
    assert!((after_one - 0.475).abs() < 1e-9);

    // A partial period after a decay does not decay again.
    assert!((system.get_score("n1", DAY_MS + DAY_MS / 2) - 0.475).abs() < 1e-9);
    let after_two = system.get_score("n1", 2 * DAY_MS);
    assert!((after_two - 0.475 * 0.95).abs() < 1e-9);
}

#[test]
fn test_peek_decays_without_mutating() {
    let mut system = ReputationSystem::default();
    system.get_score("n1", 0);
    let peeked = system.peek("n1", 3 * DAY_MS).unwrap();
    assert!((peeked - 0.5 * 0.95f64.powi(3)).abs() < 1e-9);
    assert_eq!(system.record("n1").unwrap().score(), 0.5);
}

// =============================================================================
// TEST GROUP 2: Penalties and rewards
// =============================================================================

#[test]
fn test_penalties_by_severity() {
    let mut system = ReputationSystem::default();
    assert!((system.penalize("h", Severity::High, 0) - 0.3).abs() < 1e-9);
    assert!((system.penalize("m", Severity::Medium, 0) - 0.4).abs() < 1e-9);
    assert!((system.penalize("l", Severity::Low, 0) - 0.45).abs() < 1e-9);
}

#[test]
fn test_score_is_clamped() {
    let mut system = ReputationSystem::default();
    for _ in 0..10 {
        system.penalize("n1", Severity::High, 0);
    }
    assert_eq!(system.get_score("n1", 0), 0.0);

    for _ in 0..100 {
        system.reward("n2", 0);
    }
    assert_eq!(system.get_score("n2", 0), 1.0);
}

#[test]
fn test_high_anomaly_strictly_lower_than_clean_round() {
    let mut system = ReputationSystem::default();
    let participants = vec!["bad".to_string(), "good".to_string()];
    let anomalies = vec![anomaly(Severity::High, "bad")];

    system.apply_round_outcome(&participants, &anomalies, 0);

    let later = 2 * DAY_MS;
    assert!(system.get_score("bad", later) < system.get_score("good", later));
}

#[test]
fn test_round_outcome_penalizes_once_per_anomaly() {
    let mut system = ReputationSystem::default();
    let participants = vec!["n1".to_string()];
    let anomalies = vec![anomaly(Severity::Low, "n1"), anomaly(Severity::Low, "n1")];
    system.apply_round_outcome(&participants, &anomalies, 0);
    assert!((system.get_score("n1", 0) - 0.4).abs() < 1e-9);
}

// =============================================================================
// TEST GROUP 3: Blacklisting and history
// =============================================================================

#[test]
fn test_blacklist_eligibility() {
    let mut system = ReputationSystem::default();
    system.penalize("n1", Severity::High, 0);
    assert!(!system.is_blacklist_eligible("n1", 0));
    system.penalize("n1", Severity::High, 0);
    system.penalize("n1", Severity::High, 0);
    assert!(system.is_blacklist_eligible("n1", 0));
    assert_eq!(system.blacklist_candidates(0), vec!["n1".to_string()]);
    assert!(!system.is_blacklist_eligible("unknown", 0));
}

#[test]
fn test_history_is_capped() {
    let mut system = ReputationSystem::new(ReputationConfig::for_testing());
    for i in 0..25 {
        system.reward("n1", i);
    }
    let record = system.record("n1").unwrap();
    assert_eq!(record.history().count(), 10);
    assert_eq!(record.history().next().unwrap().timestamp, 15);
}

#[test]
fn test_decay_recorded_in_history() {
    let mut system = ReputationSystem::new(ReputationConfig::for_testing());
    system.get_score("n1", 0);
    system.get_score("n1", 120_000);
    let kinds: Vec<_> = system.record("n1").unwrap().history().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![ReputationEventKind::Decay]);
}

proptest! {
    #[test]
    fn prop_score_stays_in_unit_interval(ops in prop::collection::vec((0u8..4, 0u64..3 * DAY_MS), 1..60)) {
        let mut system = ReputationSystem::default();
        let mut now = 0;
        for (op, step) in ops {
            now += step;
            let score = match op {
                0 => system.reward("n1", now),
                1 => system.penalize("n1", Severity::Low, now),
                2 => system.penalize("n1", Severity::Medium, now),
                _ => system.penalize("n1", Severity::High, now),
            };
            prop_assert!((0.0..=1.0).contains(&score));
        }
    }
}
