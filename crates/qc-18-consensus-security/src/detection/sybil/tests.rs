//! Tests for the Sybil guard

use super::*;
use crate::domain::{IdentityCredential, ProofOfWork, StakeProof};
use qc_zkp::FreshnessConfig;
use shared_crypto::{EcdsaKeyPair, Scalar};

const NOW: u64 = 1_700_000_000_000;

// =============================================================================
// TEST HELPERS
// =============================================================================

fn guard() -> SybilGuard {
    guard_sharing(Arc::new(ProofGuard::new(FreshnessConfig::default())))
}

fn guard_sharing(proof_guard: Arc<ProofGuard>) -> SybilGuard {
    let config = SybilConfig {
        pow_difficulty: 8,
        ..SybilConfig::default()
    };
    SybilGuard::new(config, proof_guard)
}

fn credential(node: &str, now: u64) -> IdentityCredential {
    IdentityCredential::for_node(&Scalar::random(), node, now).unwrap()
}

fn pow(node: &str) -> ProofOfWork {
    ProofOfWork::solve(node, 8, 1_000_000).unwrap()
}

fn stake(node: &str, amount: u64) -> StakeProof {
    StakeProof::create(node, amount, &EcdsaKeyPair::generate()).unwrap()
}

// =============================================================================
// TEST GROUP 1: Factor scoring
// =============================================================================

#[test]
fn test_two_factors_accepted() {
    let mut guard = guard();
    let request = NodeJoinRequest::new("n1", "10.0.0.1", NOW)
        .with_proof_of_work(pow("n1"))
        .with_stake(stake("n1", 5_000));
    let assessment = guard.evaluate(&request, None, NOW);
    assert!(assessment.accepted);
    assert_eq!(assessment.factors.count(), 2);
}

#[test]
fn test_single_factor_rejected() {
    let mut guard = guard();
    let request =
        NodeJoinRequest::new("n1", "10.0.0.1", NOW).with_credentials(credential("n1", NOW));
    let assessment = guard.evaluate(&request, None, NOW);
    assert!(!assessment.accepted);
    assert!(assessment.factors.credentials);
    assert!(assessment.reason(2).contains("1 of 2"));
}

#[test]
fn test_pow_for_other_node_does_not_count() {
    let mut guard = guard();
    let borrowed = pow("other-node");
    let request = NodeJoinRequest::new("n1", "10.0.0.1", NOW)
        .with_proof_of_work(borrowed)
        .with_stake(stake("n1", 5_000));
    let assessment = guard.evaluate(&request, None, NOW);
    assert_eq!(assessment.factors.proof_of_work, borrowed.is_valid("n1", 8));
    assert_eq!(assessment.accepted, borrowed.is_valid("n1", 8));
}

#[test]
fn test_low_stake_rejected_as_factor() {
    let mut guard = guard();
    let request = NodeJoinRequest::new("n1", "10.0.0.1", NOW)
        .with_proof_of_work(pow("n1"))
        .with_stake(stake("n1", 10));
    let assessment = guard.evaluate(&request, None, NOW);
    assert!(!assessment.factors.stake);
    assert!(!assessment.accepted);
}

#[test]
fn test_reputation_factor_needs_existing_record() {
    let mut guard = guard();
    let request = NodeJoinRequest::new("n1", "10.0.0.1", NOW).with_proof_of_work(pow("n1"));
    assert!(!guard.evaluate(&request, None, NOW).accepted);
    assert!(!guard.evaluate(&request, Some(0.2), NOW).accepted);
    assert!(guard.evaluate(&request, Some(0.5), NOW).accepted);
}

#[test]
fn test_stale_credential_does_not_count() {
    let mut guard = guard();
    let request = NodeJoinRequest::new("n1", "10.0.0.1", NOW)
        .with_proof_of_work(pow("n1"))
        .with_credentials(credential("n1", NOW - 600_000));
    let assessment = guard.evaluate(&request, None, NOW);
    assert!(!assessment.factors.credentials);
    assert!(!assessment.accepted);
}

#[test]
fn test_replayed_credential_does_not_count() {
    let mut guard = guard();
    let cred = credential("n1", NOW);
    let first = NodeJoinRequest::new("n1", "10.0.0.1", NOW)
        .with_proof_of_work(pow("n1"))
        .with_credentials(cred.clone());
    assert!(guard.evaluate(&first, None, NOW).factors.credentials);

    let second = NodeJoinRequest::new("n1", "10.0.0.2", NOW).with_credentials(cred);
    assert!(!guard.evaluate(&second, None, NOW).factors.credentials);
}

#[test]
fn test_credential_for_other_node_does_not_count() {
    let mut guard = guard();
    let request = NodeJoinRequest::new("n1", "10.0.0.1", NOW)
        .with_proof_of_work(pow("n1"))
        .with_credentials(credential("n2", NOW));
    let assessment = guard.evaluate(&request, None, NOW);
    assert!(!assessment.factors.credentials);
    assert!(!assessment.accepted);
}

#[test]
fn test_credential_consumed_elsewhere_does_not_count() {
    let proof_guard = Arc::new(ProofGuard::new(FreshnessConfig::default()));
    let mut guard = guard_sharing(Arc::clone(&proof_guard));
    let cred = credential("n1", NOW);
    proof_guard
        .verify_with_context(&cred.proof, &cred.public_key, b"n1", NOW)
        .unwrap();

    let request = NodeJoinRequest::new("n1", "10.0.0.1", NOW)
        .with_proof_of_work(pow("n1"))
        .with_credentials(cred);
    let assessment = guard.evaluate(&request, None, NOW);
    assert!(!assessment.factors.credentials);
    assert!(!assessment.accepted);
}

// =============================================================================
// TEST GROUP 2: Suspicious patterns
// =============================================================================

#[test]
fn test_fourth_join_from_same_ip_is_suspicious() {
    let mut guard = guard();
    for i in 0..3 {
        let node = format!("n{}", i);
        let request = NodeJoinRequest::new(&node, "10.0.0.1", NOW)
            .with_proof_of_work(pow(&node))
            .with_stake(stake(&node, 5_000));
        assert!(guard.evaluate(&request, None, NOW + i).accepted);
    }
    let request = NodeJoinRequest::new("n3", "10.0.0.1", NOW)
        .with_proof_of_work(pow("n3"))
        .with_stake(stake("n3", 5_000));
    let assessment = guard.evaluate(&request, None, NOW + 10);
    assert!(!assessment.accepted);
    assert_eq!(assessment.patterns.len(), 1);
}

#[test]
fn test_ip_window_expires() {
    let mut guard = guard();
    for i in 0..4 {
        let request = NodeJoinRequest::new(format!("n{}", i), "10.0.0.1", NOW);
        guard.evaluate(&request, None, NOW);
    }
    let later = NOW + 3_600_001;
    let request = NodeJoinRequest::new("n9", "10.0.0.1", later)
        .with_proof_of_work(pow("n9"))
        .with_stake(stake("n9", 5_000));
    assert!(guard.evaluate(&request, None, later).accepted);
    assert_eq!(guard.tracked_attempts(), 1);
}

#[test]
fn test_global_join_burst_is_suspicious() {
    let mut guard = guard();
    for i in 0..10 {
        let request = NodeJoinRequest::new(format!("n{}", i), format!("10.0.1.{}", i), NOW);
        guard.evaluate(&request, None, NOW);
    }
    let request = NodeJoinRequest::new("late", "10.0.2.1", NOW)
        .with_proof_of_work(pow("late"))
        .with_stake(stake("late", 5_000));
    let assessment = guard.evaluate(&request, None, NOW + 1_000);
    assert!(!assessment.accepted);
    assert!(assessment.patterns[0].contains("network-wide"));
}

#[test]
fn test_rejected_attempts_are_recorded() {
    let mut guard = guard();
    let request = NodeJoinRequest::new("n1", "10.0.0.1", NOW);
    guard.evaluate(&request, None, NOW);
    guard.evaluate(&request, None, NOW);
    assert_eq!(guard.tracked_attempts(), 2);
}
