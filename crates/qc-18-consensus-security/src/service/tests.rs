//! Tests for the consensus security manager

use super::*;
use crate::adapters::{InMemoryTtlCache, ManualTimeSource};
use crate::detection::DosAction;
use crate::domain::{ProofOfWork, RoundMessage};
use crate::ports::BlacklistCache;
use qc_zkp::ZkpError;
use std::sync::atomic::AtomicUsize;

const NOW: u64 = 1_700_000_000_000;

// =============================================================================
// TEST HELPERS
// =============================================================================

struct RecordingAuditSink {
    events: Mutex<Vec<String>>,
}

impl AuditSink for RecordingAuditSink {
    fn record(
        &self,
        event_type: &str,
        _context: &serde_json::Value,
    ) -> Result<(), crate::domain::InfraError> {
        self.events.lock().push(event_type.to_string());
        Ok(())
    }
}

fn create_manager() -> (ConsensusSecurityManager, Arc<ManualTimeSource>) {
    create_manager_with(SecurityConfig::for_testing())
}

fn create_manager_with(config: SecurityConfig) -> (ConsensusSecurityManager, Arc<ManualTimeSource>) {
    let clock = Arc::new(ManualTimeSource::new(NOW));
    let manager = ConsensusSecurityManager::new(config)
        .unwrap()
        .with_time_source(clock.clone());
    (manager, clock)
}

fn ready_manager() -> (ConsensusSecurityManager, Arc<ManualTimeSource>) {
    let (manager, clock) = create_manager();
    manager.initialize().unwrap();
    (manager, clock)
}

fn all_nodes() -> Vec<NodeId> {
    vec!["node-1".into(), "node-2".into(), "node-3".into()]
}

fn msg(node: &str, proposal: &str, timestamp: u64, signature: &str) -> RoundMessage {
    RoundMessage {
        node_id: node.to_string(),
        message_type: "vote".to_string(),
        proposal: proposal.to_string(),
        timestamp,
        signature: signature.to_string(),
    }
}

fn honest_round() -> ConsensusRound {
    ConsensusRound {
        id: "round-1".to_string(),
        participants: all_nodes(),
        messages: vec![
            msg("node-1", "block-1", NOW, "3f9a1c0b7e"),
            msg("node-2", "block-1", NOW + 400, "a81d44e902"),
            msg("node-3", "block-1", NOW + 800, "5c2bd7f613"),
        ],
        proposal: "block-1".to_string(),
    }
}

/// node-3 votes for two different blocks 300 ms apart.
fn equivocating_round() -> ConsensusRound {
    let mut round = honest_round();
    round.id = "round-2".to_string();
    round
        .messages
        .push(msg("node-3", "block-X", NOW + 1_100, "e07b2a99c4"));
    round
}

fn solved_pow(node: &str) -> ProofOfWork {
    ProofOfWork::solve(node, 8, 1 << 20).unwrap()
}

fn credential_for(node: &str, timestamp: u64) -> IdentityCredential {
    IdentityCredential::for_node(&Scalar::random(), node, timestamp).unwrap()
}

// =============================================================================
// TEST GROUP 1: Lifecycle
// =============================================================================

#[test]
fn test_operations_require_initialization() {
    let (manager, _) = create_manager();
    assert_eq!(manager.state(), SecurityState::Uninitialized);

    let proposal = Proposal::new("block-1");
    assert_eq!(
        manager
            .execute_secure_consensus(&proposal, &all_nodes(), None)
            .unwrap_err(),
        SecurityError::NotInitialized
    );
    assert_eq!(
        manager.generate_auth_proof(&Scalar::random()).unwrap_err(),
        SecurityError::NotInitialized
    );
    assert_eq!(
        manager.group_public_key().unwrap_err(),
        SecurityError::NotInitialized
    );
    assert!(manager.generate_range_proof(5, 0, 10).is_err());
}

#[test]
fn test_initialize_is_idempotent() {
    let (manager, _) = create_manager();
    let first = manager.initialize().unwrap();
    let second = manager.initialize().unwrap();

    assert_eq!(first, second);
    assert_eq!(manager.state(), SecurityState::Ready);
    assert_eq!(manager.group_public_key().unwrap(), first);
    assert_eq!(
        manager
            .query_forensics(&ForensicQuery::of_type("initialization"))
            .len(),
        1
    );
}

#[test]
fn test_initialize_tolerates_faulty_dealer() {
    let (manager, _) = create_manager();
    let manager = manager.with_faulty_dealers([2]);
    assert!(manager.initialize().is_ok());
    assert!(manager.is_initialized());
}

#[test]
fn test_invalid_config_rejected() {
    let mut config = SecurityConfig::for_testing();
    config.threshold.threshold = 4;
    assert!(matches!(
        ConsensusSecurityManager::new(config),
        Err(SecurityError::Config(_))
    ));
}

// =============================================================================
// TEST GROUP 2: Secure consensus
// =============================================================================

#[test]
fn test_honest_round_signed_and_rewarded() {
    let (manager, _) = ready_manager();
    let proposal = Proposal::with_hash("block-1");
    let round = honest_round();

    let result = manager
        .execute_secure_consensus(&proposal, &all_nodes(), Some(&round))
        .unwrap();

    assert!(result.security_analysis.anomalies.is_empty());
    assert_eq!(result.security_analysis.signatories, vec![1, 2, 3]);
    assert!(manager
        .verify_threshold_signature(b"block-1", &result.signature)
        .unwrap());
    assert!(!manager
        .verify_threshold_signature(b"block-2", &result.signature)
        .unwrap());
    assert!(manager.reputation_score("node-1").unwrap() > 0.5);

    let metrics = manager.export_security_metrics();
    assert_eq!(metrics.rounds_completed, 1);
    assert_eq!(metrics.alerts_raised, 0);
    assert_eq!(manager.state(), SecurityState::Ready);
}

#[test]
fn test_hash_mismatch_aborts_round() {
    let (manager, _) = ready_manager();
    let proposal = Proposal {
        content: "block-1".to_string(),
        hash: Some("deadbeef".to_string()),
    };

    let err = manager
        .execute_secure_consensus(&proposal, &all_nodes(), None)
        .unwrap_err();
    assert!(matches!(err, SecurityError::IntegrityHashMismatch { .. }));
    assert!(err.is_integrity());

    let alerts = manager.alerts().history();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].alert_type, AlertType::Integrity);
    assert_eq!(manager.export_security_metrics().rounds_failed, 1);
}

#[test]
fn test_too_few_participants_fails() {
    let (manager, _) = ready_manager();
    let err = manager
        .execute_secure_consensus(&Proposal::new("block-1"), &["node-1".to_string()], None)
        .unwrap_err();
    assert_eq!(
        err,
        SecurityError::InsufficientSignatories {
            available: 1,
            required: 2
        }
    );
    assert_eq!(
        manager
            .query_forensics(&ForensicQuery::of_type("consensus_failed"))
            .len(),
        1
    );
}

#[test]
fn test_unknown_participants_reported() {
    let (manager, _) = ready_manager();
    let participants = vec![
        "node-1".to_string(),
        "mallory".to_string(),
        "node-2".to_string(),
    ];
    let result = manager
        .execute_secure_consensus(&Proposal::new("block-1"), &participants, None)
        .unwrap();
    assert_eq!(result.security_analysis.unknown_participants, vec!["mallory"]);
    assert_eq!(result.security_analysis.signatories, vec![1, 2]);
}

#[test]
fn test_faulty_signer_dropped_during_signing() {
    let (manager, _) = create_manager();
    let manager = manager.with_faulty_signers([1]);
    manager.initialize().unwrap();

    let result = manager
        .execute_secure_consensus(&Proposal::new("block-1"), &all_nodes(), None)
        .unwrap();
    assert!(result
        .signature
        .verify(b"block-1", &manager.group_public_key().unwrap()));

    let two = vec!["node-1".to_string(), "node-2".to_string()];
    assert!(matches!(
        manager.execute_secure_consensus(&Proposal::new("block-2"), &two, None),
        Err(SecurityError::InsufficientSignatories { .. })
    ));
}

// =============================================================================
// TEST GROUP 3: Byzantine handling
// =============================================================================

#[test]
fn test_equivocation_alerts_and_penalizes() {
    let (manager, _) = ready_manager();
    let round = equivocating_round();

    let result = manager
        .execute_secure_consensus(&Proposal::new("block-1"), &all_nodes(), Some(&round))
        .unwrap();

    let analysis = &result.security_analysis;
    assert_eq!(analysis.high_severity_count, 1);
    assert!(analysis.anomalies[0].involves("node-3"));
    assert!(manager.reputation_score("node-3").unwrap() < 0.5);
    assert!(manager.reputation_score("node-1").unwrap() > 0.5);

    let alerts = manager.alerts().history();
    assert!(alerts
        .iter()
        .any(|a| a.alert_type == AlertType::Byzantine && a.severity == Severity::High));
    assert!(
        manager
            .query_forensics(&ForensicQuery::of_type("security_alert"))
            .len()
            >= 1
    );
}

#[test]
fn test_repeat_offender_excluded_from_signing() {
    let (manager, _) = ready_manager();
    for _ in 0..3 {
        manager
            .execute_secure_consensus(
                &Proposal::new("block-1"),
                &all_nodes(),
                Some(&equivocating_round()),
            )
            .unwrap();
    }

    let result = manager
        .execute_secure_consensus(&Proposal::new("block-2"), &all_nodes(), None)
        .unwrap();
    assert_eq!(result.security_analysis.excluded_participants, vec!["node-3"]);
    assert_eq!(result.security_analysis.signatories, vec![1, 2]);
    assert_eq!(manager.security_status().blacklisted_nodes, vec!["node-3"]);
}

// =============================================================================
// TEST GROUP 4: Admission control
// =============================================================================

#[test]
fn test_join_with_two_factors_accepted() {
    let (manager, _) = create_manager();
    let request = NodeJoinRequest::new("node-9", "192.0.2.10", NOW)
        .with_proof_of_work(solved_pow("node-9"))
        .with_credentials(credential_for("node-9", NOW));

    let assessment = manager.validate_node_join(&request).unwrap();
    assert!(assessment.accepted);
    assert_eq!(assessment.factors.count(), 2);
    assert!(manager.reputation_score("node-9").is_some());
}

#[test]
fn test_join_with_one_factor_rejected() {
    let (manager, _) = create_manager();
    let request = NodeJoinRequest::new("node-9", "192.0.2.10", NOW)
        .with_proof_of_work(solved_pow("node-9"));

    let err = manager.validate_node_join(&request).unwrap_err();
    assert!(matches!(err, SecurityError::JoinRejected { ref node_id, .. } if node_id == "node-9"));

    let alerts = manager.alerts().history();
    assert_eq!(alerts[0].alert_type, AlertType::Sybil);
    assert_eq!(alerts[0].severity, Severity::Medium);
    assert_eq!(manager.export_security_metrics().joins_rejected, 1);
}

#[test]
fn test_consumed_auth_proof_not_accepted_as_join_credential() {
    let (manager, _) = ready_manager();
    let credential = manager.generate_auth_proof(&Scalar::random()).unwrap();
    assert!(manager.verify_auth_proof(&credential).unwrap());
    assert!(!manager.verify_auth_proof(&credential).unwrap());

    let request = NodeJoinRequest::new("node-9", "192.0.2.10", NOW)
        .with_proof_of_work(solved_pow("node-9"))
        .with_credentials(credential);
    let err = manager.validate_node_join(&request).unwrap_err();
    assert!(matches!(err, SecurityError::JoinRejected { .. }));

    let entries = manager.query_forensics(&ForensicQuery::of_type("join_attempt"));
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].details["factors"]["credentials"], false);
    assert_eq!(entries[0].details["factors"]["proof_of_work"], true);
}

#[test]
fn test_join_credential_consumed_once_across_paths() {
    let (manager, _) = ready_manager();
    let credential = credential_for("node-9", NOW);
    let request = NodeJoinRequest::new("node-9", "192.0.2.10", NOW)
        .with_proof_of_work(solved_pow("node-9"))
        .with_credentials(credential.clone());
    assert!(manager.validate_node_join(&request).is_ok());

    let replay = NodeJoinRequest::new("node-9", "192.0.2.11", NOW)
        .with_proof_of_work(solved_pow("node-9"))
        .with_credentials(credential.clone());
    assert!(manager.validate_node_join(&replay).is_err());
    assert!(!manager.verify_auth_proof(&credential).unwrap());
}

#[test]
fn test_join_credential_bound_to_other_node_rejected() {
    let (manager, _) = create_manager();
    let request = NodeJoinRequest::new("node-9", "192.0.2.10", NOW)
        .with_proof_of_work(solved_pow("node-9"))
        .with_credentials(credential_for("node-8", NOW));
    assert!(manager.validate_node_join(&request).is_err());
}

#[test]
fn test_ip_burst_rejected_as_high_severity() {
    let (manager, _) = create_manager();
    for i in 0..4 {
        let node = format!("sybil-{}", i);
        let request = NodeJoinRequest::new(node.clone(), "192.0.2.66", NOW)
            .with_proof_of_work(solved_pow(&node))
            .with_credentials(credential_for(&node, NOW));
        let outcome = manager.validate_node_join(&request);
        if i < 3 {
            assert!(outcome.is_ok());
        } else {
            assert!(outcome.is_err());
        }
    }
    assert_eq!(manager.alerts().recent(1)[0].severity, Severity::High);
}

#[test]
fn test_connection_cap_raises_eclipse_alert() {
    let (manager, _) = create_manager();
    let connections: Vec<_> = (0..5)
        .map(|i| ConnectionRecord::new("203.0.113.7", "US", "AS64500", format!("peer-{}", i)))
        .collect();

    let report = manager.validate_connections("node-1", &connections);
    assert_eq!(report.accepted.len(), 3);
    assert_eq!(report.blocked.len(), 2);

    let alert = &manager.alerts().history()[0];
    assert_eq!(alert.alert_type, AlertType::Eclipse);
    assert_eq!(alert.details["node"], "node-1");

    let checks = manager.query_forensics(&ForensicQuery::of_type("connection_check"));
    assert_eq!(checks.len(), 1);
    assert_eq!(checks[0].details["node"], "node-1");
    assert_eq!(checks[0].details["blocked"], 2);
    assert_eq!(manager.export_security_metrics().connections_blocked, 2);
}

#[test]
fn test_diverse_connections_pass_silently() {
    let (manager, _) = create_manager();
    let connections: Vec<_> = ["US", "DE", "JP", "BR", "IN"]
        .iter()
        .enumerate()
        .map(|(i, cc)| {
            ConnectionRecord::new(
                format!("198.51.100.{}", i),
                *cc,
                format!("AS{}", 64500 + i),
                format!("peer-{}", i),
            )
        })
        .collect();

    let report = manager.validate_connections("node-2", &connections);
    assert!(!report.has_blocked());
    assert!(manager.alerts().is_empty());
    assert_eq!(
        manager
            .query_forensics(&ForensicQuery::of_type("connection_check"))
            .len(),
        1
    );
}

// =============================================================================
// TEST GROUP 5: DoS filtering
// =============================================================================

fn bot(source: &str, count: u64) -> Vec<InboundRequest> {
    (0..count)
        .map(|i| {
            let request = InboundRequest::new(source, 10_000, NOW + i * 500);
            if i % 5 == 0 {
                request.failed()
            } else {
                request
            }
        })
        .collect()
}

#[test]
fn test_flood_filtered_with_alert() {
    let (manager, clock) = create_manager();
    clock.set(NOW + 60_000);
    let mut batch = bot("203.0.113.1", 120);
    batch.push(InboundRequest::new("198.51.100.1", 512, NOW + 30_000).authenticated());

    let report = manager.filter_requests(batch);
    assert_eq!(report.allowed.len(), 1);
    assert!(report.allowed[0].authenticated);
    assert_eq!(manager.alerts().history()[0].alert_type, AlertType::Dos);
    assert_eq!(manager.export_security_metrics().requests_blocked, 120);
}

#[test]
fn test_blacklist_shared_through_cache() {
    let mut config = SecurityConfig::for_testing();
    config.dos.blacklist_threshold = 0.6;
    let cache: Arc<dyn BlacklistCache> = Arc::new(InMemoryTtlCache::new());

    let (first, clock) = create_manager_with(config.clone());
    let first = first.with_blacklist_cache(cache.clone());
    clock.set(NOW + 60_000);
    let report = first.filter_requests(bot("203.0.113.9", 120));
    assert_eq!(report.newly_blacklisted.len(), 1);
    assert!(cache.get(&blacklist_key("203.0.113.9")).unwrap().is_some());

    let (second, clock) = create_manager_with(config);
    let second = second.with_blacklist_cache(cache);
    clock.set(NOW + 61_000);
    let report = second.filter_requests(vec![InboundRequest::new("203.0.113.9", 64, NOW + 61_000)]);
    assert!(report.allowed.is_empty());
    assert_eq!(report.verdicts[0].action, DosAction::Blacklisted);
}

// =============================================================================
// TEST GROUP 6: Authentication and range proofs
// =============================================================================

#[test]
fn test_auth_proof_accepted_once() {
    let (manager, _) = ready_manager();
    let credential = manager.generate_auth_proof(&Scalar::random()).unwrap();

    assert!(manager.verify_auth_proof(&credential).unwrap());
    assert!(!manager.verify_auth_proof(&credential).unwrap());

    let metrics = manager.export_security_metrics();
    assert_eq!(metrics.proofs_issued, 1);
    assert_eq!(metrics.proofs_verified, 1);
    assert_eq!(metrics.proofs_rejected, 1);
}

#[test]
fn test_stale_auth_proof_rejected() {
    let (manager, clock) = ready_manager();
    let credential = manager.generate_auth_proof(&Scalar::random()).unwrap();
    clock.advance(300_001);
    assert!(!manager.verify_auth_proof(&credential).unwrap());
}

#[test]
fn test_range_proof_round() {
    let (manager, _) = ready_manager();
    let (commitment, proof) = manager.generate_range_proof(42, 18, 120).unwrap();
    assert!(manager.verify_range_proof(&commitment, &proof).unwrap());

    let (other, _) = manager.generate_range_proof(50, 18, 120).unwrap();
    assert!(!manager.verify_range_proof(&other, &proof).unwrap());

    assert!(matches!(
        manager.generate_range_proof(7, 18, 120),
        Err(SecurityError::ProofRejected(ZkpError::ValueOutOfRange { .. }))
    ));
}

// =============================================================================
// TEST GROUP 7: Alerts, forensics, status
// =============================================================================

#[test]
fn test_registered_handler_receives_alerts() {
    let (manager, clock) = create_manager();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    manager.register_alert_handler(
        AlertType::Dos,
        Arc::new(move |_: &SecurityAlert| {
            counter.fetch_add(1, Ordering::SeqCst);
        }),
    );

    clock.set(NOW + 60_000);
    manager.filter_requests(bot("203.0.113.1", 120));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(manager.alert_statistics(60_000).by_type[&AlertType::Dos], 1);
}

#[test]
fn test_forensic_log_intact_and_exportable() {
    let (manager, _) = ready_manager();
    manager
        .execute_secure_consensus(&Proposal::new("block-1"), &all_nodes(), Some(&equivocating_round()))
        .unwrap();

    let entries = manager.verify_forensic_integrity().unwrap();
    assert!(entries >= 3);

    let csv = manager.export_forensics(ExportFormat::Csv).unwrap();
    assert_eq!(csv.lines().count(), entries + 1);
    let json = manager.export_forensics(ExportFormat::Json).unwrap();
    let parsed: Vec<ForensicLogEntry> = serde_json::from_str(&json).unwrap();
    assert!(parsed.iter().all(ForensicLogEntry::verify));
}

#[test]
fn test_audit_sink_receives_events() {
    let sink = Arc::new(RecordingAuditSink {
        events: Mutex::new(Vec::new()),
    });
    let (manager, _) = create_manager();
    let manager = manager.with_audit_sink(sink.clone());
    manager.initialize().unwrap();
    manager
        .execute_secure_consensus(&Proposal::new("block-1"), &all_nodes(), None)
        .unwrap();

    assert_eq!(
        *sink.events.lock(),
        vec!["initialized".to_string(), "consensus_round".to_string()]
    );
}

#[test]
fn test_security_status_snapshot() {
    let (manager, _) = create_manager();
    let status = manager.security_status();
    assert_eq!(status.state, SecurityState::Uninitialized);
    assert!(status.group_public_key.is_none());

    manager.initialize().unwrap();
    let status = manager.security_status();
    assert_eq!(status.state, SecurityState::Ready);
    assert_eq!(status.parties, 3);
    assert_eq!(status.threshold, 2);
    assert_eq!(status.roster, all_nodes());
    assert!(status.forensic_integrity_ok);

    let json = serde_json::to_value(&status).unwrap();
    assert_eq!(json["state"], "ready");
    assert_eq!(
        json["group_public_key"].as_str().unwrap().len(),
        66
    );
}
