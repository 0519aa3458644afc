//! # Security Manager Flow
//!
//! Lifecycle, signed rounds, forensic hashing and reputation through the
//! `ConsensusSecurityManager` facade.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use qc_18_consensus_security::adapters::ManualTimeSource;
    use qc_18_consensus_security::{
        Anomaly, AnomalyKind, ConsensusRound, ConsensusSecurityManager, ForensicLogEntry,
        ForensicQuery, NodeId, Proposal, ReputationConfig, ReputationSystem, RoundMessage,
        SecurityConfig, SecurityState, Severity,
    };

    const NOW: u64 = 1_700_000_000_000;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn ready_manager() -> (ConsensusSecurityManager, Arc<ManualTimeSource>) {
        let clock = Arc::new(ManualTimeSource::new(NOW));
        let manager = ConsensusSecurityManager::new(SecurityConfig::for_testing())
            .unwrap()
            .with_time_source(clock.clone());
        manager.initialize().unwrap();
        (manager, clock)
    }

    fn vote(node: &str, proposal: &str, timestamp: u64, signature: &str) -> RoundMessage {
        RoundMessage {
            node_id: node.to_string(),
            message_type: "vote".to_string(),
            proposal: proposal.to_string(),
            timestamp,
            signature: signature.to_string(),
        }
    }

    // =============================================================================
    // LIFECYCLE
    // =============================================================================

    #[test]
    fn test_double_initialize_keeps_group_key() {
        let (manager, _) = ready_manager();
        let key = manager.group_public_key().unwrap();

        assert_eq!(manager.initialize().unwrap(), key);
        assert_eq!(manager.group_public_key().unwrap(), key);
        assert_eq!(manager.state(), SecurityState::Ready);
    }

    #[test]
    fn test_signed_round_verifies_against_group_key() {
        let (manager, _) = ready_manager();
        let roster: Vec<NodeId> = manager.roster().to_vec();
        let proposal = Proposal::with_hash("block-42");

        let result = manager
            .execute_secure_consensus(&proposal, &roster, None)
            .unwrap();

        assert!(manager
            .verify_threshold_signature(b"block-42", &result.signature)
            .unwrap());
        assert!(result
            .signature
            .verify(b"block-42", &manager.group_public_key().unwrap()));
        assert!(!manager
            .verify_threshold_signature(b"block-43", &result.signature)
            .unwrap());
    }

    // =============================================================================
    // FORENSICS
    // =============================================================================

    #[test]
    fn test_forensic_rehash_matches_and_detects_edits() {
        let (manager, _) = ready_manager();
        let roster: Vec<NodeId> = manager.roster().to_vec();
        manager
            .execute_secure_consensus(&Proposal::new("block-7"), &roster, None)
            .unwrap();

        let entries = manager.query_forensics(&ForensicQuery::of_type("consensus_round"));
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(
            ForensicLogEntry::compute_hash(&entry.entry_type, &entry.details),
            entry.hash
        );

        let mut edited = entry.clone();
        edited.details["proposal_hash"] = serde_json::json!("0000");
        assert_ne!(
            ForensicLogEntry::compute_hash(&edited.entry_type, &edited.details),
            entry.hash
        );
        assert!(!edited.verify());
        assert!(manager.verify_forensic_integrity().is_ok());
    }

    // =============================================================================
    // REPUTATION
    // =============================================================================

    #[test]
    fn test_high_anomaly_scores_below_clean_round() {
        let mut reputation = ReputationSystem::new(ReputationConfig::default());
        let clean: Vec<NodeId> = vec!["clean".into()];
        let flagged: Vec<NodeId> = vec!["flagged".into()];
        let anomaly = Anomaly::new(
            AnomalyKind::ContradictoryMessages,
            Severity::High,
            flagged.clone(),
            "conflicting votes",
        );

        reputation.apply_round_outcome(&clean, &[], NOW);
        reputation.apply_round_outcome(&flagged, &[anomaly], NOW);

        let later = NOW + 3 * 86_400_000;
        assert!(reputation.get_score("flagged", later) < reputation.get_score("clean", later));
    }

    #[test]
    fn test_equivocating_participant_loses_reputation() {
        let (manager, _) = ready_manager();
        let roster: Vec<NodeId> = manager.roster().to_vec();
        let round = ConsensusRound {
            id: "round-9".to_string(),
            participants: roster.clone(),
            messages: vec![
                vote(&roster[0], "block-9", NOW, "17c0ffee"),
                vote(&roster[1], "block-9", NOW + 450, "9ab4d2e1"),
                vote(&roster[2], "block-9", NOW + 900, "40f3a7c8"),
                vote(&roster[2], "block-fork", NOW + 1_150, "d65e0b13"),
            ],
            proposal: "block-9".to_string(),
        };

        let result = manager
            .execute_secure_consensus(&Proposal::new("block-9"), &roster, Some(&round))
            .unwrap();

        assert!(result.security_analysis.high_severity_count >= 1);
        let honest = manager.reputation_score(&roster[0]).unwrap();
        let equivocator = manager.reputation_score(&roster[2]).unwrap();
        assert!(equivocator < honest);
    }
}
