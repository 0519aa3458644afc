//! # Attack Scenarios
//!
//! Sybil join batches, request floods and a full penetration run against a
//! live manager.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use qc_18_consensus_security::adapters::ManualTimeSource;
    use qc_18_consensus_security::{
        ConsensusSecurityManager, ExportFormat, IdentityCredential, NodeJoinRequest, ProofOfWork, SecurityConfig, SecurityError, StakeProof,
    };
    use qc_pentest::simulators::{simulate_dos, simulate_eclipse, simulate_sybil};
    use qc_pentest::{PenetrationTester, RiskLevel, ScenarioConfig, SimulationContext};
    use shared_crypto::{EcdsaKeyPair, Scalar};

    const NOW: u64 = 1_700_000_000_000;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn manager_on(clock: &Arc<ManualTimeSource>) -> ConsensusSecurityManager {
        let manager = ConsensusSecurityManager::new(SecurityConfig::for_testing())
            .unwrap()
            .with_time_source(clock.clone());
        manager.initialize().unwrap();
        manager
    }

    fn credential(node: &str) -> IdentityCredential {
        IdentityCredential::for_node(&Scalar::random(), node, NOW).unwrap()
    }

    fn pow(node: &str) -> ProofOfWork {
        ProofOfWork::solve(node, 8, 1 << 20).unwrap()
    }

    fn weak_pow(node: &str) -> ProofOfWork {
        (0u64..1 << 16)
            .map(|nonce| ProofOfWork { nonce })
            .find(|p| !p.is_valid(node, 8))
            .unwrap()
    }

    // =============================================================================
    // SYBIL
    // =============================================================================

    #[test]
    fn test_sybil_batch_with_missing_factors_rejected() {
        let clock = Arc::new(ManualTimeSource::new(NOW));
        let manager = manager_on(&clock);
        let staker = EcdsaKeyPair::generate();

        // Each request carries at most one valid factor.
        let batch = vec![
            NodeJoinRequest::new("sybil-a", "10.1.0.1", NOW),
            NodeJoinRequest::new("sybil-b", "10.1.0.2", NOW).with_proof_of_work(pow("sybil-b")),
            NodeJoinRequest::new("sybil-c", "10.1.0.3", NOW)
                .with_credentials(credential("sybil-c")),
            NodeJoinRequest::new("sybil-d", "10.1.0.4", NOW)
                .with_stake(StakeProof::create("sybil-d", 10, &staker).unwrap()),
            NodeJoinRequest::new("sybil-e", "10.1.0.5", NOW)
                .with_proof_of_work(weak_pow("sybil-e"))
                .with_stake(StakeProof::create("sybil-e", 5_000, &staker).unwrap()),
        ];

        let rejected = batch
            .iter()
            .filter(|request| {
                matches!(
                    manager.validate_node_join(request),
                    Err(SecurityError::JoinRejected { .. })
                )
            })
            .count();

        assert!(rejected as f64 / batch.len() as f64 >= 0.8);
        assert_eq!(manager.export_security_metrics().joins_rejected, rejected as u64);
    }

    #[test]
    fn test_well_provisioned_node_still_admitted() {
        let clock = Arc::new(ManualTimeSource::new(NOW));
        let manager = manager_on(&clock);
        let request = NodeJoinRequest::new("validator-7", "192.0.2.77", NOW)
            .with_proof_of_work(pow("validator-7"))
            .with_stake(StakeProof::create("validator-7", 1_000, &EcdsaKeyPair::generate()).unwrap())
            .with_credentials(credential("validator-7"));

        let assessment = manager.validate_node_join(&request).unwrap();
        assert!(assessment.factors.count() >= 3);
    }

    #[test]
    fn test_sybil_simulator_meets_block_rate() {
        let clock = Arc::new(ManualTimeSource::new(NOW));
        let manager = manager_on(&clock);
        let ctx = SimulationContext::new(&manager, &clock);

        let outcome = simulate_sybil(&ctx, 10).unwrap();
        assert!(outcome.passed, "{}", outcome.details);
    }

    // =============================================================================
    // DOS
    // =============================================================================

    #[test]
    fn test_flood_blocked_and_legit_traffic_preserved() {
        let clock = Arc::new(ManualTimeSource::new(NOW));
        let manager = manager_on(&clock);
        let ctx = SimulationContext::new(&manager, &clock);

        let outcome = simulate_dos(&ctx, &ScenarioConfig::default()).unwrap();

        assert!(outcome.metrics["flood_block_rate"] >= 0.9, "{}", outcome.details);
        assert!(outcome.metrics["legit_preserve_rate"] >= 0.8, "{}", outcome.details);
        assert!(outcome.passed);
    }

    // =============================================================================
    // ECLIPSE
    // =============================================================================

    #[test]
    fn test_eclipse_flood_trimmed_and_legit_peers_kept() {
        let clock = Arc::new(ManualTimeSource::new(NOW));
        let manager = manager_on(&clock);
        let ctx = SimulationContext::new(&manager, &clock);

        let outcome = simulate_eclipse(&ctx, &ScenarioConfig::default()).unwrap();

        assert!(outcome.metrics["attacker_block_rate"] >= 0.6, "{}", outcome.details);
        assert_eq!(outcome.metrics["legit_keep_rate"], 1.0);
        assert!(outcome.passed);
    }

    #[test]
    fn test_eclipse_pass_bar_follows_scenario() {
        let clock = Arc::new(ManualTimeSource::new(NOW));
        let manager = manager_on(&clock);
        let ctx = SimulationContext::new(&manager, &clock);
        let strict = ScenarioConfig {
            eclipse_min_attacker_block_rate: 0.95,
            ..ScenarioConfig::default()
        };

        let outcome = simulate_eclipse(&ctx, &strict).unwrap();

        assert!(outcome.metrics["attacker_block_rate"] < 0.95);
        assert!(!outcome.passed);
    }

    // =============================================================================
    // FULL RUN
    // =============================================================================

    #[test]
    fn test_penetration_run_reports_low_risk() {
        let mut tester = PenetrationTester::new(SecurityConfig::for_testing()).unwrap();
        let report = tester.run_security_tests();

        assert_eq!(report.summary.total, 10);
        assert_eq!(report.risk_level, RiskLevel::Low);

        let csv = tester.export_results(ExportFormat::Csv).unwrap();
        assert!(csv.starts_with("test,category,passed,details,error,metrics\n"));
        assert_eq!(csv.lines().count(), 11);
    }
}
