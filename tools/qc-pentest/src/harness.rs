//! Suite driver: one live manager, every simulator, one report.

use std::sync::Arc;

use qc_18_consensus_security::adapters::ManualTimeSource;
use qc_18_consensus_security::ports::{SystemTimeSource, TimeSource};
use qc_18_consensus_security::{csv_field, ConsensusSecurityManager, ExportFormat, SecurityConfig};
use tracing::{info, warn};

use crate::error::SimulationError;
use crate::outcome::{TestCategory, TestOutcome};
use crate::report::SecurityReport;
use crate::simulators::{self, ScenarioConfig, SimulationContext};

/// Gap between simulators so their time windows do not overlap.
const SIMULATOR_GAP_MS: u64 = 120_000;

type Simulator = fn(&SimulationContext<'_>, &ScenarioConfig) -> Result<TestOutcome, SimulationError>;

/// Runs the attack suite against an initialized manager.
pub struct PenetrationTester {
    manager: ConsensusSecurityManager,
    clock: Arc<ManualTimeSource>,
    scenario: ScenarioConfig,
    last_report: Option<SecurityReport>,
}

impl PenetrationTester {
    /// Build and initialize a manager on a manual clock.
    pub fn new(config: SecurityConfig) -> Result<Self, SimulationError> {
        let clock = Arc::new(ManualTimeSource::new(SystemTimeSource.now_millis()));
        let manager = ConsensusSecurityManager::new(config)?.with_time_source(clock.clone());
        manager.initialize()?;
        Ok(Self {
            manager,
            clock,
            scenario: ScenarioConfig::default(),
            last_report: None,
        })
    }

    pub fn with_scenario(mut self, scenario: ScenarioConfig) -> Self {
        self.scenario = scenario;
        self
    }

    pub fn manager(&self) -> &ConsensusSecurityManager {
        &self.manager
    }

    pub fn last_report(&self) -> Option<&SecurityReport> {
        self.last_report.as_ref()
    }

    /// Run every simulator. Simulator errors become failed outcomes.
    pub fn run_security_tests(&mut self) -> &SecurityReport {
        let suite: [(&str, TestCategory, Simulator); 10] = [
            ("byzantine_equivocation", TestCategory::Byzantine, |ctx, s| {
                simulators::simulate_byzantine(ctx, s.byzantine_rounds)
            }),
            ("sybil_join_burst", TestCategory::Sybil, |ctx, s| {
                simulators::simulate_sybil(ctx, s.sybil_nodes)
            }),
            ("eclipse_connection_flood", TestCategory::Eclipse, simulators::simulate_eclipse),
            ("dos_flood", TestCategory::Dos, simulators::simulate_dos),
            ("signature_replay", TestCategory::Crypto, |ctx, _| {
                simulators::simulate_signature_replay(ctx)
            }),
            ("partial_signature_manipulation", TestCategory::Crypto, |ctx, _| {
                simulators::simulate_partial_signature_manipulation(ctx)
            }),
            ("key_recovery", TestCategory::Crypto, |ctx, _| {
                simulators::simulate_key_recovery(ctx)
            }),
            ("zk_proof_replay", TestCategory::Crypto, |ctx, _| {
                simulators::simulate_proof_replay(ctx)
            }),
            ("zk_challenge_prediction", TestCategory::Crypto, |ctx, _| {
                simulators::simulate_challenge_prediction(ctx)
            }),
            ("zk_commitment_manipulation", TestCategory::Crypto, |ctx, _| {
                simulators::simulate_commitment_manipulation(ctx)
            }),
        ];

        let mut results = Vec::with_capacity(suite.len());
        for (name, category, simulate) in suite {
            let ctx = SimulationContext::new(&self.manager, &self.clock);
            let outcome = match simulate(&ctx, &self.scenario) {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(test = name, error = %e, "Simulator failed");
                    TestOutcome::errored(name, category, &e)
                }
            };
            info!(test = name, passed = outcome.passed, "Security test complete");
            results.push(outcome);
            self.clock.advance(SIMULATOR_GAP_MS);
        }

        let report = SecurityReport::from_outcomes(results, self.clock.now_millis());
        info!(
            score = report.summary.score,
            risk = %report.risk_level,
            "Penetration suite finished"
        );
        self.last_report.insert(report)
    }

    /// Serialize the last report. JSON carries the full report, CSV one row
    /// per test.
    pub fn export_results(&self, format: ExportFormat) -> Result<String, SimulationError> {
        let report = self
            .last_report
            .as_ref()
            .ok_or_else(|| SimulationError::Export("no results; run the suite first".into()))?;
        export_report(report, format)
    }
}

/// Serialize a report.
pub fn export_report(report: &SecurityReport, format: ExportFormat) -> Result<String, SimulationError> {
    match format {
        ExportFormat::Json => {
            serde_json::to_string_pretty(report).map_err(|e| SimulationError::Export(e.to_string()))
        }
        ExportFormat::Csv => {
            let mut out = String::from("test,category,passed,details,error,metrics\n");
            for r in &report.results {
                let metrics = serde_json::to_string(&r.metrics)
                    .map_err(|e| SimulationError::Export(e.to_string()))?;
                out.push_str(&format!(
                    "{},{},{},{},{},{}\n",
                    csv_field(&r.name),
                    r.category,
                    r.passed,
                    csv_field(&r.details),
                    csv_field(r.error.as_deref().unwrap_or("")),
                    csv_field(&metrics)
                ));
            }
            Ok(out)
        }
    }
}
