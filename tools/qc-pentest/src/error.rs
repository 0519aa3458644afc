//! Harness error types.

use qc_18_consensus_security::SecurityError;
use qc_zkp::ZkpError;
use shared_crypto::ThresholdError;
use thiserror::Error;

/// A simulator could not complete its scenario.
///
/// Never escapes [`crate::PenetrationTester::run_security_tests`]; each error
/// becomes a failed outcome.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("Security manager error: {0}")]
    Security(#[from] SecurityError),

    #[error("Threshold scheme error: {0}")]
    Threshold(#[from] ThresholdError),

    #[error("Proof system error: {0}")]
    Zkp(#[from] ZkpError),

    #[error("Scenario setup failed: {0}")]
    Setup(String),

    #[error("Export failed: {0}")]
    Export(String),
}
