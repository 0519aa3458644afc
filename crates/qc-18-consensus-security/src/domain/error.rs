//! Error types for the consensus security subsystem.
//!
//! Policy violations and integrity failures are errors. Detector findings
//! are not: they are returned as [`super::Anomaly`] values.

use qc_zkp::ZkpError;
use shared_crypto::ThresholdError;

/// Security policy and integrity errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SecurityError {
    #[error("Security manager not initialized")]
    NotInitialized,

    #[error("Node join rejected for {node_id}: {reason}")]
    JoinRejected { node_id: String, reason: String },

    #[error("Invalid threshold signature")]
    InvalidSignature,

    #[error("Insufficient signatories: {available} available, required {required}")]
    InsufficientSignatories { available: usize, required: usize },

    #[error("Proposal hash mismatch: attached {attached}, computed {computed}")]
    IntegrityHashMismatch { attached: String, computed: String },

    #[error("Forensic log integrity violated: {corrupted} corrupted entries")]
    IntegrityLogCorrupted { corrupted: usize },

    #[error("Proof rejected: {0}")]
    ProofRejected(#[from] ZkpError),

    #[error("Threshold scheme error: {0}")]
    Threshold(ThresholdError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Export failed: {0}")]
    Export(String),
}

impl From<ThresholdError> for SecurityError {
    fn from(err: ThresholdError) -> Self {
        match err {
            ThresholdError::InsufficientSignatories {
                available,
                required,
            } => SecurityError::InsufficientSignatories {
                available,
                required,
            },
            ThresholdError::InvalidSignature => SecurityError::InvalidSignature,
            other => SecurityError::Threshold(other),
        }
    }
}

impl SecurityError {
    /// Integrity errors abort the enclosing consensus round.
    pub fn is_integrity(&self) -> bool {
        matches!(
            self,
            SecurityError::IntegrityHashMismatch { .. }
                | SecurityError::IntegrityLogCorrupted { .. }
                | SecurityError::InvalidSignature
        )
    }
}

/// Result type for security operations.
pub type SecurityResult<T> = Result<T, SecurityError>;

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A value is outside its permitted range
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
    /// TOML could not be parsed
    #[error("failed to parse config: {0}")]
    Parse(String),
    /// Config file could not be read
    #[error("failed to read config: {0}")]
    Io(String),
}

/// Failures of optional infrastructure (audit sink, cache).
///
/// Always caught at the call site and logged; never blocks a decision.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InfraError {
    #[error("cache unavailable: {0}")]
    CacheUnavailable(String),

    #[error("audit sink unavailable: {0}")]
    SinkUnavailable(String),
}
