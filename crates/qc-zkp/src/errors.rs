//! ZKP error types.

use shared_crypto::CryptoError;
use thiserror::Error;

/// Result alias for proof operations.
pub type ZkpResult<T> = Result<T, ZkpError>;

/// Zero-knowledge proof errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ZkpError {
    /// Proof equation does not hold
    #[error("Proof verification failed")]
    VerificationFailed,

    /// Non-interactive challenge differs from the transcript hash
    #[error("Challenge does not match transcript")]
    ChallengeMismatch,

    /// Proof older than the freshness window
    #[error("Proof expired: age {age_ms}ms exceeds window {window_ms}ms")]
    Expired {
        /// Age of the proof
        age_ms: u64,
        /// Configured window
        window_ms: u64,
    },

    /// Proof timestamped too far ahead of the verifier clock
    #[error("Proof timestamp {timestamp} is ahead of clock {now}")]
    FutureTimestamp {
        /// Proof timestamp
        timestamp: u64,
        /// Verifier clock
        now: u64,
    },

    /// Same proof already presented inside the window
    #[error("Proof replayed")]
    Replayed,

    /// Witness outside the claimed range
    #[error("Value {value} outside range [{min}, {max}]")]
    ValueOutOfRange {
        /// Witness value
        value: u64,
        /// Lower bound
        min: u64,
        /// Upper bound
        max: u64,
    },

    /// `min > max`
    #[error("Invalid range [{min}, {max}]")]
    InvalidRange {
        /// Lower bound
        min: u64,
        /// Upper bound
        max: u64,
    },

    /// Public key is the identity or off-curve
    #[error("Invalid public key")]
    InvalidPublicKey,

    /// Underlying group operation failed
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}
