//! Threshold scheme errors.

use thiserror::Error;

use crate::CryptoError;

/// Result alias for threshold operations.
pub type ThresholdResult<T> = Result<T, ThresholdError>;

/// Errors raised by DKG and threshold signing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThresholdError {
    #[error("Invalid threshold parameters: t={threshold}, n={parties}")]
    InvalidParameters { threshold: usize, parties: usize },

    #[error("DKG aborted: {qualified} qualified dealers, required {required}")]
    InsufficientQualifiedDealers { qualified: usize, required: usize },

    #[error("DKG ceremony failed after {attempts} attempts")]
    CeremonyFailed { attempts: usize },

    #[error("Insufficient signatories: {available} available, required {required}")]
    InsufficientSignatories { available: usize, required: usize },

    #[error("Unknown party index: {0}")]
    UnknownParty(u32),

    #[error("Duplicate party index: {0}")]
    DuplicateParty(u32),

    #[error("Partial signature from party {index} failed verification")]
    InvalidPartialSignature { index: u32 },

    #[error("Partial signatures do not match the signing package")]
    PartialSetMismatch,

    #[error("Degenerate group nonce")]
    DegenerateNonce,

    #[error("Combined signature failed verification")]
    InvalidSignature,

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}
