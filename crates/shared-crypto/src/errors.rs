//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Coordinates do not satisfy the curve equation
    #[error("Point is not on the curve")]
    NotOnCurve,

    /// Point encoding could not be decoded
    #[error("Invalid point encoding: {0}")]
    InvalidEncoding(String),

    /// Scalar outside `[1, n-1]` where a non-zero scalar is required
    #[error("Invalid scalar: {0}")]
    InvalidScalar(String),

    /// Public key is the identity or malformed
    #[error("Invalid public key")]
    InvalidPublicKey,

    /// Invalid signature components
    #[error("Invalid signature")]
    InvalidSignature,

    /// Signature verification failed
    #[error("Signature verification failed")]
    SignatureVerificationFailed,

    /// Value has no inverse modulo the given modulus
    #[error("Value is not invertible")]
    NotInvertible,
}
