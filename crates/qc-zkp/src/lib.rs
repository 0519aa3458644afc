//! # QC-ZKP: Zero-Knowledge Authentication
//!
//! Discrete-log proofs and range proofs over secp256k1.
//!
//! ## Components
//!
//! - `schnorr` - Schnorr proof of knowledge (Fiat-Shamir and interactive)
//! - `guard` - Freshness window and replay cache
//! - `pedersen` - Pedersen commitments with a hash-derived second generator
//! - `range` - Bit-decomposition range proofs with CDS OR-proofs

#![warn(missing_docs)]

pub mod errors;
pub mod guard;
pub mod pedersen;
pub mod range;
pub mod schnorr;

pub use errors::{ZkpError, ZkpResult};
pub use guard::{FreshnessConfig, ProofGuard};
pub use pedersen::PedersenCommitment;
pub use range::RangeProof;
pub use schnorr::{InteractiveProver, SchnorrProof};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
