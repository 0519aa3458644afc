//! # Shared Crypto - secp256k1 and Threshold Primitives
//!
//! **Status:** Consensus security envelope
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `curve` | secp256k1 over `num-bigint` | Group arithmetic |
//! | `hashing` | SHA-256 | Digests, Fiat-Shamir challenges |
//! | `ecdsa` | secp256k1 ECDSA | Stake proofs, node identity |
//! | `threshold` | Feldman DKG + two-round Schnorr | Consensus signatures |
//!
//! ## Security Properties
//!
//! - **Arithmetic**: every field/scalar operation reduced on arbitrary-precision integers
//! - **ECDSA**: low-S normalization (EIP-2)
//! - **Threshold**: every partial signature verified against its public share
//!   before combination; combination is all-or-nothing

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod curve;
pub mod ecdsa;
pub mod errors;
pub mod hashing;
pub mod threshold;

// Re-exports
pub use curve::{mod_inverse, CurvePoint, Scalar};
pub use ecdsa::{EcdsaKeyPair, EcdsaSignature};
pub use errors::CryptoError;
pub use hashing::{hash_message, hash_to_scalar, sha256, sha256_hex, Hash};
pub use threshold::{
    DkgCeremony, DkgOutput, PartialSignature, ThresholdError, ThresholdParams, ThresholdScheme,
    ThresholdSignature,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
