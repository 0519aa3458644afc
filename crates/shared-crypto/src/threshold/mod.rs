//! # Threshold Signatures
//!
//! `t`-of-`n` Schnorr signatures over secp256k1 with key material produced by
//! a Feldman-VSS distributed key generation.
//!
//! | Module | Role |
//! |--------|------|
//! | `dkg` | Key generation ceremony, shares, fault injection |
//! | `polynomial` | Secret polynomials, Feldman commitments |
//! | `lagrange` | Interpolation at zero over party indices |
//! | `signing` | Commit, partial sign, verify partial, combine |
//! | `scheme` | Session coordinator with signer exclusion |

pub mod dkg;
mod error;
pub mod lagrange;
pub mod polynomial;
mod scheme;
pub mod signing;

pub use dkg::{DkgCeremony, DkgOutput, PublicKeyShare, SecretShare, ThresholdParams};
pub use error::{ThresholdError, ThresholdResult};
pub use scheme::ThresholdScheme;
pub use signing::{
    combine, commit, sign_partial, verify_partial, NonceCommitment, PartialSignature,
    SigningNonces, SigningPackage, ThresholdSignature,
};
