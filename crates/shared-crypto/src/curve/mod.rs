//! # secp256k1 Group Arithmetic
//!
//! Arbitrary-precision implementation of the secp256k1 group used by the
//! threshold scheme and the zero-knowledge proofs. Every field and scalar
//! operation is reduced modulo `p` or `n` on `BigUint`; nothing wraps in a
//! machine word.
//!
//! | Type | Meaning |
//! |------|---------|
//! | [`CurvePoint`] | Affine point or the point at infinity |
//! | [`Scalar`] | Integer modulo the group order `n` |

pub mod params;
mod point;
mod scalar;

pub use point::CurvePoint;
pub use scalar::{mod_inverse, Scalar};
