//! # SHA-256 Hashing
//!
//! One-shot digests plus hash-to-scalar helpers used for ECDSA message
//! digests and Fiat-Shamir challenges.
//!
//! Multi-part inputs are length-prefixed and domain-separated so that
//! `("ab", "c")` and `("a", "bc")` never collide.

use sha2::{Digest, Sha256};

use crate::curve::Scalar;

/// SHA-256 output (256-bit).
pub type Hash = [u8; 32];

/// Hash data with SHA-256 (one-shot).
pub fn sha256(data: &[u8]) -> Hash {
    Sha256::digest(data).into()
}

/// Hex-encoded SHA-256.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// SHA-256 over several inputs, concatenated without framing.
pub fn sha256_concat(inputs: &[&[u8]]) -> Hash {
    let mut hasher = Sha256::new();
    for input in inputs {
        hasher.update(input);
    }
    hasher.finalize().into()
}

/// ECDSA message digest: `SHA256(message) mod n`.
pub fn hash_message(message: &[u8]) -> Scalar {
    Scalar::from_bytes_reduced(&sha256(message))
}

/// Domain-separated hash of framed inputs, reduced modulo `n`.
pub fn hash_to_scalar(domain: &str, parts: &[&[u8]]) -> Scalar {
    let mut hasher = Sha256::new();
    frame(&mut hasher, domain.as_bytes());
    for part in parts {
        frame(&mut hasher, part);
    }
    Scalar::from_bytes_reduced(&hasher.finalize())
}

fn frame(hasher: &mut Sha256, data: &[u8]) {
    hasher.update((data.len() as u64).to_be_bytes());
    hasher.update(data);
}

/// Number of leading zero bits in a digest.
pub fn leading_zero_bits(hash: &[u8]) -> u32 {
    let mut bits = 0;
    for byte in hash {
        if *byte == 0 {
            bits += 8;
        } else {
            bits += byte.leading_zeros();
            break;
        }
    }
    bits
}
