//! # Range Proofs
//!
//! Proves that a Pedersen commitment `C = v·G + r·H` opens to
//! `min <= v <= max` without revealing `v`.
//!
//! Both `v − min` and `max − v` are decomposed into `k = bitlen(max − min)`
//! bits. Each bit gets its own commitment `C_j = b_j·G + r_j·H` and a
//! Cramer–Damgård–Schoenmakers OR-proof that `C_j` commits to 0 or 1. The
//! bit blindings are chosen so that
//!
//! - `Σ 2^j·C_j  == C − min·G`
//! - `Σ 2^j·C'_j == max·G − C`
//!
//! which pins `v` into `[min, min + 2^k) ∩ (max − 2^k, max]`.

use serde::{Deserialize, Serialize};
use shared_crypto::{hash_to_scalar, CurvePoint, Scalar};

use crate::errors::{ZkpError, ZkpResult};
use crate::pedersen::{PedersenCommitment, GENERATOR_H};

const BIT_DOMAIN: &str = "quantum-chain/zkp/range-bit";

/// OR-proof that a bit commitment opens to 0 or 1 over base `H`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitProof {
    /// `C_j`
    pub commitment: CurvePoint,
    /// Announcement for the "bit = 0" branch
    pub a0: CurvePoint,
    /// Announcement for the "bit = 1" branch
    pub a1: CurvePoint,
    /// Branch challenges, `e0 + e1 == H(...)`
    pub e0: Scalar,
    /// Second branch challenge
    pub e1: Scalar,
    /// Branch responses
    pub z0: Scalar,
    /// Second branch response
    pub z1: Scalar,
}

/// Range proof for one commitment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeProof {
    /// Lower bound (inclusive)
    pub min: u64,
    /// Upper bound (inclusive)
    pub max: u64,
    /// Bits of `v − min`
    pub lower: Vec<BitProof>,
    /// Bits of `max − v`
    pub upper: Vec<BitProof>,
}

fn bit_width(min: u64, max: u64) -> usize {
    let span = max - min;
    (64 - span.leading_zeros() as usize).max(1)
}

fn pow2(j: usize) -> Scalar {
    Scalar::from_u64(1u64 << j)
}

fn bit_challenge(
    context: &CurvePoint,
    side: u8,
    position: usize,
    commitment: &CurvePoint,
    a0: &CurvePoint,
    a1: &CurvePoint,
) -> Scalar {
    hash_to_scalar(
        BIT_DOMAIN,
        &[
            &context.to_compressed(),
            &[side],
            &(position as u64).to_be_bytes(),
            &commitment.to_compressed(),
            &a0.to_compressed(),
            &a1.to_compressed(),
        ],
    )
}

/// Prove a single bit commitment `C_j = bit·G + blinding·H`.
fn prove_bit(
    context: &CurvePoint,
    side: u8,
    position: usize,
    bit: bool,
    blinding: &Scalar,
) -> BitProof {
    let g = CurvePoint::generator();
    let h = &*GENERATOR_H;
    let commitment = if bit {
        g.add(&h.mul(blinding))
    } else {
        h.mul(blinding)
    };
    // Statement for branch b: (C_j − b·G) = x·H
    let target0 = commitment.clone();
    let target1 = commitment.sub(&g);

    let k = Scalar::random();
    let fake_e = Scalar::random();
    let fake_z = Scalar::random();

    let (a0, a1) = if bit {
        let a0 = h.mul(&fake_z).sub(&target0.mul(&fake_e));
        (a0, h.mul(&k))
    } else {
        let a1 = h.mul(&fake_z).sub(&target1.mul(&fake_e));
        (h.mul(&k), a1)
    };

    let e = bit_challenge(context, side, position, &commitment, &a0, &a1);
    let real_e = &e - &fake_e;
    let real_z = &k + &(&real_e * blinding);

    let (e0, e1, z0, z1) = if bit {
        (fake_e, real_e, fake_z, real_z)
    } else {
        (real_e, fake_e, real_z, fake_z)
    };

    BitProof {
        commitment,
        a0,
        a1,
        e0,
        e1,
        z0,
        z1,
    }
}

fn verify_bit(context: &CurvePoint, side: u8, position: usize, proof: &BitProof) -> bool {
    let h = &*GENERATOR_H;
    let e = bit_challenge(context, side, position, &proof.commitment, &proof.a0, &proof.a1);
    if &proof.e0 + &proof.e1 != e {
        return false;
    }
    let target0 = &proof.commitment;
    let target1 = proof.commitment.sub(&CurvePoint::generator());
    h.mul(&proof.z0) == proof.a0.add(&target0.mul(&proof.e0))
        && h.mul(&proof.z1) == proof.a1.add(&target1.mul(&proof.e1))
}

/// Bit proofs for `delta` whose blindings sum (weighted) to `total_blinding`.
fn prove_decomposition(
    context: &CurvePoint,
    side: u8,
    delta: u64,
    bits: usize,
    total_blinding: &Scalar,
) -> ZkpResult<Vec<BitProof>> {
    let mut blindings: Vec<Scalar> = (0..bits - 1).map(|_| Scalar::random()).collect();
    let partial = blindings
        .iter()
        .enumerate()
        .fold(Scalar::zero(), |acc, (j, r)| &acc + &(&pow2(j) * r));
    let inv = pow2(bits - 1)
        .invert()
        .ok_or(shared_crypto::CryptoError::NotInvertible)?;
    blindings.push(&(total_blinding - &partial) * &inv);

    Ok(blindings
        .iter()
        .enumerate()
        .map(|(j, r)| prove_bit(context, side, j, (delta >> j) & 1 == 1, r))
        .collect())
}

fn weighted_sum(proofs: &[BitProof]) -> CurvePoint {
    proofs
        .iter()
        .enumerate()
        .fold(CurvePoint::infinity(), |acc, (j, p)| {
            acc.add(&p.commitment.mul(&pow2(j)))
        })
}

impl RangeProof {
    /// Prove `min <= value <= max` for `C = value·G + blinding·H`.
    pub fn prove(
        value: u64,
        blinding: &Scalar,
        min: u64,
        max: u64,
    ) -> ZkpResult<(PedersenCommitment, RangeProof)> {
        if min > max {
            return Err(ZkpError::InvalidRange { min, max });
        }
        if value < min || value > max {
            return Err(ZkpError::ValueOutOfRange { value, min, max });
        }

        let commitment = PedersenCommitment::commit(&Scalar::from_u64(value), blinding);
        let context = commitment.point().clone();
        let bits = bit_width(min, max);

        let lower = prove_decomposition(&context, 0, value - min, bits, blinding)?;
        let upper = prove_decomposition(&context, 1, max - value, bits, &-blinding)?;

        Ok((
            commitment,
            RangeProof {
                min,
                max,
                lower,
                upper,
            },
        ))
    }

    /// Verify every bit proof and both weighted sums.
    pub fn verify(&self, commitment: &PedersenCommitment) -> ZkpResult<()> {
        if self.min > self.max {
            return Err(ZkpError::InvalidRange {
                min: self.min,
                max: self.max,
            });
        }
        let bits = bit_width(self.min, self.max);
        if self.lower.len() != bits || self.upper.len() != bits {
            return Err(ZkpError::VerificationFailed);
        }

        let context = commitment.point();
        let all_bits_valid = self
            .lower
            .iter()
            .enumerate()
            .all(|(j, p)| verify_bit(context, 0, j, p))
            && self
                .upper
                .iter()
                .enumerate()
                .all(|(j, p)| verify_bit(context, 1, j, p));
        if !all_bits_valid {
            return Err(ZkpError::VerificationFailed);
        }

        let min_g = CurvePoint::mul_generator(&Scalar::from_u64(self.min));
        let max_g = CurvePoint::mul_generator(&Scalar::from_u64(self.max));
        if weighted_sum(&self.lower) != context.sub(&min_g) {
            return Err(ZkpError::VerificationFailed);
        }
        if weighted_sum(&self.upper) != max_g.sub(context) {
            return Err(ZkpError::VerificationFailed);
        }
        Ok(())
    }
}
