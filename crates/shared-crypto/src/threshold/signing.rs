//! # Two-Round Threshold Schnorr Signing
//!
//! 1. **Commit**: each signatory samples hiding/binding nonces `(d_i, e_i)`
//!    and publishes `(D_i, E_i)`.
//! 2. **Sign**: with binding factor `ρ_i = H(i ‖ m ‖ commitments)` the signer's
//!    nonce point is `K_i = D_i + ρ_i·E_i`, the group nonce is
//!    `R = Σ λ_i·K_i`, `r = R.x mod n`, `c = H(r ‖ P ‖ m)` and the partial
//!    response is `z_i = d_i + ρ_i·e_i + c·s_i`.
//! 3. **Combine**: every partial must satisfy `z_i·G == K_i + c·Y_i`; the
//!    signature is `(r, s = Σ λ_i·z_i)`.
//!
//! Verification under the group key: `R' = s·G − c·P`, accept iff
//! `R'.x mod n == r`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::dkg::{PublicKeyShare, SecretShare};
use super::error::{ThresholdError, ThresholdResult};
use super::lagrange::lagrange_coefficient;
use crate::curve::{CurvePoint, Scalar};
use crate::hashing::hash_to_scalar;

const BINDING_DOMAIN: &str = "quantum-chain/threshold/binding";
const CHALLENGE_DOMAIN: &str = "quantum-chain/threshold/challenge";

/// Secret nonces. Consumed by [`sign_partial`] so they cannot be reused.
pub struct SigningNonces {
    index: u32,
    hiding: Scalar,
    binding: Scalar,
}

impl SigningNonces {
    /// Party index these nonces belong to.
    pub fn index(&self) -> u32 {
        self.index
    }
}

/// Public half of [`SigningNonces`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonceCommitment {
    /// Signatory party index
    pub index: u32,
    /// `D_i = d_i · G`
    pub hiding: CurvePoint,
    /// `E_i = e_i · G`
    pub binding: CurvePoint,
}

/// Round 1: sample nonces for `index`.
pub fn commit(index: u32) -> (SigningNonces, NonceCommitment) {
    let hiding = Scalar::random();
    let binding = Scalar::random();
    let commitment = NonceCommitment {
        index,
        hiding: CurvePoint::mul_generator(&hiding),
        binding: CurvePoint::mul_generator(&binding),
    };
    (
        SigningNonces {
            index,
            hiding,
            binding,
        },
        commitment,
    )
}

/// Partial signature from one signatory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialSignature {
    /// Party index of the signatory
    pub signatory_id: u32,
    /// Response `z_i`
    pub response: Scalar,
    /// Per-signer nonce point `K_i`
    pub nonce_commitment: CurvePoint,
}

/// Combined `(r, s)` signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdSignature {
    /// Group nonce x-coordinate mod `n`
    pub r: Scalar,
    /// Combined response
    pub s: Scalar,
}

impl ThresholdSignature {
    /// Verify under the group public key.
    pub fn verify(&self, message: &[u8], group_public_key: &CurvePoint) -> bool {
        if group_public_key.is_infinity() || self.r.is_zero() {
            return false;
        }
        let c = challenge(&self.r, group_public_key, message);
        let recovered = CurvePoint::mul_generator(&self.s).sub(&group_public_key.mul(&c));
        if recovered.is_infinity() {
            return false;
        }
        Scalar::new(recovered.x().clone()) == self.r
    }

    /// 64-byte `r || s` encoding.
    pub fn to_bytes(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        out[..32].copy_from_slice(&self.r.to_bytes());
        out[32..].copy_from_slice(&self.s.to_bytes());
        out
    }

    /// Hex of [`ThresholdSignature::to_bytes`].
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }
}

fn challenge(r: &Scalar, group_public_key: &CurvePoint, message: &[u8]) -> Scalar {
    hash_to_scalar(
        CHALLENGE_DOMAIN,
        &[&r.to_bytes(), &group_public_key.to_compressed(), message],
    )
}

/// Everything signatories agree on before round 2.
#[derive(Debug, Clone)]
pub struct SigningPackage {
    message: Vec<u8>,
    commitments: BTreeMap<u32, NonceCommitment>,
    group_public_key: CurvePoint,
    binding_factors: BTreeMap<u32, Scalar>,
    lambdas: BTreeMap<u32, Scalar>,
    nonce_points: BTreeMap<u32, CurvePoint>,
    r: Scalar,
    challenge: Scalar,
}

impl SigningPackage {
    /// Derive binding factors, the group nonce and the challenge.
    pub fn new(
        message: &[u8],
        commitments: Vec<NonceCommitment>,
        group_public_key: &CurvePoint,
        threshold: usize,
    ) -> ThresholdResult<Self> {
        let mut by_index = BTreeMap::new();
        for c in commitments {
            let index = c.index;
            if by_index.insert(index, c).is_some() {
                return Err(ThresholdError::DuplicateParty(index));
            }
        }
        if by_index.len() < threshold {
            return Err(ThresholdError::InsufficientSignatories {
                available: by_index.len(),
                required: threshold,
            });
        }

        let mut transcript = Vec::with_capacity(by_index.len() * 70);
        for c in by_index.values() {
            transcript.extend_from_slice(&c.index.to_be_bytes());
            transcript.extend_from_slice(&c.hiding.to_compressed());
            transcript.extend_from_slice(&c.binding.to_compressed());
        }

        let indices: Vec<u32> = by_index.keys().copied().collect();
        let mut binding_factors = BTreeMap::new();
        let mut lambdas = BTreeMap::new();
        let mut nonce_points = BTreeMap::new();
        let mut group_nonce = CurvePoint::infinity();
        for (index, c) in &by_index {
            let rho = hash_to_scalar(
                BINDING_DOMAIN,
                &[&index.to_be_bytes(), message, &transcript],
            );
            let k_i = c.hiding.add(&c.binding.mul(&rho));
            let lambda = lagrange_coefficient(*index, &indices)?;
            group_nonce = group_nonce.add(&k_i.mul(&lambda));
            binding_factors.insert(*index, rho);
            lambdas.insert(*index, lambda);
            nonce_points.insert(*index, k_i);
        }

        if group_nonce.is_infinity() {
            return Err(ThresholdError::DegenerateNonce);
        }
        let r = Scalar::new(group_nonce.x().clone());
        if r.is_zero() {
            return Err(ThresholdError::DegenerateNonce);
        }
        let challenge = challenge(&r, group_public_key, message);

        Ok(Self {
            message: message.to_vec(),
            commitments: by_index,
            group_public_key: group_public_key.clone(),
            binding_factors,
            lambdas,
            nonce_points,
            r,
            challenge,
        })
    }

    /// Message being signed.
    pub fn message(&self) -> &[u8] {
        &self.message
    }

    /// Signatory indices, ascending.
    pub fn signatories(&self) -> Vec<u32> {
        self.commitments.keys().copied().collect()
    }
}

/// Round 2: compute `z_i = d_i + ρ_i·e_i + c·s_i`.
pub fn sign_partial(
    package: &SigningPackage,
    nonces: SigningNonces,
    share: &SecretShare,
) -> ThresholdResult<PartialSignature> {
    if nonces.index != share.index {
        return Err(ThresholdError::UnknownParty(nonces.index));
    }
    let rho = package
        .binding_factors
        .get(&share.index)
        .ok_or(ThresholdError::UnknownParty(share.index))?;
    let nonce_commitment = package
        .nonce_points
        .get(&share.index)
        .cloned()
        .ok_or(ThresholdError::UnknownParty(share.index))?;

    let response =
        &(&nonces.hiding + &(rho * &nonces.binding)) + &(&package.challenge * &share.value);

    Ok(PartialSignature {
        signatory_id: share.index,
        response,
        nonce_commitment,
    })
}

/// Check `z_i·G == K_i + c·Y_i`.
pub fn verify_partial(
    package: &SigningPackage,
    partial: &PartialSignature,
    public_share: &PublicKeyShare,
) -> bool {
    if partial.signatory_id != public_share.index {
        return false;
    }
    let Some(expected_k) = package.nonce_points.get(&partial.signatory_id) else {
        return false;
    };
    if *expected_k != partial.nonce_commitment {
        return false;
    }
    let lhs = CurvePoint::mul_generator(&partial.response);
    let rhs = expected_k.add(&public_share.point.mul(&package.challenge));
    lhs == rhs
}

/// Combine partials into a group signature. Atomic: any missing or invalid
/// partial fails the whole combination.
pub fn combine(
    package: &SigningPackage,
    partials: &[PartialSignature],
    public_shares: &[PublicKeyShare],
    threshold: usize,
) -> ThresholdResult<ThresholdSignature> {
    if partials.len() < threshold {
        return Err(ThresholdError::InsufficientSignatories {
            available: partials.len(),
            required: threshold,
        });
    }

    let mut by_index = BTreeMap::new();
    for partial in partials {
        if by_index.insert(partial.signatory_id, partial).is_some() {
            return Err(ThresholdError::DuplicateParty(partial.signatory_id));
        }
    }
    if by_index.keys().copied().collect::<Vec<_>>() != package.signatories() {
        return Err(ThresholdError::PartialSetMismatch);
    }

    let mut s = Scalar::zero();
    for (index, partial) in &by_index {
        let public_share = public_shares
            .iter()
            .find(|p| p.index == *index)
            .ok_or(ThresholdError::UnknownParty(*index))?;
        if !verify_partial(package, partial, public_share) {
            return Err(ThresholdError::InvalidPartialSignature { index: *index });
        }
        let lambda = package
            .lambdas
            .get(index)
            .ok_or(ThresholdError::UnknownParty(*index))?;
        s = &s + &(lambda * &partial.response);
    }

    let signature = ThresholdSignature {
        r: package.r.clone(),
        s,
    };
    if !signature.verify(&package.message, &package.group_public_key) {
        return Err(ThresholdError::InvalidSignature);
    }
    Ok(signature)
}
