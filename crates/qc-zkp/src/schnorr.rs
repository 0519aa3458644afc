//! # Schnorr Proof of Discrete Log
//!
//! Proves knowledge of `x` with `P = x·G` without revealing `x`.
//!
//! - Commitment `A = k·G` for a fresh nonce `k`
//! - Challenge `c = H(A ‖ P ‖ timestamp ‖ context)` (Fiat-Shamir) or verifier-supplied
//! - Response `z = k + c·x (mod n)`
//!
//! Accept iff `z·G == A + c·P`.

use serde::{Deserialize, Serialize};
use shared_crypto::{hash_to_scalar, CurvePoint, Scalar};

use crate::errors::{ZkpError, ZkpResult};

const CHALLENGE_DOMAIN: &str = "quantum-chain/zkp/schnorr";

/// Schnorr proof with the timestamp bound into the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchnorrProof {
    /// `A = k·G`
    pub commitment: CurvePoint,
    /// `c`
    pub challenge: Scalar,
    /// `z = k + c·x`
    pub response: Scalar,
    /// Issue time (ms since epoch)
    pub timestamp: u64,
}

/// Fiat-Shamir challenge over the commitment, public key, timestamp and an
/// application context. The context is length-prefixed so an empty context
/// cannot collide with a non-empty one.
pub fn fiat_shamir_challenge(
    commitment: &CurvePoint,
    public_key: &CurvePoint,
    timestamp: u64,
    context: &[u8],
) -> Scalar {
    hash_to_scalar(
        CHALLENGE_DOMAIN,
        &[
            &commitment.to_compressed(),
            &public_key.to_compressed(),
            &timestamp.to_be_bytes(),
            &(context.len() as u64).to_be_bytes(),
            context,
        ],
    )
}

fn check_public_key(public_key: &CurvePoint) -> ZkpResult<()> {
    if public_key.is_infinity() || !public_key.is_on_curve() {
        return Err(ZkpError::InvalidPublicKey);
    }
    Ok(())
}

/// Non-interactive proof of knowledge of `secret` for `public_key`.
pub fn prove(secret: &Scalar, public_key: &CurvePoint, timestamp: u64) -> ZkpResult<SchnorrProof> {
    prove_with_context(secret, public_key, timestamp, &[])
}

/// Non-interactive proof bound to `context` (e.g. the node id it is
/// presented for). Only verifies against the same context.
pub fn prove_with_context(
    secret: &Scalar,
    public_key: &CurvePoint,
    timestamp: u64,
    context: &[u8],
) -> ZkpResult<SchnorrProof> {
    check_public_key(public_key)?;
    if CurvePoint::mul_generator(secret) != *public_key {
        return Err(ZkpError::VerificationFailed);
    }
    let (prover, commitment) = InteractiveProver::commit(secret.clone());
    let challenge = fiat_shamir_challenge(&commitment, public_key, timestamp, context);
    Ok(prover.respond(challenge, timestamp))
}

/// Verify a non-interactive proof: transcript challenge and proof equation.
pub fn verify(proof: &SchnorrProof, public_key: &CurvePoint) -> ZkpResult<()> {
    verify_with_context(proof, public_key, &[])
}

/// Verify a proof produced by [`prove_with_context`].
pub fn verify_with_context(
    proof: &SchnorrProof,
    public_key: &CurvePoint,
    context: &[u8],
) -> ZkpResult<()> {
    check_public_key(public_key)?;
    let expected =
        fiat_shamir_challenge(&proof.commitment, public_key, proof.timestamp, context);
    if expected != proof.challenge {
        return Err(ZkpError::ChallengeMismatch);
    }
    verify_equation(proof, public_key)
}

/// Verify an interactive proof against the challenge the verifier issued.
pub fn verify_interactive(
    proof: &SchnorrProof,
    public_key: &CurvePoint,
    issued_challenge: &Scalar,
) -> ZkpResult<()> {
    check_public_key(public_key)?;
    if proof.challenge != *issued_challenge {
        return Err(ZkpError::ChallengeMismatch);
    }
    verify_equation(proof, public_key)
}

fn verify_equation(proof: &SchnorrProof, public_key: &CurvePoint) -> ZkpResult<()> {
    if proof.commitment.is_infinity() {
        return Err(ZkpError::VerificationFailed);
    }
    let lhs = CurvePoint::mul_generator(&proof.response);
    let rhs = proof.commitment.add(&public_key.mul(&proof.challenge));
    if lhs != rhs {
        return Err(ZkpError::VerificationFailed);
    }
    Ok(())
}

/// Prover state between commitment and challenge.
pub struct InteractiveProver {
    secret: Scalar,
    nonce: Scalar,
    commitment: CurvePoint,
}

impl InteractiveProver {
    /// Sample a nonce and return the commitment to send to the verifier.
    pub fn commit(secret: Scalar) -> (Self, CurvePoint) {
        let nonce = Scalar::random();
        let commitment = CurvePoint::mul_generator(&nonce);
        let prover = Self {
            secret,
            nonce,
            commitment: commitment.clone(),
        };
        (prover, commitment)
    }

    /// Answer the verifier's challenge. Consumes the nonce.
    pub fn respond(self, challenge: Scalar, timestamp: u64) -> SchnorrProof {
        let response = &self.nonce + &(&challenge * &self.secret);
        SchnorrProof {
            commitment: self.commitment,
            challenge,
            response,
            timestamp,
        }
    }
}
