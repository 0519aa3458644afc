//! Cryptographic attacks. Every one of them must fail.

use qc_18_consensus_security::{IdentityCredential, Proposal};
use qc_zkp::{PedersenCommitment, SchnorrProof};
use shared_crypto::threshold::lagrange::interpolate_at_zero;
use shared_crypto::{CurvePoint, DkgCeremony, Scalar, ThresholdParams, ThresholdScheme};
use tracing::{info, warn};

use super::SimulationContext;
use crate::error::SimulationError;
use crate::outcome::{TestCategory, TestOutcome};

fn outcome(name: &str, attack_failed: bool, details: String) -> TestOutcome {
    if attack_failed {
        info!(attack = name, "Attack defeated");
    } else {
        warn!(attack = name, "Attack succeeded");
    }
    TestOutcome::new(name, TestCategory::Crypto, attack_failed).with_details(details)
}

fn ceremony(ctx: &SimulationContext<'_>) -> Result<(ThresholdParams, DkgCeremony), SimulationError> {
    let config = &ctx.manager.config().threshold;
    let params = ThresholdParams::new(config.threshold, config.parties)?;
    Ok((params, DkgCeremony::new(params)))
}

/// Present a group signature over one proposal as a signature over another.
pub fn simulate_signature_replay(
    ctx: &SimulationContext<'_>,
) -> Result<TestOutcome, SimulationError> {
    let roster = ctx.manager.roster().to_vec();
    let signed = ctx
        .manager
        .execute_secure_consensus(&Proposal::new("pentest-transfer-1"), &roster, None)?;

    let genuine = ctx
        .manager
        .verify_threshold_signature(b"pentest-transfer-1", &signed.signature)?;
    let replayed = ctx
        .manager
        .verify_threshold_signature(b"pentest-transfer-2", &signed.signature)?;

    Ok(outcome(
        "signature_replay",
        genuine && !replayed,
        format!("genuine verifies: {}, replay accepted: {}", genuine, replayed),
    ))
}

/// A signatory submits a corrupted partial signature.
pub fn simulate_partial_signature_manipulation(
    ctx: &SimulationContext<'_>,
) -> Result<TestOutcome, SimulationError> {
    let (params, ceremony) = ceremony(ctx)?;
    let scheme = ThresholdScheme::from_dkg(ceremony.run_with_retries(3)?).with_faulty_signers([1]);
    let message = b"pentest-partial-manipulation";

    // Exactly t signers including the corrupt one cannot reach the threshold.
    let minimal: Vec<u32> = (1..=params.threshold() as u32).collect();
    let forged = scheme.sign(message, &minimal);
    let forged_accepted = forged
        .as_ref()
        .map(|sig| sig.verify(message, scheme.group_public_key()))
        .unwrap_or(false);

    // With spare signatories the corrupt one is dropped and signing recovers.
    let recovered = if params.parties() > params.threshold() {
        let all: Vec<u32> = params.indices().collect();
        scheme
            .sign(message, &all)
            .map(|sig| sig.verify(message, scheme.group_public_key()))
            .unwrap_or(false)
    } else {
        true
    };

    Ok(outcome(
        "partial_signature_manipulation",
        forged.is_err() && !forged_accepted && recovered,
        format!(
            "minimal set rejected: {}, recovery with spare signers: {}",
            forged.is_err(),
            recovered
        ),
    ))
}

/// Reconstruct the group secret from `t − 1` shares.
pub fn simulate_key_recovery(ctx: &SimulationContext<'_>) -> Result<TestOutcome, SimulationError> {
    let (params, ceremony) = ceremony(ctx)?;
    let keys = ceremony.run_with_retries(3)?;
    let stolen: Vec<(u32, Scalar)> = keys
        .secret_shares
        .iter()
        .take(params.threshold().saturating_sub(1))
        .map(|s| (s.index, s.value.clone()))
        .collect();

    let recovered = match interpolate_at_zero(&stolen) {
        Ok(guess) => CurvePoint::mul_generator(&guess) == keys.group_public_key,
        Err(_) => false,
    };

    Ok(outcome(
        "key_recovery",
        !recovered,
        format!(
            "{} of {} shares stolen, secret recovered: {}",
            stolen.len(),
            params.threshold(),
            recovered
        ),
    ))
}

/// Present the same authentication proof twice.
pub fn simulate_proof_replay(ctx: &SimulationContext<'_>) -> Result<TestOutcome, SimulationError> {
    let credential = ctx.manager.generate_auth_proof(&Scalar::random())?;
    let first = ctx.manager.verify_auth_proof(&credential)?;
    let replay = ctx.manager.verify_auth_proof(&credential)?;

    Ok(outcome(
        "zk_proof_replay",
        first && !replay,
        format!("first accepted: {}, replay accepted: {}", first, replay),
    ))
}

/// Forge a proof without the secret by choosing the challenge up front.
pub fn simulate_challenge_prediction(
    ctx: &SimulationContext<'_>,
) -> Result<TestOutcome, SimulationError> {
    let victim = CurvePoint::mul_generator(&Scalar::random());
    let challenge = Scalar::random();
    let response = Scalar::random();
    // z·G = A + c·P holds by construction, but c is not the transcript hash.
    let commitment = CurvePoint::mul_generator(&response).sub(&victim.mul(&challenge));
    let forged = IdentityCredential {
        public_key: victim,
        proof: SchnorrProof {
            commitment,
            challenge,
            response,
            timestamp: ctx.now(),
        },
    };
    let accepted = ctx.manager.verify_auth_proof(&forged)?;

    Ok(outcome(
        "zk_challenge_prediction",
        !accepted,
        format!("forged proof accepted: {}", accepted),
    ))
}

/// Reuse a range proof for a shifted commitment.
pub fn simulate_commitment_manipulation(
    ctx: &SimulationContext<'_>,
) -> Result<TestOutcome, SimulationError> {
    let (commitment, proof) = ctx.manager.generate_range_proof(500, 0, 1_000)?;
    let honest = ctx.manager.verify_range_proof(&commitment, &proof)?;

    let shifted = PedersenCommitment(commitment.point().add(&CurvePoint::generator()));
    let manipulated = ctx.manager.verify_range_proof(&shifted, &proof)?;

    Ok(outcome(
        "zk_commitment_manipulation",
        honest && !manipulated,
        format!(
            "honest proof verifies: {}, shifted commitment accepted: {}",
            honest, manipulated
        ),
    ))
}
