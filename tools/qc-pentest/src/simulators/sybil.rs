//! Sybil join burst.
//!
//! Identities from sequential addresses, joining at the same instant, each
//! carrying a proof of work below the required difficulty and a stake below
//! the minimum. One well-formed node joins first as a control.

use qc_18_consensus_security::{
    IdentityCredential, NodeJoinRequest, ProofOfWork, SecurityError, StakeProof,
};
use shared_crypto::{EcdsaKeyPair, Scalar};
use tracing::{debug, info};

use super::{thresholds, SimulationContext};
use crate::error::SimulationError;
use crate::outcome::{ratio, TestCategory, TestOutcome};

const POW_SEARCH_LIMIT: u64 = 1 << 24;

pub fn simulate_sybil(
    ctx: &SimulationContext<'_>,
    sybil_nodes: usize,
) -> Result<TestOutcome, SimulationError> {
    let sybil_config = ctx.manager.config().sybil.clone();
    let now = ctx.now();

    let control_accepted = {
        let node = "pentest-honest-joiner";
        let pow = ProofOfWork::solve(node, sybil_config.pow_difficulty, POW_SEARCH_LIMIT)
            .ok_or_else(|| SimulationError::Setup("proof of work not found".into()))?;
        let credential = IdentityCredential::for_node(&Scalar::random(), node, now)?;
        let staker = EcdsaKeyPair::generate();
        let stake = StakeProof::create(node, sybil_config.min_stake, &staker)
            .map_err(|e| SimulationError::Setup(e.to_string()))?;
        let request = NodeJoinRequest::new(node, "198.51.100.200", now)
            .with_proof_of_work(pow)
            .with_credentials(credential)
            .with_stake(stake);
        join(ctx, &request)?
    };

    let mut rejected = 0usize;
    for i in 0..sybil_nodes {
        let node = format!("pentest-sybil-{}", i);
        let staker = EcdsaKeyPair::generate();
        let stake = StakeProof::create(&node, sybil_config.min_stake / 10, &staker)
            .map_err(|e| SimulationError::Setup(e.to_string()))?;
        let request = NodeJoinRequest::new(node.clone(), format!("10.0.0.{}", i + 1), now)
            .with_proof_of_work(weak_pow(&node, sybil_config.pow_difficulty))
            .with_stake(stake);
        if !join(ctx, &request)? {
            rejected += 1;
        }
    }

    let block_rate = ratio(rejected, sybil_nodes);
    let passed = sybil_nodes > 0 && block_rate >= thresholds::SYBIL_BLOCK_RATE;
    info!(rejected, total = sybil_nodes, control_accepted, "Sybil simulation finished");

    Ok(TestOutcome::new("sybil_join_burst", TestCategory::Sybil, passed)
        .with_metric("block_rate", block_rate)
        .with_metric("control_accepted", if control_accepted { 1.0 } else { 0.0 })
        .with_details(format!(
            "{}/{} sybil joins rejected (threshold {:.0}%)",
            rejected,
            sybil_nodes,
            thresholds::SYBIL_BLOCK_RATE * 100.0
        )))
}

/// Accepted → `true`, rejected → `false`; other errors propagate.
fn join(ctx: &SimulationContext<'_>, request: &NodeJoinRequest) -> Result<bool, SimulationError> {
    match ctx.manager.validate_node_join(request) {
        Ok(_) => Ok(true),
        Err(SecurityError::JoinRejected { reason, .. }) => {
            debug!(node = %request.node_id, reason = %reason, "Join rejected");
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

/// First nonce whose work falls short of `difficulty`.
fn weak_pow(node: &str, difficulty: u32) -> ProofOfWork {
    (0u64..1 << 16)
        .map(|nonce| ProofOfWork { nonce })
        .find(|pow| pow.work(node) < difficulty)
        .unwrap_or(ProofOfWork { nonce: 0 })
}
