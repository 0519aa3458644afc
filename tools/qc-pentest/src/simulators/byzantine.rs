//! Equivocating voters.
//!
//! A third of the roster (at least one node) votes for the round's block and,
//! a few milliseconds later, for a conflicting one. Every such node must be
//! flagged HIGH in every round, and no honest node may be.

use std::collections::BTreeSet;

use qc_18_consensus_security::{
    AnomalyKind, ConsensusRound, NodeId, Proposal, RoundMessage, Severity,
};
use rand::Rng;
use tracing::info;

use super::{random_hex, SimulationContext};
use crate::error::SimulationError;
use crate::outcome::{ratio, TestCategory, TestOutcome};

const SLOT_MS: u64 = 400;
const ROUND_GAP_MS: u64 = 10_000;

pub fn simulate_byzantine(
    ctx: &SimulationContext<'_>,
    rounds: usize,
) -> Result<TestOutcome, SimulationError> {
    let roster = ctx.manager.roster().to_vec();
    if roster.len() < 2 {
        return Err(SimulationError::Setup(
            "byzantine scenario needs at least two roster nodes".into(),
        ));
    }
    let malicious_count = ((roster.len() - 1) / 3).max(1);
    let malicious: BTreeSet<&str> = roster
        .iter()
        .rev()
        .take(malicious_count)
        .map(String::as_str)
        .collect();

    let mut rng = rand::thread_rng();
    let mut detected = 0usize;
    let mut false_positives = BTreeSet::new();

    for r in 0..rounds {
        let base = ctx.now();
        let block = format!("block-{}", r);
        let mut messages = Vec::new();
        for (slot, node) in roster.iter().enumerate() {
            let ts = base + slot as u64 * SLOT_MS;
            messages.push(vote(node, &block, ts, random_hex(&mut rng, 16)));
            if malicious.contains(node.as_str()) {
                let offset = rng.gen_range(1..20);
                messages.push(vote(
                    node,
                    &format!("block-{}-fork", r),
                    ts + offset,
                    random_hex(&mut rng, 16),
                ));
            }
        }
        let round = ConsensusRound {
            id: format!("pentest-byzantine-{}", r),
            participants: roster.clone(),
            messages,
            proposal: block.clone(),
        };

        let result =
            ctx.manager
                .execute_secure_consensus(&Proposal::with_hash(block), &roster, Some(&round))?;

        let flagged: BTreeSet<&str> = result
            .security_analysis
            .anomalies
            .iter()
            .filter(|a| a.kind == AnomalyKind::ContradictoryMessages && a.severity == Severity::High)
            .flat_map(|a| a.nodes.iter().map(String::as_str))
            .collect();
        detected += malicious.iter().filter(|n| flagged.contains(*n)).count();
        false_positives.extend(
            flagged
                .iter()
                .filter(|n| !malicious.contains(*n))
                .map(|n| n.to_string()),
        );

        ctx.clock.advance(ROUND_GAP_MS);
    }

    let expected = malicious_count * rounds;
    let detection_rate = ratio(detected, expected);
    let passed = rounds > 0 && detected == expected && false_positives.is_empty();
    info!(
        detected,
        expected,
        false_positives = false_positives.len(),
        "Byzantine simulation finished"
    );

    Ok(TestOutcome::new("byzantine_equivocation", TestCategory::Byzantine, passed)
        .with_metric("detection_rate", detection_rate)
        .with_metric("malicious_nodes", malicious_count as f64)
        .with_metric("false_positives", false_positives.len() as f64)
        .with_details(format!(
            "{}/{} equivocations detected over {} rounds{}",
            detected,
            expected,
            rounds,
            if false_positives.is_empty() {
                String::new()
            } else {
                format!(
                    ", honest nodes flagged: {}",
                    false_positives.into_iter().collect::<Vec<NodeId>>().join(",")
                )
            }
        )))
}

fn vote(node: &str, proposal: &str, timestamp: u64, signature: String) -> RoundMessage {
    RoundMessage {
        node_id: node.to_string(),
        message_type: "vote".to_string(),
        proposal: proposal.to_string(),
        timestamp,
        signature,
    }
}
