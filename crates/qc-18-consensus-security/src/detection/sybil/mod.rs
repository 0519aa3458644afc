//! # Sybil Resistance
//!
//! A join request is accepted when it satisfies enough independent identity
//! factors and its source shows no suspicious join pattern.
//!
//! ## Factors
//!
//! | Factor | Check |
//! |--------|-------|
//! | Proof of work | `SHA256(node_id ‖ nonce)` has `pow_difficulty` leading zero bits |
//! | Stake | ECDSA stake proof over `node_id ‖ amount`, `amount >= min_stake` |
//! | Credentials | fresh, unreplayed Schnorr proof of the identity key, bound to `node_id` |
//! | Reputation | existing record with score `>= min_reputation` |
//!
//! ## Patterns
//!
//! More than `max_joins_per_ip` attempts from one IP within `ip_window_ms`, or
//! more than `max_global_joins` attempts within `global_window_ms`. Every
//! attempt counts, accepted or not.
//!
//! The replay cache is shared with authentication, so a proof consumed by one
//! path is not accepted by the other.

mod tracker;

#[cfg(test)]
mod tests;

pub use tracker::JoinAttemptTracker;

use std::sync::Arc;

use qc_zkp::ProofGuard;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{NodeId, NodeJoinRequest};

/// Sybil guard configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SybilConfig {
    /// Required leading zero bits
    pub pow_difficulty: u32,
    /// Minimum stake amount
    pub min_stake: u64,
    /// Minimum prior reputation
    pub min_reputation: f64,
    /// Factors required for acceptance
    pub min_factors: usize,
    /// Attempts allowed per IP per window
    pub max_joins_per_ip: usize,
    /// Per-IP window (ms)
    pub ip_window_ms: u64,
    /// Attempts allowed globally per window
    pub max_global_joins: usize,
    /// Global window (ms)
    pub global_window_ms: u64,
}

impl Default for SybilConfig {
    fn default() -> Self {
        Self {
            pow_difficulty: 16,
            min_stake: 1_000,
            min_reputation: 0.3,
            min_factors: 2,
            max_joins_per_ip: 3,
            ip_window_ms: 3_600_000,
            max_global_joins: 10,
            global_window_ms: 60_000,
        }
    }
}

/// Which identity factors a request satisfied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SybilFactors {
    pub proof_of_work: bool,
    pub stake: bool,
    pub credentials: bool,
    pub reputation: bool,
}

impl SybilFactors {
    pub fn count(&self) -> usize {
        [
            self.proof_of_work,
            self.stake,
            self.credentials,
            self.reputation,
        ]
        .iter()
        .filter(|f| **f)
        .count()
    }
}

/// Outcome of evaluating one join request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinAssessment {
    pub node_id: NodeId,
    pub accepted: bool,
    pub factors: SybilFactors,
    /// Suspicious patterns observed for the request's source
    pub patterns: Vec<String>,
}

impl JoinAssessment {
    /// Human-readable rejection reason.
    pub fn reason(&self, min_factors: usize) -> String {
        let mut reasons = Vec::new();
        if self.factors.count() < min_factors {
            reasons.push(format!(
                "{} of {} required identity factors",
                self.factors.count(),
                min_factors
            ));
        }
        reasons.extend(self.patterns.iter().cloned());
        reasons.join("; ")
    }
}

/// Join-request gatekeeper.
#[derive(Debug)]
pub struct SybilGuard {
    config: SybilConfig,
    proof_guard: Arc<ProofGuard>,
    attempts: JoinAttemptTracker,
}

impl SybilGuard {
    pub fn new(config: SybilConfig, proof_guard: Arc<ProofGuard>) -> Self {
        let retention = config.ip_window_ms.max(config.global_window_ms);
        Self {
            config,
            proof_guard,
            attempts: JoinAttemptTracker::new(retention),
        }
    }

    pub fn config(&self) -> &SybilConfig {
        &self.config
    }

    /// Attempts currently remembered.
    pub fn tracked_attempts(&self) -> usize {
        self.attempts.len()
    }

    /// Score the request's factors, record the attempt and check patterns.
    ///
    /// `prior_reputation` is the node's existing score, `None` if unknown.
    pub fn evaluate(
        &mut self,
        request: &NodeJoinRequest,
        prior_reputation: Option<f64>,
        now: u64,
    ) -> JoinAssessment {
        let factors = self.score_factors(request, prior_reputation, now);

        self.attempts.record(&request.ip, now);
        let patterns = self.suspicious_patterns(&request.ip, now);

        let accepted = factors.count() >= self.config.min_factors && patterns.is_empty();
        let assessment = JoinAssessment {
            node_id: request.node_id.clone(),
            accepted,
            factors,
            patterns,
        };

        if accepted {
            debug!(
                node = %request.node_id,
                factors = factors.count(),
                "Join request accepted"
            );
        } else {
            warn!(
                node = %request.node_id,
                ip = %request.ip,
                factors = factors.count(),
                reason = %assessment.reason(self.config.min_factors),
                "Join request rejected"
            );
        }
        assessment
    }

    fn score_factors(
        &self,
        request: &NodeJoinRequest,
        prior_reputation: Option<f64>,
        now: u64,
    ) -> SybilFactors {
        let proof_of_work = request
            .proof_of_work
            .map(|pow| pow.is_valid(&request.node_id, self.config.pow_difficulty))
            .unwrap_or(false);

        let stake = request
            .stake_proof
            .as_ref()
            .map(|s| s.is_valid(&request.node_id, self.config.min_stake))
            .unwrap_or(false);

        let credentials = match &request.credentials {
            Some(credential) => match self.proof_guard.verify_with_context(
                &credential.proof,
                &credential.public_key,
                request.node_id.as_bytes(),
                now,
            ) {
                Ok(()) => true,
                Err(e) => {
                    debug!(node = %request.node_id, error = %e, "Credential rejected");
                    false
                }
            },
            None => false,
        };

        let reputation = prior_reputation
            .map(|score| score >= self.config.min_reputation)
            .unwrap_or(false);

        SybilFactors {
            proof_of_work,
            stake,
            credentials,
            reputation,
        }
    }

    fn suspicious_patterns(&self, ip: &str, now: u64) -> Vec<String> {
        let mut patterns = Vec::new();
        let from_ip = self.attempts.count_from(ip, self.config.ip_window_ms, now);
        if from_ip > self.config.max_joins_per_ip {
            patterns.push(format!(
                "{} join attempts from {} within {} ms",
                from_ip, ip, self.config.ip_window_ms
            ));
        }
        let global = self.attempts.count_all(self.config.global_window_ms, now);
        if global > self.config.max_global_joins {
            patterns.push(format!(
                "{} join attempts network-wide within {} ms",
                global, self.config.global_window_ms
            ));
        }
        patterns
    }
}
