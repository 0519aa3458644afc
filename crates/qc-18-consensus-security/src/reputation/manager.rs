//! Reputation system implementation.

use std::collections::HashMap;

use tracing::{debug, warn};

use super::config::ReputationConfig;
use super::record::{ReputationEventKind, ReputationRecord};
use crate::domain::{Anomaly, NodeId, Severity};

/// Tracks a decaying reputation score per node.
#[derive(Debug)]
pub struct ReputationSystem {
    records: HashMap<NodeId, ReputationRecord>,
    config: ReputationConfig,
}

impl ReputationSystem {
    /// Create an empty system
    pub fn new(config: ReputationConfig) -> Self {
        Self {
            records: HashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &ReputationConfig {
        &self.config
    }

    /// Current score, creating the record on first sight and applying decay.
    pub fn get_score(&mut self, node_id: &str, now: u64) -> f64 {
        self.record_mut(node_id, now).score()
    }

    /// Decayed score of a known node. Unknown nodes return `None`.
    pub fn peek(&self, node_id: &str, now: u64) -> Option<f64> {
        self.records
            .get(node_id)
            .map(|r| r.decayed_score(&self.config, now))
    }

    /// Raw record, as last updated.
    pub fn record(&self, node_id: &str) -> Option<&ReputationRecord> {
        self.records.get(node_id)
    }

    /// Apply the penalty for one anomaly of `severity`.
    pub fn penalize(&mut self, node_id: &str, severity: Severity, now: u64) -> f64 {
        let penalty = match severity {
            Severity::High => self.config.high_penalty,
            Severity::Medium => self.config.medium_penalty,
            Severity::Low => self.config.low_penalty,
        };
        let config = self.config.clone();
        let record = self.record_mut(node_id, now);
        record.adjust(&config, ReputationEventKind::Penalty(severity), -penalty, now);
        let score = record.score();
        if score < config.blacklist_threshold {
            warn!(node = %node_id, score, "Node reputation below blacklist threshold");
        }
        score
    }

    /// Reward a node for a clean round.
    pub fn reward(&mut self, node_id: &str, now: u64) -> f64 {
        let config = self.config.clone();
        let record = self.record_mut(node_id, now);
        record.adjust(
            &config,
            ReputationEventKind::Reward,
            config.participation_reward,
            now,
        );
        record.score()
    }

    /// Penalize every participant once per anomaly that implicates it and
    /// reward the participants no anomaly implicates.
    pub fn apply_round_outcome(&mut self, participants: &[NodeId], anomalies: &[Anomaly], now: u64) {
        for node in participants {
            let implicated: Vec<Severity> = anomalies
                .iter()
                .filter(|a| a.involves(node))
                .map(|a| a.severity)
                .collect();
            if implicated.is_empty() {
                self.reward(node, now);
            } else {
                for severity in implicated {
                    self.penalize(node, severity, now);
                }
            }
        }
        debug!(
            participants = participants.len(),
            anomalies = anomalies.len(),
            "Applied round outcome to reputation"
        );
    }

    /// Whether a known node's decayed score is below the blacklist threshold.
    pub fn is_blacklist_eligible(&self, node_id: &str, now: u64) -> bool {
        self.peek(node_id, now)
            .map(|score| score < self.config.blacklist_threshold)
            .unwrap_or(false)
    }

    /// All blacklist-eligible nodes, sorted.
    pub fn blacklist_candidates(&self, now: u64) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = self
            .records
            .keys()
            .filter(|node| self.is_blacklist_eligible(node, now))
            .cloned()
            .collect();
        nodes.sort();
        nodes
    }

    /// Mean decayed score over known nodes.
    pub fn average_score(&self, now: u64) -> Option<f64> {
        if self.records.is_empty() {
            return None;
        }
        let total: f64 = self
            .records
            .values()
            .map(|r| r.decayed_score(&self.config, now))
            .sum();
        Some(total / self.records.len() as f64)
    }

    /// Number of tracked nodes
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn record_mut(&mut self, node_id: &str, now: u64) -> &mut ReputationRecord {
        let config = &self.config;
        let record = self
            .records
            .entry(node_id.to_string())
            .or_insert_with(|| ReputationRecord::new(node_id.to_string(), config, now));
        record.apply_decay(config, now);
        record
    }
}

impl Default for ReputationSystem {
    fn default() -> Self {
        Self::new(ReputationConfig::default())
    }
}
