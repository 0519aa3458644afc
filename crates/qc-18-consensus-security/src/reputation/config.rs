//! Reputation configuration.

use serde::{Deserialize, Serialize};

/// Reputation scoring configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReputationConfig {
    /// Score assigned to a node on first sight
    pub initial_score: f64,
    /// Multiplier applied once per full decay period
    pub decay_factor: f64,
    /// Decay period (ms)
    pub decay_period_ms: u64,

    /// Penalty per HIGH anomaly in a round
    pub high_penalty: f64,
    /// Penalty per MEDIUM anomaly in a round
    pub medium_penalty: f64,
    /// Penalty per LOW anomaly in a round
    pub low_penalty: f64,
    /// Reward for a clean round
    pub participation_reward: f64,

    /// Score below which a node is blacklist-eligible
    pub blacklist_threshold: f64,
    /// Events retained per node
    pub max_history: usize,
}

impl Default for ReputationConfig {
    fn default() -> Self {
        Self {
            initial_score: 0.5,
            decay_factor: 0.95,
            decay_period_ms: 86_400_000,
            high_penalty: 0.2,
            medium_penalty: 0.1,
            low_penalty: 0.05,
            participation_reward: 0.01,
            blacklist_threshold: 0.1,
            max_history: 100,
        }
    }
}

impl ReputationConfig {
    /// One-minute decay period, short history.
    pub fn for_testing() -> Self {
        Self {
            decay_period_ms: 60_000,
            max_history: 10,
            ..Self::default()
        }
    }
}
