//! Per-node reputation record.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::config::ReputationConfig;
use crate::domain::{NodeId, Severity};

/// Why a score changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReputationEventKind {
    Penalty(Severity),
    Reward,
    Decay,
}

/// One score change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReputationEvent {
    pub kind: ReputationEventKind,
    pub delta: f64,
    pub timestamp: u64,
}

/// Reputation of a single node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReputationRecord {
    pub node_id: NodeId,
    score: f64,
    last_update: u64,
    history: VecDeque<ReputationEvent>,
}

impl ReputationRecord {
    /// Fresh record at the configured initial score.
    pub fn new(node_id: NodeId, config: &ReputationConfig, now: u64) -> Self {
        Self {
            node_id,
            score: config.initial_score.clamp(0.0, 1.0),
            last_update: now,
            history: VecDeque::new(),
        }
    }

    /// Score as of the last applied update.
    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn last_update(&self) -> u64 {
        self.last_update
    }

    /// Events, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &ReputationEvent> {
        self.history.iter()
    }

    /// Score after decay up to `now`, without mutating the record.
    pub fn decayed_score(&self, config: &ReputationConfig, now: u64) -> f64 {
        let periods = self.elapsed_periods(config, now);
        if periods == 0 {
            return self.score;
        }
        (self.score * config.decay_factor.powi(periods.min(i32::MAX as u64) as i32))
            .clamp(0.0, 1.0)
    }

    /// Apply decay for every full period since the last update. `last_update`
    /// moves forward by whole periods so partial periods carry over.
    pub fn apply_decay(&mut self, config: &ReputationConfig, now: u64) {
        let periods = self.elapsed_periods(config, now);
        if periods == 0 {
            return;
        }
        let before = self.score;
        self.score = self.decayed_score(config, now);
        self.last_update = self
            .last_update
            .saturating_add(periods.saturating_mul(config.decay_period_ms));
        self.push_event(
            config,
            ReputationEventKind::Decay,
            self.score - before,
            now,
        );
    }

    /// Add `delta` (clamped) and record why.
    pub fn adjust(
        &mut self,
        config: &ReputationConfig,
        kind: ReputationEventKind,
        delta: f64,
        now: u64,
    ) {
        let before = self.score;
        self.score = (self.score + delta).clamp(0.0, 1.0);
        self.push_event(config, kind, self.score - before, now);
    }

    fn elapsed_periods(&self, config: &ReputationConfig, now: u64) -> u64 {
        if config.decay_period_ms == 0 {
            return 0;
        }
        now.saturating_sub(self.last_update) / config.decay_period_ms
    }

    fn push_event(
        &mut self,
        config: &ReputationConfig,
        kind: ReputationEventKind,
        delta: f64,
        timestamp: u64,
    ) {
        if config.max_history == 0 {
            return;
        }
        while self.history.len() >= config.max_history {
            self.history.pop_front();
        }
        self.history.push_back(ReputationEvent {
            kind,
            delta,
            timestamp,
        });
    }
}
