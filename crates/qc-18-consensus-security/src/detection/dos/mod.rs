//! # Denial-of-Service Mitigation
//!
//! Filters a batch of inbound requests. Each source passes through these layers
//! in order:
//!
//! 1. **Blacklist**: sources that scored at or above `blacklist_threshold`
//!    are dropped for `blacklist_duration_ms`
//! 2. **Circuit breaker**: opens after `circuit_failure_threshold` flagged
//!    batches, half-opens after `circuit_open_duration_ms`
//! 3. **Scoring**: weighted traffic features (see [`SourceFeatures`]);
//!    `score >= flag_threshold` drops the source for this batch
//! 4. **Rate limit**: at most `max_requests_per_source` per batch
//!
//! Surviving requests are ordered by priority class (authenticated, then
//! token-bearing, then established, then the rest), stable within a class.
//!
//! Per-source baselines and closed circuits not seen for `source_idle_ttl_ms`
//! are forgotten at the start of each batch.

mod analysis;
mod circuit_breaker;


pub use analysis::{DosWeights, SourceFeatures};
pub use circuit_breaker::{CircuitBreakerManager, CircuitState};

use std::cmp::Reverse;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::InboundRequest;

/// DoS mitigator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DosConfig {
    pub weights: DosWeights,
    /// Request rate that saturates the frequency feature
    pub frequency_saturation_rps: f64,
    /// Average size that saturates the size feature
    pub size_saturation_bytes: u64,
    /// Requests needed before regularity is scored
    pub min_regularity_samples: usize,
    /// Baseline assigned to unseen sources (rps)
    pub initial_baseline_rps: f64,
    /// EMA smoothing factor
    pub baseline_alpha: f64,
    /// Rate multiple of the baseline that saturates the deviation feature
    pub baseline_multiplier: f64,
    /// Score at which a source is dropped for the batch
    pub flag_threshold: f64,
    /// Score at which a source is blacklisted
    pub blacklist_threshold: f64,
    pub blacklist_duration_ms: u64,
    /// Flagged batches before the circuit opens
    pub circuit_failure_threshold: u32,
    pub circuit_open_duration_ms: u64,
    /// Requests accepted per source per batch
    pub max_requests_per_source: usize,
    /// Idle time after which a source's baseline and circuit are dropped
    pub source_idle_ttl_ms: u64,
}

impl Default for DosConfig {
    fn default() -> Self {
        Self {
            weights: DosWeights::default(),
            frequency_saturation_rps: 5.0,
            size_saturation_bytes: 8_192,
            min_regularity_samples: 5,
            initial_baseline_rps: 0.1,
            baseline_alpha: 0.1,
            baseline_multiplier: 5.0,
            flag_threshold: 0.5,
            blacklist_threshold: 0.8,
            blacklist_duration_ms: 3_600_000,
            circuit_failure_threshold: 3,
            circuit_open_duration_ms: 300_000,
            max_requests_per_source: 200,
            source_idle_ttl_ms: 3_600_000,
        }
    }
}

/// Why a source's requests were dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DosAction {
    Allowed,
    Blacklisted,
    CircuitOpen,
    Flagged,
    RateLimited,
}

/// Decision for one source in one batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceVerdict {
    pub source: String,
    pub action: DosAction,
    /// Present when the source was scored
    pub score: Option<f64>,
    pub requests: usize,
    pub dropped: usize,
}

/// Result of filtering one batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DosReport {
    /// Requests to serve, in priority order
    pub allowed: Vec<InboundRequest>,
    pub blocked_count: usize,
    pub verdicts: Vec<SourceVerdict>,
    /// Sources blacklisted by this batch, with expiry (ms)
    pub newly_blacklisted: Vec<(String, u64)>,
}

impl DosReport {
    /// Verdicts other than `Allowed`.
    pub fn offenders(&self) -> impl Iterator<Item = &SourceVerdict> {
        self.verdicts
            .iter()
            .filter(|v| v.action != DosAction::Allowed)
    }
}

#[derive(Debug, Clone, Copy)]
struct Baseline {
    rps: f64,
    last_seen: u64,
}

/// Stateful request filter.
#[derive(Debug)]
pub struct DosMitigator {
    config: DosConfig,
    blacklist: HashMap<String, u64>,
    baselines: HashMap<String, Baseline>,
    breakers: CircuitBreakerManager,
}

impl DosMitigator {
    pub fn new(config: DosConfig) -> Self {
        let breakers = CircuitBreakerManager::new(
            config.circuit_failure_threshold,
            config.circuit_open_duration_ms,
        );
        Self {
            config,
            blacklist: HashMap::new(),
            baselines: HashMap::new(),
            breakers,
        }
    }

    pub fn config(&self) -> &DosConfig {
        &self.config
    }

    /// Whether `source` is blacklisted at `now`.
    pub fn is_blacklisted(&self, source: &str, now: u64) -> bool {
        self.blacklist
            .get(source)
            .map(|until| *until > now)
            .unwrap_or(false)
    }

    /// Blacklist `source` until `until` (ms). Longer existing entries win.
    pub fn blacklist_until(&mut self, source: &str, until: u64) {
        let entry = self.blacklist.entry(source.to_string()).or_insert(until);
        *entry = (*entry).max(until);
    }

    /// Number of live blacklist entries.
    pub fn blacklist_len(&self, now: u64) -> usize {
        self.blacklist.values().filter(|until| **until > now).count()
    }

    /// Current EMA baseline for `source`.
    pub fn baseline(&self, source: &str) -> f64 {
        self.baselines
            .get(source)
            .map(|b| b.rps)
            .unwrap_or(self.config.initial_baseline_rps)
    }

    /// Sources with a learned baseline.
    pub fn tracked_baselines(&self) -> usize {
        self.baselines.len()
    }

    /// Sources with a circuit on record.
    pub fn tracked_circuits(&self) -> usize {
        self.breakers.tracked()
    }

    pub fn circuit_state(&self, source: &str) -> CircuitState {
        self.breakers.get_state(source)
    }

    pub fn open_circuits(&self) -> usize {
        self.breakers.open_circuits()
    }

    /// Filter one batch of requests.
    pub fn filter(&mut self, requests: Vec<InboundRequest>, now: u64) -> DosReport {
        self.evict_idle(now);

        let mut order: Vec<String> = Vec::new();
        let mut by_source: HashMap<String, Vec<(usize, InboundRequest)>> = HashMap::new();
        for (arrival, request) in requests.into_iter().enumerate() {
            if !by_source.contains_key(&request.source) {
                order.push(request.source.clone());
            }
            by_source
                .entry(request.source.clone())
                .or_default()
                .push((arrival, request));
        }

        let mut report = DosReport::default();
        let mut allowed: Vec<(usize, InboundRequest)> = Vec::new();
        for source in order {
            let Some(batch) = by_source.remove(&source) else {
                continue;
            };
            let verdict = self.judge(&source, batch, now, &mut allowed, &mut report);
            report.verdicts.push(verdict);
        }

        allowed.sort_by_key(|(arrival, r)| (Reverse(r.priority()), *arrival));
        report.allowed = allowed.into_iter().map(|(_, r)| r).collect();

        if report.blocked_count > 0 {
            warn!(
                blocked = report.blocked_count,
                allowed = report.allowed.len(),
                offenders = report.offenders().count(),
                "DoS mitigation dropped requests"
            );
        }
        report
    }

    fn evict_idle(&mut self, now: u64) {
        let ttl = self.config.source_idle_ttl_ms;
        self.blacklist.retain(|_, until| *until > now);
        let before = self.baselines.len();
        self.baselines
            .retain(|_, b| now.saturating_sub(b.last_seen) <= ttl);
        let baselines = before - self.baselines.len();
        let circuits = self.breakers.prune_idle(now, ttl);
        if baselines + circuits > 0 {
            debug!(baselines, circuits, "Evicted idle source state");
        }
    }

    fn judge(
        &mut self,
        source: &str,
        mut batch: Vec<(usize, InboundRequest)>,
        now: u64,
        allowed: &mut Vec<(usize, InboundRequest)>,
        report: &mut DosReport,
    ) -> SourceVerdict {
        let requests = batch.len();
        let mut verdict = SourceVerdict {
            source: source.to_string(),
            action: DosAction::Allowed,
            score: None,
            requests,
            dropped: 0,
        };

        if self.is_blacklisted(source, now) {
            verdict.action = DosAction::Blacklisted;
        } else if !self.breakers.should_allow(source, now) {
            verdict.action = DosAction::CircuitOpen;
        } else {
            let baseline = self.baseline(source);
            let refs: Vec<&InboundRequest> = batch.iter().map(|(_, r)| r).collect();
            let features =
                SourceFeatures::extract(&refs, baseline, self.config.min_regularity_samples);
            let score = features.score(&self.config);
            verdict.score = Some(score);

            if score >= self.config.flag_threshold {
                verdict.action = DosAction::Flagged;
                self.breakers.record_failure(source, now);
                if score >= self.config.blacklist_threshold {
                    let until = now.saturating_add(self.config.blacklist_duration_ms);
                    self.blacklist_until(source, until);
                    report.newly_blacklisted.push((source.to_string(), until));
                }
                debug!(source = %source, score, requests, "Source flagged");
            } else {
                self.breakers.record_success(source, now);
                let alpha = self.config.baseline_alpha;
                self.baselines.insert(
                    source.to_string(),
                    Baseline {
                        rps: alpha * features.frequency_rps + (1.0 - alpha) * baseline,
                        last_seen: now,
                    },
                );
            }
        }

        if verdict.action == DosAction::Allowed {
            let cap = self.config.max_requests_per_source;
            if batch.len() > cap {
                verdict.dropped = batch.len() - cap;
                verdict.action = DosAction::RateLimited;
                batch.truncate(cap);
            }
            allowed.extend(batch);
        } else {
            verdict.dropped = requests;
        }
        report.blocked_count += verdict.dropped;
        verdict
    }
}

impl Default for DosMitigator {
    fn default() -> Self {
        Self::new(DosConfig::default())
    }
}
