//! # Byzantine Behaviour Detection
//!
//! Analyses the messages of one consensus round for:
//!
//! - **Contradictions**: one node voting for two proposals inside the
//!   contradiction window (HIGH)
//! - **Timing anomalies**: timestamps far from the round mean (MEDIUM)
//! - **Collusion**: several nodes inside one time bucket (LOW), or
//!   near-identical message content from different nodes (MEDIUM)
//!
//! Detection never fails. An empty vector means nothing was found.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{Anomaly, AnomalyKind, ConsensusRound, NodeId, RoundMessage, Severity};

/// Byzantine detector configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ByzantineConfig {
    /// Max distance between contradicting messages (ms)
    pub contradiction_window_ms: u64,
    /// Max deviation from the round's mean timestamp (ms)
    pub timing_threshold_ms: u64,
    /// Collusion bucket width (ms)
    pub collusion_bucket_ms: u64,
    /// Distinct nodes in one bucket that count as collusion
    pub collusion_min_nodes: usize,
    /// Jaccard similarity above which content counts as copied
    pub similarity_threshold: f64,
    /// Character shingle length
    pub shingle_size: usize,
}

impl Default for ByzantineConfig {
    fn default() -> Self {
        Self {
            contradiction_window_ms: 1_000,
            timing_threshold_ms: 5_000,
            collusion_bucket_ms: 100,
            collusion_min_nodes: 3,
            similarity_threshold: 0.9,
            shingle_size: 3,
        }
    }
}

/// Stateless round analyser.
#[derive(Debug, Clone, Default)]
pub struct ByzantineDetector {
    config: ByzantineConfig,
}

impl ByzantineDetector {
    pub fn new(config: ByzantineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ByzantineConfig {
        &self.config
    }

    /// Run every check over the round.
    pub fn analyze(&self, round: &ConsensusRound) -> Vec<Anomaly> {
        let mut anomalies = Vec::new();
        anomalies.extend(self.detect_contradictions(&round.messages));
        anomalies.extend(self.detect_timing_anomalies(&round.messages));
        anomalies.extend(self.detect_timing_collusion(&round.messages));
        anomalies.extend(self.detect_content_collusion(&round.messages));

        if !anomalies.is_empty() {
            debug!(
                round = %round.id,
                anomalies = anomalies.len(),
                "Byzantine analysis found anomalies"
            );
        }
        anomalies
    }

    /// One HIGH anomaly per node that voted for two proposals within the window.
    pub fn detect_contradictions(&self, messages: &[RoundMessage]) -> Vec<Anomaly> {
        let mut by_node: BTreeMap<&str, Vec<&RoundMessage>> = BTreeMap::new();
        for message in messages {
            by_node.entry(message.node_id.as_str()).or_default().push(message);
        }

        let mut anomalies = Vec::new();
        for (node, mut sent) in by_node {
            sent.sort_by_key(|m| m.timestamp);
            let window = self.config.contradiction_window_ms;
            let contradiction = sent.iter().enumerate().find_map(|(i, a)| {
                sent[i + 1..]
                    .iter()
                    .take_while(|b| b.timestamp - a.timestamp <= window)
                    .find(|b| b.proposal != a.proposal)
                    .map(|b| (*a, *b))
            });
            if let Some((a, b)) = contradiction {
                anomalies.push(Anomaly::new(
                    AnomalyKind::ContradictoryMessages,
                    Severity::High,
                    vec![node.to_string()],
                    format!(
                        "node {} sent '{}' and '{}' {} ms apart",
                        node,
                        a.proposal,
                        b.proposal,
                        b.timestamp - a.timestamp
                    ),
                ));
            }
        }
        anomalies
    }

    /// One MEDIUM anomaly per node with a message far from the round mean.
    pub fn detect_timing_anomalies(&self, messages: &[RoundMessage]) -> Vec<Anomaly> {
        if messages.is_empty() {
            return Vec::new();
        }
        let mean =
            messages.iter().map(|m| m.timestamp as f64).sum::<f64>() / messages.len() as f64;

        let mut flagged: BTreeMap<&str, f64> = BTreeMap::new();
        for message in messages {
            let deviation = (message.timestamp as f64 - mean).abs();
            if deviation > self.config.timing_threshold_ms as f64 {
                let worst = flagged.entry(message.node_id.as_str()).or_insert(0.0);
                *worst = worst.max(deviation);
            }
        }

        flagged
            .into_iter()
            .map(|(node, deviation)| {
                Anomaly::new(
                    AnomalyKind::TimingAnomaly,
                    Severity::Medium,
                    vec![node.to_string()],
                    format!("node {} deviates {:.0} ms from round mean", node, deviation),
                )
            })
            .collect()
    }

    /// LOW anomaly for every time bucket shared by enough distinct nodes.
    pub fn detect_timing_collusion(&self, messages: &[RoundMessage]) -> Vec<Anomaly> {
        let bucket_ms = self.config.collusion_bucket_ms.max(1);
        let mut buckets: BTreeMap<u64, BTreeSet<&str>> = BTreeMap::new();
        for message in messages {
            buckets
                .entry(message.timestamp / bucket_ms)
                .or_default()
                .insert(message.node_id.as_str());
        }

        buckets
            .into_iter()
            .filter(|(_, nodes)| nodes.len() >= self.config.collusion_min_nodes)
            .map(|(bucket, nodes)| {
                let count = nodes.len();
                Anomaly::new(
                    AnomalyKind::CollusionTiming,
                    Severity::Low,
                    nodes.into_iter().map(str::to_string).collect(),
                    format!(
                        "{} nodes sent within {} ms window starting at {}",
                        count,
                        bucket_ms,
                        bucket * bucket_ms
                    ),
                )
            })
            .collect()
    }

    /// MEDIUM anomaly per node pair whose message content is near-identical.
    pub fn detect_content_collusion(&self, messages: &[RoundMessage]) -> Vec<Anomaly> {
        let shingled: Vec<(&str, HashSet<String>)> = messages
            .iter()
            .map(|m| {
                (
                    m.node_id.as_str(),
                    shingles(&m.serialized_content(), self.config.shingle_size),
                )
            })
            .collect();

        let mut pairs: BTreeSet<(NodeId, NodeId)> = BTreeSet::new();
        let mut anomalies = Vec::new();
        for (i, (node_a, set_a)) in shingled.iter().enumerate() {
            for (node_b, set_b) in &shingled[i + 1..] {
                if node_a == node_b {
                    continue;
                }
                let pair = if node_a < node_b {
                    (node_a.to_string(), node_b.to_string())
                } else {
                    (node_b.to_string(), node_a.to_string())
                };
                if pairs.contains(&pair) {
                    continue;
                }
                let similarity = jaccard(set_a, set_b);
                if similarity > self.config.similarity_threshold {
                    anomalies.push(Anomaly::new(
                        AnomalyKind::CollusionSimilarity,
                        Severity::Medium,
                        vec![pair.0.clone(), pair.1.clone()],
                        format!(
                            "nodes {} and {} sent messages with similarity {:.2}",
                            pair.0, pair.1, similarity
                        ),
                    ));
                    pairs.insert(pair);
                }
            }
        }
        anomalies
    }
}

/// Character n-gram shingles. Strings shorter than `size` yield one shingle.
pub fn shingles(text: &str, size: usize) -> HashSet<String> {
    let chars: Vec<char> = text.chars().collect();
    let size = size.max(1);
    if chars.len() <= size {
        return std::iter::once(text.to_string()).collect();
    }
    chars.windows(size).map(|w| w.iter().collect()).collect()
}

/// Jaccard similarity of two sets; two empty sets are identical.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 1.0;
    }
    a.intersection(b).count() as f64 / union as f64
}
