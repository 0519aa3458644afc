//! # Eclipse Attack Protection
//!
//! Keeps a node's peer set diverse. Two independent limits apply:
//!
//! 1. **Per-source cap**: at most `max_connections_per_source` connections per
//!    source IP; a random subset of that size is retained.
//! 2. **Diversity enforcement**: when there are at least
//!    `min_connections_for_entropy` connections and the Shannon entropy of
//!    either the country or the ASN distribution is below `min_entropy_bits`,
//!    connections are dropped at random from the largest country or ASN group
//!    holding more than `max_group_share` of the capped set. The share limit
//!    is fixed from the set size after the per-source cap. Trimming stops as
//!    soon as both entropies reach `min_entropy_bits`, no group is over the
//!    limit, or only `min_peers` connections remain.

use std::collections::HashMap;

use rand::seq::index::sample;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::ConnectionRecord;

/// Eclipse guard configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EclipseConfig {
    /// Entropy (bits) below which diversity is enforced
    pub min_entropy_bits: f64,
    /// Connections needed before entropy is evaluated
    pub min_connections_for_entropy: usize,
    /// Largest share of retained connections one group may hold
    pub max_group_share: f64,
    /// Connections allowed per source IP
    pub max_connections_per_source: usize,
    /// Diversity enforcement never trims the set below this many peers
    pub min_peers: usize,
}

impl Default for EclipseConfig {
    fn default() -> Self {
        Self {
            min_entropy_bits: 1.5,
            min_connections_for_entropy: 4,
            max_group_share: 0.34,
            max_connections_per_source: 3,
            min_peers: 8,
        }
    }
}

/// Outcome of evaluating a connection set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionReport {
    pub accepted: Vec<ConnectionRecord>,
    pub blocked: Vec<ConnectionRecord>,
    /// Country entropy of the set after the per-source cap (bits)
    pub country_entropy: f64,
    /// ASN entropy of the set after the per-source cap (bits)
    pub asn_entropy: f64,
    pub diversity_enforced: bool,
}

impl ConnectionReport {
    pub fn has_blocked(&self) -> bool {
        !self.blocked.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupKey {
    Source,
    Country,
    Asn,
}

impl GroupKey {
    fn of<'a>(&self, record: &'a ConnectionRecord) -> &'a str {
        match self {
            GroupKey::Source => &record.source_ip,
            GroupKey::Country => &record.geo_location,
            GroupKey::Asn => &record.asn,
        }
    }
}

/// Connection-set diversity guard.
#[derive(Debug, Clone, Default)]
pub struct EclipseGuard {
    config: EclipseConfig,
}

impl EclipseGuard {
    pub fn new(config: EclipseConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EclipseConfig {
        &self.config
    }

    /// Apply the per-source cap and, if needed, diversity enforcement.
    pub fn evaluate(&self, connections: &[ConnectionRecord]) -> ConnectionReport {
        let mut rng = rand::thread_rng();

        let (mut retained, mut blocked) = cap_groups(
            connections.to_vec(),
            GroupKey::Source,
            self.config.max_connections_per_source.max(1),
            &mut rng,
        );
        if !blocked.is_empty() {
            debug!(blocked = blocked.len(), "Per-source connection cap applied");
        }

        let country_entropy = group_entropy(&retained, GroupKey::Country);
        let asn_entropy = group_entropy(&retained, GroupKey::Asn);

        let low_entropy = country_entropy < self.config.min_entropy_bits
            || asn_entropy < self.config.min_entropy_bits;
        let diversity_enforced =
            retained.len() >= self.config.min_connections_for_entropy && low_entropy;

        if diversity_enforced {
            let cap = self.group_cap(retained.len());
            while retained.len() > self.config.min_peers && !self.is_diverse(&retained) {
                let Some(members) = largest_group_over(&retained, cap) else {
                    break;
                };
                let victim = members[rng.gen_range(0..members.len())];
                blocked.push(retained.remove(victim));
            }
            warn!(
                country_entropy,
                asn_entropy,
                retained = retained.len(),
                blocked = blocked.len(),
                "Low peer diversity, enforcing group limits"
            );
        }

        ConnectionReport {
            accepted: retained,
            blocked,
            country_entropy,
            asn_entropy,
            diversity_enforced,
        }
    }

    fn group_cap(&self, retained: usize) -> usize {
        ((self.config.max_group_share * retained as f64).floor() as usize).max(1)
    }

    fn is_diverse(&self, records: &[ConnectionRecord]) -> bool {
        group_entropy(records, GroupKey::Country) >= self.config.min_entropy_bits
            && group_entropy(records, GroupKey::Asn) >= self.config.min_entropy_bits
    }
}

/// Indices of the largest country or ASN group with more than `cap` members.
fn largest_group_over(records: &[ConnectionRecord], cap: usize) -> Option<Vec<usize>> {
    let mut largest: Option<Vec<usize>> = None;
    for key in [GroupKey::Country, GroupKey::Asn] {
        let mut groups: HashMap<&str, Vec<usize>> = HashMap::new();
        for (i, record) in records.iter().enumerate() {
            groups.entry(key.of(record)).or_default().push(i);
        }
        for members in groups.into_values().filter(|m| m.len() > cap) {
            if largest.as_ref().map_or(true, |l| members.len() > l.len()) {
                largest = Some(members);
            }
        }
    }
    largest
}

/// Shannon entropy (bits) of a label distribution.
pub fn shannon_entropy<'a>(labels: impl IntoIterator<Item = &'a str>) -> f64 {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut total = 0usize;
    for label in labels {
        *counts.entry(label).or_insert(0) += 1;
        total += 1;
    }
    if total == 0 {
        return 0.0;
    }
    counts
        .values()
        .map(|&c| {
            let p = c as f64 / total as f64;
            -p * p.log2()
        })
        .sum()
}

fn group_entropy(records: &[ConnectionRecord], key: GroupKey) -> f64 {
    shannon_entropy(records.iter().map(|r| key.of(r)))
}

/// Keep at most `cap` records per group, chosen at random. Kept records stay
/// in their original order.
fn cap_groups<R: Rng + ?Sized>(
    records: Vec<ConnectionRecord>,
    key: GroupKey,
    cap: usize,
    rng: &mut R,
) -> (Vec<ConnectionRecord>, Vec<ConnectionRecord>) {
    let mut groups: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, record) in records.iter().enumerate() {
        groups.entry(key.of(record)).or_default().push(i);
    }

    let mut keep = vec![true; records.len()];
    for members in groups.values().filter(|m| m.len() > cap) {
        let mut drop = vec![true; members.len()];
        for chosen in sample(rng, members.len(), cap).into_iter() {
            drop[chosen] = false;
        }
        for (slot, member) in members.iter().enumerate() {
            if drop[slot] {
                keep[*member] = false;
            }
        }
    }

    let mut kept = Vec::with_capacity(records.len());
    let mut removed = Vec::new();
    for (record, keep) in records.into_iter().zip(keep) {
        if keep {
            kept.push(record);
        } else {
            removed.push(record);
        }
    }
    (kept, removed)
}
