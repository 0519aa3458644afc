//! # Consensus Security Metrics
//!
//! Prometheus metrics for monitoring the security envelope.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! qc-18-consensus-security = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `security_rounds_total` - Counter of secured consensus rounds
//! - `security_rounds_failed_total` - Counter of failed rounds (by reason)
//! - `security_signing_latency_seconds` - Histogram of threshold signing time
//! - `security_anomalies_total` - Counter of Byzantine anomalies (by severity)
//! - `security_join_requests_total` - Counter of join decisions (by outcome)
//! - `security_requests_blocked_total` - Counter of requests dropped by DoS mitigation
//! - `security_connections_blocked_total` - Counter of connections dropped by Eclipse protection
//! - `security_alerts_total` - Counter of alerts raised (by type)
//!
//! [`SecurityMetrics`] is always available as a serializable snapshot.

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_counter_vec, register_histogram, register_int_counter, CounterVec, Histogram,
    IntCounter,
};

use serde::{Deserialize, Serialize};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Total secured rounds completed
    pub static ref ROUNDS_COMPLETED: IntCounter = register_int_counter!(
        "security_rounds_total",
        "Total number of secured consensus rounds completed"
    )
    .expect("Failed to create ROUNDS_COMPLETED metric");

    /// Total failed rounds, labeled by reason
    pub static ref ROUNDS_FAILED: CounterVec = register_counter_vec!(
        "security_rounds_failed_total",
        "Total number of secured consensus rounds that failed",
        &["reason"]
    )
    .expect("Failed to create ROUNDS_FAILED metric");

    /// Histogram of threshold signing latency
    pub static ref SIGNING_LATENCY: Histogram = register_histogram!(
        "security_signing_latency_seconds",
        "Time taken to produce a threshold signature in seconds",
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .expect("Failed to create SIGNING_LATENCY metric");

    /// Byzantine anomalies, labeled by severity
    pub static ref ANOMALIES: CounterVec = register_counter_vec!(
        "security_anomalies_total",
        "Total number of Byzantine anomalies detected",
        &["severity"]
    )
    .expect("Failed to create ANOMALIES metric");

    /// Join decisions, labeled by outcome
    pub static ref JOIN_REQUESTS: CounterVec = register_counter_vec!(
        "security_join_requests_total",
        "Total number of node join requests evaluated",
        &["outcome"]
    )
    .expect("Failed to create JOIN_REQUESTS metric");

    /// Requests dropped by DoS mitigation
    pub static ref REQUESTS_BLOCKED: IntCounter = register_int_counter!(
        "security_requests_blocked_total",
        "Total number of inbound requests dropped by DoS mitigation"
    )
    .expect("Failed to create REQUESTS_BLOCKED metric");

    /// Connections dropped by Eclipse protection
    pub static ref CONNECTIONS_BLOCKED: IntCounter = register_int_counter!(
        "security_connections_blocked_total",
        "Total number of peer connections dropped by Eclipse protection"
    )
    .expect("Failed to create CONNECTIONS_BLOCKED metric");

    /// Alerts raised, labeled by type
    pub static ref ALERTS: CounterVec = register_counter_vec!(
        "security_alerts_total",
        "Total number of security alerts raised",
        &["type"]
    )
    .expect("Failed to create ALERTS metric");
}

/// Record a completed round
#[cfg(feature = "metrics")]
pub fn record_round_completed() {
    ROUNDS_COMPLETED.inc();
}

/// Record a failed round with reason
#[cfg(feature = "metrics")]
pub fn record_round_failed(reason: &str) {
    ROUNDS_FAILED.with_label_values(&[reason]).inc();
}

/// Record signing latency
#[cfg(feature = "metrics")]
pub fn record_signing_latency(seconds: f64) {
    SIGNING_LATENCY.observe(seconds);
}

/// Record an anomaly
#[cfg(feature = "metrics")]
pub fn record_anomaly(severity: &str) {
    ANOMALIES.with_label_values(&[severity]).inc();
}

/// Record a join decision
#[cfg(feature = "metrics")]
pub fn record_join(accepted: bool) {
    let outcome = if accepted { "accepted" } else { "rejected" };
    JOIN_REQUESTS.with_label_values(&[outcome]).inc();
}

/// Record dropped requests
#[cfg(feature = "metrics")]
pub fn record_requests_blocked(count: u64) {
    REQUESTS_BLOCKED.inc_by(count);
}

/// Record dropped connections
#[cfg(feature = "metrics")]
pub fn record_connections_blocked(count: u64) {
    CONNECTIONS_BLOCKED.inc_by(count);
}

/// Record an alert
#[cfg(feature = "metrics")]
pub fn record_alert(alert_type: &str) {
    ALERTS.with_label_values(&[alert_type]).inc();
}

// No-op implementations when metrics feature is disabled
#[cfg(not(feature = "metrics"))]
pub fn record_round_completed() {}

#[cfg(not(feature = "metrics"))]
pub fn record_round_failed(_reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_signing_latency(_seconds: f64) {}

#[cfg(not(feature = "metrics"))]
pub fn record_anomaly(_severity: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_join(_accepted: bool) {}

#[cfg(not(feature = "metrics"))]
pub fn record_requests_blocked(_count: u64) {}

#[cfg(not(feature = "metrics"))]
pub fn record_connections_blocked(_count: u64) {}

#[cfg(not(feature = "metrics"))]
pub fn record_alert(_alert_type: &str) {}

/// Point-in-time counters kept by the manager.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecurityMetrics {
    pub rounds_completed: u64,
    pub rounds_failed: u64,
    pub anomalies_detected: u64,
    pub joins_accepted: u64,
    pub joins_rejected: u64,
    pub requests_allowed: u64,
    pub requests_blocked: u64,
    pub connections_blocked: u64,
    pub proofs_issued: u64,
    pub proofs_verified: u64,
    pub proofs_rejected: u64,
    pub alerts_raised: u64,
    pub forensic_entries: usize,
    pub tracked_nodes: usize,
    pub blacklisted_sources: usize,
    pub average_reputation: Option<f64>,
}
