//! Detector findings, severities and alerts.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::NodeId;

/// Severity of a finding or alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "LOW"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::High => write!(f, "HIGH"),
        }
    }
}

/// Kind of Byzantine behaviour observed in a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    /// Same node, different proposals, close in time
    ContradictoryMessages,
    /// Timestamp far from the round mean
    TimingAnomaly,
    /// Several nodes inside one small time bucket
    CollusionTiming,
    /// Near-identical message content from different nodes
    CollusionSimilarity,
}

/// A single finding. Never an error: policy decides what to do with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub kind: AnomalyKind,
    pub severity: Severity,
    /// Nodes the finding is attributed to
    pub nodes: Vec<NodeId>,
    pub description: String,
}

impl Anomaly {
    pub fn new(
        kind: AnomalyKind,
        severity: Severity,
        nodes: Vec<NodeId>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            severity,
            nodes,
            description: description.into(),
        }
    }

    /// Whether `node` is implicated.
    pub fn involves(&self, node: &str) -> bool {
        self.nodes.iter().any(|n| n == node)
    }
}

/// Alert category; each has its own handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertType {
    Byzantine,
    Sybil,
    Eclipse,
    Dos,
    Integrity,
}

impl AlertType {
    pub const ALL: [AlertType; 5] = [
        AlertType::Byzantine,
        AlertType::Sybil,
        AlertType::Eclipse,
        AlertType::Dos,
        AlertType::Integrity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::Byzantine => "BYZANTINE",
            AlertType::Sybil => "SYBIL",
            AlertType::Eclipse => "ECLIPSE",
            AlertType::Dos => "DOS",
            AlertType::Integrity => "INTEGRITY",
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alert raised by a detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityAlert {
    pub alert_type: AlertType,
    pub severity: Severity,
    /// Raise time (ms)
    pub timestamp: u64,
    pub details: serde_json::Value,
}

impl SecurityAlert {
    pub fn new(
        alert_type: AlertType,
        severity: Severity,
        timestamp: u64,
        details: serde_json::Value,
    ) -> Self {
        Self {
            alert_type,
            severity,
            timestamp,
            details,
        }
    }
}
