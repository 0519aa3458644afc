//! Consensus round data supplied by the external consensus protocol.

use serde::{Deserialize, Serialize};
use shared_crypto::{sha256_hex, ThresholdSignature};

use super::anomaly::Anomaly;
use super::NodeId;

/// A message emitted by one participant during a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundMessage {
    /// Sender
    pub node_id: NodeId,
    /// Message kind (e.g. `prepare`, `commit`, `vote`)
    pub message_type: String,
    /// Value the sender is voting for
    pub proposal: String,
    /// Send time (ms)
    pub timestamp: u64,
    /// Sender signature, opaque to the detectors
    pub signature: String,
}

impl RoundMessage {
    /// Content used for similarity comparison.
    pub fn serialized_content(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            self.message_type, self.proposal, self.timestamp, self.signature
        )
    }
}

/// One round of the external consensus protocol.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusRound {
    /// Round identifier
    pub id: String,
    /// Nodes taking part
    pub participants: Vec<NodeId>,
    /// Messages observed
    pub messages: Vec<RoundMessage>,
    /// Proposal under agreement
    pub proposal: String,
}

/// Proposal to be threshold-signed, optionally carrying its own hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    /// Proposal body
    pub content: String,
    /// Hex SHA-256 of `content`, if attached by the proposer
    pub hash: Option<String>,
}

impl Proposal {
    /// Proposal without an attached hash.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            hash: None,
        }
    }

    /// Proposal with its hash attached.
    pub fn with_hash(content: impl Into<String>) -> Self {
        let content = content.into();
        let hash = Some(sha256_hex(content.as_bytes()));
        Self { content, hash }
    }

    /// Hex SHA-256 of the content.
    pub fn compute_hash(&self) -> String {
        sha256_hex(self.content.as_bytes())
    }

    /// Bytes that get signed.
    pub fn signing_bytes(&self) -> &[u8] {
        self.content.as_bytes()
    }
}

/// Result of the security analysis of one round.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecurityAnalysis {
    /// Detector findings
    pub anomalies: Vec<Anomaly>,
    /// Party indices that produced the signature
    pub signatories: Vec<u32>,
    /// Participants excluded for low reputation
    pub excluded_participants: Vec<NodeId>,
    /// Participants not on the signing roster
    pub unknown_participants: Vec<NodeId>,
    /// Count of HIGH findings
    pub high_severity_count: usize,
}

/// Output of a secured consensus round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecureConsensusResult {
    /// Signed proposal
    pub proposal: Proposal,
    /// Group signature over the proposal
    pub signature: ThresholdSignature,
    /// Participants that were asked to sign
    pub participants: Vec<NodeId>,
    /// Detector and signing summary
    pub security_analysis: SecurityAnalysis,
    /// Completion time (ms)
    pub timestamp: u64,
}
