//! Domain types for the consensus security envelope.

mod anomaly;
mod error;
mod requests;
mod round;

pub use anomaly::{AlertType, Anomaly, AnomalyKind, SecurityAlert, Severity};
pub use error::{ConfigError, InfraError, SecurityError, SecurityResult};
pub use requests::{
    ConnectionRecord, IdentityCredential, InboundRequest, NodeJoinRequest, ProofOfWork,
    StakeProof,
};
pub use round::{
    ConsensusRound, Proposal, RoundMessage, SecureConsensusResult, SecurityAnalysis,
};

/// Node identifier used by the external consensus protocol.
pub type NodeId = String;

/// Lifecycle state of the security manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityState {
    Uninitialized,
    Initializing,
    Ready,
    ExecutingConsensus,
}

impl std::fmt::Display for SecurityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecurityState::Uninitialized => write!(f, "UNINITIALIZED"),
            SecurityState::Initializing => write!(f, "INITIALIZING"),
            SecurityState::Ready => write!(f, "READY"),
            SecurityState::ExecutingConsensus => write!(f, "EXECUTING_CONSENSUS"),
        }
    }
}
