#![allow(missing_docs)]

//! QC-18 Consensus Security - threshold signing, authentication and attack
//! detection wrapped around an external consensus protocol.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                  CONSENSUS SECURITY (qc-18)                           │
//! ├──────────────────────────────────────────────────────────────────────┤
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐                 │
//! │  │  Threshold   │  │     ZKP      │  │  Reputation  │                 │
//! │  │  DKG + sign  │  │ auth / range │  │  decay/score │                 │
//! │  └──────┬───────┘  └──────┬───────┘  └──────┬───────┘                 │
//! │         └─────────────────┼─────────────────┘                         │
//! │                 ┌─────────┴──────────┐                                │
//! │                 │ ConsensusSecurity- │                                │
//! │                 │      Manager       │                                │
//! │                 └─────────┬──────────┘                                │
//! │     ┌──────────┬──────────┼──────────┬──────────┐                     │
//! │     ▼          ▼          ▼          ▼          ▼                     │
//! │ Byzantine    Sybil     Eclipse      DoS      Alerts + Forensics       │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use qc_18_consensus_security::{ConsensusSecurityManager, Proposal, SecurityConfig};
//!
//! let manager = ConsensusSecurityManager::new(SecurityConfig::default())?;
//! manager.initialize()?;
//! let result = manager.execute_secure_consensus(
//!     &Proposal::with_hash("block-42"),
//!     &participants,
//!     Some(&round),
//! )?;
//! ```
//!
//! # Security
//!
//! - Group signatures verify against the DKG master key before release
//! - Authentication proofs are single-use within a freshness window
//! - Forensic entries are hash-bound to their content

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod alerting;
pub mod config;
pub mod detection;
pub mod domain;
pub mod forensics;
pub mod metrics;
pub mod ports;
pub mod reputation;
pub mod service;

// Re-exports for public API
pub use alerting::{AlertHandler, AlertStatistics, LoggingAlertHandler, SecurityAlertSystem};
pub use config::{AlertConfig, ForensicsConfig, SecurityConfig, ThresholdConfig};
pub use detection::{
    ByzantineDetector, ConnectionReport, DosAction, DosMitigator, DosReport, EclipseGuard,
    JoinAssessment, SourceVerdict, SybilFactors, SybilGuard,
};
pub use domain::*;
pub use forensics::{csv_field, ExportFormat, ForensicLogEntry, ForensicLogger, ForensicQuery};
pub use metrics::SecurityMetrics;
pub use reputation::{ReputationConfig, ReputationSystem};
pub use service::{ConsensusSecurityManager, SecurityStatus};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_default_config_builds_manager() {
        let manager = ConsensusSecurityManager::new(SecurityConfig::default()).unwrap();
        assert_eq!(manager.state(), SecurityState::Uninitialized);
        assert_eq!(manager.roster().len(), 5);
    }
}
