//! QC-Pentest - penetration-testing harness for the consensus security
//! envelope.
//!
//! Drives a live [`ConsensusSecurityManager`] with synthesized attacks and
//! scores how well it holds up.
//!
//! ```ignore
//! use qc_pentest::PenetrationTester;
//! use qc_18_consensus_security::{ExportFormat, SecurityConfig};
//!
//! let mut tester = PenetrationTester::new(SecurityConfig::default())?;
//! let report = tester.run_security_tests();
//! println!("risk: {}", report.risk_level);
//! let csv = tester.export_results(ExportFormat::Csv)?;
//! ```
//!
//! [`ConsensusSecurityManager`]: qc_18_consensus_security::ConsensusSecurityManager

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod error;
pub mod harness;
pub mod outcome;
pub mod report;
pub mod simulators;

pub use error::SimulationError;
pub use harness::{export_report, PenetrationTester};
pub use outcome::{TestCategory, TestOutcome};
pub use report::{Recommendation, ReportSummary, RiskLevel, SecurityReport, Vulnerability};
pub use simulators::{ScenarioConfig, SimulationContext};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
