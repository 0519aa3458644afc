//! Attack detectors.
//!
//! | Detector | Input | Output |
//! |----------|-------|--------|
//! | [`ByzantineDetector`] | one consensus round | `Vec<Anomaly>` |
//! | [`SybilGuard`] | one join request | [`JoinAssessment`] |
//! | [`EclipseGuard`] | a connection set | [`ConnectionReport`] |
//! | [`DosMitigator`] | a request batch | [`DosReport`] |

pub mod byzantine;
pub mod dos;
pub mod eclipse;
pub mod sybil;

pub use byzantine::{ByzantineConfig, ByzantineDetector};
pub use dos::{DosAction, DosConfig, DosMitigator, DosReport, SourceVerdict};
pub use eclipse::{ConnectionReport, EclipseConfig, EclipseGuard};
pub use sybil::{JoinAssessment, SybilConfig, SybilFactors, SybilGuard};
