//! # Node Reputation
//!
//! Scores in `[0, 1]`, created lazily at the initial score and decayed
//! multiplicatively per full period when read.
//!
//! | Event | Delta |
//! |-------|-------|
//! | HIGH anomaly | -0.2 |
//! | MEDIUM anomaly | -0.1 |
//! | LOW anomaly | -0.05 |
//! | Clean round | +0.01 |
//!
//! Nodes below 0.1 are blacklist-eligible.

mod config;
mod manager;
mod record;

#[cfg(test)]
mod tests;

pub use config::ReputationConfig;
pub use manager::ReputationSystem;
pub use record::{ReputationEvent, ReputationEventKind, ReputationRecord};
