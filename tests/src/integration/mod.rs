//! # Integration Scenarios
//!
//! Each module drives the public API of one or more envelope crates
//! end to end. Nothing here reaches into crate internals.

pub mod attack_scenarios;
pub mod manager_flow;
pub mod proofs;
pub mod threshold_flow;
