//! # Quantum-Chain Test Suite
//!
//! Cross-crate scenarios for the consensus security envelope.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── threshold_flow.rs   # DKG → sign → verify, below-threshold failures
//!     ├── proofs.rs           # Schnorr tampering, range proofs
//!     ├── manager_flow.rs     # Lifecycle, forensics, reputation
//!     └── attack_scenarios.rs # Sybil batch, DoS flood, full pentest run
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p qc-tests
//!
//! # By scenario
//! cargo test -p qc-tests integration::attack_scenarios::
//! ```

#![allow(dead_code)]

pub mod integration;
