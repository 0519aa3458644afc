//! Attack simulators.
//!
//! Each simulator drives the live manager with synthesized adversarial input
//! and measures how much of the attack got through. Time is controlled
//! through the shared [`ManualTimeSource`].

pub mod byzantine;
pub mod crypto;
pub mod dos;
pub mod eclipse;
pub mod sybil;

use qc_18_consensus_security::adapters::ManualTimeSource;
use qc_18_consensus_security::ports::TimeSource;
use qc_18_consensus_security::ConsensusSecurityManager;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub use byzantine::simulate_byzantine;
pub use crypto::{
    simulate_challenge_prediction, simulate_commitment_manipulation, simulate_key_recovery,
    simulate_partial_signature_manipulation, simulate_proof_replay, simulate_signature_replay,
};
pub use dos::simulate_dos;
pub use eclipse::simulate_eclipse;
pub use sybil::simulate_sybil;

/// Pass thresholds
pub mod thresholds {
    /// Sybil joins that must be rejected
    pub const SYBIL_BLOCK_RATE: f64 = 0.8;
    /// Flood requests that must be dropped
    pub const DOS_FLOOD_BLOCK_RATE: f64 = 0.9;
    /// Legitimate requests that must survive
    pub const DOS_LEGIT_PRESERVE_RATE: f64 = 0.8;
}

/// Manager under test and the clock it reads.
#[derive(Clone, Copy)]
pub struct SimulationContext<'a> {
    pub manager: &'a ConsensusSecurityManager,
    pub clock: &'a ManualTimeSource,
}

impl<'a> SimulationContext<'a> {
    pub fn new(manager: &'a ConsensusSecurityManager, clock: &'a ManualTimeSource) -> Self {
        Self { manager, clock }
    }

    pub fn now(&self) -> u64 {
        self.clock.now_millis()
    }
}

/// Scenario sizes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Byzantine rounds to run
    pub byzantine_rounds: usize,
    /// Sybil identities attempting to join
    pub sybil_nodes: usize,
    /// Diverse legitimate peers
    pub eclipse_legit_connections: usize,
    /// Attacker addresses, all in one country and ASN
    pub eclipse_attacker_ips: usize,
    pub eclipse_connections_per_attacker: usize,
    /// Share of attacker connections that must be blocked for the eclipse
    /// test to pass. Attackers lose everything above the per-source cap, then
    /// diversity trimming until the set reaches the entropy floor.
    pub eclipse_min_attacker_block_rate: f64,
    /// Share of legitimate connections that must be kept
    pub eclipse_min_legit_keep_rate: f64,
    /// Flood rate across the bot pool
    pub dos_flood_rps: u64,
    pub dos_duration_ms: u64,
    /// Addresses the flood is drawn from
    pub dos_bot_pool: usize,
    /// Authenticated requests mixed into the flood
    pub dos_legit_requests: usize,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            byzantine_rounds: 3,
            sybil_nodes: 10,
            eclipse_legit_connections: 10,
            eclipse_attacker_ips: 20,
            eclipse_connections_per_attacker: 5,
            eclipse_min_attacker_block_rate: 0.6,
            eclipse_min_legit_keep_rate: 0.8,
            dos_flood_rps: 100,
            dos_duration_ms: 60_000,
            dos_bot_pool: 20,
            dos_legit_requests: 10,
        }
    }
}

/// Random lowercase hex string of `len` characters.
pub(crate) fn random_hex<R: Rng>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| char::from_digit(rng.gen_range(0..16), 16).unwrap_or('0'))
        .collect()
}
