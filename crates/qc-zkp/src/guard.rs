//! # Proof Freshness Guard
//!
//! Rejects stale, future-dated and replayed authentication proofs.
//! Seen proofs are remembered for one freshness window, keyed by commitment,
//! and pruned by elapsed time.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use shared_crypto::CurvePoint;
use tracing::debug;

use crate::errors::{ZkpError, ZkpResult};
use crate::schnorr::{self, SchnorrProof};

/// Freshness configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreshnessConfig {
    /// Maximum proof age (ms)
    pub window_ms: u64,
    /// Allowed clock skew into the future (ms)
    pub max_future_skew_ms: u64,
}

impl Default for FreshnessConfig {
    fn default() -> Self {
        Self {
            window_ms: 300_000,
            max_future_skew_ms: 5_000,
        }
    }
}

/// Freshness window plus replay cache.
#[derive(Debug)]
pub struct ProofGuard {
    config: FreshnessConfig,
    /// commitment (compressed) -> proof timestamp
    seen: Mutex<HashMap<[u8; 33], u64>>,
}

impl ProofGuard {
    /// Create a guard.
    pub fn new(config: FreshnessConfig) -> Self {
        Self {
            config,
            seen: Mutex::new(HashMap::new()),
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &FreshnessConfig {
        &self.config
    }

    /// Timestamp checks only.
    pub fn check_freshness(&self, proof: &SchnorrProof, now_ms: u64) -> ZkpResult<()> {
        if proof.timestamp > now_ms.saturating_add(self.config.max_future_skew_ms) {
            return Err(ZkpError::FutureTimestamp {
                timestamp: proof.timestamp,
                now: now_ms,
            });
        }
        let age_ms = now_ms.saturating_sub(proof.timestamp);
        if age_ms > self.config.window_ms {
            return Err(ZkpError::Expired {
                age_ms,
                window_ms: self.config.window_ms,
            });
        }
        Ok(())
    }

    /// Verify the proof, its freshness and that it has not been presented
    /// before. Only accepted proofs enter the replay cache.
    pub fn verify(
        &self,
        proof: &SchnorrProof,
        public_key: &CurvePoint,
        now_ms: u64,
    ) -> ZkpResult<()> {
        self.verify_with_context(proof, public_key, &[], now_ms)
    }

    /// [`ProofGuard::verify`] for proofs bound to `context`. Proofs share one
    /// replay cache regardless of context.
    pub fn verify_with_context(
        &self,
        proof: &SchnorrProof,
        public_key: &CurvePoint,
        context: &[u8],
        now_ms: u64,
    ) -> ZkpResult<()> {
        self.check_freshness(proof, now_ms)?;
        schnorr::verify_with_context(proof, public_key, context)?;

        let key = proof.commitment.to_compressed();
        let mut seen = self.seen.lock();
        let window = self.config.window_ms.saturating_add(self.config.max_future_skew_ms);
        seen.retain(|_, ts| now_ms.saturating_sub(*ts) <= window);

        if seen.contains_key(&key) {
            debug!(timestamp = proof.timestamp, "Replayed proof rejected");
            return Err(ZkpError::Replayed);
        }
        seen.insert(key, proof.timestamp);
        Ok(())
    }

    /// Number of proofs currently remembered.
    pub fn tracked(&self) -> usize {
        self.seen.lock().len()
    }
}

impl Default for ProofGuard {
    fn default() -> Self {
        Self::new(FreshnessConfig::default())
    }
}
