//! Per-source circuit breaker.
//!
//! ```text
//!   CLOSED ──(N flagged batches)──► OPEN ──(open duration)──► HALF-OPEN
//!     ▲                                                          │
//!     └──────────────────────(clean batch)───────────────────────┘
//! ```
//!
//! A flagged batch while half-open re-opens the circuit. Circuits idle for
//! longer than the retention period are forgotten unless still open.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Circuit breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Traffic passes
    Closed,
    /// Traffic is rejected
    Open,
    /// One probe batch is let through
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half-open"),
        }
    }
}

struct SourceCircuit {
    state: CircuitState,
    failure_count: u32,
    opened_at: Option<u64>,
    total_failures: u64,
    last_seen: u64,
}

impl SourceCircuit {
    fn new(now: u64) -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            opened_at: None,
            total_failures: 0,
            last_seen: now,
        }
    }
}

/// Circuit breakers keyed by request source.
pub struct CircuitBreakerManager {
    circuits: RwLock<HashMap<String, SourceCircuit>>,
    failure_threshold: u32,
    open_duration_ms: u64,
}

impl CircuitBreakerManager {
    pub fn new(failure_threshold: u32, open_duration_ms: u64) -> Self {
        Self {
            circuits: RwLock::new(HashMap::new()),
            failure_threshold: failure_threshold.max(1),
            open_duration_ms,
        }
    }

    /// Whether a batch from `source` may be processed at `now`.
    pub fn should_allow(&self, source: &str, now: u64) -> bool {
        let mut circuits = self.circuits.write();
        let Some(circuit) = circuits.get_mut(source) else {
            return true;
        };
        circuit.last_seen = now;

        match circuit.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => match circuit.opened_at {
                Some(opened_at) if now.saturating_sub(opened_at) >= self.open_duration_ms => {
                    info!(source = source, "Circuit breaker transitioning to half-open");
                    circuit.state = CircuitState::HalfOpen;
                    true
                }
                Some(opened_at) => {
                    debug!(
                        source = source,
                        remaining_ms = self.open_duration_ms - now.saturating_sub(opened_at),
                        "Circuit breaker is open, rejecting batch"
                    );
                    false
                }
                None => true,
            },
        }
    }

    /// Record a clean batch.
    pub fn record_success(&self, source: &str, now: u64) {
        let mut circuits = self.circuits.write();
        if let Some(circuit) = circuits.get_mut(source) {
            circuit.last_seen = now;
            match circuit.state {
                CircuitState::Closed => circuit.failure_count = 0,
                CircuitState::HalfOpen => {
                    info!(source = source, "Circuit breaker closing after clean probe");
                    circuit.state = CircuitState::Closed;
                    circuit.failure_count = 0;
                    circuit.opened_at = None;
                }
                CircuitState::Open => {}
            }
        }
    }

    /// Record a flagged batch.
    pub fn record_failure(&self, source: &str, now: u64) {
        let mut circuits = self.circuits.write();
        let circuit = circuits
            .entry(source.to_string())
            .or_insert_with(|| SourceCircuit::new(now));
        circuit.last_seen = now;
        circuit.total_failures += 1;

        match circuit.state {
            CircuitState::Closed => {
                circuit.failure_count += 1;
                if circuit.failure_count >= self.failure_threshold {
                    warn!(
                        source = source,
                        failures = circuit.failure_count,
                        threshold = self.failure_threshold,
                        "Circuit breaker opening"
                    );
                    circuit.state = CircuitState::Open;
                    circuit.opened_at = Some(now);
                }
            }
            CircuitState::HalfOpen => {
                warn!(source = source, "Circuit breaker reopening after flagged probe");
                circuit.state = CircuitState::Open;
                circuit.opened_at = Some(now);
            }
            CircuitState::Open => circuit.opened_at = Some(now),
        }
    }

    pub fn get_state(&self, source: &str) -> CircuitState {
        self.circuits
            .read()
            .get(source)
            .map(|c| c.state)
            .unwrap_or(CircuitState::Closed)
    }

    /// Sources whose circuit is currently open.
    pub fn open_circuits(&self) -> usize {
        self.circuits
            .read()
            .values()
            .filter(|c| c.state == CircuitState::Open)
            .count()
    }

    /// Forget circuits not seen for more than `idle_ms`. Open circuits are
    /// kept until their open period has elapsed.
    pub fn prune_idle(&self, now: u64, idle_ms: u64) -> usize {
        let open_duration_ms = self.open_duration_ms;
        let mut circuits = self.circuits.write();
        let before = circuits.len();
        circuits.retain(|_, c| {
            let still_open = c.state == CircuitState::Open
                && c.opened_at
                    .map_or(true, |at| now.saturating_sub(at) < open_duration_ms);
            still_open || now.saturating_sub(c.last_seen) <= idle_ms
        });
        before - circuits.len()
    }

    /// Sources with a circuit on record.
    pub fn tracked(&self) -> usize {
        self.circuits.read().len()
    }

    /// Flagged batches recorded for `source` since its circuit was created.
    pub fn total_failures(&self, source: &str) -> u64 {
        self.circuits
            .read()
            .get(source)
            .map(|c| c.total_failures)
            .unwrap_or(0)
    }
}

impl std::fmt::Debug for CircuitBreakerManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreakerManager")
            .field("circuits", &self.circuits.read().len())
            .field("failure_threshold", &self.failure_threshold)
            .field("open_duration_ms", &self.open_duration_ms)
            .finish()
    }
}
