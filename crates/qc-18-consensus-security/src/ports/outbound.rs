//! Driven ports (Outbound dependencies)
//!
//! Every port is optional infrastructure: failures are logged by the caller
//! and never change a security decision.

use crate::domain::InfraError;

/// Audit trail for security decisions.
///
/// Fire-and-forget. The manager logs errors at `warn` and carries on.
pub trait AuditSink: Send + Sync {
    /// Record one audit event
    fn record(&self, event_type: &str, context: &serde_json::Value) -> Result<(), InfraError>;
}

/// Shared key-value store for blacklist entries.
pub trait BlacklistCache: Send + Sync {
    /// Store `value` under `key` for `ttl_ms`
    fn set(&self, key: &str, value: &str, ttl_ms: u64) -> Result<(), InfraError>;

    /// Fetch a live value
    fn get(&self, key: &str) -> Result<Option<String>, InfraError>;
}

/// Clock abstraction
pub trait TimeSource: Send + Sync {
    /// Current unix time in milliseconds
    fn now_millis(&self) -> u64;
}

/// Default time source using system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_millis(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}
