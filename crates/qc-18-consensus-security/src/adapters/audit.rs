//! Audit sink adapters.

use tracing::info;

use crate::domain::InfraError;
use crate::ports::AuditSink;

/// Writes audit events as structured log lines under the `audit` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event_type: &str, context: &serde_json::Value) -> Result<(), InfraError> {
        info!(target: "audit", event_type, context = %context, "Audit event");
        Ok(())
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event_type: &str, _context: &serde_json::Value) -> Result<(), InfraError> {
        Ok(())
    }
}
