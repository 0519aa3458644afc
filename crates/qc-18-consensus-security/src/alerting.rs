//! # Security Alerting
//!
//! Each alert goes to the handler registered for its type and into a rolling
//! history. Default handlers log through `tracing` at a level matching the
//! severity.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::{AlertType, SecurityAlert, Severity};

/// Receives alerts of one type.
pub trait AlertHandler: Send + Sync {
    fn handle(&self, alert: &SecurityAlert);
}

impl<F> AlertHandler for F
where
    F: Fn(&SecurityAlert) + Send + Sync,
{
    fn handle(&self, alert: &SecurityAlert) {
        self(alert)
    }
}

/// Default handler: structured log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingAlertHandler;

impl AlertHandler for LoggingAlertHandler {
    fn handle(&self, alert: &SecurityAlert) {
        match alert.severity {
            Severity::High | Severity::Medium => warn!(
                alert_type = %alert.alert_type,
                severity = %alert.severity,
                details = %alert.details,
                "Security alert"
            ),
            Severity::Low => info!(
                alert_type = %alert.alert_type,
                severity = %alert.severity,
                details = %alert.details,
                "Security alert"
            ),
        }
    }
}

/// Alert counts over a time window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertStatistics {
    pub window_ms: u64,
    pub total: usize,
    pub by_type: BTreeMap<AlertType, usize>,
    pub by_severity: BTreeMap<Severity, usize>,
}

/// Alert dispatcher with history.
pub struct SecurityAlertSystem {
    handlers: RwLock<HashMap<AlertType, Arc<dyn AlertHandler>>>,
    history: Mutex<VecDeque<SecurityAlert>>,
    history_size: usize,
}

impl SecurityAlertSystem {
    /// Logging handlers for every alert type.
    pub fn new(history_size: usize) -> Self {
        let handlers = AlertType::ALL
            .iter()
            .map(|t| (*t, Arc::new(LoggingAlertHandler) as Arc<dyn AlertHandler>))
            .collect();
        Self {
            handlers: RwLock::new(handlers),
            history: Mutex::new(VecDeque::new()),
            history_size: history_size.max(1),
        }
    }

    /// Replace the handler for `alert_type`.
    pub fn register_handler(&self, alert_type: AlertType, handler: Arc<dyn AlertHandler>) {
        self.handlers.write().insert(alert_type, handler);
    }

    /// Dispatch and record an alert.
    pub fn raise(&self, alert: SecurityAlert) {
        let handler = self.handlers.read().get(&alert.alert_type).cloned();
        if let Some(handler) = handler {
            handler.handle(&alert);
        }

        let mut history = self.history.lock();
        if history.len() >= self.history_size {
            history.pop_front();
        }
        history.push_back(alert);
    }

    /// History, oldest first.
    pub fn history(&self) -> Vec<SecurityAlert> {
        self.history.lock().iter().cloned().collect()
    }

    /// Up to `n` most recent alerts, newest first.
    pub fn recent(&self, n: usize) -> Vec<SecurityAlert> {
        self.history.lock().iter().rev().take(n).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.history.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.lock().is_empty()
    }

    /// Counts of alerts raised within `window_ms` before `now`.
    pub fn statistics(&self, window_ms: u64, now: u64) -> AlertStatistics {
        let mut stats = AlertStatistics {
            window_ms,
            ..AlertStatistics::default()
        };
        for alert in self
            .history
            .lock()
            .iter()
            .filter(|a| now.saturating_sub(a.timestamp) <= window_ms)
        {
            stats.total += 1;
            *stats.by_type.entry(alert.alert_type).or_insert(0) += 1;
            *stats.by_severity.entry(alert.severity).or_insert(0) += 1;
        }
        stats
    }
}

impl Default for SecurityAlertSystem {
    fn default() -> Self {
        Self::new(1_000)
    }
}

impl std::fmt::Debug for SecurityAlertSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityAlertSystem")
            .field("handlers", &self.handlers.read().len())
            .field("history", &self.history.lock().len())
            .field("history_size", &self.history_size)
            .finish()
    }
}
