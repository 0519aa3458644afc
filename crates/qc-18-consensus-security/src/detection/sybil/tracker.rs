//! Sliding-window record of join attempts.

use std::collections::VecDeque;

/// Join attempts, oldest first, pruned by elapsed time.
#[derive(Debug, Default)]
pub struct JoinAttemptTracker {
    attempts: VecDeque<(String, u64)>,
    retention_ms: u64,
}

impl JoinAttemptTracker {
    /// Keep attempts for `retention_ms`.
    pub fn new(retention_ms: u64) -> Self {
        Self {
            attempts: VecDeque::new(),
            retention_ms,
        }
    }

    /// Record an attempt and drop expired ones.
    pub fn record(&mut self, ip: &str, now: u64) {
        self.prune(now);
        self.attempts.push_back((ip.to_string(), now));
    }

    /// Attempts from `ip` within the last `window_ms`.
    pub fn count_from(&self, ip: &str, window_ms: u64, now: u64) -> usize {
        self.attempts
            .iter()
            .filter(|(source, ts)| source == ip && now.saturating_sub(*ts) <= window_ms)
            .count()
    }

    /// Attempts from anywhere within the last `window_ms`.
    pub fn count_all(&self, window_ms: u64, now: u64) -> usize {
        self.attempts
            .iter()
            .filter(|(_, ts)| now.saturating_sub(*ts) <= window_ms)
            .count()
    }

    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }

    fn prune(&mut self, now: u64) {
        while let Some((_, ts)) = self.attempts.front() {
            if now.saturating_sub(*ts) > self.retention_ms {
                self.attempts.pop_front();
            } else {
                break;
            }
        }
    }
}
