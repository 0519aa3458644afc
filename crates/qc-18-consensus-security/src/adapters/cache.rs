//! In-process TTL cache.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::domain::InfraError;
use crate::ports::{BlacklistCache, SystemTimeSource, TimeSource};

/// Key-value store with per-entry expiry, evicted lazily on access.
pub struct InMemoryTtlCache {
    entries: RwLock<HashMap<String, (String, u64)>>,
    clock: Arc<dyn TimeSource>,
}

impl InMemoryTtlCache {
    pub fn new() -> Self {
        Self::with_time_source(Arc::new(SystemTimeSource))
    }

    pub fn with_time_source(clock: Arc<dyn TimeSource>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Live entries.
    pub fn len(&self) -> usize {
        let now = self.clock.now_millis();
        self.entries
            .read()
            .values()
            .filter(|(_, expires)| *expires > now)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryTtlCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryTtlCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryTtlCache")
            .field("entries", &self.entries.read().len())
            .field("clock", &"<time source>")
            .finish()
    }
}

impl BlacklistCache for InMemoryTtlCache {
    fn set(&self, key: &str, value: &str, ttl_ms: u64) -> Result<(), InfraError> {
        let expires = self.clock.now_millis().saturating_add(ttl_ms);
        self.entries
            .write()
            .insert(key.to_string(), (value.to_string(), expires));
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>, InfraError> {
        let now = self.clock.now_millis();
        let mut entries = self.entries.write();
        match entries.get(key) {
            Some((value, expires)) if *expires > now => Ok(Some(value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }
}
