use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde_json::Value;

use crate::error::Result;

/// Key-value store with per-entry TTL, shared by all fetchers. Payloads are
/// opaque JSON values so one store serves every entry kind. Implementations
/// must be safe under concurrent access from parallel assessments, and a read
/// must never return an entry past its expiry.
pub trait Cache: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>>;
    fn put(&self, key: &str, value: Value, ttl: Duration) -> Result<()>;
}

#[derive(Debug)]
struct Entry {
    value: Value,
    expires_at: Instant,
}

/// Process-local cache over `DashMap`. Expired entries are dropped on the
/// read path rather than by a sweeper.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, Entry>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self { entries: DashMap::new() }
    }

    #[cfg(test)]
    pub(crate) fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        // The read guard must drop before the remove below, or the shard
        // lock deadlocks.
        let expired = match self.entries.get(key) {
            None => return Ok(None),
            Some(entry) => {
                if Instant::now() < entry.expires_at {
                    return Ok(Some(entry.value.clone()));
                }
                true
            }
        };
        if expired {
            self.entries.remove(key);
        }
        Ok(None)
    }

    fn put(&self, key: &str, value: Value, ttl: Duration) -> Result<()> {
        self.entries
            .insert(key.to_string(), Entry { value, expires_at: Instant::now() + ttl });
        Ok(())
    }
}
