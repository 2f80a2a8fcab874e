use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::cache::store::Cache;
use crate::error::Result;

/// Read-through cache shared by the fetchers.
///
/// Concurrent misses for the same key collapse into at most one upstream
/// call: the first caller takes the per-key gate and fetches, waiters
/// re-check the cache once the gate opens. A failing cache store is logged
/// and treated as a miss, never as an assessment failure.
pub struct CachedFetch {
    cache: Arc<dyn Cache>,
    gates: DashMap<String, Arc<Mutex<()>>>,
    ttl: Duration,
}

impl CachedFetch {
    pub fn new(cache: Arc<dyn Cache>, ttl: Duration) -> Self {
        Self { cache, gates: DashMap::new(), ttl }
    }

    /// Return the cached value for `key`, or run `fetch` once and cache its
    /// result with the configured TTL. Fetch failures are surfaced unchanged
    /// and nothing is cached for them.
    pub async fn get_or_fetch<T, F, Fut>(&self, key: &str, fetch: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(hit) = self.read(key) {
            debug!(key, "cache hit");
            return Ok(hit);
        }

        let gate = self.gates.entry(key.to_string()).or_default().clone();
        let guard = gate.lock().await;

        // Another task may have filled the entry while we waited on the gate.
        if let Some(hit) = self.read(key) {
            debug!(key, "cache hit after single-flight wait");
            return Ok(hit);
        }

        debug!(key, "cache miss");
        let outcome = fetch().await;

        if let Ok(value) = &outcome {
            match serde_json::to_value(value) {
                Ok(json) => {
                    if let Err(e) = self.cache.put(key, json, self.ttl) {
                        warn!(key, error = %e, "cache write failed");
                    }
                }
                Err(e) => warn!(key, error = %e, "cache serialization failed"),
            }
        }

        drop(guard);
        // Queued waiters keep their clone of the gate; new arrivals re-check
        // the now-warm cache, so dropping the registry entry is safe.
        self.gates.remove(key);

        outcome
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.cache.get(key) {
            Ok(found) => found?,
            Err(e) => {
                warn!(key, error = %e, "cache read failed, treating as miss");
                return None;
            }
        };
        match serde_json::from_value(raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "cached payload undecodable, treating as miss");
                None
            }
        }
    }
}
