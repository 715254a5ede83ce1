//! Time-boxed memoization of successful JSON responses.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;
use tracing::debug;

/// How long a cached response stays trustworthy.
pub const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Hard bound on the table so per-query keys cannot grow without limit.
const MAX_ENTRIES: usize = 256;

struct CacheEntry {
    data: Value,
    stored_at: Instant,
}

/// Per-endpoint response cache with lazy expiry: entries past their TTL are
/// treated as absent at read time, never swept in the background.
pub struct ResponseCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::with_ttl(CACHE_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached value for `key` if it is still within its TTL.
    pub fn get(&self, key: &str) -> Option<Value> {
        let entries = self.entries.lock().expect("cache lock poisoned");
        let entry = entries.get(key)?;
        if entry.stored_at.elapsed() >= self.ttl {
            debug!(key, "cache.expired");
            return None;
        }
        debug!(key, "cache.hit");
        Some(entry.data.clone())
    }

    /// Stores `data` under `key`, unconditionally overwriting any previous
    /// entry. When the table is full the stalest entry makes room.
    pub fn put(&self, key: &str, data: Value) {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        if entries.len() >= MAX_ENTRIES && !entries.contains_key(key) {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.stored_at)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                debug!(key = oldest.as_str(), "cache.evict");
                entries.remove(&oldest);
            }
        }
        entries.insert(
            key.to_string(),
            CacheEntry {
                data,
                stored_at: Instant::now(),
            },
        );
    }

    pub fn clear(&self) {
        self.entries.lock().expect("cache lock poisoned").clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}
