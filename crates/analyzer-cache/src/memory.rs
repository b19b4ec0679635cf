//! In-memory request cache.

use analyzer_core::cache::{CacheKey, CachedValue, Clock, RequestCache, SystemClock};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::debug;

/// Cache entry with its insertion time.
#[derive(Debug, Clone)]
struct Entry {
    inserted_at: Instant,
    value: CachedValue,
}

/// In-memory TTL cache over a single mutex-protected map.
///
/// The TTL is evaluated at `get` time against the per-call argument, so
/// entries have no fixed lifetime of their own. Stale entries are left in
/// place until overwritten or cleared; there is no eviction. The lock is
/// held only for map access, never across a provider call, so two
/// concurrent misses on the same key may both reach the provider.
#[derive(Debug)]
pub struct MemoryCache {
    entries: Mutex<HashMap<CacheKey, Entry>>,
    clock: Arc<dyn Clock>,
}

impl MemoryCache {
    /// Creates an empty cache using the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty cache reading time from `clock`.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestCache for MemoryCache {
    fn get(&self, key: &CacheKey, ttl: Duration) -> Option<CachedValue> {
        let entries = self.entries.lock().ok()?;
        let entry = entries.get(key)?;
        let age = self
            .clock
            .now()
            .checked_duration_since(entry.inserted_at)
            .unwrap_or(Duration::ZERO);
        if age >= ttl {
            debug!(op = key.op, args = %key.args, age_secs = age.as_secs(), "cache entry expired");
            return None;
        }
        debug!(op = key.op, args = %key.args, "cache hit");
        Some(entry.value.clone())
    }

    fn put(&self, key: CacheKey, value: CachedValue) {
        if let Ok(mut entries) = self.entries.lock() {
            debug!(op = key.op, args = %key.args, "cache store");
            entries.insert(
                key,
                Entry {
                    inserted_at: self.clock.now(),
                    value,
                },
            );
        }
    }

    fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }
}
