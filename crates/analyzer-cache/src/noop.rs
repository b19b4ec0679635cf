//! No-op cache implementation.

use analyzer_core::cache::{CacheKey, CachedValue, RequestCache};
use std::time::Duration;
use tracing::trace;

/// A cache that doesn't store anything.
///
/// `get` always misses and `put` discards its value. Useful for disabling
/// caching or testing code paths without cache hits.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

impl NoopCache {
    /// Create a new no-op cache.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl RequestCache for NoopCache {
    fn get(&self, key: &CacheKey, _ttl: Duration) -> Option<CachedValue> {
        trace!(op = key.op, "NoopCache: get called, returning None");
        None
    }

    fn put(&self, key: CacheKey, _value: CachedValue) {
        trace!(op = key.op, "NoopCache: put called, doing nothing");
    }

    fn clear(&self) {}

    fn len(&self) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_cache_never_stores() {
        let cache = NoopCache::new();
        let key = CacheKey::new("company_profile", "AAPL");

        cache.put(key.clone(), CachedValue::Profile(None));
        assert!(cache.get(&key, Duration::from_secs(300)).is_none());
        assert!(cache.is_empty());
    }
}
