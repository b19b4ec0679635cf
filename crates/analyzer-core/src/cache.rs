//! Request cache trait and key types.
//!
//! This module defines the [`RequestCache`] trait that lets the orchestrator
//! short-circuit repeated provider calls within a TTL window. The TTL is
//! supplied per `get` call rather than stored with the entry, so one cache can
//! serve operations with different freshness requirements.
//!
//! Time is read through the [`Clock`] trait so TTL behavior can be tested
//! deterministically with [`ManualClock`].

use std::fmt::Debug;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::types::{
    CompanyProfile, EconomicPoint, InsiderTransaction, PriceBar, RatioSnapshot, StatementRecord,
};

/// A monotonic time source.
pub trait Clock: Send + Sync + Debug {
    /// Returns the current instant.
    fn now(&self) -> Instant;
}

/// Clock backed by [`Instant::now`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually-advanced clock for tests.
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    /// Creates a clock frozen at the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Advances the clock by `delta`.
    pub fn advance(&self, delta: Duration) {
        if let Ok(mut offset) = self.offset.lock() {
            *offset += delta;
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = self.offset.lock().map(|o| *o).unwrap_or(Duration::ZERO);
        self.base + offset
    }
}

/// Key identifying one cached operation result.
///
/// `op` is the operation name and `args` a normalized rendering of its
/// arguments, so `company_profile("AAPL")` and `company_profile("MSFT")`
/// occupy distinct entries.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Operation name.
    pub op: &'static str,
    /// Normalized argument string.
    pub args: String,
}

impl CacheKey {
    /// Creates a new cache key.
    #[must_use]
    pub fn new(op: &'static str, args: impl Into<String>) -> Self {
        Self {
            op,
            args: args.into(),
        }
    }
}

/// The payloads a request cache can hold.
///
/// A closed enum keeps the cache object-safe without type erasure; each
/// cacheable operation has exactly one variant.
#[derive(Clone, Debug, PartialEq)]
pub enum CachedValue {
    /// A resolved company profile (or a remembered miss).
    Profile(Option<CompanyProfile>),
    /// Resolved financial ratios (or a remembered miss).
    Ratios(Option<RatioSnapshot>),
    /// A daily price series.
    Prices(Vec<PriceBar>),
    /// An insider transaction list.
    Insiders(Vec<InsiderTransaction>),
    /// An economic series.
    Series(Vec<EconomicPoint>),
    /// Financial statement records.
    Statements(Vec<StatementRecord>),
}

/// Trait for request-scoped TTL caching of provider results.
///
/// Implementations must not hold internal locks across provider calls;
/// `get` and `put` are cheap synchronous map operations.
pub trait RequestCache: Send + Sync + Debug {
    /// Returns the cached value for `key` if one exists and is younger
    /// than `ttl`.
    fn get(&self, key: &CacheKey, ttl: Duration) -> Option<CachedValue>;

    /// Stores `value` under `key`, overwriting any previous entry.
    fn put(&self, key: CacheKey, value: CachedValue);

    /// Removes all entries.
    fn clear(&self);

    /// Returns the number of entries currently held (stale included).
    fn len(&self) -> usize;

    /// Returns true if the cache holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
