//! Single-value cache with time-based expiry.
//!
//! Time comes from an injected [`Clock`], so expiry is deterministic under
//! test.

use chrono::{DateTime, Duration, Utc};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use storefront_core::environment::Clock;

struct Entry<T> {
    value: T,
    stored_at: DateTime<Utc>,
}

/// Holds at most one value, considered fresh for `ttl` after insertion.
///
/// Expired values are kept (see [`TtlCache::get_stale`]) until replaced or
/// invalidated.
pub struct TtlCache<T> {
    clock: Arc<dyn Clock>,
    ttl: Duration,
    entry: Mutex<Option<Entry<T>>>,
}

impl<T> fmt::Debug for TtlCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlCache")
            .field("ttl", &self.ttl)
            .field("fresh", &self.is_fresh())
            .finish_non_exhaustive()
    }
}

impl<T: Clone> TtlCache<T> {
    /// Empty cache
    #[must_use]
    pub const fn new(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            clock,
            ttl,
            entry: Mutex::new(None),
        }
    }

    /// The value, if present and not expired
    #[must_use]
    pub fn get(&self) -> Option<T> {
        let now = self.clock.now();
        self.lock()
            .as_ref()
            .filter(|entry| now - entry.stored_at < self.ttl)
            .map(|entry| entry.value.clone())
    }

    /// The value regardless of age
    #[must_use]
    pub fn get_stale(&self) -> Option<T> {
        self.lock().as_ref().map(|entry| entry.value.clone())
    }

    /// Replace the value; it is fresh from now
    pub fn insert(&self, value: T) {
        *self.lock() = Some(Entry {
            value,
            stored_at: self.clock.now(),
        });
    }

    /// Drop the value
    pub fn invalidate(&self) {
        *self.lock() = None;
    }
}

impl<T> TtlCache<T> {
    /// Whether a value is present and not expired
    #[must_use]
    pub fn is_fresh(&self) -> bool {
        let now = self.clock.now();
        self.lock()
            .as_ref()
            .is_some_and(|entry| now - entry.stored_at < self.ttl)
    }

    /// Configured time-to-live
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    // Poison-tolerant: the entry is only ever replaced whole
    fn lock(&self) -> MutexGuard<'_, Option<Entry<T>>> {
        self.entry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
