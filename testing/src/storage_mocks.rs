//! In-memory key-value storage for tests
//!
//! - [`InMemoryStorage`]: HashMap-backed storage with an optional byte quota
//! - [`FailingStorage`]: storage that rejects every operation

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Lock poisoning only happens after a test already panicked

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use storefront_core::storage::{KeyValueStore, StorageError, StorageFuture};

/// In-memory key-value storage for fast, deterministic testing.
///
/// Clones share the same underlying map, so a test can keep one handle for
/// assertions while the code under test owns another.
///
/// # Example
///
/// ```
/// use storefront_testing::InMemoryStorage;
/// use storefront_core::storage::KeyValueStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let storage = InMemoryStorage::new();
/// storage.set("cart", "[]".to_string()).await?;
///
/// assert_eq!(storage.get("cart").await?, Some("[]".to_string()));
/// assert_eq!(storage.writes(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryStorage {
    data: Arc<RwLock<HashMap<String, String>>>,
    quota: Option<usize>,
    writes: Arc<AtomicUsize>,
}

impl InMemoryStorage {
    /// Create a new empty storage without a quota
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create storage that rejects writes once the total stored bytes
    /// (keys plus values) would exceed `quota`
    #[must_use]
    pub fn with_quota(quota: usize) -> Self {
        Self {
            quota: Some(quota),
            ..Self::default()
        }
    }

    /// Put a raw value in place without going through [`KeyValueStore::set`]
    ///
    /// Useful for seeding corrupt or legacy data. Does not count as a write.
    pub fn insert_raw(&self, key: impl Into<String>, value: impl Into<String>) {
        self.data.write().unwrap().insert(key.into(), value.into());
    }

    /// Read a raw value synchronously
    #[must_use]
    pub fn get_raw(&self, key: &str) -> Option<String> {
        self.data.read().unwrap().get(key).cloned()
    }

    /// Number of successful `set` calls so far
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of stored keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.read().unwrap().len()
    }

    /// Check if nothing is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.read().unwrap().is_empty()
    }

    /// Remove everything (for test isolation)
    pub fn clear(&self) {
        self.data.write().unwrap().clear();
    }

    fn used_bytes_excluding(data: &HashMap<String, String>, key: &str) -> usize {
        data.iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl KeyValueStore for InMemoryStorage {
    fn get<'a>(&'a self, key: &'a str) -> StorageFuture<'a, Option<String>> {
        Box::pin(async move { Ok(self.data.read().unwrap().get(key).cloned()) })
    }

    fn set<'a>(&'a self, key: &'a str, value: String) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            let mut data = self.data.write().unwrap();

            if let Some(quota) = self.quota {
                let used = Self::used_bytes_excluding(&data, key);
                let needed = key.len() + value.len();
                let available = quota.saturating_sub(used);
                if needed > available {
                    return Err(StorageError::QuotaExceeded { needed, available });
                }
            }

            data.insert(key.to_string(), value);
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    fn remove<'a>(&'a self, key: &'a str) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            self.data.write().unwrap().remove(key);
            Ok(())
        })
    }
}

/// Storage whose every operation fails with [`StorageError::Unavailable`].
///
/// Stands in for a disabled or inaccessible backend.
#[derive(Clone, Debug, Default)]
pub struct FailingStorage;

impl FailingStorage {
    /// Create a new failing storage
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn unavailable() -> StorageError {
        StorageError::Unavailable("storage disabled".to_string())
    }
}

impl KeyValueStore for FailingStorage {
    fn get<'a>(&'a self, _key: &'a str) -> StorageFuture<'a, Option<String>> {
        Box::pin(async { Err(Self::unavailable()) })
    }

    fn set<'a>(&'a self, _key: &'a str, _value: String) -> StorageFuture<'a, ()> {
        Box::pin(async { Err(Self::unavailable()) })
    }

    fn remove<'a>(&'a self, _key: &'a str) -> StorageFuture<'a, ()> {
        Box::pin(async { Err(Self::unavailable()) })
    }
}
