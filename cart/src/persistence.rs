//! Persistent store adapter.
//!
//! The cart is stored as one JSON array of line items under a fixed key.
//! Both directions fail soft: a missing, unreadable or corrupt record loads
//! as an empty cart, and a failed write is logged and dropped. Callers never
//! see a storage error.

use crate::cart::{Cart, LineItem};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use storefront_core::storage::{KeyValueStore, StorageError, StorageFuture};
use tokio::sync::Mutex;

/// Default storage key for the cart record
pub const DEFAULT_CART_KEY: &str = "storefront-cart";

/// Fail-soft JSON adapter between the cart and a [`KeyValueStore`].
///
/// Clones share the backend and the revision guard. Each cart session
/// numbers its revisions from zero, so it takes its own guard through
/// [`CartPersistence::session`].
#[derive(Clone)]
pub struct CartPersistence {
    storage: Arc<dyn KeyValueStore>,
    key: String,
    /// Newest revision written (or attempted) so far
    last_revision: Arc<Mutex<u64>>,
}

impl fmt::Debug for CartPersistence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartPersistence")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl CartPersistence {
    /// Adapter storing the cart under `key`
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
            last_revision: Arc::new(Mutex::new(0)),
        }
    }

    /// Same backend and key, with a revision guard starting at zero.
    ///
    /// Revisions written through an earlier session no longer count as
    /// newer than the ones this session writes.
    #[must_use]
    pub fn session(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            key: self.key.clone(),
            last_revision: Arc::new(Mutex::new(0)),
        }
    }

    /// Storage key in use
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the persisted cart.
    ///
    /// Never fails: anything other than a well-formed record yields an empty
    /// cart. Well-formed but inconsistent records (duplicate ticket groups,
    /// zero quantities, stale totals) are repaired.
    pub async fn load(&self) -> Vec<LineItem> {
        let raw = match self.storage.get(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::debug!(key = %self.key, "No persisted cart");
                return Vec::new();
            },
            Err(error) => {
                tracing::warn!(key = %self.key, %error, "Failed to read persisted cart, starting empty");
                metrics::counter!("cart.persistence.load_failed", "reason" => "storage").increment(1);
                return Vec::new();
            },
        };

        let items: Vec<LineItem> = match serde_json::from_str(&raw) {
            Ok(items) => items,
            Err(error) => {
                tracing::warn!(key = %self.key, %error, "Persisted cart is corrupt, starting empty");
                metrics::counter!("cart.persistence.load_failed", "reason" => "corrupt").increment(1);
                return Vec::new();
            },
        };

        let loaded = items.len();
        let (cart, repaired) = Cart::normalized(items);
        if repaired {
            tracing::warn!(
                key = %self.key,
                loaded,
                kept = cart.len(),
                "Persisted cart violated invariants and was repaired"
            );
        }

        tracing::debug!(key = %self.key, items = cart.len(), "Loaded persisted cart");
        cart.items().to_vec()
    }

    /// Write the cart. Failures are logged and otherwise ignored.
    pub async fn save(&self, items: &[LineItem]) {
        if let Err(error) = self.try_save(items).await {
            tracing::warn!(key = %self.key, %error, "Failed to persist cart");
            metrics::counter!("cart.persistence.save_failed").increment(1);
        }
    }

    /// Write the cart as of `revision`, unless a newer revision was already
    /// written.
    ///
    /// Writes are serialised, so the record always ends up holding the
    /// newest revision handed to this method. Returns whether a write was
    /// attempted.
    pub async fn save_revision(&self, revision: u64, items: &[LineItem]) -> bool {
        let mut last = self.last_revision.lock().await;
        if revision <= *last {
            tracing::debug!(revision, newest = *last, "Skipping stale cart write");
            return false;
        }

        self.save(items).await;
        *last = revision;
        true
    }

    async fn try_save(&self, items: &[LineItem]) -> Result<(), StorageError> {
        let json = serde_json::to_string(items)
            .map_err(|error| StorageError::Serialization(error.to_string()))?;
        self.storage.set(&self.key, json).await?;
        tracing::trace!(key = %self.key, items = items.len(), "Persisted cart");
        Ok(())
    }
}

/// One file per key under a directory.
///
/// Writes go to a temporary file that is then renamed over the target, so
/// a crash mid-write never leaves a truncated record.
#[derive(Clone, Debug)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Storage rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{file}.json"))
    }
}

impl KeyValueStore for FileStorage {
    fn get<'a>(&'a self, key: &'a str) -> StorageFuture<'a, Option<String>> {
        Box::pin(async move {
            match tokio::fs::read_to_string(self.path_for(key)).await {
                Ok(value) => Ok(Some(value)),
                Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(error) => Err(error.into()),
            }
        })
    }

    fn set<'a>(&'a self, key: &'a str, value: String) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            tokio::fs::create_dir_all(&self.dir).await?;

            let path = self.path_for(key);
            let tmp = path.with_extension(format!("json.{}.tmp", uuid::Uuid::new_v4()));
            tokio::fs::write(&tmp, value).await?;
            if let Err(error) = tokio::fs::rename(&tmp, &path).await {
                let _ = tokio::fs::remove_file(&tmp).await;
                return Err(error.into());
            }
            Ok(())
        })
    }

    fn remove<'a>(&'a self, key: &'a str) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            match tokio::fs::remove_file(self.path_for(key)).await {
                Ok(()) => Ok(()),
                Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(error) => Err(error.into()),
            }
        })
    }
}
