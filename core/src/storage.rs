//! Key-value storage abstraction for client-side persistence.
//!
//! The storefront persists small serialized records (the shopping cart) under
//! fixed keys, the way a browser keeps data in local storage. This module
//! defines that contract so domain code never touches a global store directly.
//!
//! # Implementations
//!
//! - `FileStorage` (in `storefront-cart`): one file per key on local disk
//! - `InMemoryStorage` / `FailingStorage` (in `storefront-testing`): fast, deterministic tests
//!
//! # Dyn Compatibility
//!
//! Methods return boxed futures so the trait can be injected as
//! `Arc<dyn KeyValueStore>` through an environment.

use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Boxed future returned by [`KeyValueStore`] methods
pub type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StorageError>> + Send + 'a>>;

/// Errors that can occur during storage operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The backend cannot be used at all (disabled, missing, permission denied).
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// The write would exceed the backend's capacity.
    #[error("Storage quota exceeded: {needed} bytes needed, {available} available")]
    QuotaExceeded {
        /// Size of the rejected value in bytes
        needed: usize,
        /// Bytes still available in the backend
        available: usize,
    },

    /// Reading or writing the underlying medium failed.
    #[error("I/O error: {0}")]
    Io(String),

    /// The stored value could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for StorageError {
    fn from(error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => Self::Unavailable(error.to_string()),
            _ => Self::Io(error.to_string()),
        }
    }
}

/// String key-value store.
///
/// Values are opaque strings (usually JSON). Implementations must be
/// `Send + Sync` so they can be shared with spawned effects.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Returns
    ///
    /// - `Some(value)` if the key exists
    /// - `None` if nothing was ever stored under the key
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be read.
    fn get<'a>(&'a self, key: &'a str) -> StorageFuture<'a, Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::QuotaExceeded`] if the backend is full, or
    /// another [`StorageError`] if the write fails.
    fn set<'a>(&'a self, key: &'a str, value: String) -> StorageFuture<'a, ()>;

    /// Remove the value stored under `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be written.
    fn remove<'a>(&'a self, key: &'a str) -> StorageFuture<'a, ()>;
}
