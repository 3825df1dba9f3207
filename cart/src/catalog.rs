//! Category directory: fetches flat category records from a source, builds
//! the forest and caches it for a fixed time.
//!
//! When a refetch fails, the last forest that was built successfully keeps
//! being served.

use crate::cache::TtlCache;
use crate::category::{Category, CategoryRecord, build_tree};
use chrono::Duration;
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;
use storefront_core::environment::Clock;
use thiserror::Error;

/// Errors from the category source and directory.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// The source could not deliver records.
    #[error("Category source failed: {0}")]
    Source(String),

    /// The source failed and no earlier forest is available.
    #[error("Categories unavailable: {0}")]
    Unavailable(String),
}

/// Collaborator delivering the flat category list.
///
/// Returns `BoxFuture` so it can be injected as `Arc<dyn CategorySource>`.
pub trait CategorySource: Send + Sync {
    /// Fetch every category record.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Source`] if the records cannot be fetched.
    fn fetch_categories(&self) -> BoxFuture<'_, Result<Vec<CategoryRecord>, CatalogError>>;
}

/// Cached category forest backed by a [`CategorySource`].
pub struct CategoryDirectory {
    source: Arc<dyn CategorySource>,
    cache: TtlCache<Arc<Vec<Category>>>,
}

impl fmt::Debug for CategoryDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CategoryDirectory")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl CategoryDirectory {
    /// Directory that refetches after `ttl`
    #[must_use]
    pub const fn new(source: Arc<dyn CategorySource>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            source,
            cache: TtlCache::new(clock, ttl),
        }
    }

    /// The category forest.
    ///
    /// Served from the cache while fresh; otherwise fetched and rebuilt.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Unavailable`] only if the fetch fails and no
    /// forest was ever built.
    pub async fn categories(&self) -> Result<Arc<Vec<Category>>, CatalogError> {
        if let Some(forest) = self.cache.get() {
            tracing::trace!("Serving categories from cache");
            return Ok(forest);
        }
        self.refresh().await
    }

    /// Fetch and rebuild now, ignoring freshness.
    ///
    /// # Errors
    ///
    /// Same as [`CategoryDirectory::categories`].
    pub async fn refresh(&self) -> Result<Arc<Vec<Category>>, CatalogError> {
        match self.source.fetch_categories().await {
            Ok(records) => {
                let count = records.len();
                let forest = Arc::new(build_tree(records));
                tracing::debug!(records = count, roots = forest.len(), "Rebuilt category tree");
                self.cache.insert(Arc::clone(&forest));
                Ok(forest)
            },
            Err(error) => {
                if let Some(stale) = self.cache.get_stale() {
                    tracing::warn!(%error, "Category fetch failed, serving last known categories");
                    Ok(stale)
                } else {
                    tracing::warn!(%error, "Category fetch failed and nothing is cached");
                    Err(CatalogError::Unavailable(error.to_string()))
                }
            },
        }
    }

    /// Force the next call to [`CategoryDirectory::categories`] to refetch
    /// by dropping the cached forest
    pub fn invalidate(&self) {
        self.cache.invalidate();
    }
}
