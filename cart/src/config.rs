//! Configuration management for the storefront cart.
//!
//! Loads configuration from `STOREFRONT_*` environment variables with
//! sensible defaults. Unparseable values fall back to the default.

use crate::persistence::DEFAULT_CART_KEY;
use crate::pricing::{DEFAULT_DELIVERY_FEE, DEFAULT_SERVICE_FEE_BPS, PricingPolicy};
use crate::types::Money;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Cart storage configuration
    pub storage: StorageConfig,
    /// Fee configuration
    pub pricing: PricingPolicy,
    /// Category cache configuration
    pub catalog: CatalogConfig,
    /// Runtime configuration
    pub runtime: RuntimeConfig,
}

/// Cart storage configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one file per storage key
    pub dir: PathBuf,
    /// Key the cart record is stored under
    pub cart_key: String,
}

/// Category cache configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Seconds a fetched category tree stays fresh
    pub cache_ttl_secs: u64,
}

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Seconds to wait for pending cart writes on shutdown
    pub shutdown_timeout_secs: u64,
    /// Log filter used when `RUST_LOG` is not set
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let parsed = |name: &str| lookup(name).and_then(|s| s.trim().parse::<u64>().ok());

        Self {
            storage: StorageConfig {
                dir: lookup("STOREFRONT_STORAGE_DIR")
                    .map_or_else(|| PathBuf::from(".storefront"), PathBuf::from),
                cart_key: lookup("STOREFRONT_CART_KEY")
                    .unwrap_or_else(|| DEFAULT_CART_KEY.to_string()),
            },
            pricing: PricingPolicy {
                service_fee_basis_points: parsed("STOREFRONT_SERVICE_FEE_BPS")
                    .and_then(|bps| u32::try_from(bps).ok())
                    .unwrap_or(DEFAULT_SERVICE_FEE_BPS),
                delivery_fee: parsed("STOREFRONT_DELIVERY_FEE_CENTS")
                    .map_or(DEFAULT_DELIVERY_FEE, Money::from_cents),
            },
            catalog: CatalogConfig {
                cache_ttl_secs: parsed("STOREFRONT_CATEGORY_CACHE_TTL").unwrap_or(300),
            },
            runtime: RuntimeConfig {
                shutdown_timeout_secs: parsed("STOREFRONT_SHUTDOWN_TIMEOUT").unwrap_or(5),
                log_level: lookup("STOREFRONT_LOG_LEVEL")
                    .unwrap_or_else(|| "storefront=debug,storefront_runtime=info".to_string()),
            },
        }
    }

    /// Shutdown timeout as a `Duration`
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.runtime.shutdown_timeout_secs)
    }

    /// Category cache TTL as a `chrono::Duration`
    #[must_use]
    pub fn category_cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::try_from(self.catalog.cache_ttl_secs).unwrap_or(i64::MAX))
    }
}
