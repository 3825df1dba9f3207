//! Client-side shopping cart engine for a ticket marketplace storefront.
//!
//! Holds the ticket line items a shopper intends to buy, keeps a price
//! summary derived from them, and persists the cart across restarts. A
//! category tree builder turns the catalog's flat category list into a
//! forest.
//!
//! # Layout
//!
//! - [`types`]: money and identifiers
//! - [`cart`]: line items and the repository enforcing their invariants
//! - [`pricing`]: pure price summary
//! - [`persistence`]: fail-soft storage adapter and file-backed storage
//! - [`reducer`]: cart actions, state and reducer for the Store runtime
//! - [`context`]: [`CartContext`], the handle presentation code uses
//! - [`category`], [`cache`], [`catalog`]: category forest and its cache
//! - [`config`]: environment configuration
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use storefront::{CartContext, CartEnvironment, CartPersistence, FileStorage, LineItemInput, Money};
//! use storefront_core::environment::SystemClock;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = Arc::new(FileStorage::new(".storefront"));
//! let env = CartEnvironment::new(
//!     Arc::new(SystemClock),
//!     CartPersistence::new(storage, "storefront-cart"),
//! );
//!
//! let cart = CartContext::initialize(env).await;
//! cart.add_item(LineItemInput::new("tg-42", 2, Money::from_cents(4_550))).await?;
//!
//! println!("Total: {}", cart.summary().await.total);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod cart;
pub mod catalog;
pub mod category;
pub mod config;
pub mod context;
pub mod persistence;
pub mod pricing;
pub mod reducer;
pub mod types;

// Re-export commonly used types
pub use cart::{Cart, LineItem, LineItemInput};
pub use catalog::{CatalogError, CategoryDirectory, CategorySource};
pub use category::{Category, CategoryRecord, build_tree, slugify};
pub use config::Config;
pub use context::{CartContext, CartSnapshot};
pub use persistence::{CartPersistence, FileStorage};
pub use pricing::{PriceSummary, PricingPolicy, summarize, summarize_with};
pub use reducer::{CartAction, CartEnvironment, CartReducer, CartState};
pub use types::{LineItemId, Money, TicketGroupId};
