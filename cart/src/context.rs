//! Cart context: the surface presentation code talks to.
//!
//! Wraps a [`Store`] running the [`CartReducer`]. Mutations return as soon as
//! the in-memory cart is updated; the write-behind save runs on its own.
//! Observers get a [`CartSnapshot`] after every change through a
//! `tokio::sync::watch` channel.

use crate::cart::{LineItem, LineItemInput};
use crate::pricing::PriceSummary;
use crate::reducer::{CartAction, CartEnvironment, CartReducer, CartState};
use crate::types::{LineItemId, TicketGroupId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use storefront_runtime::{Store, StoreError};
use tokio::sync::watch;

type CartStore = Store<CartState, CartAction, CartEnvironment, CartReducer>;

/// Consistent view of the cart at one revision.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSnapshot {
    /// Cart revision (0 for the state loaded at startup)
    pub revision: u64,
    /// Line items in insertion order
    pub items: Vec<LineItem>,
    /// Derived price summary
    pub summary: PriceSummary,
}

impl CartSnapshot {
    fn of(state: &CartState) -> Self {
        Self {
            revision: state.revision,
            items: state.cart.items().to_vec(),
            summary: state.summary,
        }
    }
}

/// Shopping cart handle.
///
/// Cheap to clone; clones share the same cart.
#[derive(Clone)]
pub struct CartContext {
    store: CartStore,
    snapshots: Arc<watch::Sender<CartSnapshot>>,
}

impl std::fmt::Debug for CartContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartContext")
            .field("revision", &self.snapshots.borrow().revision)
            .finish_non_exhaustive()
    }
}

impl CartContext {
    /// Load the persisted cart (once) and start the store.
    ///
    /// Never fails: an unreadable record starts an empty cart.
    pub async fn initialize(mut env: CartEnvironment) -> Self {
        env.persistence = env.persistence.session();
        let items = env.persistence.load().await;
        let state = CartState::hydrated(items, &env.pricing);
        tracing::info!(
            items = state.cart.len(),
            key = env.persistence.key(),
            "Cart initialized"
        );

        let (snapshots, _) = watch::channel(CartSnapshot::of(&state));
        Self {
            store: Store::new(state, CartReducer::new(), env),
            snapshots: Arc::new(snapshots),
        }
    }

    // ========== Mutations ==========

    /// Add a candidate; an existing ticket group has its quantity increased.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after [`CartContext::shutdown`].
    pub async fn add_item(&self, input: LineItemInput) -> Result<(), StoreError> {
        self.dispatch(CartAction::AddItem { input }).await
    }

    /// Remove a line item. Unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after [`CartContext::shutdown`].
    pub async fn remove_item(&self, id: LineItemId) -> Result<(), StoreError> {
        self.dispatch(CartAction::RemoveItem { id }).await
    }

    /// Set a line item's quantity; zero or less removes it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after [`CartContext::shutdown`].
    pub async fn update_quantity(&self, id: LineItemId, quantity: i64) -> Result<(), StoreError> {
        self.dispatch(CartAction::UpdateQuantity { id, quantity }).await
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after [`CartContext::shutdown`].
    pub async fn clear_cart(&self) -> Result<(), StoreError> {
        self.dispatch(CartAction::ClearCart).await
    }

    // ========== Queries ==========

    /// Line items in insertion order
    pub async fn items(&self) -> Vec<LineItem> {
        self.store.state(|s| s.cart.items().to_vec()).await
    }

    /// Current price summary
    pub async fn summary(&self) -> PriceSummary {
        self.store.state(|s| s.summary).await
    }

    /// Items and summary at a single revision
    pub async fn snapshot(&self) -> CartSnapshot {
        self.store.state(CartSnapshot::of).await
    }

    /// Sum of quantities
    pub async fn get_item_count(&self) -> u64 {
        self.store.state(|s| s.cart.item_count()).await
    }

    /// Whether the ticket group already has a line item
    pub async fn is_item_in_cart(&self, ticket_group_id: &TicketGroupId) -> bool {
        self.store
            .state(|s| s.cart.is_item_in_cart(ticket_group_id))
            .await
    }

    /// Look up a line item
    pub async fn get_item(&self, id: &LineItemId) -> Option<LineItem> {
        self.store.state(|s| s.cart.get_item(id).cloned()).await
    }

    // ========== Observers ==========

    /// Receive a snapshot after every change.
    ///
    /// The receiver starts with the current snapshot marked as seen; await
    /// `changed()` for the next one.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartSnapshot> {
        self.snapshots.subscribe()
    }

    /// Stop accepting mutations and wait for pending writes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownTimeout`] if writes are still running
    /// after `timeout`.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
        self.store.shutdown(timeout).await
    }

    async fn dispatch(&self, action: CartAction) -> Result<(), StoreError> {
        self.store.send(action).await?;

        let snapshot = self.store.state(CartSnapshot::of).await;
        let published = self.snapshots.send_if_modified(|current| {
            // Concurrent callers may publish out of order; keep the newest
            if snapshot.revision > current.revision {
                *current = snapshot;
                true
            } else {
                false
            }
        });

        if published {
            tracing::trace!("Published cart snapshot");
        }
        Ok(())
    }
}
