//! Cart reducer.
//!
//! Mutations are applied to [`CartState`] synchronously; persistence is a
//! write-behind [`Effect::Future`] returned to the Store, which runs it
//! without making the caller wait.

use crate::cart::{Cart, LineItem, LineItemInput};
use crate::persistence::CartPersistence;
use crate::pricing::{PriceSummary, PricingPolicy, summarize_with};
use crate::types::LineItemId;
use std::sync::Arc;
use storefront_core::{
    SmallVec, async_effect, effect::Effect, environment::Clock, reducer::Reducer, smallvec,
};

// ============================================================================
// Actions
// ============================================================================

/// Actions accepted by the cart
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CartAction {
    /// Add a candidate, merging with an existing ticket group
    AddItem {
        /// Add-to-cart candidate
        input: LineItemInput,
    },
    /// Remove a line item (no-op if absent)
    RemoveItem {
        /// Line item identity
        id: LineItemId,
    },
    /// Set a line item's quantity; zero or less removes it
    UpdateQuantity {
        /// Line item identity
        id: LineItemId,
        /// New quantity
        quantity: i64,
    },
    /// Empty the cart
    ClearCart,
    /// Replace the whole collection (normalised first)
    Restore {
        /// Items to restore
        items: Vec<LineItem>,
    },
}

// ============================================================================
// State
// ============================================================================

/// Cart state: the collection plus its derived summary
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CartState {
    /// Line items
    pub cart: Cart,
    /// Summary of `cart` under the environment's pricing policy
    pub summary: PriceSummary,
    /// Bumped on every change to `cart`
    pub revision: u64,
}

impl CartState {
    /// State for an already loaded collection, at revision 0
    #[must_use]
    pub fn hydrated(items: Vec<LineItem>, policy: &PricingPolicy) -> Self {
        let (cart, _) = Cart::normalized(items);
        let summary = summarize_with(policy, cart.items());
        Self {
            cart,
            summary,
            revision: 0,
        }
    }
}

// ============================================================================
// Environment
// ============================================================================

/// Dependencies of the cart reducer
#[derive(Clone)]
pub struct CartEnvironment {
    /// Clock for `added_at` timestamps
    pub clock: Arc<dyn Clock>,
    /// Where the cart is written after every change
    pub persistence: CartPersistence,
    /// Fee parameters
    pub pricing: PricingPolicy,
}

impl std::fmt::Debug for CartEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartEnvironment")
            .field("persistence", &self.persistence)
            .field("pricing", &self.pricing)
            .finish_non_exhaustive()
    }
}

impl CartEnvironment {
    /// Creates a new `CartEnvironment` with the default pricing policy
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, persistence: CartPersistence) -> Self {
        Self {
            clock,
            persistence,
            pricing: PricingPolicy::default(),
        }
    }

    /// Use a different pricing policy
    #[must_use]
    pub const fn with_pricing(mut self, pricing: PricingPolicy) -> Self {
        self.pricing = pricing;
        self
    }
}

// ============================================================================
// Reducer
// ============================================================================

/// Reducer for the cart
#[derive(Clone, Debug, Default)]
pub struct CartReducer;

impl CartReducer {
    /// Creates a new `CartReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Apply an action to the collection. Returns whether it changed.
    fn apply(cart: &mut Cart, action: CartAction, env: &CartEnvironment) -> bool {
        match action {
            CartAction::AddItem { input } => {
                tracing::debug!(
                    ticket_group = %input.ticket_group_id,
                    quantity = input.quantity,
                    "Adding to cart"
                );
                cart.add_item(input, LineItemId::new(), env.clock.now())
            },
            CartAction::RemoveItem { id } => {
                tracing::debug!(%id, "Removing from cart");
                cart.remove_item(&id)
            },
            CartAction::UpdateQuantity { id, quantity } => {
                tracing::debug!(%id, quantity, "Updating quantity");
                cart.update_quantity(&id, quantity)
            },
            CartAction::ClearCart => {
                tracing::debug!("Clearing cart");
                cart.clear()
            },
            CartAction::Restore { items } => {
                let (restored, repaired) = Cart::normalized(items);
                if repaired {
                    tracing::warn!("Restored cart violated invariants and was repaired");
                }
                *cart = restored;
                true
            },
        }
    }
}

impl Reducer for CartReducer {
    type State = CartState;
    type Action = CartAction;
    type Environment = CartEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        if !Self::apply(&mut state.cart, action, env) {
            tracing::trace!("Cart unchanged");
            return smallvec![Effect::None];
        }

        state.revision += 1;
        state.summary = summarize_with(&env.pricing, state.cart.items());

        let revision = state.revision;
        let items = state.cart.items().to_vec();
        let persistence = env.persistence.clone();

        smallvec![async_effect! {
            persistence.save_revision(revision, &items).await;
            None
        }]
    }
}
