//! Price summary derivation.
//!
//! The summary is never stored on its own: it is recomputed in full from
//! the line items after every change.

use crate::cart::LineItem;
use crate::types::Money;
use serde::{Deserialize, Serialize};

/// Default service fee: 10% of the subtotal
pub const DEFAULT_SERVICE_FEE_BPS: u32 = 1_000;

/// Default flat delivery fee for a non-empty cart: 4.99
pub const DEFAULT_DELIVERY_FEE: Money = Money::from_cents(499);

/// Fee parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingPolicy {
    /// Service fee in basis points of the subtotal, rounded half-up
    pub service_fee_basis_points: u32,
    /// Flat fee charged once for any non-empty cart
    pub delivery_fee: Money,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            service_fee_basis_points: DEFAULT_SERVICE_FEE_BPS,
            delivery_fee: DEFAULT_DELIVERY_FEE,
        }
    }
}

/// Derived price breakdown for a cart.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSummary {
    /// Sum of quantities
    pub item_count: u64,
    /// Sum of line totals
    pub subtotal: Money,
    /// Service fee on the subtotal
    pub service_fee: Money,
    /// Flat delivery fee, zero for an empty cart
    pub delivery_fee: Money,
    /// Promotional discount (always zero for now)
    pub discount: Money,
    /// `subtotal + service_fee + delivery_fee - discount`
    pub total: Money,
}

/// Summarize with the default policy.
///
/// ```
/// use storefront::pricing::summarize;
///
/// let summary = summarize(&[]);
/// assert!(summary.total.is_zero());
/// ```
#[must_use]
pub fn summarize(items: &[LineItem]) -> PriceSummary {
    summarize_with(&PricingPolicy::default(), items)
}

/// Summarize with an explicit policy.
#[must_use]
pub fn summarize_with(policy: &PricingPolicy, items: &[LineItem]) -> PriceSummary {
    let item_count = items.iter().map(|item| u64::from(item.quantity)).sum();
    let subtotal: Money = items.iter().map(|item| item.total_price).sum();
    let service_fee = subtotal.basis_points(policy.service_fee_basis_points);
    let delivery_fee = if items.is_empty() {
        Money::ZERO
    } else {
        policy.delivery_fee
    };
    let discount = Money::ZERO;

    let total = subtotal
        .saturating_add(service_fee)
        .saturating_add(delivery_fee)
        .saturating_sub(discount);

    PriceSummary {
        item_count,
        subtotal,
        service_fee,
        delivery_fee,
        discount,
        total,
    }
}
