//! Value objects shared by the cart, pricing and persistence modules.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Identity of a line item within the cart.
///
/// Generated when the item is first added and never changed afterwards,
/// even when its quantity is updated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineItemId(Uuid);

impl LineItemId {
    /// Creates a new random `LineItemId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `LineItemId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for LineItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LineItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to the priced inventory unit (a seating/price offering).
///
/// Opaque to the cart; supplied by the catalog.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketGroupId(String);

impl TicketGroupId {
    /// Wrap a catalog-supplied ticket group reference
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TicketGroupId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TicketGroupId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// ============================================================================
// Money
// ============================================================================

/// Non-negative amount in minor units (cents).
///
/// All arithmetic saturates, so no combination of trusted catalog prices
/// can overflow or go negative.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    /// Zero
    pub const ZERO: Self = Self(0);

    /// Amount from cents
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Amount from whole dollars
    #[must_use]
    pub const fn from_dollars(dollars: u64) -> Self {
        Self(dollars.saturating_mul(100))
    }

    /// Amount in cents
    #[must_use]
    pub const fn cents(self) -> u64 {
        self.0
    }

    /// `self + other`, clamped at `u64::MAX` cents
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// `self - other`, clamped at zero
    #[must_use]
    pub const fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// `self * quantity`, clamped at `u64::MAX` cents
    #[must_use]
    pub const fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(quantity as u64))
    }

    /// Fraction of this amount in basis points (1/100 of a percent),
    /// rounded half-up to the nearest cent.
    ///
    /// ```
    /// use storefront::types::Money;
    ///
    /// assert_eq!(Money::from_cents(10_000).basis_points(1_000), Money::from_cents(1_000));
    /// assert_eq!(Money::from_cents(5).basis_points(1_000), Money::from_cents(1));
    /// ```
    #[must_use]
    pub const fn basis_points(self, bps: u32) -> Self {
        let scaled = (self.0 as u128) * (bps as u128) + 5_000;
        let cents = scaled / 10_000;
        if cents > u64::MAX as u128 {
            Self(u64::MAX)
        } else {
            #[allow(clippy::cast_possible_truncation)] // bounded by the check above
            Self(cents as u64)
        }
    }

    /// True for zero
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Self::saturating_add)
    }
}
