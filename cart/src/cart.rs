//! Line-item repository.
//!
//! [`Cart`] is the ordered collection of [`LineItem`]s and the single source
//! of truth for everything derived from it (see [`crate::pricing`]).
//!
//! Invariants kept by every mutation:
//! - at most one line item per [`TicketGroupId`]
//! - `total_price == quantity * price_per_ticket` for every item
//! - every quantity is at least 1
//! - insertion order is preserved

use crate::types::{LineItemId, Money, TicketGroupId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One shopper-intended purchase unit.
///
/// Event and venue fields are for display only and never affect pricing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Synthetic identity, stable across updates
    pub id: LineItemId,
    /// Priced inventory unit
    pub ticket_group_id: TicketGroupId,
    /// Event reference
    pub event_id: String,
    /// Event name
    pub event_name: String,
    /// Event date as supplied by the catalog
    pub event_date: String,
    /// Venue name
    pub venue_name: String,
    /// Venue city/location
    pub venue_location: String,
    /// Seating section
    pub section: String,
    /// Seating row
    pub row: String,
    /// Number of tickets
    pub quantity: u32,
    /// Unit price
    pub price_per_ticket: Money,
    /// Always `quantity * price_per_ticket`
    pub total_price: Money,
    /// When the item was first added
    pub added_at: DateTime<Utc>,
}

impl LineItem {
    /// Build a new line item from an add-to-cart candidate
    #[must_use]
    pub fn from_input(input: LineItemInput, id: LineItemId, added_at: DateTime<Utc>) -> Self {
        Self {
            id,
            total_price: input.price_per_ticket.times(input.quantity),
            ticket_group_id: input.ticket_group_id,
            event_id: input.event_id,
            event_name: input.event_name,
            event_date: input.event_date,
            venue_name: input.venue_name,
            venue_location: input.venue_location,
            section: input.section,
            row: input.row,
            quantity: input.quantity,
            price_per_ticket: input.price_per_ticket,
            added_at,
        }
    }

    /// Set the quantity and recompute the total
    pub const fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
        self.total_price = self.price_per_ticket.times(quantity);
    }
}

/// Add-to-cart candidate supplied by the catalog.
///
/// Values are trusted as given.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemInput {
    /// Priced inventory unit
    pub ticket_group_id: TicketGroupId,
    /// Event reference
    pub event_id: String,
    /// Event name
    pub event_name: String,
    /// Event date
    pub event_date: String,
    /// Venue name
    pub venue_name: String,
    /// Venue city/location
    pub venue_location: String,
    /// Seating section
    pub section: String,
    /// Seating row
    pub row: String,
    /// Number of tickets to add
    pub quantity: u32,
    /// Unit price
    pub price_per_ticket: Money,
}

impl LineItemInput {
    /// Minimal candidate: ticket group, quantity and unit price
    ///
    /// Descriptive fields are left empty; set them with struct update syntax.
    #[must_use]
    pub fn new(ticket_group_id: impl Into<TicketGroupId>, quantity: u32, price_per_ticket: Money) -> Self {
        Self {
            ticket_group_id: ticket_group_id.into(),
            quantity,
            price_per_ticket,
            ..Self::default()
        }
    }
}

/// Ordered collection of line items.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    /// Empty cart
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a cart from possibly inconsistent data (e.g. loaded from storage).
    ///
    /// Repairs applied:
    /// - items with quantity 0 are dropped
    /// - items sharing a ticket group are merged into the first one
    /// - `total_price` is recomputed
    ///
    /// Returns the cart and whether anything had to be repaired.
    #[must_use]
    pub fn normalized(items: Vec<LineItem>) -> (Self, bool) {
        let mut repaired = false;
        let mut cart = Self::new();
        let mut positions: HashMap<TicketGroupId, usize> = HashMap::new();

        for mut item in items {
            if item.quantity == 0 {
                repaired = true;
                continue;
            }

            let expected = item.price_per_ticket.times(item.quantity);
            if item.total_price != expected {
                repaired = true;
                item.total_price = expected;
            }

            if let Some(&index) = positions.get(&item.ticket_group_id) {
                repaired = true;
                let existing = &mut cart.items[index];
                let merged = existing.quantity.saturating_add(item.quantity);
                existing.set_quantity(merged);
            } else {
                positions.insert(item.ticket_group_id.clone(), cart.items.len());
                cart.items.push(item);
            }
        }

        (cart, repaired)
    }

    /// Add a candidate to the cart.
    ///
    /// - quantity 0: no-op
    /// - ticket group already in the cart: quantities are summed and the
    ///   existing unit price is kept
    /// - otherwise: appended as a new item with `id` and `now`
    ///
    /// Returns whether the cart changed.
    pub fn add_item(&mut self, candidate: LineItemInput, id: LineItemId, now: DateTime<Utc>) -> bool {
        if candidate.quantity == 0 {
            return false;
        }

        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|item| item.ticket_group_id == candidate.ticket_group_id)
        {
            let merged = existing.quantity.saturating_add(candidate.quantity);
            if merged == existing.quantity {
                return false;
            }
            existing.set_quantity(merged);
            return true;
        }

        self.items.push(LineItem::from_input(candidate, id, now));
        true
    }

    /// Remove the item with `id`. Unknown ids are a no-op.
    ///
    /// Returns whether the cart changed.
    pub fn remove_item(&mut self, id: &LineItemId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| &item.id != id);
        self.items.len() != before
    }

    /// Set the quantity of the item with `id`.
    ///
    /// Zero or negative quantities remove the item. Unknown ids are a no-op.
    /// Quantities beyond `u32::MAX` are clamped.
    ///
    /// Returns whether the cart changed.
    pub fn update_quantity(&mut self, id: &LineItemId, quantity: i64) -> bool {
        if quantity <= 0 {
            return self.remove_item(id);
        }

        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        match self.items.iter_mut().find(|item| &item.id == id) {
            Some(item) if item.quantity != quantity => {
                item.set_quantity(quantity);
                true
            },
            _ => false,
        }
    }

    /// Remove everything. Returns whether the cart changed.
    pub fn clear(&mut self) -> bool {
        let changed = !self.items.is_empty();
        self.items.clear();
        changed
    }

    /// Sum of quantities
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Whether the ticket group already has a line item
    #[must_use]
    pub fn is_item_in_cart(&self, ticket_group_id: &TicketGroupId) -> bool {
        self.items
            .iter()
            .any(|item| &item.ticket_group_id == ticket_group_id)
    }

    /// Look up an item by identity
    #[must_use]
    pub fn get_item(&self, id: &LineItemId) -> Option<&LineItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Items in insertion order
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Number of distinct line items
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if the cart has no items
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
