//! Property tests for the cart repository, pricing and category tree

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use proptest::prelude::*;
use proptest::test_runner::Config;
use std::collections::HashSet;
use storefront::{
    Cart, CategoryRecord, LineItemId, LineItemInput, Money, build_tree, summarize,
};
use storefront_core::environment::Clock;
use storefront_testing::test_clock;

#[derive(Debug, Clone)]
enum Op {
    Add { group: u8, quantity: u32, cents: u64 },
    Remove { index: usize },
    Update { index: usize, quantity: i64 },
    Clear,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => (0_u8..6, 0_u32..10, 0_u64..100_000)
            .prop_map(|(group, quantity, cents)| Op::Add { group, quantity, cents }),
        2 => (0_usize..8).prop_map(|index| Op::Remove { index }),
        3 => (0_usize..8, -3_i64..20).prop_map(|(index, quantity)| Op::Update { index, quantity }),
        1 => Just(Op::Clear),
    ]
}

fn apply(cart: &mut Cart, op: Op) {
    let now = test_clock().now();
    match op {
        Op::Add { group, quantity, cents } => {
            let input = LineItemInput::new(format!("tg-{group}"), quantity, Money::from_cents(cents));
            cart.add_item(input, LineItemId::new(), now);
        },
        Op::Remove { index } => {
            // Out-of-range indexes exercise removal of unknown ids
            let id = cart.items().get(index).map_or_else(LineItemId::new, |item| item.id);
            cart.remove_item(&id);
        },
        Op::Update { index, quantity } => {
            let id = cart.items().get(index).map_or_else(LineItemId::new, |item| item.id);
            cart.update_quantity(&id, quantity);
        },
        Op::Clear => {
            cart.clear();
        },
    }
}

fn category() -> impl Strategy<Value = CategoryRecord> {
    (0_u8..12, "[A-Za-z ]{0,8}", proptest::option::of(0_u8..14), any::<bool>()).prop_map(
        |(id, name, parent, featured)| {
            let mut record = CategoryRecord::new(id.to_string(), name);
            if let Some(parent) = parent {
                record = record.with_parent(parent.to_string());
            }
            if featured {
                record = record.featured();
            }
            record
        },
    )
}

fn collect_ids(categories: &[storefront::Category], seen: &mut Vec<String>) {
    for category in categories {
        seen.push(category.id.as_str().to_string());
        collect_ids(&category.children, seen);
    }
}

proptest! {
    #![proptest_config(Config::with_cases(256))]

    #[test]
    fn cart_invariants_hold_after_any_mutation(ops in prop::collection::vec(op(), 0..40)) {
        let mut cart = Cart::new();
        for op in ops {
            apply(&mut cart, op);

            let groups: HashSet<_> = cart.items().iter().map(|i| i.ticket_group_id.clone()).collect();
            prop_assert_eq!(groups.len(), cart.len());
            for item in cart.items() {
                prop_assert!(item.quantity >= 1);
                prop_assert_eq!(item.total_price, item.price_per_ticket.times(item.quantity));
            }
        }
    }

    #[test]
    fn summary_is_consistent_with_items(ops in prop::collection::vec(op(), 0..30)) {
        let mut cart = Cart::new();
        for op in ops {
            apply(&mut cart, op);
        }

        let summary = summarize(cart.items());
        prop_assert_eq!(summary, summarize(cart.items()));
        prop_assert_eq!(summary.item_count, cart.item_count());
        prop_assert_eq!(summary.subtotal, cart.items().iter().map(|i| i.total_price).sum::<Money>());
        prop_assert_eq!(summary.delivery_fee.is_zero(), cart.is_empty());
        prop_assert_eq!(
            summary.total,
            summary.subtotal
                .saturating_add(summary.service_fee)
                .saturating_add(summary.delivery_fee)
                .saturating_sub(summary.discount)
        );
    }

    #[test]
    fn remove_twice_equals_remove_once(ops in prop::collection::vec(op(), 1..20), pick in 0_usize..8) {
        let mut cart = Cart::new();
        for op in ops {
            apply(&mut cart, op);
        }
        let id = cart.items().get(pick).map_or_else(LineItemId::new, |item| item.id);

        let mut once = cart.clone();
        once.remove_item(&id);
        let mut twice = cart;
        twice.remove_item(&id);
        twice.remove_item(&id);

        prop_assert_eq!(once, twice);
    }

    #[test]
    fn persisted_json_round_trips(ops in prop::collection::vec(op(), 0..20)) {
        let mut cart = Cart::new();
        for op in ops {
            apply(&mut cart, op);
        }

        let json = serde_json::to_string(cart.items()).unwrap();
        let back: Vec<storefront::LineItem> = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back.as_slice(), cart.items());
    }

    #[test]
    fn category_tree_places_every_id_once(records in prop::collection::vec(category(), 0..24)) {
        let distinct: HashSet<String> = records.iter().map(|r| r.id.as_str().to_string()).collect();
        let tree = build_tree(records);

        let mut seen = Vec::new();
        collect_ids(&tree, &mut seen);
        let unique: HashSet<String> = seen.iter().cloned().collect();

        prop_assert_eq!(seen.len(), unique.len());
        prop_assert_eq!(unique, distinct);
        for root in &tree {
            for child in &root.children {
                prop_assert!(!child.is_featured);
            }
        }
    }
}
