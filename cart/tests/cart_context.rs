//! Integration tests for the cart context
//!
//! Exercise the full path: context → store → reducer → write-behind
//! persistence → observers, with in-memory and on-disk storage.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use std::sync::Arc;
use std::time::Duration;
use storefront::{
    CartContext, CartEnvironment, CartPersistence, FileStorage, LineItemInput, Money,
    TicketGroupId,
};
use storefront_core::storage::KeyValueStore;
use storefront_runtime::StoreError;
use storefront_testing::{FailingStorage, InMemoryStorage, test_clock};

// ============================================================================
// Test Fixtures
// ============================================================================

const KEY: &str = "storefront-cart";
const FLUSH: Duration = Duration::from_secs(5);

fn env_with(storage: Arc<dyn KeyValueStore>) -> CartEnvironment {
    CartEnvironment::new(Arc::new(test_clock()), CartPersistence::new(storage, KEY))
}

fn ticket(group: &str, quantity: u32, cents: u64) -> LineItemInput {
    LineItemInput {
        event_name: format!("Event for {group}"),
        venue_name: "Main Hall".to_string(),
        section: "Floor".to_string(),
        row: "A".to_string(),
        ..LineItemInput::new(group, quantity, Money::from_cents(cents))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_cart_survives_restart() {
    let storage = InMemoryStorage::new();

    let cart = CartContext::initialize(env_with(Arc::new(storage.clone()))).await;
    cart.add_item(ticket("tg-1", 2, 2_500)).await.unwrap();
    cart.add_item(ticket("tg-2", 1, 5_000)).await.unwrap();
    let before = cart.snapshot().await;
    cart.shutdown(FLUSH).await.unwrap();

    let reopened = CartContext::initialize(env_with(Arc::new(storage))).await;
    let after = reopened.snapshot().await;

    assert_eq!(after.items, before.items);
    assert_eq!(after.summary, before.summary);
    assert_eq!(after.summary.total, Money::from_cents(11_499));
    // A freshly loaded cart starts a new revision sequence
    assert_eq!(after.revision, 0);
}

#[tokio::test]
async fn test_reinitialized_cart_is_persisted() {
    let storage = InMemoryStorage::new();
    let env = env_with(Arc::new(storage.clone()));

    let first = CartContext::initialize(env.clone()).await;
    for i in 0..3 {
        first.add_item(ticket(&format!("tg-{i}"), 1, 100)).await.unwrap();
    }
    first.shutdown(FLUSH).await.unwrap();

    let second = CartContext::initialize(env.clone()).await;
    assert_eq!(second.items().await.len(), 3);
    second.clear_cart().await.unwrap();
    second.add_item(ticket("tg-new", 2, 300)).await.unwrap();
    second.shutdown(FLUSH).await.unwrap();

    let persisted = env.persistence.load().await;
    assert_eq!(persisted, second.items().await);
    assert_eq!(persisted.len(), 1);
    assert_eq!(persisted[0].ticket_group_id, TicketGroupId::new("tg-new"));

    let third = CartContext::initialize(env).await;
    assert_eq!(third.items().await, persisted);
}

#[tokio::test]
async fn test_last_write_holds_newest_state() {
    let storage = InMemoryStorage::new();
    let cart = CartContext::initialize(env_with(Arc::new(storage.clone()))).await;

    for i in 0..20 {
        cart.add_item(ticket(&format!("tg-{i}"), 1, 100)).await.unwrap();
    }
    let id = cart.items().await[3].id;
    cart.remove_item(id).await.unwrap();
    cart.shutdown(FLUSH).await.unwrap();

    let persisted = CartPersistence::new(Arc::new(storage), KEY).load().await;
    assert_eq!(persisted, cart.items().await);
    assert_eq!(persisted.len(), 19);
}

#[tokio::test]
async fn test_mutations_do_not_wait_for_storage() {
    let cart = CartContext::initialize(env_with(Arc::new(FailingStorage::new()))).await;

    cart.add_item(ticket("tg-1", 3, 1_000)).await.unwrap();
    assert_eq!(cart.get_item_count().await, 3);

    cart.clear_cart().await.unwrap();
    assert_eq!(cart.get_item_count().await, 0);

    // Failed writes are swallowed
    cart.shutdown(FLUSH).await.unwrap();
}

#[tokio::test]
async fn test_corrupt_record_starts_empty_and_is_overwritten() {
    let storage = InMemoryStorage::new();
    storage.insert_raw(KEY, "<<garbage>>");

    let cart = CartContext::initialize(env_with(Arc::new(storage.clone()))).await;
    assert!(cart.items().await.is_empty());

    cart.add_item(ticket("tg-1", 1, 999)).await.unwrap();
    cart.shutdown(FLUSH).await.unwrap();

    let raw = storage.get_raw(KEY).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json[0]["ticketGroupId"], "tg-1");
    assert_eq!(json[0]["quantity"], 1);
    assert_eq!(json[0]["pricePerTicket"], 999);
}

#[tokio::test]
async fn test_observer_sees_every_change() {
    let cart = CartContext::initialize(env_with(Arc::new(InMemoryStorage::new()))).await;
    let mut rx = cart.subscribe();
    assert_eq!(rx.borrow().revision, 0);

    cart.add_item(ticket("tg-1", 2, 1_000)).await.unwrap();
    rx.changed().await.unwrap();
    {
        let snapshot = rx.borrow_and_update();
        assert_eq!(snapshot.revision, 1);
        assert_eq!(snapshot.summary.item_count, 2);
    }

    let id = cart.items().await[0].id;
    cart.update_quantity(id, 5).await.unwrap();
    rx.changed().await.unwrap();
    {
        let snapshot = rx.borrow_and_update();
        assert_eq!(snapshot.revision, 2);
        assert_eq!(snapshot.items[0].total_price, Money::from_cents(5_000));
        assert_eq!(snapshot.summary.service_fee, Money::from_cents(500));
    }

    cart.update_quantity(id, -1).await.unwrap();
    rx.changed().await.unwrap();
    assert!(rx.borrow_and_update().items.is_empty());
    assert_eq!(rx.borrow().summary.total, Money::ZERO);
}

#[tokio::test]
async fn test_concurrent_adds_keep_uniqueness() {
    let cart = CartContext::initialize(env_with(Arc::new(InMemoryStorage::new()))).await;

    let mut handles = Vec::new();
    for i in 0..10 {
        let cart = cart.clone();
        handles.push(tokio::spawn(async move {
            let group = if i % 2 == 0 { "even" } else { "odd" };
            cart.add_item(ticket(group, 1, 1_000)).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let items = cart.items().await;
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|item| item.quantity == 5));
    assert!(cart.is_item_in_cart(&TicketGroupId::new("even")).await);

    let mut rx = cart.subscribe();
    assert_eq!(rx.borrow_and_update().revision, 10);
}

#[tokio::test]
async fn test_shutdown_rejects_mutations() {
    let cart = CartContext::initialize(env_with(Arc::new(InMemoryStorage::new()))).await;
    cart.shutdown(FLUSH).await.unwrap();

    let result = cart.add_item(ticket("tg-1", 1, 100)).await;
    assert!(matches!(result, Err(StoreError::ShutdownInProgress)));
    assert!(cart.items().await.is_empty());
}

#[tokio::test]
async fn test_file_storage_end_to_end() {
    let dir = tempfile::tempdir().unwrap();

    let cart = CartContext::initialize(env_with(Arc::new(FileStorage::new(dir.path())))).await;
    cart.add_item(ticket("tg-1", 4, 1_250)).await.unwrap();
    cart.shutdown(FLUSH).await.unwrap();

    assert!(dir.path().join("storefront-cart.json").exists());

    let reopened = CartContext::initialize(env_with(Arc::new(FileStorage::new(dir.path())))).await;
    assert_eq!(reopened.items().await, cart.items().await);
    assert_eq!(reopened.summary().await.subtotal, Money::from_cents(5_000));
}
