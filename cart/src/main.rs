//! Storefront cart demo binary
//!
//! Restores the cart from disk, adds a few tickets, prints the price summary
//! and the category tree, then flushes pending writes before exiting. Run it
//! twice to see the cart survive a restart.

use anyhow::Context as _;
use futures::future::BoxFuture;
use std::sync::Arc;
use storefront::{
    CartContext, CartEnvironment, CartPersistence, CatalogError, Category, CategoryDirectory,
    CategoryRecord, CategorySource, Config, FileStorage, LineItemInput, Money,
};
use storefront_core::environment::SystemClock;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Category source serving a fixed list
struct DemoCategories;

impl CategorySource for DemoCategories {
    fn fetch_categories(&self) -> BoxFuture<'_, Result<Vec<CategoryRecord>, CatalogError>> {
        Box::pin(async {
            Ok(vec![
                CategoryRecord::new("1", "Concerts"),
                CategoryRecord::new("2", "Sports"),
                CategoryRecord::new("3", "rock").with_parent("1"),
                CategoryRecord::new("4", "Jazz").with_parent("1"),
                CategoryRecord::new("5", "Basketball").with_parent("2"),
                CategoryRecord::new("6", "Playoffs").with_parent("5").featured(),
            ])
        })
    }
}

fn print_tree(categories: &[Category], depth: usize) {
    for category in categories {
        let marker = if category.is_featured { " *" } else { "" };
        println!("  {}{} ({}){marker}", "  ".repeat(depth), category.name, category.slug);
        print_tree(&category.children, depth + 1);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.runtime.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== Storefront Cart ===\n");

    let clock = Arc::new(SystemClock);
    let storage = Arc::new(FileStorage::new(&config.storage.dir));
    let env = CartEnvironment::new(
        clock.clone(),
        CartPersistence::new(storage, config.storage.cart_key.clone()),
    )
    .with_pricing(config.pricing);

    let cart = CartContext::initialize(env).await;
    let restored = cart.items().await;
    println!("Restored {} line item(s) from {}", restored.len(), config.storage.dir.display());

    let mut updates = cart.subscribe();
    tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let snapshot = updates.borrow_and_update().clone();
            tracing::info!(
                revision = snapshot.revision,
                items = snapshot.summary.item_count,
                total = %snapshot.summary.total,
                "Cart changed"
            );
        }
    });

    println!("\n>>> Adding 2 x Balcony C and 1 x Floor A");
    cart.add_item(LineItemInput {
        event_name: "Symphony No. 9".to_string(),
        venue_name: "Concert Hall".to_string(),
        section: "Balcony".to_string(),
        row: "C".to_string(),
        ..LineItemInput::new("tg-balcony-c", 2, Money::from_cents(4_550))
    })
    .await?;
    cart.add_item(LineItemInput {
        event_name: "Finals Game 7".to_string(),
        venue_name: "Arena".to_string(),
        section: "Floor".to_string(),
        row: "A".to_string(),
        ..LineItemInput::new("tg-floor-a", 1, Money::from_cents(12_000))
    })
    .await?;

    println!("\nCart:");
    for item in cart.items().await {
        let label = if item.event_name.is_empty() {
            item.ticket_group_id.as_str()
        } else {
            item.event_name.as_str()
        };
        println!(
            "  {} x {label} ({} {}) @ {} = {}",
            item.quantity,
            item.section,
            item.row,
            item.price_per_ticket,
            item.total_price
        );
    }

    let summary = cart.summary().await;
    println!("\nItems:        {}", summary.item_count);
    println!("Subtotal:     {}", summary.subtotal);
    println!("Service fee:  {}", summary.service_fee);
    println!("Delivery fee: {}", summary.delivery_fee);
    println!("Discount:     {}", summary.discount);
    println!("Total:        {}", summary.total);

    let directory =
        CategoryDirectory::new(Arc::new(DemoCategories), clock, config.category_cache_ttl());
    let categories = directory.categories().await.context("loading categories")?;
    println!("\nCategories (* = featured):");
    print_tree(&categories, 0);

    cart.shutdown(config.shutdown_timeout())
        .await
        .context("flushing cart writes")?;

    println!("\n=== Done ===");
    Ok(())
}
