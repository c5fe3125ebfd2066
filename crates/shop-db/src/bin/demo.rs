//! # Catalog Demo
//!
//! Walks through every product repository operation against the configured
//! database, logging what each step returns.
//!
//! ## Usage
//! ```bash
//! cargo run -p shop-db --bin init-db   # schema + sample data first
//! cargo run -p shop-db --bin demo
//! ```
//!
//! A failing step is logged and ends the walkthrough; the pool is closed
//! either way.

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use shop_core::{Money, Product};
use shop_db::{Database, DbSettings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    info!("=== Starting shop catalog demo ===");

    let settings = DbSettings::load();
    let db = Database::new(&settings)
        .await
        .context("failed to create connection pool")?;

    if db.test_connection().await {
        info!("Database connection established");
        if let Err(e) = walkthrough(&db).await {
            error!(error = %e, "Demo step failed");
        }
    } else {
        error!("Could not connect to the database. Please check:");
        error!("  - the url in database.toml (or SHOP_DB__URL) points at a reachable file");
        error!("  - the directory holding the database file exists and is writable");
        error!("  - the schema exists (run the init-db binary first)");
    }

    db.shutdown().await;
    info!("=== Demo finished ===");
    Ok(())
}

fn log_products(products: &[Product]) {
    if products.is_empty() {
        info!("  (none)");
    }
    for product in products {
        info!("  - {} | {} | stock: {}", product.name, product.price(), product.stock);
    }
}

async fn walkthrough(db: &Database) -> anyhow::Result<()> {
    let repo = db.products();

    info!("1. Listing all products");
    log_products(&repo.find_all().await?);

    info!("2. Products in category 'Electronics'");
    log_products(&repo.find_by_category("Electronics").await?);

    info!("3. Creating a new product");
    let mut tablet = Product::new(
        "Tablet Samsung Galaxy Tab S9",
        Some("Premium tablet with an 11-inch AMOLED display".to_string()),
        "649.99".parse::<Money>()?,
        15,
        "Electronics",
    );
    let id = repo.save(&mut tablet).await?;
    info!("  created with id {}", id);

    info!("4. Looking up the new product");
    match repo.find_by_id(id).await? {
        Some(mut found) => {
            info!("  found: {} | {} | id {}", found.name, found.price(), id);

            info!("5. Updating its price");
            let previous = found.price();
            found.set_price("599.99".parse()?);
            if repo.update(&mut found).await? {
                info!(
                    "  price is now {} ({} off)",
                    found.price(),
                    previous - found.price()
                );
            }

            info!("6. Updating its stock");
            if repo.update_stock(id, 20).await? {
                info!("  stock is now 20 units");
            }
        }
        None => warn!("  product {} vanished after insert", id),
    }

    info!("7. Products between $100.00 and $500.00");
    log_products(
        &repo
            .find_by_price_range("100".parse()?, "500".parse()?)
            .await?,
    );

    info!("8. Products whose name contains 'Samsung'");
    log_products(&repo.find_by_name("Samsung").await?);

    info!("9. Statistics");
    info!("  active products: {}", repo.count_active().await?);

    info!("10. Connection pool status");
    db.log_pool_stats();

    Ok(())
}
