//! # Database Initializer
//!
//! Creates the schema and loads the sample catalog.
//!
//! ## Usage
//! ```bash
//! # Uses ./database.toml (or built-in defaults)
//! cargo run -p shop-db --bin init-db
//!
//! # Point at another settings file
//! SHOP_DB_CONFIG=/etc/shop/database.toml cargo run -p shop-db --bin init-db
//!
//! # Override a single key
//! SHOP_DB__URL="sqlite://catalog.db?mode=rwc" cargo run -p shop-db --bin init-db
//! ```
//!
//! Exits with status 1 if the store is unreachable or any step fails.

use anyhow::{bail, Context};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use shop_db::{seed, Database, DbSettings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    info!("Initializing shop database");

    let settings = DbSettings::load();
    let db = Database::new(&settings)
        .await
        .context("failed to create connection pool")?;

    let result = initialize(&db).await;
    db.shutdown().await;

    if let Err(e) = &result {
        error!(error = %e, "Database initialization failed");
    }
    result
}

async fn initialize(db: &Database) -> anyhow::Result<()> {
    if !db.test_connection().await {
        bail!("database is unreachable");
    }

    db.run_migrations().await.context("failed to apply migrations")?;

    let inserted = seed::seed_sample_products(&db.products())
        .await
        .context("failed to insert sample products")?;

    info!(inserted = inserted, "Database initialized");
    Ok(())
}
