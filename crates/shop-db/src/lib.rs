//! # shop-db: Database Layer for the Shop Catalog
//!
//! Pooled SQLite access for the product catalog, built on sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shop Catalog Data Flow                           │
//! │                                                                         │
//! │  init-db / demo                                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                     shop-db (THIS CRATE)                        │    │
//! │  │                                                                 │    │
//! │  │  ┌────────────┐  ┌────────────┐  ┌─────────────┐  ┌──────────┐  │    │
//! │  │  │ DbSettings │─►│  Database  │◄─│ SqlExecutor │◄─│ Product  │  │    │
//! │  │  │ (config.rs)│  │  (pool.rs) │  │(executor.rs)│  │Repository│  │    │
//! │  │  └────────────┘  └─────┬──────┘  └─────────────┘  └──────────┘  │    │
//! │  │                        │                                        │    │
//! │  │                  migrations + seed                              │    │
//! │  └────────────────────────┼────────────────────────────────────────┘    │
//! │                           ▼                                             │
//! │                   SQLite (shop.db)                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - Settings file + environment loading
//! - [`pool`] - Connection pool lifecycle
//! - [`executor`] - Generic statement execution and transactions
//! - [`repository`] - Entity repositories
//! - [`migrations`] - Embedded schema migrations
//! - [`seed`] - Sample catalog
//! - [`error`] - Database error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shop_db::{Database, DbSettings};
//!
//! let db = Database::new(&DbSettings::load()).await?;
//! db.run_migrations().await?;
//!
//! let cheap = db
//!     .products()
//!     .find_by_price_range(Money::zero(), Money::from_cents(5_000))
//!     .await?;
//!
//! db.shutdown().await;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod executor;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod seed;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::DbSettings;
pub use error::{DbError, DbResult};
pub use executor::{SqlExecutor, SqlValue};
pub use pool::{Database, PoolStats};

pub use repository::product::ProductRepository;
