//! # Repository Module
//!
//! Entity repositories for the shop catalog.
//!
//! ## Layering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  demo / init-db                                                         │
//! │       │                                                                 │
//! │       │  db.products().find_by_category("Tools")                        │
//! │       ▼                                                                 │
//! │  ProductRepository      SQL text + row mapping for `products`           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SqlExecutor            acquire, bind, execute, release                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite                                                                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Product CRUD and search

use chrono::{DateTime, SubsecRound, Utc};

pub mod product;

/// Current time at millisecond precision, the resolution rows are compared at.
pub(crate) fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}
