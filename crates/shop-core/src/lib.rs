//! # shop-core: Entity Types for the Shop Catalog
//!
//! Pure data types shared by the database layer and the binaries.
//! Nothing in this crate performs I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   demo / init-db binaries                                               │
//! │          │                                                              │
//! │          ▼                                                              │
//! │   shop-db  (pool, executor, ProductRepository)                          │
//! │          │                                                              │
//! │          ▼                                                              │
//! │   ★ shop-core (THIS CRATE) ★   Product, Money                           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - The `Product` entity
//! - [`money`] - Integer-cent money type
//! - [`error`] - Parsing errors

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod types;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::MoneyError;
pub use money::Money;
pub use types::Product;
