//! # Domain Types
//!
//! The catalog has a single entity: [`Product`].
//!
//! ## Product Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Product Lifecycle                               │
//! │                                                                         │
//! │  Product::new(..)        id = None, created_at = None, updated_at = None│
//! │       │                                                                 │
//! │       ▼  repository.save()                                              │
//! │  persisted               id = Some(n), both timestamps stamped          │
//! │       │                                                                 │
//! │       ▼  update() / update_stock()                                      │
//! │  modified                updated_at refreshed                           │
//! │       │                                                                 │
//! │       ├──► delete()             active = false (row kept)               │
//! │       └──► delete_physically()  row removed                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Non-negative price and stock are enforced by the table's CHECK
//! constraints, not here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Store-assigned identity. `None` until the first save.
    pub id: Option<i64>,

    /// Display name.
    pub name: String,

    /// Optional long description.
    pub description: Option<String>,

    /// Price in cents.
    pub price_cents: i64,

    /// Units on hand.
    pub stock: i32,

    /// Category label (exact-match lookups).
    pub category: String,

    /// Whether product is active (soft delete).
    pub active: bool,

    /// When the product was first persisted.
    pub created_at: Option<DateTime<Utc>>,

    /// When the product was last written.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Creates an unsaved, active product.
    ///
    /// ## Example
    /// ```rust
    /// use shop_core::{Money, Product};
    ///
    /// let tablet = Product::new(
    ///     "Tablet Samsung Galaxy Tab S9",
    ///     Some("11 inch AMOLED display".to_string()),
    ///     Money::from_cents(64999),
    ///     15,
    ///     "Electronics",
    /// );
    /// assert!(tablet.active);
    /// assert!(!tablet.is_persisted());
    /// ```
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
        price: Money,
        stock: i32,
        category: impl Into<String>,
    ) -> Self {
        Product {
            id: None,
            name: name.into(),
            description,
            price_cents: price.cents(),
            stock,
            category: category.into(),
            active: true,
            created_at: None,
            updated_at: None,
        }
    }

    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Replaces the price.
    #[inline]
    pub fn set_price(&mut self, price: Money) {
        self.price_cents = price.cents();
    }

    /// True once the store has assigned an id.
    #[inline]
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_product_defaults() {
        let product = Product::new("Widget", None, Money::from_cents(1000), 5, "Tools");

        assert_eq!(product.id, None);
        assert_eq!(product.name, "Widget");
        assert_eq!(product.price(), Money::from_cents(1000));
        assert_eq!(product.stock, 5);
        assert_eq!(product.category, "Tools");
        assert!(product.active);
        assert!(product.created_at.is_none());
        assert!(product.updated_at.is_none());
        assert!(!product.is_persisted());
    }

    #[test]
    fn test_set_price() {
        let mut product = Product::new("Widget", None, Money::from_cents(1000), 5, "Tools");
        product.set_price(Money::from_cents(899));
        assert_eq!(product.price_cents, 899);
    }

    #[test]
    fn test_unsaved_product_serializes_nulls() {
        let product = Product::new("Widget", None, Money::from_cents(1000), 5, "Tools");
        let json = serde_json::to_value(&product).unwrap();

        assert_eq!(json["id"], serde_json::Value::Null);
        assert_eq!(json["price_cents"], 1000);
        assert_eq!(json["active"], true);
        assert_eq!(json["created_at"], serde_json::Value::Null);
    }
}
