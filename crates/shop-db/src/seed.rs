//! # Sample Catalog
//!
//! Eight demo products loaded into an empty `products` table.
//!
//! The whole set goes in as one batch, so a failure leaves the table empty
//! and the next run tries again.

use tracing::info;

use crate::error::DbResult;
use crate::repository::product::ProductRepository;
use shop_core::{Money, Product};

/// (name, description, price in cents, stock, category)
const SAMPLE_PRODUCTS: &[(&str, &str, i64, i32, &str)] = &[
    (
        "Laptop Dell XPS 13",
        "13-inch ultrabook, Intel Core i7, 16GB RAM",
        129_999,
        10,
        "Electronics",
    ),
    (
        "iPhone 15 Pro",
        "Apple smartphone with A17 Pro chip",
        99_999,
        25,
        "Electronics",
    ),
    (
        "Nike Dri-Fit T-Shirt",
        "Breathable sports t-shirt",
        2_999,
        50,
        "Clothing",
    ),
    (
        "Adidas Ultraboost Sneakers",
        "Running shoes with Boost cushioning",
        17_999,
        30,
        "Footwear",
    ),
    (
        "Book: Clean Code",
        "Robert C. Martin's guide to writing clean code",
        3_999,
        15,
        "Books",
    ),
    (
        "Premium Gourmet Coffee",
        "Colombian single-origin coffee beans, 500g",
        2_499,
        100,
        "Food",
    ),
    (
        "Samsung 27\" Monitor",
        "27-inch 4K UHD monitor",
        29_999,
        8,
        "Electronics",
    ),
    (
        "Sports Backpack",
        "Water-resistant 30L backpack",
        4_999,
        40,
        "Accessories",
    ),
];

/// The sample set as unsaved products.
pub fn sample_products() -> Vec<Product> {
    SAMPLE_PRODUCTS
        .iter()
        .map(|(name, description, cents, stock, category)| {
            Product::new(
                *name,
                Some(description.to_string()),
                Money::from_cents(*cents),
                *stock,
                *category,
            )
        })
        .collect()
}

/// Inserts the sample set if `products` has no rows at all.
///
/// ## Returns
/// * `Ok(8)` - Table was empty and is now seeded
/// * `Ok(0)` - Table already had rows (active or not); nothing written
pub async fn seed_sample_products(repo: &ProductRepository) -> DbResult<usize> {
    let existing = repo.count_all().await?;
    if existing > 0 {
        info!(existing = existing, "Products table already populated, skipping seed");
        return Ok(0);
    }

    let mut products = sample_products();
    let ids = repo.save_all(&mut products).await?;

    info!(count = ids.len(), "Sample products inserted");
    Ok(ids.len())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DbSettings;
    use crate::pool::Database;

    async fn repo() -> ProductRepository {
        let db = Database::new(&DbSettings::in_memory()).await.unwrap();
        db.run_migrations().await.unwrap();
        db.products()
    }

    #[test]
    fn test_sample_products_are_valid() {
        let products = sample_products();

        assert_eq!(products.len(), 8);
        assert!(products.iter().all(|p| p.active && !p.is_persisted()));
        assert!(products.iter().all(|p| p.price_cents >= 0 && p.stock >= 0));
    }

    #[tokio::test]
    async fn test_seed_fills_empty_table_once() {
        let repo = repo().await;

        assert_eq!(seed_sample_products(&repo).await.unwrap(), 8);
        assert_eq!(seed_sample_products(&repo).await.unwrap(), 0);
        assert_eq!(repo.count_active().await.unwrap(), 8);

        let electronics = repo.find_by_category("Electronics").await.unwrap();
        assert_eq!(electronics.len(), 3);
    }

    #[tokio::test]
    async fn test_seed_skips_table_with_only_inactive_rows() {
        let repo = repo().await;
        let mut leftover = Product::new("Old", None, Money::from_cents(100), 1, "Misc");
        let id = repo.save(&mut leftover).await.unwrap();
        repo.delete(id).await.unwrap();

        assert_eq!(seed_sample_products(&repo).await.unwrap(), 0);
        assert_eq!(repo.count_active().await.unwrap(), 0);
    }
}
