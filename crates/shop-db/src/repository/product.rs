//! # Product Repository
//!
//! Database operations for the `products` table.
//!
//! ## Key Operations
//! - Active listings (all, by category, by name fragment, by price range)
//! - Lookup by id (active or not)
//! - Insert / full update / stock-only update
//! - Soft delete (`active = 0`) and hard delete
//!
//! ## Visibility
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Which reads see which rows                           │
//! │                                                                         │
//! │                          active = 1     active = 0     deleted          │
//! │  find_by_id                  ✓              ✓             ✗             │
//! │  find_all                    ✓              ✗             ✗             │
//! │  find_by_category            ✓              ✗             ✗             │
//! │  find_by_name                ✓              ✗             ✗             │
//! │  find_by_price_range         ✓              ✗             ✗             │
//! │  count_active                ✓              ✗             ✗             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every method is one statement on one pooled connection, except
//! [`ProductRepository::save_all`] which wraps its inserts in a transaction.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::executor::{insert_on, SqlExecutor, SqlValue};
use crate::params;
use crate::repository::timestamp_now;
use shop_core::{Money, Product};

const SELECT_PRODUCT: &str = r#"
    SELECT
        id,
        name,
        description,
        price_cents,
        stock,
        category,
        active,
        created_at,
        updated_at
    FROM products
"#;

const INSERT_PRODUCT: &str = r#"
    INSERT INTO products (
        name, description, price_cents, stock, category,
        active, created_at, updated_at, name_folded
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
"#;

/// Maps one `products` row onto a [`Product`].
pub fn map_product(row: &SqliteRow) -> Result<Product, sqlx::Error> {
    Ok(Product {
        id: Some(row.try_get("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        price_cents: row.try_get("price_cents")?,
        stock: row.try_get("stock")?,
        category: row.try_get("category")?,
        active: row.try_get("active")?,
        created_at: row.try_get::<Option<DateTime<Utc>>, _>("created_at")?,
        updated_at: row.try_get::<Option<DateTime<Utc>>, _>("updated_at")?,
    })
}

fn insert_params(product: &Product) -> Vec<SqlValue> {
    params![
        product.name.as_str(),
        product.description.clone(),
        product.price_cents,
        product.stock,
        product.category.as_str(),
        product.active,
        product.created_at,
        product.updated_at,
        fold_name(&product.name),
    ]
}

/// Unicode lowercase used for name matching. SQLite's `LOWER()` is ASCII-only.
fn fold_name(name: &str) -> String {
    name.to_lowercase()
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let mut widget = Product::new("Widget", None, Money::from_cents(1000), 5, "Tools");
/// let id = repo.save(&mut widget).await?;
///
/// let found = repo.find_by_id(id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    executor: SqlExecutor,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(executor: SqlExecutor) -> Self {
        ProductRepository { executor }
    }

    /// Lists active products ordered by name.
    pub async fn find_all(&self) -> DbResult<Vec<Product>> {
        let sql = format!("{SELECT_PRODUCT} WHERE active = 1 ORDER BY name");
        let products = self.executor.query(&sql, &[], map_product).await?;

        debug!(count = products.len(), "Listed active products");
        Ok(products)
    }

    /// Gets a product by its ID, whether active or soft-deleted.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn find_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let sql = format!("{SELECT_PRODUCT} WHERE id = ?1");
        self.executor
            .query_optional(&sql, &params![id], map_product)
            .await
    }

    /// Active products in exactly this category, ordered by name.
    pub async fn find_by_category(&self, category: &str) -> DbResult<Vec<Product>> {
        debug!(category = %category, "Finding products by category");

        let sql = format!("{SELECT_PRODUCT} WHERE category = ?1 AND active = 1 ORDER BY name");
        self.executor
            .query(&sql, &params![category], map_product)
            .await
    }

    /// Active products whose name contains `fragment`, ignoring case
    /// (Unicode-aware: "CAFÉ" finds "Café Premium").
    ///
    /// ## Example
    /// ```rust,ignore
    /// // matches "Monitor Samsung 27\"" and "samsung tablet"
    /// let products = repo.find_by_name("SAMSUNG").await?;
    /// ```
    pub async fn find_by_name(&self, fragment: &str) -> DbResult<Vec<Product>> {
        debug!(fragment = %fragment, "Finding products by name");

        let sql = format!(
            "{SELECT_PRODUCT} WHERE name_folded LIKE ?1 AND active = 1 ORDER BY name"
        );
        let pattern = format!("%{}%", fold_name(fragment));
        self.executor
            .query(&sql, &params![pattern], map_product)
            .await
    }

    /// Active products with `min <= price <= max`, cheapest first.
    pub async fn find_by_price_range(&self, min: Money, max: Money) -> DbResult<Vec<Product>> {
        debug!(min = %min, max = %max, "Finding products by price range");

        let sql = format!(
            "{SELECT_PRODUCT} WHERE price_cents BETWEEN ?1 AND ?2 AND active = 1 ORDER BY price_cents"
        );
        self.executor
            .query(&sql, &params![min.cents(), max.cents()], map_product)
            .await
    }

    /// Inserts a new product.
    ///
    /// Stamps `created_at` and `updated_at` to now, then writes the
    /// generated id back onto `product`.
    ///
    /// ## Returns
    /// * `Ok(id)` - Store-generated identity
    /// * `Err(DbError::Statement)` - e.g. negative price rejected by CHECK
    pub async fn save(&self, product: &mut Product) -> DbResult<i64> {
        debug!(name = %product.name, "Inserting product");

        let now = timestamp_now();
        product.created_at = Some(now);
        product.updated_at = Some(now);

        let id = self
            .executor
            .insert_returning_key(INSERT_PRODUCT, &insert_params(product))
            .await?;

        product.id = Some(id);
        Ok(id)
    }

    /// Inserts several products atomically.
    ///
    /// Either every product gets an id or none is written. On success the
    /// ids and timestamps are written back onto `products`.
    pub async fn save_all(&self, products: &mut [Product]) -> DbResult<Vec<i64>> {
        debug!(count = products.len(), "Inserting product batch");

        let now = timestamp_now();
        let batch: Vec<Vec<SqlValue>> = products
            .iter()
            .map(|product| {
                let mut stamped = product.clone();
                stamped.created_at = Some(now);
                stamped.updated_at = Some(now);
                insert_params(&stamped)
            })
            .collect();

        let ids = self
            .executor
            .in_transaction(move |conn| {
                Box::pin(async move {
                    let mut ids = Vec::with_capacity(batch.len());
                    for row in &batch {
                        ids.push(insert_on(conn, INSERT_PRODUCT, row).await?);
                    }
                    Ok::<_, DbError>(ids)
                })
            })
            .await?;

        for (product, id) in products.iter_mut().zip(&ids) {
            product.id = Some(*id);
            product.created_at = Some(now);
            product.updated_at = Some(now);
        }

        Ok(ids)
    }

    /// Overwrites every field except `id` and `created_at`.
    ///
    /// Stamps `updated_at` to now. A product that was never saved is not
    /// sent to the store and yields `false`.
    pub async fn update(&self, product: &mut Product) -> DbResult<bool> {
        let Some(id) = product.id else {
            debug!(name = %product.name, "Skipping update of unsaved product");
            return Ok(false);
        };

        debug!(id = %id, "Updating product");

        product.updated_at = Some(timestamp_now());

        let affected = self
            .executor
            .update(
                r#"
                UPDATE products SET
                    name = ?1,
                    description = ?2,
                    price_cents = ?3,
                    stock = ?4,
                    category = ?5,
                    active = ?6,
                    updated_at = ?7,
                    name_folded = ?8
                WHERE id = ?9
                "#,
                &params![
                    product.name.as_str(),
                    product.description.clone(),
                    product.price_cents,
                    product.stock,
                    product.category.as_str(),
                    product.active,
                    product.updated_at,
                    fold_name(&product.name),
                    id,
                ],
            )
            .await?;

        Ok(affected > 0)
    }

    /// Sets the stock level (absolute, not a delta).
    pub async fn update_stock(&self, id: i64, stock: i32) -> DbResult<bool> {
        debug!(id = %id, stock = %stock, "Updating stock");

        let affected = self
            .executor
            .update(
                "UPDATE products SET stock = ?1, updated_at = ?2 WHERE id = ?3",
                &params![stock, timestamp_now(), id],
            )
            .await?;

        Ok(affected > 0)
    }

    /// Soft-deletes a product by setting active = 0.
    ///
    /// The row stays reachable through [`ProductRepository::find_by_id`].
    pub async fn delete(&self, id: i64) -> DbResult<bool> {
        debug!(id = %id, "Soft-deleting product");

        let affected = self
            .executor
            .update(
                "UPDATE products SET active = 0, updated_at = ?1 WHERE id = ?2",
                &params![timestamp_now(), id],
            )
            .await?;

        Ok(affected > 0)
    }

    /// Removes the row for good.
    pub async fn delete_physically(&self, id: i64) -> DbResult<bool> {
        debug!(id = %id, "Deleting product row");

        let affected = self
            .executor
            .update("DELETE FROM products WHERE id = ?1", &params![id])
            .await?;

        Ok(affected > 0)
    }

    /// Counts active products.
    pub async fn count_active(&self) -> DbResult<i64> {
        self.executor
            .query_scalar("SELECT COUNT(*) FROM products WHERE active = 1", &[])
            .await
    }

    /// Counts every row, soft-deleted ones included.
    pub async fn count_all(&self) -> DbResult<i64> {
        self.executor
            .query_scalar("SELECT COUNT(*) FROM products", &[])
            .await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
