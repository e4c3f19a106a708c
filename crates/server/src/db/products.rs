//! Product repository.
//!
//! The stock helpers at the bottom take a connection instead of the pool so
//! the purchase flow can run them inside its own transaction.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use teashop_core::{Price, ProductId, normalize_discount};

use super::RepositoryError;
use crate::models::{Product, ProductInput};

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    description: Option<String>,
    price: Price,
    discount_price: Option<Price>,
    image_url: Option<String>,
    category: String,
    stock: i32,
    has_sweetness: bool,
    has_ice_level: bool,
    is_hot: bool,
    hot_priority: i32,
    hot_badge_text: String,
    created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            discount_price: normalize_discount(row.price, row.discount_price),
            discount_percentage: 0,
            image_url: row.image_url,
            category: row.category,
            stock: row.stock,
            has_sweetness: row.has_sweetness,
            has_ice_level: row.has_ice_level,
            is_hot: row.is_hot,
            hot_priority: row.hot_priority,
            hot_badge_text: row.hot_badge_text,
            created_at: row.created_at,
        }
        .with_derived_discount()
    }
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products, optionally restricted to one category.
    ///
    /// Hot products come first (highest `hot_priority` first), then newest.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, category: Option<&str>) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, description, price, discount_price, image_url, category,
                   stock, has_sweetness, has_ice_level, is_hot, hot_priority,
                   hot_badge_text, created_at
            FROM shop.product
            WHERE $1::TEXT IS NULL OR category = $1
            ORDER BY is_hot DESC, hot_priority DESC, created_at DESC, id DESC
            ",
        )
        .bind(category)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, description, price, discount_price, image_url, category,
                   stock, has_sweetness, has_ice_level, is_hot, hot_priority,
                   hot_badge_text, created_at
            FROM shop.product
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, input: &ProductInput) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO shop.product (
                name, description, price, discount_price, image_url, category, stock,
                has_sweetness, has_ice_level, is_hot, hot_priority, hot_badge_text
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id, name, description, price, discount_price, image_url, category,
                      stock, has_sweetness, has_ice_level, is_hot, hot_priority,
                      hot_badge_text, created_at
            ",
        )
        .bind(&input.name)
        .bind(input.description.as_deref())
        .bind(input.price)
        .bind(normalize_discount(input.price, input.discount_price))
        .bind(input.image_url.as_deref())
        .bind(&input.category)
        .bind(input.stock)
        .bind(input.has_sweetness)
        .bind(input.has_ice_level)
        .bind(input.is_hot)
        .bind(input.hot_priority)
        .bind(&input.hot_badge_text)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Replace every editable field of a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            UPDATE shop.product
            SET name = $2, description = $3, price = $4, discount_price = $5,
                image_url = $6, category = $7, stock = $8, has_sweetness = $9,
                has_ice_level = $10, is_hot = $11, hot_priority = $12, hot_badge_text = $13
            WHERE id = $1
            RETURNING id, name, description, price, discount_price, image_url, category,
                      stock, has_sweetness, has_ice_level, is_hot, hot_priority,
                      hot_badge_text, created_at
            ",
        )
        .bind(id)
        .bind(&input.name)
        .bind(input.description.as_deref())
        .bind(input.price)
        .bind(normalize_discount(input.price, input.discount_price))
        .bind(input.image_url.as_deref())
        .bind(&input.category)
        .bind(input.stock)
        .bind(input.has_sweetness)
        .bind(input.has_ice_level)
        .bind(input.is_hot)
        .bind(input.hot_priority)
        .bind(&input.hot_badge_text)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete a product. Orders keep their snapshot and lose the reference.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Distinct category names used by at least one product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn distinct_categories(&self) -> Result<Vec<String>, RepositoryError> {
        let names: Vec<String> =
            sqlx::query_scalar("SELECT DISTINCT category FROM shop.product ORDER BY category")
                .fetch_all(self.pool)
                .await?;

        Ok(names)
    }

    /// Number of products on the menu.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shop.product")
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }
}

/// Take `quantity` units of a product if that many are in stock.
///
/// Returns the product with its new stock, or `None` if the product is
/// missing or short. The row stays locked until the caller's transaction
/// ends.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn take_stock(
    conn: &mut PgConnection,
    id: ProductId,
    quantity: i32,
) -> Result<Option<Product>, RepositoryError> {
    let row = sqlx::query_as::<_, ProductRow>(
        r"
        UPDATE shop.product
        SET stock = stock - $2
        WHERE id = $1 AND stock >= $2
        RETURNING id, name, description, price, discount_price, image_url, category,
                  stock, has_sweetness, has_ice_level, is_hot, hot_priority,
                  hot_badge_text, created_at
        ",
    )
    .bind(id)
    .bind(quantity)
    .fetch_optional(conn)
    .await?;

    Ok(row.map(Product::from))
}

/// Read and row-lock a product through the caller's transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_for_purchase(
    conn: &mut PgConnection,
    id: ProductId,
) -> Result<Option<Product>, RepositoryError> {
    let row = sqlx::query_as::<_, ProductRow>(
        r"
        SELECT id, name, description, price, discount_price, image_url, category,
               stock, has_sweetness, has_ice_level, is_hot, hot_priority,
               hot_badge_text, created_at
        FROM shop.product
        WHERE id = $1
        FOR UPDATE
        ",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(row.map(Product::from))
}
