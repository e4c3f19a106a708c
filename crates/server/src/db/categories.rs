//! Category repository.
//!
//! Products point at categories by name, so renames cascade to
//! `shop.product.category` and deletes are refused while the name is in use.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use teashop_core::CategoryId;

use super::RepositoryError;
use crate::models::{Category, CategoryWithCount};

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: CategoryId,
    name: String,
    emoji: String,
    created_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            emoji: row.emoji,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CategoryCountRow {
    #[sqlx(flatten)]
    category: CategoryRow,
    product_count: i64,
}

/// Repository for category database operations.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All categories in creation order, each with its product count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_with_counts(&self) -> Result<Vec<CategoryWithCount>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryCountRow>(
            r"
            SELECT c.id, c.name, c.emoji, c.created_at, COUNT(p.id) AS product_count
            FROM shop.category c
            LEFT JOIN shop.product p ON p.category = c.name
            GROUP BY c.id
            ORDER BY c.id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| CategoryWithCount {
                category: r.category.into(),
                product_count: r.product_count,
            })
            .collect())
    }

    /// Get a category by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, emoji, created_at FROM shop.category WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Category::from))
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name is taken.
    pub async fn create(&self, name: &str, emoji: &str) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            INSERT INTO shop.category (name, emoji)
            VALUES ($1, $2)
            RETURNING id, name, emoji, created_at
            ",
        )
        .bind(name)
        .bind(emoji)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::unique_violation(e, "category name already exists"))?;

        Ok(row.into())
    }

    /// Insert a category unless one with that name exists.
    ///
    /// Returns `true` if a row was inserted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn ensure(&self, name: &str, emoji: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO shop.category (name, emoji)
            VALUES ($1, $2)
            ON CONFLICT (name) DO NOTHING
            ",
        )
        .bind(name)
        .bind(emoji)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Rename and/or re-emoji a category.
    ///
    /// A rename is applied to every product in the category in the same
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist.
    /// Returns `RepositoryError::Conflict` if the new name is taken.
    pub async fn update(
        &self,
        id: CategoryId,
        name: &str,
        emoji: Option<&str>,
    ) -> Result<Category, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let old_name: String =
            sqlx::query_scalar("SELECT name FROM shop.category WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(RepositoryError::NotFound)?;

        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            UPDATE shop.category
            SET name = $2, emoji = COALESCE($3, emoji)
            WHERE id = $1
            RETURNING id, name, emoji, created_at
            ",
        )
        .bind(id)
        .bind(name)
        .bind(emoji)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::unique_violation(e, "category name already exists"))?;

        if old_name != name {
            sqlx::query("UPDATE shop.product SET category = $2 WHERE category = $1")
                .bind(&old_name)
                .bind(name)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(row.into())
    }

    /// Delete a category that no product uses.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist.
    /// Returns `RepositoryError::Conflict` if products still reference it;
    /// nothing is deleted in that case.
    pub async fn delete(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let name: String =
            sqlx::query_scalar("SELECT name FROM shop.category WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(RepositoryError::NotFound)?;

        let in_use: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shop.product WHERE category = $1")
            .bind(&name)
            .fetch_one(&mut *tx)
            .await?;

        if in_use > 0 {
            return Err(RepositoryError::Conflict(format!(
                "category still has {in_use} products"
            )));
        }

        sqlx::query("DELETE FROM shop.category WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }
}
