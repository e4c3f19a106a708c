//! Order repository.
//!
//! Orders are append-only; the read flag is the only column that changes
//! after insert.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use teashop_core::{Customization, Email, OrderId, OrderStatus, Price, ProductId};

use super::RepositoryError;
use crate::models::{NewOrder, Order, OrderStats};

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    product_id: Option<ProductId>,
    product_name: String,
    product_image: Option<String>,
    quantity: i32,
    price: Price,
    total_price: Price,
    customization: Option<Json<Customization>>,
    customer_email: String,
    status: String,
    is_read: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let customer_email = Email::parse(&row.customer_email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let status = row
            .status
            .parse::<OrderStatus>()
            .map_err(RepositoryError::DataCorruption)?;

        Ok(Self {
            id: row.id,
            product_id: row.product_id,
            product_name: row.product_name,
            product_image: row.product_image,
            quantity: row.quantity,
            price: row.price,
            total_price: row.total_price,
            customization: row.customization.map(|Json(c)| c),
            customer_email,
            status,
            is_read: row.is_read,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StatsRow {
    order_count: i64,
    total_amount: Price,
    last_order_date: Option<DateTime<Utc>>,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every order, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, product_id, product_name, product_image, quantity, price,
                   total_price, customization, customer_email, status, is_read, created_at
            FROM shop.customer_order
            ORDER BY created_at DESC, id DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    /// The newest `limit` orders placed by `email`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_email(
        &self,
        email: &Email,
        limit: i64,
    ) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, product_id, product_name, product_image, quantity, price,
                   total_price, customization, customer_email, status, is_read, created_at
            FROM shop.customer_order
            WHERE customer_email = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            ",
        )
        .bind(email.as_str())
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    /// Aggregate figures over all orders placed by `email`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn stats_for_email(&self, email: &Email) -> Result<OrderStats, RepositoryError> {
        let row = sqlx::query_as::<_, StatsRow>(
            r"
            SELECT COUNT(*) AS order_count,
                   COALESCE(SUM(total_price), 0) AS total_amount,
                   MAX(created_at) AS last_order_date
            FROM shop.customer_order
            WHERE customer_email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_one(self.pool)
        .await?;

        Ok(OrderStats {
            order_count: row.order_count,
            total_amount: row.total_amount,
            last_order_date: row.last_order_date,
        })
    }

    /// Number of orders no manager has looked at yet.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn unread_count(&self) -> Result<i64, RepositoryError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM shop.customer_order WHERE NOT is_read")
                .fetch_one(self.pool)
                .await?;

        Ok(count)
    }

    /// Mark one order as read.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn mark_read(&self, id: OrderId) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE shop.customer_order SET is_read = TRUE WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Mark every unread order as read. Returns how many changed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn mark_all_read(&self) -> Result<u64, RepositoryError> {
        let result =
            sqlx::query("UPDATE shop.customer_order SET is_read = TRUE WHERE NOT is_read")
                .execute(self.pool)
                .await?;

        Ok(result.rows_affected())
    }
}

/// Insert an order through the caller's connection.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert(conn: &mut PgConnection, order: &NewOrder) -> Result<Order, RepositoryError> {
    let row = sqlx::query_as::<_, OrderRow>(
        r"
        INSERT INTO shop.customer_order (
            product_id, product_name, product_image, quantity, price,
            total_price, customization, customer_email
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id, product_id, product_name, product_image, quantity, price,
                  total_price, customization, customer_email, status, is_read, created_at
        ",
    )
    .bind(order.product_id)
    .bind(&order.product_name)
    .bind(order.product_image.as_deref())
    .bind(order.quantity)
    .bind(order.price)
    .bind(order.total_price)
    .bind(order.customization.map(Json))
    .bind(order.customer_email.as_str())
    .fetch_one(conn)
    .await?;

    Order::try_from(row)
}
