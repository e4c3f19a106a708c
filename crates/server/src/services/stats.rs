//! Cached per-user order aggregates.
//!
//! `total_orders` / `total_spent` on `shop.user` are recomputed from
//! `shop.customer_order` after each purchase, and whenever a manager lists
//! users or opens one and the row is older than [`MAX_AGE`]. Readers
//! tolerate staleness.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;

use teashop_core::Email;

use crate::db::{RepositoryError, UserRepository};
use crate::models::User;

/// How long a cached aggregate is trusted.
pub const MAX_AGE: Duration = Duration::minutes(5);

/// Whether an aggregate last refreshed at `updated_at` is due at `now`.
#[must_use]
pub fn is_stale(updated_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    updated_at.is_none_or(|at| now - at > MAX_AGE)
}

/// Whether the stats for `email` should be recomputed.
///
/// Also true when no such user exists.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the lookup fails.
pub async fn should_update(pool: &PgPool, email: &Email) -> Result<bool, RepositoryError> {
    let updated_at = UserRepository::new(pool).stats_updated_at(email).await?;
    Ok(updated_at.is_none_or(|at| is_stale(at, Utc::now())))
}

/// Recompute and store the stats for `email`.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn update(pool: &PgPool, email: &Email) -> Result<bool, RepositoryError> {
    UserRepository::new(pool).refresh_stats(email).await
}

/// Refresh the stats of `user` if they are due and return the current row.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
pub async fn refresh_if_due(pool: &PgPool, user: User) -> Result<User, RepositoryError> {
    if !should_update(pool, &user.email).await? {
        return Ok(user);
    }
    update(pool, &user.email).await?;

    Ok(UserRepository::new(pool)
        .get_by_id(user.id)
        .await?
        .unwrap_or(user))
}

/// Refresh the stats for `email` on a background task.
///
/// Failures are logged and otherwise ignored.
pub fn refresh_in_background(pool: PgPool, email: Email) {
    tokio::spawn(async move {
        match update(&pool, &email).await {
            Ok(true) => tracing::debug!(email = %email, "User stats refreshed"),
            Ok(false) => tracing::debug!(email = %email, "No user row for stats refresh"),
            Err(e) => tracing::warn!(email = %email, error = %e, "User stats refresh failed"),
        }
    });
}

/// Refresh every stale user in `users`. Returns how many were refreshed.
///
/// Individual failures are logged and skipped.
pub async fn refresh_stale(pool: &PgPool, users: &[User]) -> usize {
    let now = Utc::now();
    let mut refreshed = 0;

    for user in users.iter().filter(|u| is_stale(u.stats_updated_at, now)) {
        match update(pool, &user.email).await {
            Ok(_) => refreshed += 1,
            Err(e) => {
                tracing::warn!(user_id = %user.id, error = %e, "User stats refresh failed");
            }
        }
    }

    refreshed
}
