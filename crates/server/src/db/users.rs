//! User repository for database operations.
//!
//! Besides the account itself this owns the cached order aggregate
//! (`total_orders`, `total_spent`) that the stats service keeps fresh.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use teashop_core::{AccountStatus, Email, Price, UserId, UserRole};

use super::RepositoryError;
use crate::models::User;

/// Raw `shop.user` row.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: UserId,
    email: String,
    username: String,
    avatar: String,
    role: String,
    status: String,
    nickname: Option<String>,
    total_orders: i32,
    total_spent: Price,
    stats_updated_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    last_login: Option<DateTime<Utc>>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let role = row
            .role
            .parse::<UserRole>()
            .map_err(RepositoryError::DataCorruption)?;
        let status = row
            .status
            .parse::<AccountStatus>()
            .map_err(RepositoryError::DataCorruption)?;

        Ok(Self {
            id: row.id,
            email,
            username: row.username,
            avatar: row.avatar,
            role,
            status,
            nickname: row.nickname,
            total_orders: row.total_orders,
            total_spent: row.total_spent,
            stats_updated_at: row.stats_updated_at,
            created_at: row.created_at,
            last_login: row.last_login,
        })
    }
}

/// Account row plus its password hash, for login.
#[derive(Debug, sqlx::FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: Option<String>,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored row is invalid.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, email, username, avatar, role, status, nickname,
                   total_orders, total_spent, stats_updated_at, created_at, last_login
            FROM shop.user
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored row is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, email, username, avatar, role, status, nickname,
                   total_orders, total_spent, stats_updated_at, created_at, last_login
            FROM shop.user
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// List every account, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, email, username, avatar, role, status, nickname,
                   total_orders, total_spent, stats_updated_at, created_at, last_login
            FROM shop.user
            ORDER BY created_at DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(User::try_from).collect()
    }

    /// Get a user together with their password hash (if one is set).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_with_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, Option<String>)>, RepositoryError> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r"
            SELECT id, email, username, avatar, role, status, nickname,
                   total_orders, total_spent, stats_updated_at, created_at, last_login,
                   password_hash
            FROM shop.user
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some((User::try_from(r.user)?, r.password_hash))),
            None => Ok(None),
        }
    }

    /// Get only the password hash for a user.
    ///
    /// Returns `Ok(None)` when the user has no password set.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn get_password_hash(&self, id: UserId) -> Result<Option<String>, RepositoryError> {
        let hash: Option<Option<String>> =
            sqlx::query_scalar("SELECT password_hash FROM shop.user WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        hash.ok_or(RepositoryError::NotFound)
    }

    /// Create a new account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        email: &Email,
        username: &str,
        password_hash: Option<&str>,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO shop.user (email, username, password_hash, last_login)
            VALUES ($1, $2, $3, NOW())
            RETURNING id, email, username, avatar, role, status, nickname,
                      total_orders, total_spent, stats_updated_at, created_at, last_login
            ",
        )
        .bind(email.as_str())
        .bind(username)
        .bind(password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::unique_violation(e, "email already exists"))?;

        User::try_from(row)
    }

    /// Insert the account if missing and return it either way.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn ensure_exists(&self, email: &Email, username: &str) -> Result<User, RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO shop.user (email, username)
            VALUES ($1, $2)
            ON CONFLICT (email) DO NOTHING
            ",
        )
        .bind(email.as_str())
        .bind(username)
        .execute(self.pool)
        .await?;

        self.get_by_email(email)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Set or replace a user's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn set_password_hash(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE shop.user SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Update display name and, when given, the avatar.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn update_profile(
        &self,
        id: UserId,
        username: &str,
        avatar: Option<&str>,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            UPDATE shop.user
            SET username = $2, avatar = COALESCE($3, avatar)
            WHERE id = $1
            RETURNING id, email, username, avatar, role, status, nickname,
                      total_orders, total_spent, stats_updated_at, created_at, last_login
            ",
        )
        .bind(id)
        .bind(username)
        .bind(avatar)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        User::try_from(row)
    }

    /// Record a successful sign-in.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn touch_last_login(&self, id: UserId) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE shop.user SET last_login = NOW() WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Change a user's role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn set_role(&self, id: UserId, role: UserRole) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            UPDATE shop.user SET role = $2
            WHERE id = $1
            RETURNING id, email, username, avatar, role, status, nickname,
                      total_orders, total_spent, stats_updated_at, created_at, last_login
            ",
        )
        .bind(id)
        .bind(role.to_string())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        User::try_from(row)
    }

    /// Enable or disable an account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn set_status(
        &self,
        id: UserId,
        status: AccountStatus,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            UPDATE shop.user SET status = $2
            WHERE id = $1
            RETURNING id, email, username, avatar, role, status, nickname,
                      total_orders, total_spent, stats_updated_at, created_at, last_login
            ",
        )
        .bind(id)
        .bind(status.to_string())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        User::try_from(row)
    }

    /// Set or clear the manager's note on a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn set_nickname(
        &self,
        id: UserId,
        nickname: Option<&str>,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            UPDATE shop.user SET nickname = $2
            WHERE id = $1
            RETURNING id, email, username, avatar, role, status, nickname,
                      total_orders, total_spent, stats_updated_at, created_at, last_login
            ",
        )
        .bind(id)
        .bind(nickname)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        User::try_from(row)
    }

    /// Make `email` an active manager, creating the account if needed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn promote_to_manager(&self, email: &Email) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO shop.user (email, role)
            VALUES ($1, 'manager')
            ON CONFLICT (email) DO UPDATE SET role = 'manager', status = 'active'
            RETURNING id, email, username, avatar, role, status, nickname,
                      total_orders, total_spent, stats_updated_at, created_at, last_login
            ",
        )
        .bind(email.as_str())
        .fetch_one(self.pool)
        .await?;

        User::try_from(row)
    }

    /// When the cached stats for `email` were last refreshed.
    ///
    /// The outer `Option` is `None` when no such user exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn stats_updated_at(
        &self,
        email: &Email,
    ) -> Result<Option<Option<DateTime<Utc>>>, RepositoryError> {
        let updated_at: Option<Option<DateTime<Utc>>> =
            sqlx::query_scalar("SELECT stats_updated_at FROM shop.user WHERE email = $1")
                .bind(email.as_str())
                .fetch_optional(self.pool)
                .await?;

        Ok(updated_at)
    }

    /// Recount orders for `email` and overwrite the cached aggregate.
    ///
    /// Returns `false` when no user has that email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn refresh_stats(&self, email: &Email) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE shop.user u
            SET total_orders = s.order_count,
                total_spent = s.total_amount,
                stats_updated_at = NOW()
            FROM (
                SELECT COUNT(*)::INTEGER AS order_count,
                       COALESCE(SUM(total_price), 0) AS total_amount
                FROM shop.customer_order
                WHERE customer_email = $1
            ) s
            WHERE u.email = $1
            ",
        )
        .bind(email.as_str())
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
