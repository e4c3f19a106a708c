//! Verification code repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use teashop_core::{Email, VerificationCodeId};

use super::RepositoryError;
use crate::models::VerificationCode;

#[derive(Debug, sqlx::FromRow)]
struct VerificationCodeRow {
    id: VerificationCodeId,
    email: String,
    code: String,
    expires_at: DateTime<Utc>,
    used: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<VerificationCodeRow> for VerificationCode {
    type Error = RepositoryError;

    fn try_from(row: VerificationCodeRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            email,
            code: row.code,
            expires_at: row.expires_at,
            used: row.used,
            created_at: row.created_at,
        })
    }
}

/// Repository for one-time login codes.
pub struct VerificationCodeRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> VerificationCodeRepository<'a> {
    /// Create a new verification code repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Whether a code was issued to `email` after `since`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn issued_since(
        &self,
        email: &Email,
        since: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            r"
            SELECT EXISTS (
                SELECT 1 FROM shop.verification_code
                WHERE email = $1 AND created_at > $2
            )
            ",
        )
        .bind(email.as_str())
        .bind(since)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    /// Store a new code, retiring every earlier unused code for the address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails. Nothing is
    /// written in that case.
    pub async fn issue(
        &self,
        email: &Email,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<VerificationCode, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r"
            UPDATE shop.verification_code SET used = TRUE
            WHERE email = $1 AND used = FALSE
            ",
        )
        .bind(email.as_str())
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query_as::<_, VerificationCodeRow>(
            r"
            INSERT INTO shop.verification_code (email, code, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, email, code, expires_at, used, created_at
            ",
        )
        .bind(email.as_str())
        .bind(code)
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        VerificationCode::try_from(row)
    }

    /// Find the newest unused, unexpired code matching `email` and `code`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_valid(
        &self,
        email: &Email,
        code: &str,
    ) -> Result<Option<VerificationCode>, RepositoryError> {
        let row = sqlx::query_as::<_, VerificationCodeRow>(
            r"
            SELECT id, email, code, expires_at, used, created_at
            FROM shop.verification_code
            WHERE email = $1 AND code = $2 AND used = FALSE AND expires_at > NOW()
            ORDER BY created_at DESC
            LIMIT 1
            ",
        )
        .bind(email.as_str())
        .bind(code)
        .fetch_optional(self.pool)
        .await?;

        row.map(VerificationCode::try_from).transpose()
    }

    /// Mark a code used. Returns `false` if it was already used.
    ///
    /// Only one of several concurrent callers can get `true` for a code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn consume(&self, id: VerificationCodeId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE shop.verification_code SET used = TRUE WHERE id = $1 AND used = FALSE",
        )
        .bind(id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Delete every expired code. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_expired(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.verification_code WHERE expires_at < NOW()")
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
