//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] teashop_core::EmailError),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The account signs in with codes only.
    #[error("no password is set for this account")]
    PasswordNotSet,

    /// The account exists but has been disabled by a manager.
    #[error("account is disabled")]
    AccountDisabled,

    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Changing a password requires the current one.
    #[error("current password is required")]
    CurrentPasswordRequired,

    /// Profile field rejected.
    #[error("invalid profile: {0}")]
    InvalidProfile(String),

    /// Code is not six ASCII digits.
    #[error("verification code must be 6 digits")]
    MalformedCode,

    /// Code is wrong, expired, or already used.
    #[error("verification code is invalid or expired")]
    InvalidCode,

    /// A code was issued to this address less than a minute ago.
    #[error("a code was requested too recently")]
    CodeRequestedTooSoon,

    /// Bearer token failed verification.
    #[error("invalid token")]
    InvalidToken,

    /// Token could not be signed.
    #[error("token signing failed: {0}")]
    TokenSigning(#[source] jsonwebtoken::errors::Error),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
