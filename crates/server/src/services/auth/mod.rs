//! Authentication service.
//!
//! Password and one-time-code sign-in, profile edits, and password changes.
//! Session tokens live in [`token`].

mod error;
pub mod token;

pub use error::AuthError;
pub use token::{Claims, TokenKeys};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use sqlx::PgPool;

use teashop_core::{Email, UserId};

use crate::db::{RepositoryError, UserRepository, VerificationCodeRepository};
use crate::models::User;
use crate::models::user::DEFAULT_USERNAME;
use crate::models::verification_code::{CODE_TTL, RESEND_INTERVAL};
use crate::services::email::generate_verification_code;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    codes: VerificationCodeRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
            codes: VerificationCodeRepository::new(pool),
        }
    }

    // =========================================================================
    // Password Authentication
    // =========================================================================

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    /// Returns `AuthError::PasswordNotSet` for code-only accounts.
    /// Returns `AuthError::AccountDisabled` if a manager disabled the account.
    pub async fn login_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;

        let (user, password_hash) = self
            .users
            .get_with_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let password_hash = password_hash.ok_or(AuthError::PasswordNotSet)?;
        verify_password(password, &password_hash)?;

        if !user.status.is_active() {
            return Err(AuthError::AccountDisabled);
        }

        self.users.touch_last_login(user.id).await?;

        Ok(user)
    }

    // =========================================================================
    // Verification Codes
    // =========================================================================

    /// Issue a fresh code for `email`, superseding any earlier one.
    ///
    /// Returns the parsed address and the code to deliver.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::CodeRequestedTooSoon` if a code went out within
    /// the last minute.
    pub async fn request_code(&self, email: &str) -> Result<(Email, String), AuthError> {
        let email = Email::parse(email)?;
        let now = Utc::now();

        if self.codes.issued_since(&email, now - RESEND_INTERVAL).await? {
            return Err(AuthError::CodeRequestedTooSoon);
        }

        let code = generate_verification_code();
        self.codes.issue(&email, &code, now + CODE_TTL).await?;

        tracing::info!(email = %email, "Verification code issued");
        Ok((email, code))
    }

    /// Redeem a code, creating the account on first sign-in.
    ///
    /// A new account needs `password`. An existing account without a
    /// password gets `password` set when one is supplied. Input problems are
    /// reported before the code is consumed, so the user can retry.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MalformedCode` if `code` is not six digits.
    /// Returns `AuthError::InvalidCode` if it is wrong, expired, or used.
    /// Returns `AuthError::WeakPassword` if a required password is too short.
    /// Returns `AuthError::AccountDisabled` if a manager disabled the account.
    pub async fn verify_code(
        &self,
        email: &str,
        code: &str,
        password: Option<&str>,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        validate_code_format(code)?;

        let found = self
            .codes
            .find_valid(&email, code)
            .await?
            .ok_or(AuthError::InvalidCode)?;

        let existing = self.users.get_with_password_hash(&email).await?;
        let password = password.filter(|p| !p.is_empty());

        match &existing {
            None => validate_password(password.unwrap_or_default())?,
            Some((user, _)) if !user.status.is_active() => {
                return Err(AuthError::AccountDisabled);
            }
            Some((_, None)) => {
                if let Some(password) = password {
                    validate_password(password)?;
                }
            }
            Some((_, Some(_))) => {}
        }

        if !self.codes.consume(found.id).await? {
            return Err(AuthError::InvalidCode);
        }

        let user = match existing {
            None => {
                let hash = hash_password(password.unwrap_or_default())?;
                match self.users.create(&email, DEFAULT_USERNAME, Some(&hash)).await {
                    Ok(user) => {
                        tracing::info!(user_id = %user.id, "New account created");
                        user
                    }
                    // Lost a race with a concurrent sign-up for the same address.
                    Err(RepositoryError::Conflict(_)) => self
                        .users
                        .get_by_email(&email)
                        .await?
                        .ok_or(AuthError::UserNotFound)?,
                    Err(e) => return Err(e.into()),
                }
            }
            Some((user, None)) => {
                if let Some(password) = password {
                    let hash = hash_password(password)?;
                    self.users.set_password_hash(user.id, &hash).await?;
                }
                user
            }
            Some((user, Some(_))) => user,
        };

        self.users.touch_last_login(user.id).await?;

        Ok(user)
    }

    /// Delete codes past their expiry. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the delete fails.
    pub async fn purge_expired_codes(&self) -> Result<u64, AuthError> {
        Ok(self.codes.delete_expired().await?)
    }

    // =========================================================================
    // Account Management
    // =========================================================================

    /// Load the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the account no longer exists.
    pub async fn current_user(&self, id: UserId) -> Result<User, AuthError> {
        self.users
            .get_by_id(id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Change display name and optionally the avatar.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidProfile` if the username is blank.
    pub async fn update_profile(
        &self,
        id: UserId,
        username: &str,
        avatar: Option<&str>,
    ) -> Result<User, AuthError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AuthError::InvalidProfile(
                "username must not be empty".to_owned(),
            ));
        }
        let avatar = avatar.map(str::trim).filter(|a| !a.is_empty());

        self.users
            .update_profile(id, username, avatar)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::UserNotFound,
                other => AuthError::Repository(other),
            })
    }

    /// Whether the account has a password set.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the account no longer exists.
    pub async fn has_password(&self, id: UserId) -> Result<bool, AuthError> {
        let hash = self.users.get_password_hash(id).await.map_err(|e| match e {
            RepositoryError::NotFound => AuthError::UserNotFound,
            other => AuthError::Repository(other),
        })?;
        Ok(hash.is_some())
    }

    /// Set a new password.
    ///
    /// When a password already exists, `current` must be supplied and match.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` if `new` is too short.
    /// Returns `AuthError::CurrentPasswordRequired` or
    /// `AuthError::InvalidCredentials` if the current password check fails.
    pub async fn change_password(
        &self,
        id: UserId,
        current: Option<&str>,
        new: &str,
    ) -> Result<(), AuthError> {
        validate_password(new)?;

        let existing = self.users.get_password_hash(id).await.map_err(|e| match e {
            RepositoryError::NotFound => AuthError::UserNotFound,
            other => AuthError::Repository(other),
        })?;

        if let Some(existing) = existing {
            let current = current
                .filter(|c| !c.is_empty())
                .ok_or(AuthError::CurrentPasswordRequired)?;
            verify_password(current, &existing)?;
        }

        let hash = hash_password(new)?;
        self.users.set_password_hash(id, &hash).await?;

        tracing::info!(user_id = %id, "Password changed");
        Ok(())
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Codes are exactly six ASCII digits.
fn validate_code_format(code: &str) -> Result<(), AuthError> {
    if code.len() == 6 && code.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(AuthError::MalformedCode)
    }
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("oolong6").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("oolong6", &hash).is_ok());
        assert!(matches!(
            verify_password("oolong7", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(matches!(
            verify_password("anything", "not-a-hash"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
        // Counted in characters, not bytes.
        assert!(validate_password("乌龙茶乌龙").is_err());
        assert!(validate_password("乌龙茶乌龙茶").is_ok());
    }

    #[test]
    fn test_validate_code_format() {
        assert!(validate_code_format("123456").is_ok());
        assert!(validate_code_format("000000").is_ok());
        assert!(validate_code_format("12345").is_err());
        assert!(validate_code_format("1234567").is_err());
        assert!(validate_code_format("12a456").is_err());
        assert!(validate_code_format("１２３４５６").is_err());
    }
}
