//! HS256 bearer tokens.
//!
//! Tokens are only ever accepted after signature and expiry verification.
//! The `role` claim is informational; manager checks re-read the stored role.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use teashop_core::{Email, UserId, UserRole};

use super::AuthError;
use crate::config::{JwtConfig, MAX_TOKEN_TTL_DAYS};
use crate::models::User;

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID, as a string.
    pub sub: String,
    pub email: Email,
    pub role: UserRole,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// The user the token was issued to.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if `sub` is not a user ID.
    pub fn user_id(&self) -> Result<UserId, AuthError> {
        self.sub
            .parse::<i32>()
            .map(UserId::new)
            .map_err(|_| AuthError::InvalidToken)
    }
}

/// Signing and verification keys derived from the configured secret.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenKeys")
            .field("keys", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenKeys {
    /// Build keys from configuration.
    ///
    /// The lifetime is clamped to `1..=MAX_TOKEN_TTL_DAYS` days.
    #[must_use]
    pub fn new(config: &JwtConfig) -> Self {
        let secret = config.secret.expose_secret().as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl: Duration::days(config.ttl_days.clamp(1, MAX_TOKEN_TTL_DAYS)),
        }
    }

    /// Sign a token for `user`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenSigning` if encoding fails.
    pub fn issue(&self, user: &User) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(AuthError::TokenSigning)
    }

    /// Verify a token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for a bad signature, an expired
    /// token, or malformed claims.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "Rejected bearer token");
            AuthError::InvalidToken
        })?;

        Ok(data.claims)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;
    use teashop_core::{AccountStatus, Price};

    use super::*;
    use crate::models::user::{DEFAULT_AVATAR, DEFAULT_USERNAME};

    fn keys(secret: &str) -> TokenKeys {
        TokenKeys::new(&JwtConfig {
            secret: SecretString::from(secret.to_owned()),
            ttl_days: 7,
        })
    }

    fn user(role: UserRole) -> User {
        User {
            id: UserId::new(42),
            email: Email::parse("tea@example.com").unwrap(),
            username: DEFAULT_USERNAME.to_owned(),
            avatar: DEFAULT_AVATAR.to_owned(),
            role,
            status: AccountStatus::Active,
            nickname: None,
            total_orders: 0,
            total_spent: Price::ZERO,
            stats_updated_at: None,
            created_at: Utc::now(),
            last_login: None,
        }
    }

    const SECRET: &str = "q8Zr2LmX9vTk4NwP7yHc3JbF6sGd1AeU";

    #[test]
    fn test_issue_then_verify() {
        let keys = keys(SECRET);
        let token = keys.issue(&user(UserRole::User)).unwrap();

        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.user_id().unwrap(), UserId::new(42));
        assert_eq!(claims.email.as_str(), "tea@example.com");
        assert_eq!(claims.role, UserRole::User);
        assert_eq!(claims.exp - claims.iat, Duration::days(7).num_seconds());
    }

    #[test]
    fn test_oversized_ttl_is_clamped() {
        let keys = TokenKeys::new(&JwtConfig {
            secret: SecretString::from(SECRET.to_owned()),
            ttl_days: 1_000_000_000_000,
        });
        let token = keys.issue(&user(UserRole::User)).unwrap();

        let claims = keys.verify(&token).unwrap();
        assert_eq!(
            claims.exp - claims.iat,
            Duration::days(MAX_TOKEN_TTL_DAYS).num_seconds()
        );
    }

    #[test]
    fn test_rejects_other_secret() {
        let token = keys(SECRET).issue(&user(UserRole::Manager)).unwrap();
        let other = keys("Vb7nQ2xR8kLp4MzT9wYc6HdJ3fGs5AeN");

        assert!(matches!(other.verify(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_rejects_tampered_payload() {
        let keys = keys(SECRET);
        let token = keys.issue(&user(UserRole::User)).unwrap();
        let forged = keys.issue(&user(UserRole::Manager)).unwrap();

        // Manager payload with the user token's signature.
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged_parts: Vec<&str> = forged.split('.').collect();
        parts[1] = forged_parts[1];
        let spliced = parts.join(".");

        assert!(matches!(keys.verify(&spliced), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_rejects_expired() {
        let keys = keys(SECRET);
        let now = Utc::now();
        let claims = Claims {
            sub: "42".to_owned(),
            email: Email::parse("tea@example.com").unwrap(),
            role: UserRole::User,
            iat: (now - Duration::days(8)).timestamp(),
            exp: (now - Duration::days(1)).timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding).unwrap();

        assert!(matches!(keys.verify(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(keys(SECRET).verify("not-a-token").is_err());
        assert!(keys(SECRET).verify("").is_err());
    }

    #[test]
    fn test_non_numeric_subject() {
        let claims = Claims {
            sub: "admin".to_owned(),
            email: Email::parse("tea@example.com").unwrap(),
            role: UserRole::Manager,
            iat: 0,
            exp: 0,
        };
        assert!(claims.user_id().is_err());
    }
}
