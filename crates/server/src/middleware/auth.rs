//! Authentication extractors.
//!
//! Requests authenticate with `Authorization: Bearer <jwt>`. A token is
//! only trusted after its signature and expiry verify. Routes that change
//! state then re-read the caller's row, so a disabled account or a revoked
//! manager role takes effect before the token expires.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use teashop_core::{Email, UserId, UserRole};

use crate::db::UserRepository;
use crate::error::{AppError, set_sentry_user};
use crate::models::User;
use crate::state::AppState;

/// Identity taken from a verified token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: UserId,
    pub email: Email,
    /// Role at the time the token was issued.
    pub role: UserRole,
}

/// Extractor that requires a valid bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireAuth(pub AuthUser);

/// Extractor that requires a valid token for an existing, active account.
///
/// Carries the caller's current database row.
pub struct RequireActiveUser(pub User);

/// Extractor that requires an active manager account.
///
/// Carries the caller's current database row.
pub struct RequireManager(pub User);

/// Error returned when an auth extractor rejects a request.
#[derive(Debug)]
pub enum AuthRejection {
    /// No usable token.
    Unauthorized(&'static str),
    /// Authenticated but not allowed.
    Forbidden(&'static str),
    /// Looking up the caller failed.
    Internal(AppError),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            Self::Internal(err) => return err.into_response(),
        };
        (status, Json(json!({ "success": false, "message": message }))).into_response()
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn verify(parts: &Parts, state: &AppState) -> Result<AuthUser, AuthRejection> {
    let token = bearer_token(parts).ok_or(AuthRejection::Unauthorized("Missing bearer token"))?;

    let claims = state
        .tokens()
        .verify(token)
        .map_err(|_| AuthRejection::Unauthorized("Invalid or expired token"))?;
    let id = claims
        .user_id()
        .map_err(|_| AuthRejection::Unauthorized("Invalid or expired token"))?;

    set_sentry_user(&id, Some(claims.email.as_str()));

    Ok(AuthUser {
        id,
        email: claims.email,
        role: claims.role,
    })
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        verify(parts, state).map(Self)
    }
}

/// Gate on the stored account: missing is 401, disabled is 403.
fn active_account(stored: Option<User>) -> Result<User, AuthRejection> {
    let user = stored.ok_or(AuthRejection::Unauthorized("Account no longer exists"))?;
    if !user.status.is_active() {
        return Err(AuthRejection::Forbidden("Account is disabled"));
    }
    Ok(user)
}

/// Gate on the stored account for manager routes.
fn active_manager(stored: Option<User>) -> Result<User, AuthRejection> {
    let user = active_account(stored)?;
    if !user.is_active_manager() {
        return Err(AuthRejection::Forbidden("Manager access required"));
    }
    Ok(user)
}

async fn load_caller(parts: &Parts, state: &AppState) -> Result<Option<User>, AuthRejection> {
    let caller = verify(parts, state)?;

    UserRepository::new(state.pool())
        .get_by_id(caller.id)
        .await
        .map_err(|e| AuthRejection::Internal(e.into()))
}

impl FromRequestParts<AppState> for RequireActiveUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        active_account(load_caller(parts, state).await?).map(Self)
    }
}

impl FromRequestParts<AppState> for RequireManager {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        active_manager(load_caller(parts, state).await?).map(Self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;
    use chrono::Utc;
    use teashop_core::{AccountStatus, Price};

    use super::*;

    fn stored(role: UserRole, status: AccountStatus) -> Option<User> {
        Some(User {
            id: UserId::new(7),
            email: Email::parse("buyer@shop.com").unwrap(),
            username: "买家".to_owned(),
            avatar: "🙂".to_owned(),
            role,
            status,
            nickname: None,
            total_orders: 0,
            total_spent: Price::ZERO,
            stats_updated_at: None,
            created_at: Utc::now(),
            last_login: None,
        })
    }

    fn rejection_status(result: Result<User, AuthRejection>) -> StatusCode {
        result.map(|_| ()).unwrap_err().into_response().status()
    }

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/products/purchase");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&parts_with(Some("Bearer abc.def.ghi"))), Some("abc.def.ghi"));
        assert_eq!(bearer_token(&parts_with(Some("Bearer "))), None);
        assert_eq!(bearer_token(&parts_with(Some("Basic dXNlcjpwYXNz"))), None);
        assert_eq!(bearer_token(&parts_with(None)), None);
    }

    #[test]
    fn test_rejection_status() {
        assert_eq!(
            AuthRejection::Unauthorized("x").into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthRejection::Forbidden("x").into_response().status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_active_account_gate() {
        let user = active_account(stored(UserRole::User, AccountStatus::Active)).unwrap();
        assert_eq!(user.id, UserId::new(7));

        assert_eq!(
            rejection_status(active_account(stored(UserRole::User, AccountStatus::Disabled))),
            StatusCode::FORBIDDEN
        );
        assert_eq!(rejection_status(active_account(None)), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_disabled_account_message() {
        let err = active_account(stored(UserRole::Manager, AccountStatus::Disabled)).unwrap_err();
        assert!(matches!(err, AuthRejection::Forbidden("Account is disabled")));
    }

    #[test]
    fn test_active_manager_gate() {
        assert!(active_manager(stored(UserRole::Manager, AccountStatus::Active)).is_ok());

        let err = active_manager(stored(UserRole::User, AccountStatus::Active)).unwrap_err();
        assert!(matches!(err, AuthRejection::Forbidden("Manager access required")));

        let err = active_manager(stored(UserRole::Manager, AccountStatus::Disabled)).unwrap_err();
        assert!(matches!(err, AuthRejection::Forbidden("Account is disabled")));

        assert_eq!(rejection_status(active_manager(None)), StatusCode::UNAUTHORIZED);
    }
}
