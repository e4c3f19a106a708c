//! Manager user administration.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use teashop_core::{AccountStatus, UserId, UserRole};

use crate::db::{OrderRepository, RepositoryError, UserRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireManager;
use crate::models::{Order, OrderStats, User};
use crate::routes::ApiResponse;
use crate::services::stats;
use crate::state::AppState;

/// Upper bound on orders shown in a user's detail view.
const DETAIL_ORDER_LIMIT: i64 = 500;

#[derive(Debug, Serialize)]
pub struct UsersBody {
    pub users: Vec<User>,
}

#[derive(Debug, Serialize)]
pub struct UserBody {
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct UserDetailBody {
    pub user: User,
    pub stats: OrderStats,
    pub orders: Vec<Order>,
}

fn user_not_found(e: RepositoryError) -> AppError {
    match e {
        RepositoryError::NotFound => AppError::NotFound("User not found".to_owned()),
        other => other.into(),
    }
}

/// GET /api/products/users
///
/// Stale cached stats are recomputed before the list is returned.
///
/// # Errors
///
/// Returns `AppError::Database` if a query fails.
pub async fn index(
    State(state): State<AppState>,
    RequireManager(_): RequireManager,
) -> Result<Json<ApiResponse<UsersBody>>> {
    let repo = UserRepository::new(state.pool());

    let users = repo.list_all().await?;
    let users = if stats::refresh_stale(state.pool(), &users).await > 0 {
        repo.list_all().await?
    } else {
        users
    };

    Ok(ApiResponse::ok(UsersBody { users }))
}

/// GET /api/products/users/{id}
///
/// Stale cached stats are recomputed before the user is returned.
///
/// # Errors
///
/// 404 if the user does not exist.
pub async fn show(
    State(state): State<AppState>,
    RequireManager(_): RequireManager,
    Path(id): Path<UserId>,
) -> Result<Json<ApiResponse<UserDetailBody>>> {
    let user = UserRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_owned()))?;
    let user = stats::refresh_if_due(state.pool(), user).await?;

    let orders_repo = OrderRepository::new(state.pool());
    let (stats, orders) = tokio::try_join!(
        orders_repo.stats_for_email(&user.email),
        orders_repo.list_for_email(&user.email, DETAIL_ORDER_LIMIT),
    )?;

    Ok(ApiResponse::ok(UserDetailBody {
        user,
        stats,
        orders,
    }))
}

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    #[serde(default)]
    pub role: String,
}

/// PUT /api/products/users/{id}/role
///
/// # Errors
///
/// 400 on an unknown role, 403 when a manager demotes themselves,
/// 404 if the user does not exist.
pub async fn update_role(
    State(state): State<AppState>,
    RequireManager(manager): RequireManager,
    Path(id): Path<UserId>,
    Json(req): Json<RoleRequest>,
) -> Result<Json<ApiResponse<UserBody>>> {
    let role: UserRole = req
        .role
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid role".to_owned()))?;

    if id == manager.id && !role.is_manager() {
        return Err(AppError::Forbidden("Cannot demote yourself".to_owned()));
    }

    let user = UserRepository::new(state.pool())
        .set_role(id, role)
        .await
        .map_err(user_not_found)?;

    tracing::info!(user_id = %id, manager_id = %manager.id, %role, "User role changed");
    Ok(ApiResponse::with_message("Role updated", UserBody { user }))
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    #[serde(default)]
    pub status: String,
}

/// PUT /api/products/users/{id}/status
///
/// # Errors
///
/// 400 on an unknown status, 403 when a manager disables themselves,
/// 404 if the user does not exist.
pub async fn update_status(
    State(state): State<AppState>,
    RequireManager(manager): RequireManager,
    Path(id): Path<UserId>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<ApiResponse<UserBody>>> {
    let status: AccountStatus = req
        .status
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid status".to_owned()))?;

    if id == manager.id && !status.is_active() {
        return Err(AppError::Forbidden("Cannot disable yourself".to_owned()));
    }

    let user = UserRepository::new(state.pool())
        .set_status(id, status)
        .await
        .map_err(user_not_found)?;

    tracing::info!(user_id = %id, manager_id = %manager.id, %status, "User status changed");
    Ok(ApiResponse::with_message("Status updated", UserBody { user }))
}

#[derive(Debug, Deserialize)]
pub struct NicknameRequest {
    pub nickname: Option<String>,
}

impl NicknameRequest {
    fn nickname(&self) -> Option<&str> {
        self.nickname.as_deref().map(str::trim).filter(|n| !n.is_empty())
    }
}

/// PUT /api/products/users/{id}/nickname
///
/// A blank or missing nickname clears it.
///
/// # Errors
///
/// 404 if the user does not exist.
pub async fn update_nickname(
    State(state): State<AppState>,
    RequireManager(_): RequireManager,
    Path(id): Path<UserId>,
    Json(req): Json<NicknameRequest>,
) -> Result<Json<ApiResponse<UserBody>>> {
    let user = UserRepository::new(state.pool())
        .set_nickname(id, req.nickname())
        .await
        .map_err(user_not_found)?;

    Ok(ApiResponse::with_message("Nickname updated", UserBody { user }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_nickname_blank_clears() {
        let req: NicknameRequest = serde_json::from_str(r#"{"nickname": "  "}"#).unwrap();
        assert_eq!(req.nickname(), None);

        let req: NicknameRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.nickname(), None);

        let req: NicknameRequest = serde_json::from_str(r#"{"nickname": " 老顾客 "}"#).unwrap();
        assert_eq!(req.nickname(), Some("老顾客"));
    }

    #[test]
    fn test_role_values() {
        assert_eq!("manager".parse::<UserRole>().unwrap(), UserRole::Manager);
        assert!("admin".parse::<UserRole>().is_err());
        assert!("".parse::<AccountStatus>().is_err());
    }
}
