//! Manager order triage.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

use teashop_core::OrderId;

use crate::db::{OrderRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::RequireManager;
use crate::models::Order;
use crate::routes::{ApiResponse, NoBody};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct OrdersBody {
    pub orders: Vec<Order>,
}

#[derive(Debug, Serialize)]
pub struct CountBody {
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct UpdatedBody {
    pub updated: u64,
}

/// GET /api/products/orders
///
/// # Errors
///
/// Returns `AppError::Database` if the query fails.
pub async fn index(
    State(state): State<AppState>,
    RequireManager(_): RequireManager,
) -> Result<Json<ApiResponse<OrdersBody>>> {
    let orders = OrderRepository::new(state.pool()).list_all().await?;
    Ok(ApiResponse::ok(OrdersBody { orders }))
}

/// GET /api/products/orders/unread-count
///
/// # Errors
///
/// Returns `AppError::Database` if the query fails.
pub async fn unread_count(
    State(state): State<AppState>,
    RequireManager(_): RequireManager,
) -> Result<Json<ApiResponse<CountBody>>> {
    let count = OrderRepository::new(state.pool()).unread_count().await?;
    Ok(ApiResponse::ok(CountBody { count }))
}

/// POST /api/products/orders/{id}/mark-read
///
/// # Errors
///
/// 404 if the order does not exist.
pub async fn mark_read(
    State(state): State<AppState>,
    RequireManager(_): RequireManager,
    Path(id): Path<OrderId>,
) -> Result<Json<ApiResponse<NoBody>>> {
    OrderRepository::new(state.pool())
        .mark_read(id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("Order not found".to_owned()),
            other => other.into(),
        })?;

    Ok(ApiResponse::message("Order marked as read"))
}

/// POST /api/products/orders/mark-all-read
///
/// # Errors
///
/// Returns `AppError::Database` if the update fails.
pub async fn mark_all_read(
    State(state): State<AppState>,
    RequireManager(manager): RequireManager,
) -> Result<Json<ApiResponse<UpdatedBody>>> {
    let updated = OrderRepository::new(state.pool()).mark_all_read().await?;

    tracing::info!(manager_id = %manager.id, updated, "Marked all orders read");
    Ok(ApiResponse::with_message(
        "All orders marked as read",
        UpdatedBody { updated },
    ))
}
