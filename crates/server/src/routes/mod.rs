//! HTTP route handlers for the shop API.
//!
//! # Route Structure
//!
//! ```text
//! # Auth (rate limited ~10/min per IP)
//! POST /api/auth/login                   - Email + password sign-in
//! POST /api/auth/request-code            - Mail a one-time code
//! POST /api/auth/verify-code             - Redeem a code (creates account if new)
//! GET  /api/auth/profile                 - Current profile
//! PUT  /api/auth/profile                 - Update username / avatar
//! PUT  /api/auth/password                - Set or change password
//! GET  /api/auth/has-password            - Whether a password is set
//!
//! # Catalog (rate limited ~100/min per IP)
//! GET    /api/products                   - List (optional ?category=)
//! GET    /api/products/{id}              - One product
//! POST   /api/products                   - Create (manager)
//! PUT    /api/products/{id}              - Replace (manager)
//! DELETE /api/products/{id}              - Delete (manager)
//!
//! # Categories
//! GET    /api/products/categories        - Categories with product counts
//! GET    /api/products/categories/list   - Names used by products
//! POST   /api/products/categories        - Create (manager)
//! PUT    /api/products/categories/{id}   - Rename / re-emoji (manager)
//! DELETE /api/products/categories/{id}   - Delete unused (manager)
//!
//! # Purchases
//! POST /api/products/purchase            - Buy (auth)
//! GET  /api/products/user/role           - Caller's role (auth)
//! GET  /api/products/user/purchases      - Caller's orders + stats (auth)
//!
//! # Orders (manager)
//! GET  /api/products/orders              - All orders
//! GET  /api/products/orders/unread-count - Unread count
//! POST /api/products/orders/{id}/mark-read
//! POST /api/products/orders/mark-all-read
//!
//! # Users (manager)
//! GET /api/products/users                - All users (stale stats refreshed)
//! GET /api/products/users/{id}           - User, stats and orders
//! PUT /api/products/users/{id}/role
//! PUT /api/products/users/{id}/status
//! PUT /api/products/users/{id}/nickname
//! ```

pub mod auth;
pub mod categories;
pub mod orders;
pub mod products;
pub mod purchases;
pub mod users;

use axum::{
    Json, Router,
    routing::{get, post, put},
};
use serde::Serialize;

use crate::state::AppState;

/// Success envelope: `{"success": true, "message"?: ..., ...body}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub body: T,
}

/// Body for responses that only carry a message.
#[derive(Debug, Serialize)]
pub struct NoBody {}

impl<T: Serialize> ApiResponse<T> {
    /// Successful response without a message.
    pub const fn ok(body: T) -> Json<Self> {
        Json(Self {
            success: true,
            message: None,
            body,
        })
    }

    /// Successful response with a message.
    pub fn with_message(message: impl Into<String>, body: T) -> Json<Self> {
        Json(Self {
            success: true,
            message: Some(message.into()),
            body,
        })
    }
}

impl ApiResponse<NoBody> {
    /// Successful response carrying only a message.
    pub fn message(message: impl Into<String>) -> Json<Self> {
        Self::with_message(message, NoBody {})
    }
}

/// Create the `/api/auth` router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/request-code", post(auth::request_code))
        .route("/verify-code", post(auth::verify_code))
        .route("/profile", get(auth::profile).put(auth::update_profile))
        .route("/password", put(auth::change_password))
        .route("/has-password", get(auth::has_password))
}

/// Create the `/api/products` router.
///
/// Static segments (`/categories`, `/orders`, `/users`, ...) take priority
/// over `/{id}` in axum's matcher.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
        // Categories
        .route(
            "/categories",
            get(categories::index).post(categories::create),
        )
        .route("/categories/list", get(categories::names))
        .route(
            "/categories/{id}",
            put(categories::update).delete(categories::delete),
        )
        // Purchases
        .route("/purchase", post(purchases::purchase))
        .route("/user/role", get(purchases::role))
        .route("/user/purchases", get(purchases::history))
        // Orders
        .route("/orders", get(orders::index))
        .route("/orders/unread-count", get(orders::unread_count))
        .route("/orders/mark-all-read", post(orders::mark_all_read))
        .route("/orders/{id}/mark-read", post(orders::mark_read))
        // Users
        .route("/users", get(users::index))
        .route("/users/{id}", get(users::show))
        .route("/users/{id}/role", put(users::update_role))
        .route("/users/{id}/status", put(users::update_status))
        .route("/users/{id}/nickname", put(users::update_nickname))
}
