//! Customer purchase handlers.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use teashop_core::{Customization, ProductId, UserRole};

use crate::db::{OrderRepository, UserRepository};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::{RequireActiveUser, RequireAuth};
use crate::models::{Order, OrderStats};
use crate::routes::ApiResponse;
use crate::services::purchase::{PurchaseReceipt, PurchaseRequest, PurchaseService};
use crate::state::AppState;

/// How many orders the purchase history returns.
const HISTORY_LIMIT: i64 = 50;

const fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseBody {
    pub product_id: Option<ProductId>,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    pub customization: Option<Customization>,
}

#[derive(Debug, Serialize)]
pub struct ReceiptBody {
    pub data: PurchaseReceipt,
}

/// POST /api/products/purchase
///
/// # Errors
///
/// 400 on a bad quantity, 403 for a disabled account, 404 if the product
/// does not exist, 409 when stock is short.
pub async fn purchase(
    State(state): State<AppState>,
    RequireActiveUser(buyer): RequireActiveUser,
    Json(body): Json<PurchaseBody>,
) -> Result<Json<ApiResponse<ReceiptBody>>> {
    let product_id = body
        .product_id
        .ok_or_else(|| AppError::BadRequest("Product ID is required".to_owned()))?;

    let receipt = PurchaseService::new(state.pool())
        .purchase(
            &buyer.email,
            PurchaseRequest {
                product_id,
                quantity: body.quantity,
                customization: body.customization,
            },
        )
        .await?;

    add_breadcrumb(
        "purchase",
        &format!("Bought {} x product {product_id}", receipt.quantity),
        None,
    );

    Ok(ApiResponse::with_message(
        "Purchase successful",
        ReceiptBody { data: receipt },
    ))
}

#[derive(Debug, Serialize)]
pub struct RoleBody {
    pub role: UserRole,
}

/// GET /api/products/user/role
///
/// The stored role wins over the one baked into the token.
///
/// # Errors
///
/// Returns `AppError::Database` if the lookup fails.
pub async fn role(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
) -> Result<Json<ApiResponse<RoleBody>>> {
    let role = UserRepository::new(state.pool())
        .get_by_id(caller.id)
        .await?
        .map_or(caller.role, |user| user.role);

    Ok(ApiResponse::ok(RoleBody { role }))
}

#[derive(Debug, Serialize)]
pub struct HistoryBody {
    pub stats: OrderStats,
    pub orders: Vec<Order>,
}

/// GET /api/products/user/purchases
///
/// # Errors
///
/// Returns `AppError::Database` if a query fails.
pub async fn history(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
) -> Result<Json<ApiResponse<HistoryBody>>> {
    let orders_repo = OrderRepository::new(state.pool());

    let (stats, orders) = tokio::try_join!(
        orders_repo.stats_for_email(&caller.email),
        orders_repo.list_for_email(&caller.email, HISTORY_LIMIT),
    )?;

    Ok(ApiResponse::ok(HistoryBody {
        // The customer view only shows count and spend.
        stats: OrderStats {
            last_order_date: None,
            ..stats
        },
        orders,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use teashop_core::{IceLevel, Sweetness};

    use super::*;

    #[test]
    fn test_quantity_defaults_to_one() {
        let body: PurchaseBody = serde_json::from_str(r#"{"productId": 4}"#).unwrap();
        assert_eq!(body.product_id, Some(ProductId::new(4)));
        assert_eq!(body.quantity, 1);
        assert!(body.customization.is_none());
    }

    #[test]
    fn test_customization_parsed() {
        let body: PurchaseBody = serde_json::from_str(
            r#"{"productId": 1, "quantity": 2, "customization": {"sweetness": "5", "iceLevel": "less"}}"#,
        )
        .unwrap();

        let c = body.customization.unwrap();
        assert_eq!(c.sweetness, Some(Sweetness::Half));
        assert_eq!(c.ice_level, Some(IceLevel::Less));
        assert_eq!(body.quantity, 2);
    }

    #[test]
    fn test_invalid_sweetness_rejected() {
        let result = serde_json::from_str::<PurchaseBody>(
            r#"{"productId": 1, "customization": {"sweetness": "4"}}"#,
        );
        assert!(result.is_err());
    }
}
