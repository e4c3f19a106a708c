//! Product catalog handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use teashop_core::{Price, ProductId};

use crate::db::{ProductRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::RequireManager;
use crate::models::product::{DEFAULT_HOT_BADGE, DEFAULT_HOT_PRIORITY};
use crate::models::{Product, ProductInput};
use crate::routes::{ApiResponse, NoBody};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProductsBody {
    pub products: Vec<Product>,
}

#[derive(Debug, Serialize)]
pub struct ProductBody {
    pub product: Product,
}

/// Body of create and update requests.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub discount_price: Option<Decimal>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub stock: Option<i32>,
    pub has_sweetness: Option<bool>,
    pub has_ice_level: Option<bool>,
    pub is_hot: Option<bool>,
    pub hot_priority: Option<i32>,
    pub hot_badge_text: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

impl TryFrom<ProductRequest> for ProductInput {
    type Error = AppError;

    fn try_from(req: ProductRequest) -> Result<Self> {
        const REQUIRED: &str = "Name, price and category are required";

        let name = non_blank(req.name).ok_or_else(|| AppError::BadRequest(REQUIRED.to_owned()))?;
        let category =
            non_blank(req.category).ok_or_else(|| AppError::BadRequest(REQUIRED.to_owned()))?;
        let price = req
            .price
            .ok_or_else(|| AppError::BadRequest(REQUIRED.to_owned()))?;
        if price <= Decimal::ZERO {
            return Err(AppError::BadRequest(
                "Price must be greater than 0".to_owned(),
            ));
        }
        let price = Price::new(price).map_err(|e| AppError::BadRequest(e.to_string()))?;

        let discount_price = req
            .discount_price
            .map(Price::new)
            .transpose()
            .map_err(|_| AppError::BadRequest("Discount price must not be negative".to_owned()))?;

        let stock = req.stock.unwrap_or(0);
        if stock < 0 {
            return Err(AppError::BadRequest("Stock must not be negative".to_owned()));
        }

        Ok(Self {
            name,
            description: non_blank(req.description),
            price,
            discount_price,
            image_url: non_blank(req.image_url),
            category,
            stock,
            has_sweetness: req.has_sweetness.unwrap_or(false),
            has_ice_level: req.has_ice_level.unwrap_or(false),
            is_hot: req.is_hot.unwrap_or(false),
            hot_priority: req.hot_priority.unwrap_or(DEFAULT_HOT_PRIORITY),
            hot_badge_text: non_blank(req.hot_badge_text)
                .unwrap_or_else(|| DEFAULT_HOT_BADGE.to_owned()),
        })
    }
}

fn product_not_found(e: RepositoryError) -> AppError {
    match e {
        RepositoryError::NotFound => AppError::NotFound("Product not found".to_owned()),
        other => other.into(),
    }
}

/// GET /api/products
///
/// # Errors
///
/// Returns `AppError::Database` if the query fails.
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<ProductsBody>>> {
    let category = non_blank(query.category).filter(|c| c != "all");
    let products = ProductRepository::new(state.pool())
        .list(category.as_deref())
        .await?;

    Ok(ApiResponse::ok(ProductsBody { products }))
}

/// GET /api/products/{id}
///
/// # Errors
///
/// 404 if the product does not exist.
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ApiResponse<ProductBody>>> {
    let product = ProductRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_owned()))?;

    Ok(ApiResponse::ok(ProductBody { product }))
}

/// POST /api/products
///
/// # Errors
///
/// 400 if name, category or a positive price is missing.
pub async fn create(
    State(state): State<AppState>,
    RequireManager(manager): RequireManager,
    Json(req): Json<ProductRequest>,
) -> Result<Json<ApiResponse<ProductBody>>> {
    let input = ProductInput::try_from(req)?;
    let product = ProductRepository::new(state.pool()).create(&input).await?;

    tracing::info!(product_id = %product.id, manager_id = %manager.id, "Product created");
    Ok(ApiResponse::with_message(
        "Product created",
        ProductBody { product },
    ))
}

/// PUT /api/products/{id}
///
/// # Errors
///
/// 400 on invalid fields, 404 if the product does not exist.
pub async fn update(
    State(state): State<AppState>,
    RequireManager(manager): RequireManager,
    Path(id): Path<ProductId>,
    Json(req): Json<ProductRequest>,
) -> Result<Json<ApiResponse<ProductBody>>> {
    let input = ProductInput::try_from(req)?;
    let product = ProductRepository::new(state.pool())
        .update(id, &input)
        .await
        .map_err(product_not_found)?;

    tracing::info!(product_id = %product.id, manager_id = %manager.id, "Product updated");
    Ok(ApiResponse::with_message(
        "Product updated",
        ProductBody { product },
    ))
}

/// DELETE /api/products/{id}
///
/// # Errors
///
/// 404 if the product does not exist.
pub async fn delete(
    State(state): State<AppState>,
    RequireManager(manager): RequireManager,
    Path(id): Path<ProductId>,
) -> Result<Json<ApiResponse<NoBody>>> {
    ProductRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(product_not_found)?;

    tracing::info!(product_id = %id, manager_id = %manager.id, "Product deleted");
    Ok(ApiResponse::message("Product deleted"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request() -> ProductRequest {
        serde_json::from_value(serde_json::json!({
            "name": " 蜂蜜柠檬水 ",
            "price": 18,
            "category": "柠檬饮料",
            "imageUrl": "🍯",
            "hasSweetness": true,
        }))
        .unwrap()
    }

    #[test]
    fn test_defaults_applied() {
        let input = ProductInput::try_from(request()).unwrap();
        assert_eq!(input.name, "蜂蜜柠檬水");
        assert_eq!(input.stock, 0);
        assert!(input.has_sweetness);
        assert!(!input.has_ice_level);
        assert!(!input.is_hot);
        assert_eq!(input.hot_priority, DEFAULT_HOT_PRIORITY);
        assert_eq!(input.hot_badge_text, DEFAULT_HOT_BADGE);
        assert_eq!(input.description, None);
    }

    #[test]
    fn test_requires_name_price_category() {
        let mut req = request();
        req.name = Some("  ".to_owned());
        assert!(matches!(ProductInput::try_from(req), Err(AppError::BadRequest(_))));

        let mut req = request();
        req.category = None;
        assert!(matches!(ProductInput::try_from(req), Err(AppError::BadRequest(_))));

        let mut req = request();
        req.price = None;
        assert!(matches!(ProductInput::try_from(req), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_rejects_non_positive_price() {
        let mut req = request();
        req.price = Some(Decimal::ZERO);
        assert!(ProductInput::try_from(req).is_err());
    }

    #[test]
    fn test_rejects_negative_stock_and_discount() {
        let mut req = request();
        req.stock = Some(-1);
        assert!(ProductInput::try_from(req).is_err());

        let mut req = request();
        req.discount_price = Some(Decimal::new(-100, 2));
        assert!(ProductInput::try_from(req).is_err());
    }

    #[test]
    fn test_accepts_string_prices() {
        let req: ProductRequest = serde_json::from_value(serde_json::json!({
            "name": "美式咖啡",
            "price": "15.00",
            "discountPrice": "12.5",
            "category": "咖啡",
            "isHot": true,
            "hotPriority": 90,
            "hotBadgeText": "新品",
        }))
        .unwrap();

        let input = ProductInput::try_from(req).unwrap();
        assert_eq!(input.price.amount(), Decimal::new(1500, 2));
        assert_eq!(input.discount_price.unwrap().amount(), Decimal::new(1250, 2));
        assert!(input.is_hot);
        assert_eq!(input.hot_priority, 90);
        assert_eq!(input.hot_badge_text, "新品");
    }
}
