//! Category handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use teashop_core::CategoryId;

use crate::db::{CategoryRepository, ProductRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::RequireManager;
use crate::models::category::DEFAULT_CATEGORY_EMOJI;
use crate::models::{Category, CategoryWithCount};
use crate::routes::{ApiResponse, NoBody};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CategoriesBody {
    pub data: Vec<CategoryWithCount>,
}

#[derive(Debug, Serialize)]
pub struct CategoryBody {
    pub data: Category,
}

#[derive(Debug, Serialize)]
pub struct NamesBody {
    pub categories: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    #[serde(default)]
    pub name: String,
    pub emoji: Option<String>,
}

impl CategoryRequest {
    fn name(&self) -> Result<&str> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest("Category name is required".to_owned()));
        }
        Ok(name)
    }

    fn emoji(&self) -> Option<&str> {
        self.emoji.as_deref().map(str::trim).filter(|e| !e.is_empty())
    }
}

fn category_error(e: RepositoryError) -> AppError {
    match e {
        RepositoryError::NotFound => AppError::NotFound("Category not found".to_owned()),
        RepositoryError::Conflict(msg) => AppError::Conflict(msg),
        other => other.into(),
    }
}

/// GET /api/products/categories
///
/// # Errors
///
/// Returns `AppError::Database` if the query fails.
pub async fn index(State(state): State<AppState>) -> Result<Json<ApiResponse<CategoriesBody>>> {
    let data = CategoryRepository::new(state.pool())
        .list_with_counts()
        .await?;
    Ok(ApiResponse::ok(CategoriesBody { data }))
}

/// GET /api/products/categories/list
///
/// Distinct category names that products actually use.
///
/// # Errors
///
/// Returns `AppError::Database` if the query fails.
pub async fn names(State(state): State<AppState>) -> Result<Json<ApiResponse<NamesBody>>> {
    let categories = ProductRepository::new(state.pool())
        .distinct_categories()
        .await?;
    Ok(ApiResponse::ok(NamesBody { categories }))
}

/// POST /api/products/categories
///
/// # Errors
///
/// 400 without a name, 409 if the name is taken.
pub async fn create(
    State(state): State<AppState>,
    RequireManager(manager): RequireManager,
    Json(req): Json<CategoryRequest>,
) -> Result<Json<ApiResponse<CategoryBody>>> {
    let name = req.name()?;
    let emoji = req.emoji().unwrap_or(DEFAULT_CATEGORY_EMOJI);

    let data = CategoryRepository::new(state.pool())
        .create(name, emoji)
        .await
        .map_err(category_error)?;

    tracing::info!(category_id = %data.id, manager_id = %manager.id, "Category created");
    Ok(ApiResponse::with_message("Category created", CategoryBody { data }))
}

/// PUT /api/products/categories/{id}
///
/// Renaming moves every product in the category along with it.
///
/// # Errors
///
/// 400 without a name, 404 if missing, 409 if the new name is taken.
pub async fn update(
    State(state): State<AppState>,
    RequireManager(manager): RequireManager,
    Path(id): Path<CategoryId>,
    Json(req): Json<CategoryRequest>,
) -> Result<Json<ApiResponse<CategoryBody>>> {
    let name = req.name()?;

    let data = CategoryRepository::new(state.pool())
        .update(id, name, req.emoji())
        .await
        .map_err(category_error)?;

    tracing::info!(category_id = %id, manager_id = %manager.id, "Category updated");
    Ok(ApiResponse::with_message("Category updated", CategoryBody { data }))
}

/// DELETE /api/products/categories/{id}
///
/// # Errors
///
/// 404 if missing, 409 while products still use the category.
pub async fn delete(
    State(state): State<AppState>,
    RequireManager(manager): RequireManager,
    Path(id): Path<CategoryId>,
) -> Result<Json<ApiResponse<NoBody>>> {
    CategoryRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(category_error)?;

    tracing::info!(category_id = %id, manager_id = %manager.id, "Category deleted");
    Ok(ApiResponse::message("Category deleted"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_name_is_trimmed_and_required() {
        let req: CategoryRequest = serde_json::from_str(r#"{"name": "  茶饮 "}"#).unwrap();
        assert_eq!(req.name().unwrap(), "茶饮");

        let req: CategoryRequest = serde_json::from_str(r#"{"emoji": "🍵"}"#).unwrap();
        assert!(matches!(req.name(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_blank_emoji_is_absent() {
        let req: CategoryRequest =
            serde_json::from_str(r#"{"name": "果汁", "emoji": " "}"#).unwrap();
        assert_eq!(req.emoji(), None);
    }

    #[test]
    fn test_conflict_maps_to_409_message() {
        let err = category_error(RepositoryError::Conflict("category still has 2 products".into()));
        assert!(matches!(err, AppError::Conflict(ref m) if m.contains("2 products")));
        assert!(matches!(category_error(RepositoryError::NotFound), AppError::NotFound(_)));
    }
}
