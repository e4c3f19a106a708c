//! Category domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use teashop_core::CategoryId;

/// Emoji used when a category is created without one.
pub const DEFAULT_CATEGORY_EMOJI: &str = "📦";

/// A menu category. Products refer to it by `name`.
#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub emoji: String,
    pub created_at: DateTime<Utc>,
}

/// A category together with how many products use it.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryWithCount {
    #[serde(flatten)]
    pub category: Category,
    #[serde(rename = "productCount")]
    pub product_count: i64,
}
