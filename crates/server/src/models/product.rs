//! Product domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use teashop_core::{Price, ProductId, discount_percentage, effective_unit_price};

/// Default badge shown on hot products.
pub const DEFAULT_HOT_BADGE: &str = "🔥爆款";

/// Default sort weight for hot products.
pub const DEFAULT_HOT_PRIORITY: i32 = 50;

/// A menu item.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    /// Only ever set to a value below `price`.
    pub discount_price: Option<Price>,
    /// Derived from `price` and `discount_price`, 0 without a discount.
    pub discount_percentage: i32,
    /// Emoji or image URL.
    pub image_url: Option<String>,
    pub category: String,
    pub stock: i32,
    pub has_sweetness: bool,
    pub has_ice_level: bool,
    pub is_hot: bool,
    pub hot_priority: i32,
    pub hot_badge_text: String,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// What one unit costs the customer right now.
    #[must_use]
    pub fn unit_price(&self) -> Price {
        effective_unit_price(self.price, self.discount_price)
    }

    /// Recompute the derived discount percentage.
    #[must_use]
    pub fn with_derived_discount(mut self) -> Self {
        self.discount_percentage = discount_percentage(self.price, self.discount_price);
        self
    }
}

/// Validated fields for creating or replacing a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductInput {
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    pub discount_price: Option<Price>,
    pub image_url: Option<String>,
    pub category: String,
    pub stock: i32,
    pub has_sweetness: bool,
    pub has_ice_level: bool,
    pub is_hot: bool,
    pub hot_priority: i32,
    pub hot_badge_text: String,
}
