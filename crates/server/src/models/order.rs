//! Order domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use teashop_core::{Customization, Email, OrderId, OrderStatus, Price, ProductId};

/// A completed purchase.
///
/// Product name and image are copied at purchase time so the record stays
/// readable after the product is edited or deleted.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    /// `None` once the product has been deleted.
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub product_image: Option<String>,
    pub quantity: i32,
    /// Unit price actually charged.
    pub price: Price,
    pub total_price: Price,
    pub customization: Option<Customization>,
    pub customer_email: Email,
    pub status: OrderStatus,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields for inserting a new order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub product_id: ProductId,
    pub product_name: String,
    pub product_image: Option<String>,
    pub quantity: i32,
    pub price: Price,
    pub total_price: Price,
    pub customization: Option<Customization>,
    pub customer_email: Email,
}

/// Aggregate order figures for one customer.
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub order_count: i64,
    pub total_amount: Price,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_order_date: Option<DateTime<Utc>>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_serialize_camel_case() {
        let json = serde_json::to_value(OrderStats::default()).unwrap();
        assert_eq!(json["orderCount"], 0);
        assert_eq!(json["totalAmount"], 0.0);
        assert!(json.get("lastOrderDate").is_none());
    }
}
