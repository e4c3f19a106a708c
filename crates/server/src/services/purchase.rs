//! Purchase flow: stock reservation plus order creation.
//!
//! Both writes happen in one transaction. Stock is taken with a guarded
//! `UPDATE ... WHERE stock >= quantity`, so concurrent buyers can never push
//! stock below zero and the returned remaining stock is the committed value.

use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;

use teashop_core::{Customization, Email, Price, ProductId};

use crate::db::{RepositoryError, orders, products};
use crate::models::{NewOrder, Order};
use crate::services::stats;

/// Errors that can occur while buying a product.
#[derive(Debug, Error)]
pub enum PurchaseError {
    /// Quantity below one.
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    /// No such product.
    #[error("product not found")]
    ProductNotFound,

    /// Not enough units left.
    #[error("insufficient stock: {available} left")]
    InsufficientStock { available: i32 },

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for PurchaseError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// What the buyer asked for.
#[derive(Debug, Clone, Copy)]
pub struct PurchaseRequest {
    pub product_id: ProductId,
    pub quantity: i32,
    pub customization: Option<Customization>,
}

/// Outcome of a successful purchase.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseReceipt {
    pub product_id: ProductId,
    pub quantity: i32,
    pub total_price: Price,
    pub remaining_stock: i32,
    pub customization: Option<Customization>,
    #[serde(skip)]
    pub order: Order,
}

/// Purchase service.
pub struct PurchaseService<'a> {
    pool: &'a PgPool,
}

impl<'a> PurchaseService<'a> {
    /// Create a new purchase service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Buy `request.quantity` units for `buyer`.
    ///
    /// On success the buyer's cached stats are refreshed in the background.
    ///
    /// # Errors
    ///
    /// Returns `PurchaseError::InvalidQuantity`, `ProductNotFound` or
    /// `InsufficientStock` without writing anything. Choices the product
    /// does not offer are dropped from the stored customization.
    pub async fn purchase(
        &self,
        buyer: &Email,
        request: PurchaseRequest,
    ) -> Result<PurchaseReceipt, PurchaseError> {
        if request.quantity < 1 {
            return Err(PurchaseError::InvalidQuantity);
        }

        let mut tx = self.pool.begin().await?;

        let product = products::get_for_purchase(&mut *tx, request.product_id)
            .await?
            .ok_or(PurchaseError::ProductNotFound)?;

        let customization = offered_customization(
            request.customization,
            product.has_sweetness,
            product.has_ice_level,
        );

        let Some(product) = products::take_stock(&mut *tx, request.product_id, request.quantity)
            .await?
        else {
            return Err(PurchaseError::InsufficientStock {
                available: product.stock,
            });
        };

        let unit_price = product.unit_price();
        let total_price = unit_price.times(request.quantity);

        let order = orders::insert(
            &mut *tx,
            &NewOrder {
                product_id: product.id,
                product_name: product.name.clone(),
                product_image: product.image_url.clone(),
                quantity: request.quantity,
                price: unit_price,
                total_price,
                customization,
                customer_email: buyer.clone(),
            },
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            order_id = %order.id,
            product_id = %product.id,
            quantity = request.quantity,
            total_price = %total_price,
            remaining_stock = product.stock,
            "Purchase completed"
        );

        stats::refresh_in_background(self.pool.clone(), buyer.clone());

        Ok(PurchaseReceipt {
            product_id: product.id,
            quantity: request.quantity,
            total_price,
            remaining_stock: product.stock,
            customization,
            order,
        })
    }
}

/// The part of `requested` the product offers, or `None` if nothing is left.
fn offered_customization(
    requested: Option<Customization>,
    has_sweetness: bool,
    has_ice_level: bool,
) -> Option<Customization> {
    requested
        .map(|c| c.restrict_to(has_sweetness, has_ice_level))
        .filter(|c| !c.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use teashop_core::{IceLevel, Sweetness};

    use super::*;

    fn both_choices() -> Option<Customization> {
        serde_json::from_value(serde_json::json!({ "sweetness": "5", "iceLevel": "less" })).unwrap()
    }

    #[test]
    fn test_ice_only_product_keeps_ice_level() {
        let c = offered_customization(both_choices(), false, true).unwrap();
        assert_eq!(c.sweetness, None);
        assert_eq!(c.ice_level, Some(IceLevel::Less));
    }

    #[test]
    fn test_sweetness_only_product_keeps_sweetness() {
        let c = offered_customization(both_choices(), true, false).unwrap();
        assert_eq!(c.sweetness, Some(Sweetness::Half));
        assert_eq!(c.ice_level, None);
    }

    #[test]
    fn test_plain_product_stores_nothing() {
        assert_eq!(offered_customization(both_choices(), false, false), None);
        assert_eq!(offered_customization(None, true, true), None);
    }
}
