//! Menu prices and discount arithmetic.
//!
//! Prices are decimal amounts in the shop's single currency, stored as
//! `NUMERIC(10, 2)` and exchanged with clients as JSON numbers.

use core::fmt;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative")]
    Negative,
}

/// A non-negative amount of money with two decimal places.
///
/// ```
/// use rust_decimal::Decimal;
/// use teashop_core::Price;
///
/// let price = Price::new(Decimal::new(1550, 2)).unwrap();
/// assert_eq!(price.times(2).amount(), Decimal::new(3100, 2));
/// assert!(Price::new(Decimal::new(-1, 0)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    /// A price of zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price, rounding to cents.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if `amount` is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        Ok(Self(
            amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        ))
    }

    /// The decimal amount.
    #[must_use]
    pub const fn amount(self) -> Decimal {
        self.0
    }

    /// Whether the price is exactly zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    /// Line total for `quantity` units at this price.
    ///
    /// Quantities below one yield [`Price::ZERO`].
    #[must_use]
    pub fn times(self, quantity: i32) -> Self {
        if quantity < 1 {
            return Self::ZERO;
        }
        Self(self.0 * Decimal::from(quantity))
    }

    /// Sum of two prices.
    #[must_use]
    pub fn plus(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = rust_decimal::serde::float::deserialize(deserializer)?;
        Self::new(amount).map_err(serde::de::Error::custom)
    }
}

/// Drop a discount price that does not undercut the list price.
#[must_use]
pub fn normalize_discount(price: Price, discount: Option<Price>) -> Option<Price> {
    discount.filter(|d| *d < price)
}

/// Whole-number percentage saved by `discount` against `price`.
///
/// Computed as `round((1 - discount / price) * 100)`. Returns 0 when there is
/// no discount, the discount is not below the price, or the price is zero.
///
/// ```
/// use rust_decimal::Decimal;
/// use teashop_core::{Price, discount_percentage};
///
/// let price = Price::new(Decimal::new(18, 0)).unwrap();
/// let discount = Price::new(Decimal::new(15, 0)).unwrap();
/// assert_eq!(discount_percentage(price, Some(discount)), 17);
/// assert_eq!(discount_percentage(price, None), 0);
/// ```
#[must_use]
pub fn discount_percentage(price: Price, discount: Option<Price>) -> i32 {
    let Some(discount) = normalize_discount(price, discount) else {
        return 0;
    };
    if price.is_zero() {
        return 0;
    }
    let ratio = (Decimal::ONE - discount.0 / price.0) * Decimal::ONE_HUNDRED;
    ratio
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i32()
        .unwrap_or(0)
}

/// The price a customer actually pays per unit.
#[must_use]
pub fn effective_unit_price(price: Price, discount: Option<Price>) -> Price {
    normalize_discount(price, discount).unwrap_or(price)
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn price(cents: i64) -> Price {
        Price::new(Decimal::new(cents, 2)).unwrap()
    }

    #[test]
    fn test_new_rejects_negative() {
        assert_eq!(Price::new(Decimal::new(-1, 2)), Err(PriceError::Negative));
        assert!(Price::new(Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_new_rounds_to_cents() {
        let p = Price::new(Decimal::new(12_345, 3)).unwrap();
        assert_eq!(p.amount(), Decimal::new(1235, 2));
    }

    #[test]
    fn test_times() {
        assert_eq!(price(1550).times(3), price(4650));
        assert_eq!(price(1550).times(0), Price::ZERO);
    }

    #[test]
    fn test_display_two_places() {
        assert_eq!(price(800).to_string(), "8.00");
        assert_eq!(price(1850).to_string(), "18.50");
    }

    #[test]
    fn test_discount_percentage() {
        assert_eq!(discount_percentage(price(2000), Some(price(1500))), 25);
        assert_eq!(discount_percentage(price(1800), Some(price(1500))), 17);
        assert_eq!(discount_percentage(price(1000), Some(price(995))), 1);
    }

    #[test]
    fn test_discount_not_below_price_is_ignored() {
        assert_eq!(discount_percentage(price(1000), Some(price(1000))), 0);
        assert_eq!(discount_percentage(price(1000), Some(price(1200))), 0);
        assert_eq!(normalize_discount(price(1000), Some(price(1200))), None);
    }

    #[test]
    fn test_effective_unit_price() {
        assert_eq!(effective_unit_price(price(1800), Some(price(1500))), price(1500));
        assert_eq!(effective_unit_price(price(1800), None), price(1800));
        assert_eq!(effective_unit_price(price(1800), Some(price(1900))), price(1800));
    }

    #[test]
    fn test_serde_as_number() {
        let json = serde_json::to_value(price(1550)).unwrap();
        assert!(json.is_number());
        assert!((json.as_f64().unwrap() - 15.5).abs() < f64::EPSILON);

        let parsed: Price = serde_json::from_str("12.5").unwrap();
        assert_eq!(parsed, price(1250));
        assert!(serde_json::from_str::<Price>("-3").is_err());
    }
}
