//! Seed the database with the starter menu.
//!
//! Safe to run repeatedly: categories are inserted only when missing,
//! sample products only into an empty catalog, and the guest account only
//! if it does not exist yet.

use rust_decimal::Decimal;

use teashop_core::{Email, Price};
use teashop_server::db::{CategoryRepository, ProductRepository, UserRepository};
use teashop_server::models::ProductInput;
use teashop_server::models::product::{DEFAULT_HOT_BADGE, DEFAULT_HOT_PRIORITY};

use super::{CommandError, connect};

/// Default categories with their emoji.
const CATEGORIES: &[(&str, &str)] = &[
    ("柠檬饮料", "🍋"),
    ("果汁", "🍊"),
    ("牛奶", "🥛"),
    ("茶饮", "🍵"),
    ("咖啡", "☕"),
    ("小食", "🍪"),
];

/// Categories whose products offer sweetness and ice choices.
const DRINK_CATEGORIES: &[&str] = &["柠檬饮料", "果汁", "牛奶"];

const GUEST_EMAIL: &str = "guest@shop.com";
const GUEST_USERNAME: &str = "访客用户";

/// (name, description, price in cents, emoji, category, stock)
type SampleProduct = (&'static str, &'static str, i64, &'static str, &'static str, i32);

const SAMPLE_PRODUCTS: &[SampleProduct] = &[
    ("蜂蜜柠檬水", "精选天然蜂蜜配新鲜柠檬，清甜解腻", 1800, "🍯", "柠檬饮料", 35),
    ("柠檬汁", "100%纯柠檬汁，酸甜可口，富含维生素C", 1550, "🍋", "柠檬饮料", 40),
    ("苹果汁", "新鲜苹果榨取，香甜可口，营养丰富", 1200, "🍎", "果汁", 45),
    ("橙汁", "鲜榨橙汁，维生素C含量丰富，口感清新", 1400, "🍊", "果汁", 38),
    ("牛奶", "新鲜纯牛奶，富含蛋白质和钙质", 850, "🥛", "牛奶", 60),
    ("巧克力牛奶", "香浓巧克力与牛奶的完美融合", 1100, "🍫", "牛奶", 30),
    ("巧克力双拼", "双重巧克力口感，浓郁香甜", 1650, "🍩", "牛奶", 25),
];

/// Build the starter products.
///
/// # Errors
///
/// Returns `PriceError` if a listed price is negative.
pub fn sample_products() -> Result<Vec<ProductInput>, teashop_core::PriceError> {
    SAMPLE_PRODUCTS
        .iter()
        .map(|&(name, description, cents, emoji, category, stock)| {
            let is_drink = DRINK_CATEGORIES.contains(&category);
            Ok(ProductInput {
                name: name.to_owned(),
                description: Some(description.to_owned()),
                price: Price::new(Decimal::new(cents, 2))?,
                discount_price: None,
                image_url: Some(emoji.to_owned()),
                category: category.to_owned(),
                stock,
                has_sweetness: is_drink,
                has_ice_level: is_drink,
                is_hot: false,
                hot_priority: DEFAULT_HOT_PRIORITY,
                hot_badge_text: DEFAULT_HOT_BADGE.to_owned(),
            })
        })
        .collect()
}

/// Seed categories, sample products and the guest account.
///
/// # Errors
///
/// Returns `CommandError` if the connection or an insert fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    let categories = CategoryRepository::new(&pool);
    let mut created = 0;
    for (name, emoji) in CATEGORIES {
        if categories.ensure(name, emoji).await? {
            created += 1;
        }
    }
    tracing::info!(created, total = CATEGORIES.len(), "Categories seeded");

    let products = ProductRepository::new(&pool);
    let existing = products.count().await?;
    if existing == 0 {
        let samples = sample_products()
            .map_err(|e| CommandError::Seed(e.to_string()))?;
        for input in &samples {
            let product = products.create(input).await?;
            tracing::info!(
                product_id = %product.id,
                name = %product.name,
                customizable = product.has_sweetness,
                "Sample product created"
            );
        }
    } else {
        tracing::info!(existing, "Catalog not empty, skipping sample products");
    }

    let guest = UserRepository::new(&pool)
        .ensure_exists(&Email::parse(GUEST_EMAIL)?, GUEST_USERNAME)
        .await?;
    tracing::info!(user_id = %guest.id, "Guest account ready");

    tracing::info!("Seeding complete!");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_use_seeded_categories() {
        let samples = sample_products().unwrap();
        assert_eq!(samples.len(), SAMPLE_PRODUCTS.len());
        for product in &samples {
            assert!(CATEGORIES.iter().any(|(name, _)| *name == product.category));
        }
    }

    #[test]
    fn test_drinks_are_customizable() {
        let samples = sample_products().unwrap();
        let milk = samples.iter().find(|p| p.name == "牛奶").unwrap();
        assert!(milk.has_sweetness && milk.has_ice_level);
        assert_eq!(milk.price.amount(), Decimal::new(850, 2));
    }

    #[test]
    fn test_guest_email_is_valid() {
        assert!(Email::parse(GUEST_EMAIL).is_ok());
    }
}
