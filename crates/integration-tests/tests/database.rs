//! Store-level guarantees that need a real database.
//!
//! Run with `SHOP_DATABASE_URL` set and `-- --include-ignored`.

#![allow(clippy::unwrap_used)]

use teashop_core::{AccountStatus, Email};
use teashop_integration_tests::{
    cents, create_product, create_user, database_pool, product_input, unique,
};
use teashop_server::db::{CategoryRepository, ProductRepository, RepositoryError, UserRepository};
use teashop_server::services::auth::{AuthError, AuthService};
use teashop_server::services::purchase::{PurchaseError, PurchaseRequest, PurchaseService};
use teashop_server::services::stats;

fn request(product_id: teashop_core::ProductId, quantity: i32) -> PurchaseRequest {
    PurchaseRequest {
        product_id,
        quantity,
        customization: None,
    }
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL database"]
async fn test_concurrent_purchases_cannot_oversell() {
    let pool = database_pool().await;
    let product = create_product(&pool, &product_input("柠檬饮料", 1, cents(1800))).await;
    let first = create_user(&pool, AccountStatus::Active).await;
    let second = create_user(&pool, AccountStatus::Active).await;

    let service = PurchaseService::new(&pool);
    let (a, b) = tokio::join!(
        service.purchase(&first.email, request(product.id, 1)),
        service.purchase(&second.email, request(product.id, 1)),
    );

    let outcomes = [a, b];
    let succeeded = outcomes.iter().filter(|r| r.is_ok()).count();
    assert_eq!(succeeded, 1);
    assert!(outcomes.iter().any(|r| matches!(
        r,
        Err(PurchaseError::InsufficientStock { available: 0 })
    )));

    let stored = ProductRepository::new(&pool).get(product.id).await.unwrap().unwrap();
    assert_eq!(stored.stock, 0);
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL database"]
async fn test_remaining_stock_matches_store() {
    let pool = database_pool().await;
    let product = create_product(&pool, &product_input("柠檬饮料", 10, cents(1200))).await;
    let buyer = create_user(&pool, AccountStatus::Active).await;

    let receipt = PurchaseService::new(&pool)
        .purchase(&buyer.email, request(product.id, 3))
        .await
        .unwrap();

    let stored = ProductRepository::new(&pool).get(product.id).await.unwrap().unwrap();
    assert_eq!(receipt.remaining_stock, 7);
    assert_eq!(receipt.remaining_stock, stored.stock);
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL database"]
async fn test_total_uses_discount_price() {
    let pool = database_pool().await;
    let mut input = product_input("咖啡", 5, cents(1800));
    input.discount_price = Some(cents(1500));
    let product = create_product(&pool, &input).await;
    let buyer = create_user(&pool, AccountStatus::Active).await;

    let receipt = PurchaseService::new(&pool)
        .purchase(&buyer.email, request(product.id, 2))
        .await
        .unwrap();

    assert_eq!(receipt.total_price, cents(3000));
    assert_eq!(receipt.order.price, cents(1500));
    assert_eq!(receipt.order.total_price, cents(3000));
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL database"]
async fn test_short_stock_writes_nothing() {
    let pool = database_pool().await;
    let product = create_product(&pool, &product_input("柠檬饮料", 2, cents(1000))).await;
    let buyer = create_user(&pool, AccountStatus::Active).await;

    let err = PurchaseService::new(&pool)
        .purchase(&buyer.email, request(product.id, 3))
        .await
        .unwrap_err();
    assert!(matches!(err, PurchaseError::InsufficientStock { available: 2 }));

    let stored = ProductRepository::new(&pool).get(product.id).await.unwrap().unwrap();
    assert_eq!(stored.stock, 2);
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL database"]
async fn test_verification_code_redeems_once() {
    let pool = database_pool().await;
    let address = format!("{}@shop.test", unique("signup"));
    let auth = AuthService::new(&pool);

    let (_, code) = auth.request_code(&address).await.unwrap();

    let user = auth
        .verify_code(&address, &code, Some("teapass123"))
        .await
        .unwrap();
    assert_eq!(user.email, Email::parse(&address).unwrap());

    let again = auth.verify_code(&address, &code, Some("teapass123")).await;
    assert!(matches!(again, Err(AuthError::InvalidCode)));
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL database"]
async fn test_category_with_products_is_not_deleted() {
    let pool = database_pool().await;
    let categories = CategoryRepository::new(&pool);
    let category = categories.create(&unique("果茶"), "🍑").await.unwrap();
    let product = create_product(&pool, &product_input(&category.name, 3, cents(1600))).await;

    let err = categories.delete(category.id).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)));

    assert!(categories.get(category.id).await.unwrap().is_some());
    let stored = ProductRepository::new(&pool).get(product.id).await.unwrap().unwrap();
    assert_eq!(stored.category, category.name);
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL database"]
async fn test_stats_refresh_when_due() {
    let pool = database_pool().await;
    let product = create_product(&pool, &product_input("柠檬饮料", 5, cents(1800))).await;
    let buyer = create_user(&pool, AccountStatus::Active).await;

    PurchaseService::new(&pool)
        .purchase(&buyer.email, request(product.id, 2))
        .await
        .unwrap();

    let current = UserRepository::new(&pool).get_by_id(buyer.id).await.unwrap().unwrap();
    let refreshed = stats::refresh_if_due(&pool, current).await.unwrap();
    assert_eq!(refreshed.total_orders, 1);
    assert_eq!(refreshed.total_spent, cents(3600));
    assert!(refreshed.stats_updated_at.is_some());
    assert!(!stats::should_update(&pool, &buyer.email).await.unwrap());

    let unknown = Email::parse(&format!("{}@shop.test", unique("nobody"))).unwrap();
    assert!(stats::should_update(&pool, &unknown).await.unwrap());
}
