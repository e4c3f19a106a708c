//! Authentication boundaries: token verification and input validation that
//! settle before any database access.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use serde_json::json;

use teashop_core::UserRole;
use teashop_integration_tests::{TEST_SECRET, claims, send, sign, test_app, unsigned};

#[tokio::test]
async fn test_missing_token_is_rejected() {
    let response = send(test_app(), Method::GET, "/api/auth/profile", None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let body = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Missing bearer token");
}

#[tokio::test]
async fn test_unsigned_manager_token_is_rejected() {
    let token = unsigned(&claims(1, UserRole::Manager));
    let response = send(test_app(), Method::GET, "/api/products/orders", None, Some(&token)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.json()["success"], false);
}

#[tokio::test]
async fn test_token_from_other_secret_is_rejected() {
    let token = sign(
        &claims(1, UserRole::Manager),
        "another-service-signing-key-9f3Kq1Zx",
    );
    let response = send(test_app(), Method::GET, "/api/products/users", None, Some(&token)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let mut expired = claims(1, UserRole::User);
    expired.iat -= 7200;
    expired.exp -= 7200;
    let token = sign(&expired, TEST_SECRET);

    let response = send(test_app(), Method::GET, "/api/auth/has-password", None, Some(&token)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_requires_email_and_password() {
    let response = send(
        test_app(),
        Method::POST,
        "/api/auth/login",
        Some(json!({ "email": "a@example.com" })),
        None,
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["message"], "Email and password are required");
}

#[tokio::test]
async fn test_login_rejects_malformed_email() {
    let response = send(
        test_app(),
        Method::POST,
        "/api/auth/login",
        Some(json!({ "email": "not-an-email", "password": "secret1" })),
        None,
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["message"], "Invalid email address");
}

#[tokio::test]
async fn test_request_code_rejects_malformed_email() {
    let response = send(
        test_app(),
        Method::POST,
        "/api/auth/request-code",
        Some(json!({ "email": "nobody@" })),
        None,
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_verify_code_requires_six_digits() {
    let response = send(
        test_app(),
        Method::POST,
        "/api/auth/verify-code",
        Some(json!({ "email": "buyer@example.com", "code": "12a456" })),
        None,
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["message"], "Verification code must be 6 digits");
}

#[tokio::test]
async fn test_auth_routes_are_rate_limited() {
    let app = test_app();
    let mut statuses = Vec::new();
    for _ in 0..6 {
        let response = send(app.clone(), Method::POST, "/api/auth/login", Some(json!({})), None).await;
        statuses.push(response.status);
    }

    assert!(statuses[..5].iter().all(|s| *s == StatusCode::BAD_REQUEST));
    assert_eq!(statuses[5], StatusCode::TOO_MANY_REQUESTS);
}
