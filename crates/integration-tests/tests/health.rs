//! Operational endpoints and cross-cutting middleware.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use teashop_integration_tests::{send, test_app};

#[tokio::test]
async fn test_liveness() {
    let response = send(test_app(), Method::GET, "/health", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, "ok");
}

#[tokio::test]
async fn test_readiness_without_database() {
    let response = send(test_app(), Method::GET, "/health/ready", None, None).await;
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_every_response_has_request_id() {
    let ok = send(test_app(), Method::GET, "/health", None, None).await;
    assert!(ok.headers.contains_key("x-request-id"));

    let rejected = send(test_app(), Method::GET, "/api/auth/profile", None, None).await;
    assert_eq!(rejected.status, StatusCode::UNAUTHORIZED);
    assert!(rejected.headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let response = send(test_app(), Method::GET, "/api/nothing-here", None, None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
