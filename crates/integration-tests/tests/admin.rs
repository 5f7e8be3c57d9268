//! Admin router tests that stop before the database.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use keystall_integration_tests::{admin, body_json, get, post_json};
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_health() {
    let app = admin();
    let response = app.router.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_api_requires_admin_session() {
    for uri in [
        "/auth/me",
        "/api/dashboard",
        "/api/products",
        "/api/orders?status=submitted",
        "/api/orders/1/payment-proof",
        "/api/exports/orders.csv",
        "/api/banners",
        "/api/admin-users",
        "/api/premium/memberships",
        "/api/stock-counts",
    ] {
        let response = admin().router.oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
        let json = body_json(response).await;
        assert_eq!(json["error"], "Please log in to continue", "{uri}");
    }
}

#[tokio::test]
async fn test_approve_requires_admin_session() {
    let response = admin()
        .router
        .oneshot(post_json(
            "/api/orders/1/approve",
            &json!({ "license_key": "ABCD-1234" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_with_malformed_email_is_rejected() {
    let response = admin()
        .router
        .oneshot(post_json(
            "/auth/login",
            &json!({ "email": "nobody", "password": "long enough" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["error"], "invalid email or password");
}

#[tokio::test]
async fn test_login_is_rate_limited_per_ip() {
    let router = admin().router;
    let attempt = || post_json("/auth/login", &json!({ "email": "x", "password": "y" }));

    for _ in 0..5 {
        let response = router.clone().oneshot(attempt()).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
    let response = router.clone().oneshot(attempt()).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_admin_responses_are_not_indexed() {
    let response = admin().router.oneshot(get("/health")).await.unwrap();
    let headers = response.headers();
    assert_eq!(headers["x-robots-tag"], "noindex, nofollow");
    assert_eq!(headers["x-frame-options"], "DENY");
    let request_id = headers["x-request-id"].to_str().unwrap();
    assert_eq!(request_id.len(), 36);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let response = admin().router.oneshot(get("/api/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
