//! Storefront router tests that stop before the database.

#![allow(clippy::unwrap_used)]

use axum::body::to_bytes;
use axum::http::StatusCode;
use bytes::Bytes;
use keystall_integration_tests::{body_json, get, post_json, storefront};
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_health() {
    let app = storefront();
    let response = app.router.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"ok");
}

#[tokio::test]
async fn test_account_requires_login() {
    let app = storefront();
    let response = app.router.oneshot(get("/api/account")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_orders_require_login() {
    let app = storefront();
    let response = app.router.oneshot(get("/api/orders")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_with_malformed_email_is_rejected() {
    let app = storefront();
    let response = app
        .router
        .oneshot(post_json(
            "/api/auth/login",
            &json!({ "email": "not-an-email", "password": "whatever123" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["error"], "invalid email or password");
}

#[tokio::test]
async fn test_product_images_are_public() {
    let app = storefront();
    app.media
        .put("products/cover.png", Bytes::from_static(b"\x89PNG\r\n\x1a\nrest"))
        .await
        .unwrap();

    let response = app
        .router
        .oneshot(get("/media/products/cover.png"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "image/png");
    assert_eq!(response.headers()["cache-control"], "public, max-age=86400");
}

#[tokio::test]
async fn test_payment_proofs_are_never_public() {
    let app = storefront();
    app.media
        .put(
            "payment-proofs/KS-260510-7XK2QP/proof.png",
            Bytes::from_static(b"\x89PNG\r\n\x1a\nrest"),
        )
        .await
        .unwrap();

    let response = app
        .router
        .oneshot(get("/media/payment-proofs/KS-260510-7XK2QP/proof.png"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_image_is_not_found() {
    let app = storefront();
    let response = app
        .router
        .oneshot(get("/media/products/missing.png"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_security_and_request_id_headers() {
    let app = storefront();
    let mut request = get("/health");
    request
        .headers_mut()
        .insert("x-request-id", "edge-abc-123".parse().unwrap());

    let response = app.router.oneshot(request).await.unwrap();
    let headers = response.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["cache-control"], "no-store, max-age=0");
    assert_eq!(headers["x-request-id"], "edge-abc-123");
}
