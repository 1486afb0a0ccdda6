//! Health, cache admin, and HTTP-surface contract tests (§6.1).

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use crate::support::test_app;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_healthy() {
    let (app, _upstreams) = test_app(150).await;

    let response = app
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert!(body["checks"].is_object());
}

#[tokio::test]
async fn cache_stats_starts_at_zero() {
    let (app, _upstreams) = test_app(150).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/happyScroll/v1/cache/stats")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["hits"], 0);
    assert_eq!(body["misses"], 0);
    assert_eq!(body["puts"], 0);
}

#[tokio::test]
async fn cache_clear_reports_entries_removed() {
    let (app, _upstreams) = test_app(150).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/happyScroll/v1/cache/clear")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["entries_removed"], 0);
}

/// §6.1: "Only POST is accepted on `/verdict`; GET must return 405."
#[tokio::test]
async fn get_on_verdict_route_is_method_not_allowed() {
    let (app, _upstreams) = test_app(150).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/happyScroll/v1/verdict")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn security_headers_are_present() {
    let (app, _upstreams) = test_app(150).await;

    let response = app
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let headers = response.headers();
    assert!(headers.contains_key("x-content-type-options"));
    assert!(headers.contains_key("x-frame-options"));
    assert!(headers.contains_key("x-request-id"));
}
