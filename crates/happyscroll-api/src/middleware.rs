//! HTTP ambient layers (§10.6): CORS, request id, request/response logging,
//! security headers, and an edge per-IP token bucket. Generalized from this
//! codebase's `middleware.rs`, trimmed to what this service actually needs
//! (no JWT/auth layer — §1's explicit non-goal is per-user identity).

use std::net::IpAddr;
use std::num::NonZeroU32;
use std::time::Instant;

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderValue, Request, Response, StatusCode};
use axum::middleware::Next;
use axum::response::IntoResponse;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn, Span};
use uuid::Uuid;

/// Per-process, unkeyed token bucket: a coarse request-volume safeguard at
/// the edge, independent of C7's per-video-analysis budget (§10.6).
pub type EdgeRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

pub fn create_edge_rate_limiter(requests_per_second: u32) -> std::sync::Arc<EdgeRateLimiter> {
    let quota = Quota::per_second(NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::new(20).unwrap()));
    std::sync::Arc::new(RateLimiter::direct(quota))
}

pub async fn edge_rate_limit_middleware(
    State(limiter): State<std::sync::Arc<EdgeRateLimiter>>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    if limiter.check().is_err() {
        warn!("edge rate limit exceeded");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            [("Retry-After", "1")],
            "Too many requests, please slow down.",
        )
            .into_response();
    }
    next.run(request).await
}

/// Permissive `Any` origin when no explicit allow-list is configured:
/// browser extensions are served from unpredictable `chrome-extension://`
/// ids that cannot be enumerated in advance (§6.1, §10.6).
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    use axum::http::{header, Method};

    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_methods(Any)
            .allow_headers(Any)
            .allow_origin(Any)
            .max_age(std::time::Duration::from_secs(600))
    } else {
        let allowed_origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        let client_id_header = header::HeaderName::from_static("x-client-id");
        CorsLayer::new()
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT, client_id_header])
            .allow_origin(allowed_origins)
            .max_age(std::time::Duration::from_secs(600))
    }
}

pub async fn security_headers(request: Request<Body>, next: Next) -> Response<Body> {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert("X-Content-Type-Options", HeaderValue::from_static("nosniff"));
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert("Referrer-Policy", HeaderValue::from_static("strict-origin-when-cross-origin"));
    headers.insert(
        "Permissions-Policy",
        HeaderValue::from_static("camera=(), microphone=(), geolocation=()"),
    );

    response
}

/// Generates (or echoes) a request id, recorded in the tracing span and
/// returned in the `x-request-id` response header (§10.1).
pub async fn request_id(mut request: Request<Body>, next: Next) -> Response<Body> {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    request.extensions_mut().insert(request_id.clone());
    Span::current().record("request_id", &request_id);

    let mut response = next.run(request).await;
    if let Ok(value) = request_id.parse() {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

pub async fn request_logging(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    if uri.path() != "/api/health" {
        info!(
            method = %method,
            uri = %uri,
            status = %response.status(),
            duration_ms = start.elapsed().as_millis(),
            "request completed"
        );
    }

    response
}

#[allow(dead_code)]
fn extract_client_ip(request: &Request<Body>) -> Option<IpAddr> {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|ip| ip.trim().parse().ok())
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<std::net::SocketAddr>>()
                .map(|ci| ci.0.ip())
        })
}
