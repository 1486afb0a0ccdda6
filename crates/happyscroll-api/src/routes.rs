//! API routes (§6.1).

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;

use crate::config::MAX_VERDICT_BODY_BYTES;
use crate::handlers::{get_cache_stats, health, post_cache_clear, post_verdict};
use crate::metrics::metrics_middleware;
use crate::middleware::{cors_layer, create_edge_rate_limiter, edge_rate_limit_middleware, request_id, request_logging, security_headers};
use crate::state::AppState;

pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let edge_limiter = create_edge_rate_limiter(state.config.edge_requests_per_second);

    let verdict_routes = Router::new()
        .route("/verdict", post(post_verdict))
        .layer(DefaultBodyLimit::max(MAX_VERDICT_BODY_BYTES));

    let cache_routes = Router::new()
        .route("/cache/stats", get(get_cache_stats))
        .route("/cache/clear", post(post_cache_clear));

    let api_routes = Router::new()
        .nest("/api/happyScroll/v1", verdict_routes.merge(cache_routes))
        .layer(middleware::from_fn_with_state(edge_limiter, edge_rate_limit_middleware));

    let health_routes = Router::new().route("/api/health", get(health));

    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .merge(api_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
