//! Prometheus metrics (§10.5): operational counters are an ambient concern
//! carried regardless of the spec's product-metrics non-goal. Generalized
//! from this codebase's `metrics.rs` init/middleware pattern.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder")
}

pub mod names {
    pub const HTTP_REQUESTS_TOTAL: &str = "happyscroll_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "happyscroll_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "happyscroll_http_requests_in_flight";
    pub const RATE_LIMIT_REJECTIONS_TOTAL: &str = "happyscroll_rate_limit_rejections_total";
}

pub fn record_rate_limit_rejection(scope: &str) {
    let labels = [("scope", scope.to_string())];
    counter!(names::RATE_LIMIT_REJECTIONS_TOTAL, &labels).increment(1);
}

fn sanitize_path(path: &str) -> &str {
    // This service's route set is small and fixed (no path params beyond
    // what's already stable), so no id-scrubbing is needed unlike the
    // broader API this pattern is borrowed from.
    path
}

pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = sanitize_path(request.uri().path()).to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);
    let response = next.run(request).await;
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16().to_string();
    let labels = [("method", method), ("path", path), ("status", status)];
    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(start.elapsed().as_secs_f64());

    response
}
