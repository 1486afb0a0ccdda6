//! §7/§10.2 — the single top-level `VerdictError`, the only place the
//! component-local error taxonomy is converted into an HTTP response.
//! Branch-local errors (C3/C4) never reach here; they are captured into
//! `BranchResult::Err` by the combiner instead (§4.5, §7).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use happyscroll_core::error::{IdentityError, MetadataError, RateLimitError};

pub type VerdictResult<T> = Result<T, VerdictError>;

#[derive(Debug, Error)]
pub enum VerdictError {
    #[error("invalid request: {0}")]
    Identity(#[from] IdentityError),

    #[error("upstream metadata failure: {0}")]
    Metadata(#[from] MetadataError),

    #[error("rate limit: {0}")]
    RateLimit(#[from] RateLimitError),

    #[error("request body was empty")]
    EmptyBody,

    #[error("internal error: {0}")]
    Internal(String),
}

impl VerdictError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Identity(_) | Self::EmptyBody => StatusCode::BAD_REQUEST,
            Self::RateLimit(RateLimitError::BudgetExhausted { .. }) => StatusCode::TOO_MANY_REQUESTS,
            Self::Metadata(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct PlainDetail {
    detail: String,
}

impl IntoResponse for VerdictError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            Self::RateLimit(RateLimitError::BudgetExhausted { limit, count_today }) => {
                let body = json!({
                    "detail": {
                        "error": "BudgetExhausted",
                        "message": format!(
                            "The daily limit of {limit} new video analyses has been reached."
                        ),
                        "limit": limit,
                        "count_today": count_today,
                        "info": "Cached videos are not counted against this limit and are still served.",
                    }
                });
                (status, Json(body)).into_response()
            }
            Self::Metadata(_) | Self::Internal(_) => {
                // Redact internal detail in production (§7, §10.2); the
                // full detail is still logged by the caller before this
                // response is constructed.
                let production = std::env::var("ENVIRONMENT")
                    .map(|v| v.eq_ignore_ascii_case("production"))
                    .unwrap_or(false);
                let detail = if production {
                    "An internal error occurred while analyzing this video.".to_string()
                } else {
                    self.to_string()
                };
                (status, Json(PlainDetail { detail })).into_response()
            }
            _ => (status, Json(PlainDetail { detail: self.to_string() })).into_response(),
        }
    }
}
