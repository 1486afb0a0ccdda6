//! `POST /api/happyScroll/v1/verdict` (§6.1).

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use tracing::warn;

use crate::error::{VerdictError, VerdictResult};
use crate::orchestrator::get_verdict;
use crate::state::AppState;
use happyscroll_core::model::Verdict;

#[derive(Debug, Deserialize)]
pub struct VerdictRequest {
    #[serde(default)]
    pub video_url: String,
}

/// `client_id` is optional and entirely a courtesy from the caller; the
/// spec's authoritative gate is global (§4.7). When present, the server
/// additionally enforces the per-client daily budget.
pub async fn post_verdict(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<VerdictRequest>,
) -> VerdictResult<Json<Verdict>> {
    if request.video_url.trim().is_empty() {
        return Err(VerdictError::EmptyBody);
    }

    let client_id = headers
        .get("x-client-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let verdict = get_verdict(&state, &request.video_url, client_id.as_deref())
        .await
        .inspect_err(|e| warn!(error = %e, "get_verdict failed"))?;

    Ok(Json(verdict))
}
