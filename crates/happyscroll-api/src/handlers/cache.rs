//! `GET /api/happyScroll/v1/cache/stats` and
//! `POST /api/happyScroll/v1/cache/clear` (§6.1, §4.6).

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use happyscroll_cache::CacheStatsSnapshot;

use crate::state::AppState;

pub async fn get_cache_stats(State(state): State<AppState>) -> Json<CacheStatsSnapshot> {
    Json(state.cache.stats().await)
}

#[derive(Serialize)]
pub struct ClearCacheResponse {
    pub entries_removed: usize,
}

pub async fn post_cache_clear(State(state): State<AppState>) -> Json<ClearCacheResponse> {
    let entries_removed = state.cache.clear().await;
    Json(ClearCacheResponse { entries_removed })
}
