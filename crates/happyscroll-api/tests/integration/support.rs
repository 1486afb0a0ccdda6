//! Shared test harness: builds application state against local `wiremock`
//! servers standing in for the metadata API, image classifier, and text
//! classifier (§10.4).

use std::sync::{Mutex, OnceLock};

use happyscroll_api::config::AppConfig;
use happyscroll_api::{create_router, AppState};
use wiremock::MockServer;

/// Configuration is read from process environment variables, so tests that
/// set them must not interleave. `#[tokio::test]` defaults to a
/// current-thread runtime, so holding this guard across the `await`s below
/// does not require it to be `Send`.
fn env_guard() -> &'static Mutex<()> {
    static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
    GUARD.get_or_init(|| Mutex::new(()))
}

pub struct Upstreams {
    pub metadata: MockServer,
    pub image: MockServer,
    pub text: MockServer,
}

pub async fn test_app(global_daily_limit: u32) -> (axum::Router, Upstreams) {
    let _guard = env_guard().lock().unwrap_or_else(|e| e.into_inner());

    let metadata = MockServer::start().await;
    let image = MockServer::start().await;
    let text = MockServer::start().await;

    std::env::set_var("YOUTUBE_DATA_API_KEY", "test-key");
    std::env::set_var("YOUTUBE_DATA_API_BASE_URL", metadata.uri());
    std::env::set_var("IMAGE_CLASSIFIER_API_KEY", "test-key");
    std::env::set_var("IMAGE_CLASSIFIER_BASE_URL", image.uri());
    std::env::set_var("IMAGE_SAFETY_THRESHOLD", "POSSIBLE");
    std::env::set_var("TEXT_CLASSIFIER_API_KEY", "test-key");
    std::env::set_var("TEXT_CLASSIFIER_BASE_URL", text.uri());
    std::env::remove_var("TEXT_CLASSIFIER_MODEL");
    std::env::set_var("GLOBAL_DAILY_LIMIT", global_daily_limit.to_string());
    std::env::set_var("CLIENT_DAILY_LIMIT", "100");
    std::env::set_var("CACHE_TTL_DAYS", "7");
    std::env::remove_var("CACHE_BACKEND_URL");
    std::env::set_var("ENVIRONMENT", "test");
    // High enough that the edge token bucket never interferes with a test's
    // own assertions about C7's budget gating.
    std::env::set_var("EDGE_REQUESTS_PER_SECOND", "10000");

    let config = AppConfig::from_env();
    let state = AppState::new(config).await;
    let app = create_router(state, None);

    (app, Upstreams { metadata, image, text })
}

/// A metadata snippet response with no caption tracks, so the client falls
/// through to the description/tags fallback tier (§4.2 tier 5).
pub fn snippet_body(title: &str, channel: &str, description: &str, thumbnail_url: &str) -> serde_json::Value {
    serde_json::json!({
        "items": [{
            "snippet": {
                "title": title,
                "channelTitle": channel,
                "description": description,
                "tags": [],
                "thumbnails": { "high": { "url": thumbnail_url } },
            }
        }]
    })
}

pub fn empty_captions_body() -> serde_json::Value {
    serde_json::json!({ "items": [] })
}

pub fn safe_search_body(adult: &str, violence: &str, racy: &str) -> serde_json::Value {
    serde_json::json!({
        "responses": [{
            "safeSearchAnnotation": {
                "adult": adult,
                "violence": violence,
                "racy": racy,
                "medical": "VERY_UNLIKELY",
                "spoof": "VERY_UNLIKELY",
            }
        }]
    })
}

pub fn classifier_verdict_body(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{ "content": { "parts": [{ "text": text }] } }]
    })
}
