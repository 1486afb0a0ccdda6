//! End-to-end verdict scenarios (§8 concrete scenarios 1, 2, 3, 5, 6, 7, 8).
//! Scenario 4 (thumbnail categories crossing threshold) is covered by
//! `happyscroll-classifiers`' own unit tests, where it doesn't need a live
//! HTTP round trip.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::support::{classifier_verdict_body, empty_captions_body, safe_search_body, snippet_body, test_app};

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn verdict_request(video_url: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/happyScroll/v1/verdict")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::json!({ "video_url": video_url }).to_string()))
        .unwrap()
}

async fn mount_safe_upstreams(upstreams: &crate::support::Upstreams, title: &str, channel: &str) {
    Mock::given(method("GET"))
        .and(path("/videos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(snippet_body(
            title,
            channel,
            "hello",
            "https://i.ytimg.com/vi/x/hq.jpg",
        )))
        .mount(&upstreams.metadata)
        .await;
    Mock::given(method("GET"))
        .and(path("/captions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(empty_captions_body()))
        .mount(&upstreams.metadata)
        .await;
    Mock::given(method("POST"))
        .and(path("/images:annotate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(safe_search_body(
            "VERY_UNLIKELY",
            "VERY_UNLIKELY",
            "VERY_UNLIKELY",
        )))
        .mount(&upstreams.image)
        .await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(classifier_verdict_body(
            "SAFE: nothing concerning in this video.",
        )))
        .mount(&upstreams.text)
        .await;
}

/// Scenarios 1, 2, 6, 7: a fresh build caches the verdict and debits the
/// global budget exactly once; the cached repeat neither re-fetches upstream
/// nor debits the budget again, and stays servable even once the budget for
/// *new* builds is exhausted.
#[tokio::test]
async fn safe_video_is_cached_and_not_rebudgeted_on_repeat() {
    let (app, upstreams) = test_app(1).await;
    mount_safe_upstreams(&upstreams, "A", "B").await;

    let first = app
        .clone()
        .oneshot(verdict_request("https://youtu.be/aaaaaaaaaaa"))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let first_body = body_json(first).await;
    assert_eq!(first_body["is_safe"], true);
    assert_eq!(first_body["is_safe_transcript"], true);
    assert_eq!(first_body["is_safe_thumbnail"], true);
    assert_eq!(first_body["video_title"], "A");
    assert_eq!(first_body["channel_title"], "B");
    assert!(first_body["overall_reason"].as_str().unwrap().contains("appropriate"));

    // Scenario 2 / 7: repeat immediately. Budget is already exhausted
    // (limit=1, already committed once) but the cache hit bypasses it.
    let second = app
        .clone()
        .oneshot(verdict_request("https://youtu.be/aaaaaaaaaaa"))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    let second_body = body_json(second).await;
    assert_eq!(second_body, first_body);

    // Scenario 6: a different, never-cached id now hits the exhausted budget.
    let third = app.clone().oneshot(verdict_request("https://youtu.be/ccccccccccc")).await.unwrap();
    assert_eq!(third.status(), StatusCode::TOO_MANY_REQUESTS);
    let third_body = body_json(third).await;
    assert_eq!(third_body["detail"]["error"], "BudgetExhausted");
    assert_eq!(third_body["detail"]["limit"], 1);
    assert!(third_body["detail"]["info"].as_str().unwrap().contains("not counted"));

    let stats = app
        .oneshot(
            Request::builder()
                .uri("/api/happyScroll/v1/cache/stats")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let stats_body = body_json(stats).await;
    assert_eq!(stats_body["hits"], 1);
    assert_eq!(stats_body["puts"], 1);
}

/// Scenario 3: transcript branch reports unsafe, thumbnail branch safe.
#[tokio::test]
async fn mixed_unsafe_transcript_safe_thumbnail() {
    let (app, upstreams) = test_app(10).await;

    Mock::given(method("GET"))
        .and(path("/videos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(snippet_body(
            "C",
            "D",
            "bad words here",
            "https://i.ytimg.com/vi/y/hq.jpg",
        )))
        .mount(&upstreams.metadata)
        .await;
    Mock::given(method("GET"))
        .and(path("/captions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(empty_captions_body()))
        .mount(&upstreams.metadata)
        .await;
    Mock::given(method("POST"))
        .and(path("/images:annotate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(safe_search_body(
            "VERY_UNLIKELY",
            "VERY_UNLIKELY",
            "VERY_UNLIKELY",
        )))
        .mount(&upstreams.image)
        .await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(classifier_verdict_body(
            "UNSAFE - contains strong profanity throughout.",
        )))
        .mount(&upstreams.text)
        .await;

    let response = app
        .oneshot(verdict_request("https://www.youtube.com/shorts/bbbbbbbbbbb"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["is_safe"], false);
    assert_eq!(body["is_safe_transcript"], false);
    assert_eq!(body["is_safe_thumbnail"], true);
    assert!(body["transcript_reason"].as_str().unwrap().contains("profanity"));
    assert!(body["overall_reason"].as_str().unwrap().contains("captions"));
}

/// Scenario 5: a malformed URL is rejected before any gating or upstream call.
#[tokio::test]
async fn invalid_url_returns_400_without_touching_upstreams() {
    let (app, _upstreams) = test_app(150).await;

    let response = app.oneshot(verdict_request("not a url")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["detail"].as_str().unwrap().contains("InvalidUrl") || body["detail"].as_str().unwrap().contains("invalid"));
}

/// Scenario 8: N concurrent requests for the same uncached id build exactly
/// once and receive byte-identical responses.
#[tokio::test]
async fn concurrent_requests_for_same_video_single_flight() {
    let (app, upstreams) = test_app(150).await;
    mount_safe_upstreams(&upstreams, "E", "F").await;

    let mut handles = Vec::new();
    for _ in 0..50 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            app.oneshot(verdict_request("https://youtu.be/ddddddddddd")).await.unwrap()
        }));
    }

    let mut bodies = Vec::new();
    for handle in handles {
        let response = handle.await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        bodies.push(body_json(response).await);
    }

    let first = &bodies[0];
    assert!(bodies.iter().all(|b| b == first));

    let stats = app
        .oneshot(
            Request::builder()
                .uri("/api/happyScroll/v1/cache/stats")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let stats_body = body_json(stats).await;
    assert_eq!(stats_body["puts"], 1);
}
