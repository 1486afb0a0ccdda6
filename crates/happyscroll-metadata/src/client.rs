//! C2 — Metadata client.
//!
//! Fetches title, channel, best-available thumbnail URL, and caption text
//! for a [`VideoId`] from the video platform's data API. Performs one or
//! two outbound calls: snippet fields, then caption tracks (§4.2).
//!
//! Grounded on this codebase's typed-REST-client idiom (`FirestoreClient`:
//! a `reqwest::Client` plus a config struct, one method per endpoint,
//! errors mapped at the call site) and its outbound-URL safety check
//! (`validate_video_url`), reused here for the thumbnail URL before it is
//! ever handed to the thumbnail analyzer.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use happyscroll_core::error::MetadataError;
use happyscroll_core::model::CaptionSource;
use happyscroll_core::{VideoId, VideoMetadata};

/// Deadline for each outbound call to the metadata API (§5, recommended 10s).
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Small fixed retry budget for transport-level failures on the outbound
/// GETs (§4.2 "Transport"). Never applied to response-status-derived
/// errors (`VideoNotFound`, `PermissionDenied`), only to connection
/// reset/timeout failures that never reached the upstream at all.
const MAX_TRANSPORT_RETRIES: u32 = 2;

/// Client configuration. `base_url` is overridable so tests can point it at
/// a `wiremock` server.
#[derive(Debug, Clone)]
pub struct MetadataClientConfig {
    pub api_key: String,
    pub base_url: String,
}

impl MetadataClientConfig {
    pub fn from_env() -> Result<Self, MetadataError> {
        let api_key = std::env::var("YOUTUBE_DATA_API_KEY")
            .map_err(|_| MetadataError::UpstreamUnavailable("YOUTUBE_DATA_API_KEY not configured".to_string()))?;
        Ok(Self {
            api_key,
            base_url: std::env::var("YOUTUBE_DATA_API_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        })
    }
}

#[derive(Clone)]
pub struct MetadataClient {
    http: Client,
    config: MetadataClientConfig,
}

impl MetadataClient {
    pub fn new(config: MetadataClientConfig) -> Self {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client config is static and valid");
        Self { http, config }
    }

    pub fn from_env() -> Result<Self, MetadataError> {
        Ok(Self::new(MetadataClientConfig::from_env()?))
    }

    /// Issue a GET, retrying a small fixed number of times on transport-level
    /// failures (connection reset, timeout) with exponential backoff.
    /// Grounded on this codebase's `FirestoreClient::with_retry` idiom.
    async fn get_with_retry(&self, url: &str) -> Result<reqwest::Response, MetadataError> {
        let mut last_err = None;

        for attempt in 0..=MAX_TRANSPORT_RETRIES {
            match self.http.get(url).send().await {
                Ok(response) => return Ok(response),
                Err(e) if is_retryable_transport_error(&e) && attempt < MAX_TRANSPORT_RETRIES => {
                    let delay = Duration::from_millis(100 * 2u64.pow(attempt));
                    warn!(attempt = attempt + 1, error = %e, ?delay, "metadata request failed, retrying");
                    tokio::time::sleep(delay).await;
                    last_err = Some(e);
                }
                Err(e) => {
                    return Err(MetadataError::UpstreamUnavailable(format!("request failed: {e}")));
                }
            }
        }

        Err(MetadataError::UpstreamUnavailable(format!(
            "request failed after {MAX_TRANSPORT_RETRIES} retries: {}",
            last_err.map(|e| e.to_string()).unwrap_or_default()
        )))
    }

    /// Fetch the full [`VideoMetadata`] for `video_id` (§4.2).
    pub async fn fetch(&self, video_id: &VideoId) -> Result<VideoMetadata, MetadataError> {
        let snippet = self.fetch_snippet(video_id).await?;
        let (caption_text, caption_source) = self.fetch_caption_text(video_id, &snippet).await;

        Ok(VideoMetadata {
            video_id: video_id.clone(),
            title: snippet.title,
            channel: snippet.channel_title,
            thumbnail_url: snippet.thumbnail_url,
            caption_text,
            caption_source,
        })
    }

    // -- snippet -----------------------------------------------------------

    async fn fetch_snippet(&self, video_id: &VideoId) -> Result<Snippet, MetadataError> {
        let url = format!(
            "{}/videos?part=snippet&id={}&key={}",
            self.config.base_url,
            video_id.as_str(),
            self.config.api_key
        );

        let response = self.get_with_retry(&url).await?;

        let response = check_status(response)?;

        let body: VideosListResponse = response.json().await.map_err(|e| {
            MetadataError::MetadataUnavailable(format!("malformed snippet response: {e}"))
        })?;

        let item = body.items.into_iter().next().ok_or(MetadataError::VideoNotFound)?;

        let thumbnail_url = select_best_thumbnail(&item.snippet.thumbnails)
            .ok_or_else(|| MetadataError::MetadataUnavailable("no usable thumbnail tier available".to_string()))?;

        Ok(Snippet {
            title: item.snippet.title,
            channel_title: item.snippet.channel_title,
            thumbnail_url,
            description: item.snippet.description,
            tags: item.snippet.tags.unwrap_or_default(),
        })
    }

    // -- captions ------------------------------------------------------------

    /// Preference order, first non-empty wins (§4.2):
    /// manual-en, auto-en, manual-any, auto-any, description+tags fallback.
    async fn fetch_caption_text(
        &self,
        video_id: &VideoId,
        snippet: &Snippet,
    ) -> (String, CaptionSource) {
        match self.list_caption_tracks(video_id).await {
            Ok(tracks) => {
                if let Some(track) = pick_preferred_track(&tracks) {
                    match self.download_caption_track(&track.id).await {
                        Ok(text) if !text.trim().is_empty() => {
                            let source = if track.is_auto_generated {
                                CaptionSource::AutoGenerated
                            } else {
                                CaptionSource::Manual
                            };
                            return (strip_caption_markup(&text), source);
                        }
                        Ok(_) => debug!(video_id = %video_id, "caption track downloaded empty, falling back"),
                        Err(e) => warn!(video_id = %video_id, error = %e, "caption download failed, falling back"),
                    }
                }
            }
            Err(e) => warn!(video_id = %video_id, error = %e, "caption listing failed, falling back"),
        }

        (description_fallback(snippet), CaptionSource::DescriptionFallback)
    }

    async fn list_caption_tracks(&self, video_id: &VideoId) -> Result<Vec<CaptionTrack>, MetadataError> {
        let url = format!(
            "{}/captions?part=snippet&videoId={}&key={}",
            self.config.base_url,
            video_id.as_str(),
            self.config.api_key
        );

        let response = self.get_with_retry(&url).await?;
        let response = check_status(response)?;

        let body: CaptionsListResponse = response.json().await.map_err(|e| {
            MetadataError::MetadataUnavailable(format!("malformed captions response: {e}"))
        })?;

        Ok(body
            .items
            .into_iter()
            .map(|item| CaptionTrack {
                id: item.id,
                language: item.snippet.language,
                is_auto_generated: item.snippet.track_kind.eq_ignore_ascii_case("asr"),
            })
            .collect())
    }

    async fn download_caption_track(&self, track_id: &str) -> Result<String, MetadataError> {
        let url = format!(
            "{}/captions/{}?tfmt=srt&key={}",
            self.config.base_url, track_id, self.config.api_key
        );

        let response = self.get_with_retry(&url).await?;
        let response = check_status(response)?;

        response
            .text()
            .await
            .map_err(|e| MetadataError::MetadataUnavailable(format!("caption body unreadable: {e}")))
    }
}

fn is_retryable_transport_error(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect()
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response, MetadataError> {
    match response.status() {
        StatusCode::OK => Ok(response),
        StatusCode::NOT_FOUND => Err(MetadataError::VideoNotFound),
        StatusCode::FORBIDDEN => Err(MetadataError::PermissionDenied),
        status if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS => {
            Err(MetadataError::UpstreamUnavailable(format!("upstream returned {status}")))
        }
        status => Err(MetadataError::MetadataUnavailable(format!("upstream returned {status}"))),
    }
}

struct Snippet {
    title: String,
    channel_title: String,
    thumbnail_url: String,
    description: String,
    tags: Vec<String>,
}

struct CaptionTrack {
    id: String,
    language: String,
    is_auto_generated: bool,
}

/// Tier 1-4 of §4.2's preference order. Tier 5 (description+tags) is the
/// caller's fallback when this returns `None`.
fn pick_preferred_track(tracks: &[CaptionTrack]) -> Option<&CaptionTrack> {
    tracks
        .iter()
        .find(|t| !t.is_auto_generated && is_english(&t.language))
        .or_else(|| tracks.iter().find(|t| t.is_auto_generated && is_english(&t.language)))
        .or_else(|| tracks.iter().find(|t| !t.is_auto_generated))
        .or_else(|| tracks.iter().find(|t| t.is_auto_generated))
}

fn is_english(lang: &str) -> bool {
    lang.eq_ignore_ascii_case("en") || lang.to_ascii_lowercase().starts_with("en-")
}

fn description_fallback(snippet: &Snippet) -> String {
    if snippet.tags.is_empty() {
        snippet.description.clone()
    } else {
        format!("{}\n\nTags: {}", snippet.description, snippet.tags.join(", "))
    }
}

/// Strip SRT/VTT sequence numbers, timing lines, and basic markup tags,
/// leaving plain spoken text (§4.2: "timing marks and markup are stripped").
fn strip_caption_markup(raw: &str) -> String {
    let timing_marker = "-->";
    let lines: Vec<&str> = raw
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                return false;
            }
            if trimmed.contains(timing_marker) {
                return false;
            }
            if trimmed.chars().all(|c| c.is_ascii_digit()) {
                return false;
            }
            true
        })
        .map(strip_markup_tags)
        .collect();
    lines.join(" ")
}

fn strip_markup_tags(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut in_tag = false;
    for c in line.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.trim().to_string()
}

fn select_best_thumbnail(thumbnails: &Thumbnails) -> Option<String> {
    thumbnails
        .maxres
        .as_ref()
        .or(thumbnails.high.as_ref())
        .map(|t| t.url.clone())
}

#[derive(Deserialize)]
struct VideosListResponse {
    items: Vec<VideoItem>,
}

#[derive(Deserialize)]
struct VideoItem {
    snippet: VideoSnippet,
}

#[derive(Deserialize)]
struct VideoSnippet {
    title: String,
    #[serde(rename = "channelTitle")]
    channel_title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    tags: Option<Vec<String>>,
    thumbnails: Thumbnails,
}

#[derive(Deserialize, Default)]
struct Thumbnails {
    maxres: Option<Thumbnail>,
    #[serde(rename = "high")]
    high: Option<Thumbnail>,
}

#[derive(Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Deserialize)]
struct CaptionsListResponse {
    items: Vec<CaptionItem>,
}

#[derive(Deserialize)]
struct CaptionItem {
    id: String,
    snippet: CaptionSnippet,
}

#[derive(Deserialize)]
struct CaptionSnippet {
    language: String,
    #[serde(rename = "trackKind")]
    track_kind: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caption_markup_strips_timing_and_tags() {
        let srt = "1\n00:00:00,000 --> 00:00:02,000\n<b>Hello</b> world\n\n2\n00:00:02,000 --> 00:00:04,000\nSecond line\n";
        assert_eq!(strip_caption_markup(srt), "Hello world Second line");
    }

    #[test]
    fn preference_order_manual_english_first() {
        let tracks = vec![
            CaptionTrack { id: "a".into(), language: "fr".into(), is_auto_generated: false },
            CaptionTrack { id: "b".into(), language: "en".into(), is_auto_generated: true },
            CaptionTrack { id: "c".into(), language: "en".into(), is_auto_generated: false },
        ];
        assert_eq!(pick_preferred_track(&tracks).unwrap().id, "c");
    }

    #[test]
    fn preference_falls_back_to_auto_english() {
        let tracks = vec![
            CaptionTrack { id: "a".into(), language: "fr".into(), is_auto_generated: false },
            CaptionTrack { id: "b".into(), language: "en".into(), is_auto_generated: true },
        ];
        assert_eq!(pick_preferred_track(&tracks).unwrap().id, "b");
    }

    #[test]
    fn preference_falls_back_to_manual_any_language() {
        let tracks = vec![CaptionTrack { id: "a".into(), language: "fr".into(), is_auto_generated: false }];
        assert_eq!(pick_preferred_track(&tracks).unwrap().id, "a");
    }

    #[test]
    fn preference_empty_when_no_tracks() {
        assert!(pick_preferred_track(&[]).is_none());
    }

    #[test]
    fn thumbnail_prefers_maxres_over_high() {
        let thumbnails = Thumbnails {
            maxres: Some(Thumbnail { url: "maxres.jpg".to_string() }),
            high: Some(Thumbnail { url: "hq.jpg".to_string() }),
        };
        assert_eq!(select_best_thumbnail(&thumbnails).unwrap(), "maxres.jpg");
    }

    #[test]
    fn thumbnail_falls_back_to_high() {
        let thumbnails = Thumbnails { maxres: None, high: Some(Thumbnail { url: "hq.jpg".to_string() }) };
        assert_eq!(select_best_thumbnail(&thumbnails).unwrap(), "hq.jpg");
    }

    #[test]
    fn thumbnail_none_when_no_tier_available() {
        let thumbnails = Thumbnails { maxres: None, high: None };
        assert!(select_best_thumbnail(&thumbnails).is_none());
    }
}
