//! C1 — Identity extractor.
//!
//! Parses a user-supplied URL into a canonical [`VideoId`]. Pure function,
//! no I/O, no shared state: the only state this module holds is the
//! compile-time host/shape tables below.
//!
//! Grounded on this codebase's existing YouTube id-extraction idiom
//! (`extract_youtube_id` / `analyze_youtube_url`), generalized to the
//! watch/short-link/shorts/embed shapes the spec enumerates and tightened
//! to return a single canonical id rather than a yt-dlp download plan.

use url::Url;

use crate::error::IdentityError;

/// Canonical video id length. The platform this service targets mints ids
/// of exactly this length; the "restricted alphabet, length range" language
/// in the data model is this fixed width in practice.
const VIDEO_ID_LEN: usize = 11;

/// Canonical hosts this extractor recognizes, after stripping a leading
/// `www.` or `m.` subdomain.
const WATCH_HOSTS: &[&str] = &["youtube.com", "youtube-nocookie.com"];
const SHORT_LINK_HOST: &str = "youtu.be";

/// Opaque canonical video identifier. The sole cache key (§3); produced
/// only by [`extract_video_id`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct VideoId(String);

impl VideoId {
    /// Construct from an already-validated id string. Only used internally
    /// and in tests; real callers go through [`extract_video_id`].
    fn new_unchecked(id: String) -> Self {
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parse `raw_url` into a canonical [`VideoId`].
///
/// Two URLs that differ only in query ordering, scheme, or short-link vs.
/// watch-style form must yield a byte-identical [`VideoId`] (§8, identity
/// canonicalization property).
pub fn extract_video_id(raw_url: &str) -> Result<VideoId, IdentityError> {
    let raw_url = raw_url.trim();
    if raw_url.is_empty() {
        return Err(IdentityError::InvalidUrl);
    }

    let url = Url::parse(raw_url).map_err(|_| IdentityError::InvalidUrl)?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(IdentityError::InvalidUrl),
    }

    let host = url
        .host_str()
        .ok_or(IdentityError::InvalidUrl)?
        .to_ascii_lowercase();
    let bare_host = strip_known_subdomain(&host);

    let candidate = if bare_host == SHORT_LINK_HOST {
        extract_from_short_link(&url)
    } else if WATCH_HOSTS.contains(&bare_host) {
        extract_from_watch_host(&url)
    } else {
        return Err(IdentityError::InvalidUrl);
    };

    let id = candidate.ok_or(IdentityError::UnextractableId)?;
    validate_id(&id).ok_or(IdentityError::UnextractableId)
}

fn strip_known_subdomain(host: &str) -> &str {
    host.strip_prefix("www.")
        .or_else(|| host.strip_prefix("m."))
        .unwrap_or(host)
}

/// `youtu.be/<id>` — the only path shape the short-link host serves.
fn extract_from_short_link(url: &Url) -> Option<String> {
    url.path_segments()?.next().map(str::to_string)
}

/// `youtube.com`/`youtube-nocookie.com` serve four shapes: `?v=<id>`,
/// `/shorts/<id>`, `/embed/<id>`, and the legacy `/v/<id>` embed path.
fn extract_from_watch_host(url: &Url) -> Option<String> {
    if let Some((_, v)) = url.query_pairs().find(|(k, _)| k == "v") {
        return Some(v.into_owned());
    }

    let mut segments = url.path_segments()?;
    match segments.next() {
        Some("shorts") | Some("embed") | Some("v") => segments.next().map(str::to_string),
        _ => None,
    }
}

/// Alphabet is letters, digits, `_`, `-`; length is the platform's fixed id
/// width.
fn validate_id(id: &str) -> Option<VideoId> {
    if id.len() != VIDEO_ID_LEN {
        return None;
    }
    if !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return None;
    }
    Some(VideoId::new_unchecked(id.to_string()))
}
