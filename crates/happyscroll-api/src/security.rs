//! Outbound URL safety check (§4.2, DESIGN.md grounding note): the
//! thumbnail URL selected by the metadata client is platform-supplied, not
//! user-supplied, but is still handed to an outbound HTTP call (C3), so it
//! is defense-in-depth checked the same way this codebase's
//! `validate_video_url` checks user-supplied video URLs before they reach
//! an outbound call.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Blocked host patterns: loopback, RFC1918 private ranges, link-local, and
/// cloud metadata endpoints. A thumbnail URL matching any of these is
/// refused rather than fetched.
static BLOCKED_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"^https?://127\.").unwrap(),
        Regex::new(r"^https?://localhost").unwrap(),
        Regex::new(r"^https?://10\.").unwrap(),
        Regex::new(r"^https?://172\.(1[6-9]|2[0-9]|3[0-1])\.").unwrap(),
        Regex::new(r"^https?://192\.168\.").unwrap(),
        Regex::new(r"^https?://169\.254\.").unwrap(),
        Regex::new(r"^https?://\[::1\]").unwrap(),
        Regex::new(r"^https?://metadata\.").unwrap(),
    ]
});

/// Validate that `url` is a fetchable `https`/`http` URL that does not
/// target an internal or cloud-metadata endpoint. Returns `Err` with a
/// short reason on rejection.
pub fn validate_outbound_url(url: &str) -> Result<(), &'static str> {
    let parsed = Url::parse(url).map_err(|_| "malformed URL")?;

    match parsed.scheme() {
        "http" | "https" => {}
        _ => return Err("unsupported URL scheme"),
    }

    if BLOCKED_PATTERNS.iter().any(|p| p.is_match(url)) {
        return Err("URL targets an internal or restricted endpoint");
    }

    if parsed.host_str().is_none() {
        return Err("URL has no host");
    }

    Ok(())
}
