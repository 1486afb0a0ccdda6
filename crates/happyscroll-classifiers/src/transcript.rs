//! C4 — Transcript analyzer.
//!
//! Submits caption text plus title/channel to the text policy classifier
//! using a fixed prompt, then parses its SAFE/UNSAFE verdict (§4.4).
//!
//! Grounded on this codebase's `GeminiClient`: same request/response shape
//! (a single text part, `generateContent`), same markdown-fence-stripped
//! text extraction, generalized from a JSON-schema scene response to a
//! keyword-prefixed free-text verdict.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::warn;

use happyscroll_core::model::BranchResult;

/// Deadline for the classifier call (§5, recommended 30s).
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Phrases that indicate the classifier hedged rather than committing to a
/// verdict. Per §4.4's policy-tie rule, hedging is treated as `safe=false`
/// ("when in doubt, fail closed") even when a SAFE/UNSAFE token is also present.
const HEDGE_PHRASES: &[&str] = &[
    "not sure",
    "unsure",
    "uncertain",
    "cannot determine",
    "can't determine",
    "difficult to determine",
    "unclear",
    "ambiguous",
    "hard to tell",
];

#[derive(Debug, Clone)]
pub struct TranscriptAnalyzerConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl TranscriptAnalyzerConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("TEXT_CLASSIFIER_API_KEY").unwrap_or_default(),
            base_url: std::env::var("TEXT_CLASSIFIER_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            model: std::env::var("TEXT_CLASSIFIER_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
        }
    }
}

#[derive(Clone)]
pub struct TranscriptAnalyzer {
    http: Client,
    config: TranscriptAnalyzerConfig,
}

impl TranscriptAnalyzer {
    pub fn new(config: TranscriptAnalyzerConfig) -> Self {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client config is static and valid");
        Self { http, config }
    }

    /// Classify caption text in the context of `title`/`channel`. Never
    /// returns an `Err`; failures are captured into `BranchResult::Err`.
    pub async fn analyze(&self, caption_text: &str, title: &str, channel: &str) -> BranchResult {
        let prompt = build_prompt(caption_text, title, channel);

        match self.call_classifier(&prompt).await {
            Ok(text) => match parse_verdict(&text) {
                Some((safe, reason)) => BranchResult::ok(safe, reason),
                None => {
                    warn!(response = %text, "transcript classifier response had no recognizable verdict");
                    BranchResult::err("ClassifierUnparseable", "classifier response contained no SAFE/UNSAFE verdict")
                }
            },
            Err((kind, detail)) => {
                warn!(kind = %kind, detail = %detail, "transcript classification failed");
                BranchResult::err(kind, detail)
            }
        }
    }

    async fn call_classifier(&self, prompt: &str) -> Result<String, (&'static str, String)> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.config.base_url, self.config.model, self.config.api_key
        );

        let request = GenerateContentRequest {
            contents: vec![Content { parts: vec![Part { text: prompt.to_string() }] }],
        };

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ("ClassifierUnavailable", format!("request to classifier failed: {e}")))?;

        match response.status() {
            StatusCode::OK => {}
            status if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS => {
                return Err(("ClassifierUnavailable", format!("classifier returned {status}")));
            }
            status => return Err(("ClassifierUnavailable", format!("classifier returned {status}"))),
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ("ClassifierUnavailable", format!("malformed classifier response: {e}")))?;

        body.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or(("ClassifierUnavailable", "no content in classifier response".to_string()))
    }
}

/// Build the fixed content-policy prompt. The rule enumeration is a stable
/// contract with the classifier, not a list the implementer is free to
/// edit (§4.4).
fn build_prompt(caption_text: &str, title: &str, channel: &str) -> String {
    format!(
        r#"You are a content safety classifier deciding whether a short-form video is
appropriate for a young child to watch, based solely on its title, channel
name, and caption/transcript text.

Video title: {title}
Channel: {channel}
Caption text:
{caption_text}

Evaluate the text against ALL of the following categories: violence,
sexual content, profanity, substance references (alcohol, drugs, tobacco),
discrimination or hateful content, scary or disturbing content, dangerous
acts or challenges a child could imitate, adult themes, and any other
content a cautious parent would consider inappropriate for a young child.

Respond with exactly one verdict keyword on its own — SAFE or UNSAFE —
followed by a short justification (one or two sentences) explaining the
verdict. If you are uncertain, respond UNSAFE."#
    )
}

/// Parse the classifier's response (§4.4). Hedging overrides any verdict
/// keyword present and is treated as unsafe. Returns `None` when neither
/// keyword nor hedging is recognizable.
fn parse_verdict(response: &str) -> Option<(bool, String)> {
    let trimmed = strip_code_fences(response.trim());
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_ascii_lowercase();

    if HEDGE_PHRASES.iter().any(|phrase| lower.contains(phrase)) {
        return Some((false, trimmed.to_string()));
    }

    // Check "unsafe" before "safe": "safe" is a substring of "unsafe".
    if let Some(pos) = find_word(&lower, "unsafe") {
        return Some((false, justification_after(trimmed, pos, "unsafe".len())));
    }
    if let Some(pos) = find_word(&lower, "safe") {
        return Some((true, justification_after(trimmed, pos, "safe".len())));
    }

    None
}

/// Strip a leading/trailing markdown code fence (`` ``` `` or `` ```lang ``)
/// the classifier sometimes wraps its response in, mirroring this
/// codebase's fenced-JSON response handling (§4.4, DESIGN.md). Leaves the
/// text untouched if no fence is present.
fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(mut inner) = text.strip_prefix("```") else {
        return text;
    };
    if let Some(newline) = inner.find('\n') {
        let first_line = &inner[..newline];
        if first_line.chars().all(|c| c.is_ascii_alphanumeric()) {
            inner = &inner[newline + 1..];
        }
    }
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

/// Find `word` in `haystack` at a word boundary (not as part of a longer
/// identifier).
fn find_word(haystack: &str, word: &str) -> Option<usize> {
    let bytes = haystack.as_bytes();
    let mut start = 0;
    while let Some(rel) = haystack[start..].find(word) {
        let pos = start + rel;
        let before_ok = pos == 0 || !bytes[pos - 1].is_ascii_alphanumeric();
        let after = pos + word.len();
        let after_ok = after >= bytes.len() || !bytes[after].is_ascii_alphanumeric();
        if before_ok && after_ok {
            return Some(pos);
        }
        start = pos + 1;
    }
    None
}

fn justification_after(original: &str, keyword_pos: usize, keyword_len: usize) -> String {
    let rest = original[keyword_pos + keyword_len..].trim_start_matches([':', '.', ',', '-', ' ', '\n']);
    if rest.trim().is_empty() {
        original.to_string()
    } else {
        rest.trim().to_string()
    }
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_safe_verdict() {
        let (safe, reason) = parse_verdict("SAFE: nothing concerning in this video.").unwrap();
        assert!(safe);
        assert!(reason.contains("nothing concerning"));
    }

    #[test]
    fn parses_unsafe_verdict() {
        let (safe, reason) = parse_verdict("UNSAFE - contains strong profanity throughout.").unwrap();
        assert!(!safe);
        assert!(reason.contains("profanity"));
    }

    #[test]
    fn case_insensitive() {
        let (safe, _) = parse_verdict("safe. Nothing to flag.").unwrap();
        assert!(safe);
    }

    #[test]
    fn hedging_forces_unsafe_even_with_safe_keyword() {
        let (safe, _) = parse_verdict("I'm not sure, but it looks mostly safe.").unwrap();
        assert!(!safe);
    }

    #[test]
    fn unparseable_response_is_none() {
        assert!(parse_verdict("").is_none());
        assert!(parse_verdict("This video seems fine overall.").is_none());
    }

    #[test]
    fn unsafe_checked_before_safe_substring() {
        let (safe, _) = parse_verdict("UNSAFE: contains violence.").unwrap();
        assert!(!safe);
    }

    #[test]
    fn strips_markdown_code_fence_before_parsing() {
        let (safe, reason) = parse_verdict("```\nSAFE: fine.\n```").unwrap();
        assert!(safe);
        assert_eq!(reason, "fine.");
        assert!(!reason.contains("```"));
    }

    #[test]
    fn strips_language_tagged_code_fence() {
        let (safe, reason) = parse_verdict("```text\nUNSAFE: profanity.\n```").unwrap();
        assert!(!safe);
        assert!(!reason.contains("```"));
    }
}
