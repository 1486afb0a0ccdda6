//! C5 — Verdict combiner.
//!
//! A total function over the four (ok/err × ok/err) cases (§9): branch
//! errors propagate as unsafe, never as a request failure. Fail-closed is
//! the product's rule, not an edge case.

use crate::model::{BranchResult, Verdict, VideoMetadata};

/// Combine the transcript and thumbnail branch outcomes into the final,
/// cacheable [`Verdict`].
pub fn combine(
    transcript: BranchResult,
    thumbnail: BranchResult,
    meta: &VideoMetadata,
) -> Verdict {
    let is_safe_transcript = transcript.is_safe();
    let is_safe_thumbnail = thumbnail.is_safe();
    let is_safe = is_safe_transcript && is_safe_thumbnail;

    let overall_reason = compose_overall_reason(
        is_safe,
        is_safe_transcript,
        is_safe_thumbnail,
        transcript.reason(),
        thumbnail.reason(),
    );

    Verdict {
        video_id: meta.video_id.clone(),
        is_safe,
        is_safe_transcript,
        is_safe_thumbnail,
        transcript_reason: transcript.reason().to_string(),
        thumbnail_reason: thumbnail.reason().to_string(),
        overall_reason,
        video_title: meta.title.clone(),
        channel_title: meta.channel.clone(),
    }
}

fn compose_overall_reason(
    is_safe: bool,
    is_safe_transcript: bool,
    is_safe_thumbnail: bool,
    transcript_reason: &str,
    thumbnail_reason: &str,
) -> String {
    if is_safe {
        return "Both the caption text and the thumbnail image passed the safety review; \
                this video looks appropriate for a young child."
            .to_string();
    }

    let mut parts = Vec::new();
    if !is_safe_transcript {
        parts.push(format!("the captions were flagged ({transcript_reason})"));
    }
    if !is_safe_thumbnail {
        parts.push(format!("the thumbnail was flagged ({thumbnail_reason})"));
    }

    format!("This video was marked unsafe because {}.", parts.join(" and "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::extract_video_id;

    fn meta() -> VideoMetadata {
        VideoMetadata {
            video_id: extract_video_id("https://youtu.be/dQw4w9WgXcQ").unwrap(),
            title: "A".to_string(),
            channel: "B".to_string(),
            thumbnail_url: "https://example.com/thumb.jpg".to_string(),
            caption_text: "hello".to_string(),
            caption_source: crate::model::CaptionSource::Manual,
        }
    }

    #[test]
    fn both_safe_is_conjunction_true() {
        let v = combine(
            BranchResult::ok(true, "no issues"),
            BranchResult::ok(true, "no issues"),
            &meta(),
        );
        assert!(v.is_safe);
        assert!(v.is_safe_transcript);
        assert!(v.is_safe_thumbnail);
        assert!(v.overall_reason.to_lowercase().contains("appropriate"));
    }

    #[test]
    fn transcript_unsafe_thumbnail_safe() {
        let v = combine(
            BranchResult::ok(false, "profanity"),
            BranchResult::ok(true, "no issues"),
            &meta(),
        );
        assert!(!v.is_safe);
        assert!(!v.is_safe_transcript);
        assert!(v.is_safe_thumbnail);
        assert!(v.transcript_reason.contains("profanity"));
        assert!(v.overall_reason.contains("captions"));
    }

    #[test]
    fn branch_error_forces_unsafe() {
        let v = combine(
            BranchResult::err("ClassifierUnavailable", "timed out"),
            BranchResult::ok(true, "no issues"),
            &meta(),
        );
        assert!(!v.is_safe);
        assert!(!v.is_safe_transcript);
        assert!(v.is_safe_thumbnail);
        assert_eq!(v.transcript_reason, "timed out");
    }

    #[test]
    fn both_errors_are_unsafe() {
        let v = combine(
            BranchResult::err("ClassifierUnparseable", "no verdict keyword"),
            BranchResult::err("ImageFetchFailed", "404"),
            &meta(),
        );
        assert!(!v.is_safe);
        assert!(v.overall_reason.contains("captions"));
        assert!(v.overall_reason.contains("thumbnail"));
    }
}
