//! Data model shared across the verdict pipeline (§3).

use serde::{Deserialize, Serialize};

use crate::identity::VideoId;

/// Maximum length, in bytes, of any human-readable reason string stored on
/// a [`Verdict`] or surfaced from a [`BranchResult`]. Applied at the point
/// each reason is produced (C3/C4/C5), not retroactively.
pub const MAX_REASON_LEN: usize = 600;

/// Which tier of the caption-acquisition fallback chain (§4.2) produced the
/// caption text on a [`VideoMetadata`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaptionSource {
    Manual,
    AutoGenerated,
    DescriptionFallback,
}

/// Immutable per-request record for one [`VideoId`] (§3). Lives for one
/// request unless embedded in a cached [`Verdict`] — in this design it is
/// not embedded; only its title/channel survive into the cached shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub video_id: VideoId,
    pub title: String,
    pub channel: String,
    /// Best-available thumbnail URL selected by the quality fallback chain.
    pub thumbnail_url: String,
    /// Plain text, timing marks and markup stripped. May be empty only if
    /// every tier of the fallback chain (including the description/tags
    /// fallback) produced nothing.
    pub caption_text: String,
    pub caption_source: CaptionSource,
}

/// Sum type for one branch's outcome (§3, §9 — tagged variant, not
/// null-with-out-of-band-error).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BranchResult {
    Ok { safe: bool, reason: String },
    Err { kind: String, detail: String },
}

impl BranchResult {
    pub fn ok(safe: bool, reason: impl Into<String>) -> Self {
        Self::Ok {
            safe,
            reason: truncate_reason(reason.into()),
        }
    }

    pub fn err(kind: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Err {
            kind: kind.into(),
            detail: truncate_reason(detail.into()),
        }
    }

    /// `true` iff this branch is `Ok` and reports `safe`. An `Err` branch
    /// is never safe (§3 invariant: any branch error yields `is_safe=false`).
    pub fn is_safe(&self) -> bool {
        matches!(self, Self::Ok { safe: true, .. })
    }

    /// The reason to surface to the caller — the success reason, or the
    /// error's detail when the branch failed (§4.5).
    pub fn reason(&self) -> &str {
        match self {
            Self::Ok { reason, .. } => reason,
            Self::Err { detail, .. } => detail,
        }
    }
}

fn truncate_reason(mut s: String) -> String {
    if s.len() > MAX_REASON_LEN {
        let boundary = s
            .char_indices()
            .map(|(i, c)| i + c.len_utf8())
            .take_while(|&end| end <= MAX_REASON_LEN)
            .last()
            .unwrap_or(0);
        s.truncate(boundary);
    }
    s
}

/// The cached, returned value (§3). Created by C5, stored by C6,
/// read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub video_id: VideoId,
    pub is_safe: bool,
    pub is_safe_transcript: bool,
    pub is_safe_thumbnail: bool,
    pub transcript_reason: String,
    pub thumbnail_reason: String,
    pub overall_reason: String,
    pub video_title: String,
    pub channel_title: String,
}
