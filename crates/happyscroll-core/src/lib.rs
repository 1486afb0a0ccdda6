//! Shared data model, identity extraction, and verdict combination for the
//! happyScroll verdict core.
//!
//! - [`identity`] — C1, parses a user URL into a canonical [`VideoId`].
//! - [`model`] — the [`VideoMetadata`], [`BranchResult`], and [`Verdict`] types (§3).
//! - [`combiner`] — C5, merges two branch results plus metadata into a [`Verdict`].
//! - [`window`] — civil-date window keys shared by the rate-limit gate.
//! - [`error`] — the per-component error taxonomy (§7).

pub mod combiner;
pub mod error;
pub mod identity;
pub mod model;
pub mod window;

pub use combiner::combine;
pub use error::{CacheBackendError, ClassifierError, IdentityError, MetadataError, RateLimitError};
pub use identity::{extract_video_id, VideoId};
pub use model::{BranchResult, CaptionSource, Verdict, VideoMetadata, MAX_REASON_LEN};
pub use window::{today_window_key, window_key_for, DEFAULT_WINDOW_TZ};
