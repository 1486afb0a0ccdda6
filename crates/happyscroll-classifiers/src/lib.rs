//! C3/C4 — upstream classifier clients.
//!
//! [`thumbnail`] submits the canonical thumbnail to an image SafeSearch-style
//! classifier; [`transcript`] submits caption text to a text policy
//! classifier. Both return a [`happyscroll_core::model::BranchResult`]
//! directly — classifier failures never propagate as request errors.

pub mod thumbnail;
pub mod transcript;

pub use thumbnail::{Category, Likelihood, ThumbnailAnalyzer, ThumbnailAnalyzerConfig};
pub use transcript::{TranscriptAnalyzer, TranscriptAnalyzerConfig};
