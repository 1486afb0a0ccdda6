//! C2 — metadata client: fetches title, channel, thumbnail, and captions
//! for a canonical video id.

pub mod client;

pub use client::{MetadataClient, MetadataClientConfig};
