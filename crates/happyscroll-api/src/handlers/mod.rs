//! Request handlers (§6.1).

pub mod cache;
pub mod health;
pub mod verdict;

pub use cache::{get_cache_stats, post_cache_clear};
pub use health::health;
pub use verdict::post_verdict;
