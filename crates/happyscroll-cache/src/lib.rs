//! C6 — verdict cache.
//!
//! [`backend::CacheBackend`] abstracts over a pluggable store;
//! [`memory::MemoryBackend`] is the in-process fallback and
//! [`redis_backend::RedisBackend`] the shared store. [`single_flight::VerdictCache`]
//! layers single-flight `get_or_compute` coordination and statistics on top
//! of either.

pub mod backend;
pub mod memory;
pub mod redis_backend;
pub mod single_flight;
pub mod stats;

pub use backend::CacheBackend;
pub use memory::MemoryBackend;
pub use redis_backend::RedisBackend;
pub use single_flight::{VerdictCache, DEFAULT_TTL};
pub use stats::{CacheStats, CacheStatsSnapshot};
