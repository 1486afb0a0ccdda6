//! Pluggable storage backend for the verdict cache (§4.6).

use std::time::Duration;

use async_trait::async_trait;

use happyscroll_core::error::CacheBackendError;
use happyscroll_core::identity::VideoId;
use happyscroll_core::model::Verdict;

/// A key/value store capable of holding TTL'd [`Verdict`] entries.
///
/// Implementations never need to worry about single-flight coordination —
/// that lives one layer up, in [`crate::single_flight::VerdictCache`]. A
/// backend only needs to honor TTL and answer get/put/remove/clear/size.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &VideoId) -> Result<Option<Verdict>, CacheBackendError>;

    async fn put(&self, key: &VideoId, verdict: &Verdict, ttl: Duration) -> Result<(), CacheBackendError>;

    async fn remove(&self, key: &VideoId) -> Result<(), CacheBackendError>;

    /// Remove every entry. Returns the number removed.
    async fn clear(&self) -> Result<usize, CacheBackendError>;

    /// Best-effort entry count, for `stats()`. Backends for which this is
    /// expensive or unsupported may return `None`.
    async fn approx_size(&self) -> Result<Option<usize>, CacheBackendError> {
        Ok(None)
    }
}

/// Lets [`crate::single_flight::VerdictCache::new`] accept an
/// already-type-erased backend the same way it accepts a concrete one — the
/// backend chosen at startup (in-process vs. Redis) is selected behind an
/// `Arc<dyn CacheBackend>` in `happyscroll-api`'s application state.
#[async_trait]
impl CacheBackend for std::sync::Arc<dyn CacheBackend> {
    async fn get(&self, key: &VideoId) -> Result<Option<Verdict>, CacheBackendError> {
        (**self).get(key).await
    }

    async fn put(&self, key: &VideoId, verdict: &Verdict, ttl: Duration) -> Result<(), CacheBackendError> {
        (**self).put(key, verdict, ttl).await
    }

    async fn remove(&self, key: &VideoId) -> Result<(), CacheBackendError> {
        (**self).remove(key).await
    }

    async fn clear(&self) -> Result<usize, CacheBackendError> {
        (**self).clear().await
    }

    async fn approx_size(&self) -> Result<Option<usize>, CacheBackendError> {
        (**self).approx_size().await
    }
}
