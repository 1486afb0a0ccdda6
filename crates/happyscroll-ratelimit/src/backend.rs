//! Pluggable atomic counter store (§4.7).

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::CounterBackendError;

/// Outcome of an atomic check-and-increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncrementOutcome {
    /// The counter was below `limit` and has been incremented; carries the
    /// post-increment count.
    Committed(u32),
    /// The counter was already at or above `limit`; left unchanged.
    Exhausted(u32),
}

/// A store supporting atomic check-and-increment over string-keyed civil-date
/// windows (§4.7 "the counter store must support atomic check-and-increment").
#[async_trait]
pub trait CounterBackend: Send + Sync {
    /// Current value for `key` (0 if absent). Used by `precheck`, which is
    /// advisory and does not mutate state.
    async fn current(&self, key: &str) -> Result<u32, CounterBackendError>;

    /// Atomically increment `key` iff its current value is `< limit`.
    async fn increment_if_under(&self, key: &str, limit: u32) -> Result<IncrementOutcome, CounterBackendError>;
}

/// Lets callers instantiate [`crate::gate::RateLimitGate`] over a
/// type-erased backend chosen at startup (in-process vs. Redis), the same
/// way `happyscroll-cache`'s `VerdictCache` is built over `Arc<dyn
/// CacheBackend>` rather than a generic parameter.
#[async_trait]
impl CounterBackend for Arc<dyn CounterBackend> {
    async fn current(&self, key: &str) -> Result<u32, CounterBackendError> {
        (**self).current(key).await
    }

    async fn increment_if_under(&self, key: &str, limit: u32) -> Result<IncrementOutcome, CounterBackendError> {
        (**self).increment_if_under(key, limit).await
    }
}
