//! Shared Redis-backed cache (§4.6).
//!
//! Single-flight is enforced per-process only (§4.6 "Backend variants"):
//! two processes racing to build the same key will both build and both
//! write; the later write wins and the result is still correct because
//! builds are idempotent modulo classifier nondeterminism. No distributed
//! lock is taken here — that would buy strict cross-process single-flight
//! the spec explicitly says this backend does not need.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;

use happyscroll_core::error::CacheBackendError;
use happyscroll_core::identity::VideoId;
use happyscroll_core::model::Verdict;

use crate::backend::CacheBackend;

const DATA_PREFIX: &str = "verdict:";

pub struct RedisBackend {
    client: redis::Client,
}

impl RedisBackend {
    /// Open a connection and verify reachability with a `PING`. Callers
    /// should fall back to [`crate::memory::MemoryBackend`] if this fails.
    pub async fn connect(url: &str) -> Result<Self, CacheBackendError> {
        let client = redis::Client::open(url).map_err(to_backend_error)?;
        let mut conn = client.get_multiplexed_async_connection().await.map_err(to_backend_error)?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await.map_err(to_backend_error)?;
        Ok(Self { client })
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, CacheBackendError> {
        self.client.get_multiplexed_async_connection().await.map_err(to_backend_error)
    }

    fn data_key(key: &VideoId) -> String {
        format!("{DATA_PREFIX}{key}")
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    async fn get(&self, key: &VideoId) -> Result<Option<Verdict>, CacheBackendError> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn.get(Self::data_key(key)).await.map_err(to_backend_error)?;
        match raw {
            Some(s) => serde_json::from_str(&s)
                .map(Some)
                .map_err(|e| CacheBackendError(format!("corrupt cache entry: {e}"))),
            None => Ok(None),
        }
    }

    async fn put(&self, key: &VideoId, verdict: &Verdict, ttl: Duration) -> Result<(), CacheBackendError> {
        let mut conn = self.connection().await?;
        let payload = serde_json::to_string(verdict).map_err(|e| CacheBackendError(e.to_string()))?;
        let _: () = conn
            .set_ex(Self::data_key(key), payload, ttl.as_secs().max(1))
            .await
            .map_err(to_backend_error)?;
        Ok(())
    }

    async fn remove(&self, key: &VideoId) -> Result<(), CacheBackendError> {
        let mut conn = self.connection().await?;
        let _: i64 = conn.del(Self::data_key(key)).await.map_err(to_backend_error)?;
        Ok(())
    }

    async fn clear(&self) -> Result<usize, CacheBackendError> {
        let mut conn = self.connection().await?;
        let keys: Vec<String> = conn.keys(format!("{DATA_PREFIX}*")).await.map_err(to_backend_error)?;
        if keys.is_empty() {
            return Ok(0);
        }
        let mut pipe = redis::pipe();
        for k in &keys {
            pipe.del(k.as_str());
        }
        let _: Vec<i64> = pipe.query_async(&mut conn).await.map_err(to_backend_error)?;
        Ok(keys.len())
    }
}

fn to_backend_error(e: redis::RedisError) -> CacheBackendError {
    CacheBackendError(e.to_string())
}
