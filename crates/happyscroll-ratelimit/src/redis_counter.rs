//! Shared Redis-backed counter (§4.7, §9): lets a multi-process deployment
//! get a strict global cap once a shared backend is configured, by backing
//! the counter with the same store used for the cache.
//!
//! Generalizes this codebase's `current_month_key()` / optimistic-retry
//! idiom from a naive-UTC monthly document precondition to a civil-date
//! window guarded by a single atomic Lua script, rather than a
//! read-then-conditionally-write retry loop — the store itself
//! (Redis, vs. a document database) makes the atomic version both simpler
//! and race-free.

use async_trait::async_trait;

use crate::backend::{CounterBackend, IncrementOutcome};
use crate::error::CounterBackendError;

/// End-of-window expiry margin so a key outlives its nominal day by enough
/// to absorb clock skew between processes, without lingering indefinitely.
const KEY_TTL_SECONDS: u64 = 2 * 24 * 60 * 60;

const CHECK_AND_INCREMENT_SCRIPT: &str = r#"
local current = tonumber(redis.call("GET", KEYS[1]) or "0")
local limit = tonumber(ARGV[1])
if current >= limit then
    return {0, current}
end
local updated = redis.call("INCR", KEYS[1])
if updated == 1 then
    redis.call("EXPIRE", KEYS[1], ARGV[2])
end
return {1, updated}
"#;

pub struct RedisCounterBackend {
    client: redis::Client,
}

impl RedisCounterBackend {
    pub async fn connect(url: &str) -> Result<Self, CounterBackendError> {
        let client = redis::Client::open(url).map_err(to_backend_error)?;
        let mut conn = client.get_multiplexed_async_connection().await.map_err(to_backend_error)?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await.map_err(to_backend_error)?;
        Ok(Self { client })
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, CounterBackendError> {
        self.client.get_multiplexed_async_connection().await.map_err(to_backend_error)
    }

    fn namespaced(key: &str) -> String {
        format!("ratelimit:{key}")
    }
}

#[async_trait]
impl CounterBackend for RedisCounterBackend {
    async fn current(&self, key: &str) -> Result<u32, CounterBackendError> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = redis::cmd("GET")
            .arg(Self::namespaced(key))
            .query_async(&mut conn)
            .await
            .map_err(to_backend_error)?;
        Ok(raw.and_then(|s| s.parse().ok()).unwrap_or(0))
    }

    async fn increment_if_under(&self, key: &str, limit: u32) -> Result<IncrementOutcome, CounterBackendError> {
        let mut conn = self.connection().await?;
        let script = redis::Script::new(CHECK_AND_INCREMENT_SCRIPT);
        let (committed, count): (i64, i64) = script
            .key(Self::namespaced(key))
            .arg(limit)
            .arg(KEY_TTL_SECONDS)
            .invoke_async(&mut conn)
            .await
            .map_err(to_backend_error)?;

        let count = count.max(0) as u32;
        Ok(if committed == 1 {
            IncrementOutcome::Committed(count)
        } else {
            IncrementOutcome::Exhausted(count)
        })
    }
}

fn to_backend_error(e: redis::RedisError) -> CounterBackendError {
    CounterBackendError(e.to_string())
}
