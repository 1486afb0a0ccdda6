//! Single-flight verdict cache (§4.6, §5, §9): `get_or_compute` ensures at
//! most one build runs per key at a time; concurrent callers wait and share
//! the builder's result rather than each invoking `build` themselves.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Notify};
use tracing::warn;

use happyscroll_core::identity::VideoId;
use happyscroll_core::model::Verdict;

use crate::backend::CacheBackend;
use crate::stats::{CacheStats, CacheStatsSnapshot};

/// Default TTL when none is configured (§6.2 `CACHE_TTL_DAYS`, default 7).
pub const DEFAULT_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

pub struct VerdictCache {
    backend: Arc<dyn CacheBackend>,
    ttl: Duration,
    inflight: Mutex<HashMap<VideoId, Arc<Notify>>>,
    stats: CacheStats,
}

impl VerdictCache {
    pub fn new<B: CacheBackend + 'static>(backend: B, ttl: Duration) -> Self {
        Self {
            backend: Arc::new(backend),
            ttl,
            inflight: Mutex::new(HashMap::new()),
            stats: CacheStats::new(),
        }
    }

    /// Non-expired entry, if any. Backend errors are logged and treated as a
    /// miss (§4.6, §9: cache failures never fail the request).
    pub async fn get(&self, key: &VideoId) -> Option<Verdict> {
        match self.backend.get(key).await {
            Ok(Some(v)) => {
                self.stats.record_hit();
                Some(v)
            }
            Ok(None) => {
                self.stats.record_miss();
                None
            }
            Err(e) => {
                warn!(error = %e, video_id = %key, "cache get failed, treating as miss");
                self.stats.record_miss();
                None
            }
        }
    }

    pub async fn put(&self, key: &VideoId, verdict: &Verdict) {
        match self.backend.put(key, verdict, self.ttl).await {
            Ok(()) => self.stats.record_put(),
            Err(e) => warn!(error = %e, video_id = %key, "cache put failed, proceeding as if it succeeded"),
        }
    }

    pub async fn invalidate(&self, key: &VideoId) {
        if let Err(e) = self.backend.remove(key).await {
            warn!(error = %e, video_id = %key, "cache invalidate failed");
        }
    }

    pub async fn clear(&self) -> usize {
        match self.backend.clear().await {
            Ok(n) => {
                self.stats.record_clear();
                n
            }
            Err(e) => {
                warn!(error = %e, "cache clear failed");
                0
            }
        }
    }

    pub async fn stats(&self) -> CacheStatsSnapshot {
        let mut snapshot = self.stats.snapshot();
        if let Ok(size) = self.backend.approx_size().await {
            snapshot.size = size;
        }
        snapshot
    }

    /// Single-flight get-or-build (§4.6, §8 "Single-flight" testable
    /// property). At most one `build` future is driven to completion per
    /// key at a time; other concurrent callers await its result instead of
    /// invoking `build` themselves.
    ///
    /// A builder's failure is not cached — the key is released on either
    /// outcome so the next caller becomes the new builder.
    pub async fn get_or_compute<F, Fut, E>(&self, key: &VideoId, build: F) -> Result<Verdict, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Verdict, E>>,
    {
        loop {
            if let Some(v) = self.get(key).await {
                return Ok(v);
            }

            let mut inflight = self.inflight.lock().await;
            if let Some(existing) = inflight.get(key) {
                // Create the `Notified` future while still holding the map
                // lock, so it cannot miss a `notify_waiters()` call racing
                // against us: the builder must take this same lock to
                // remove its entry before notifying, which can only happen
                // strictly before or after this critical section, never
                // during it.
                let notify = Arc::clone(existing);
                let notified = notify.notified();
                drop(inflight);
                notified.await;
                continue;
            }

            let notify = Arc::new(Notify::new());
            inflight.insert(key.clone(), Arc::clone(&notify));
            drop(inflight);

            let result = build().await;

            {
                let mut inflight = self.inflight.lock().await;
                inflight.remove(key);
            }
            notify.notify_waiters();

            return match result {
                Ok(verdict) => {
                    self.put(key, &verdict).await;
                    Ok(verdict)
                }
                Err(e) => Err(e),
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc as StdArc;

    use happyscroll_core::identity::extract_video_id;

    use super::*;
    use crate::memory::MemoryBackend;

    fn video_id() -> VideoId {
        extract_video_id("https://youtu.be/dQw4w9WgXcQ").unwrap()
    }

    fn verdict(id: &VideoId) -> Verdict {
        Verdict {
            video_id: id.clone(),
            is_safe: true,
            is_safe_transcript: true,
            is_safe_thumbnail: true,
            transcript_reason: "ok".to_string(),
            thumbnail_reason: "ok".to_string(),
            overall_reason: "ok".to_string(),
            video_title: "t".to_string(),
            channel_title: "c".to_string(),
        }
    }

    #[tokio::test]
    async fn builds_once_for_concurrent_callers() {
        let cache = StdArc::new(VerdictCache::new(MemoryBackend::new(), Duration::from_secs(60)));
        let id = video_id();
        let build_count = StdArc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let cache = StdArc::clone(&cache);
            let id = id.clone();
            let build_count = StdArc::clone(&build_count);
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_compute(&id, || async {
                        build_count.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Ok::<_, String>(verdict(&id))
                    })
                    .await
            }));
        }

        let results: Vec<_> = futures_join_all(handles).await;
        for r in &results {
            assert!(r.as_ref().unwrap().is_ok());
        }
        assert_eq!(build_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_build_is_not_cached_and_next_caller_rebuilds() {
        let cache = VerdictCache::new(MemoryBackend::new(), Duration::from_secs(60));
        let id = video_id();

        let first = cache
            .get_or_compute(&id, || async { Err::<Verdict, _>("boom".to_string()) })
            .await;
        assert!(first.is_err());

        let second = cache.get_or_compute(&id, || async { Ok(verdict(&id)) }).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn hit_does_not_invoke_build() {
        let cache = VerdictCache::new(MemoryBackend::new(), Duration::from_secs(60));
        let id = video_id();
        cache.put(&id, &verdict(&id)).await;

        let result = cache
            .get_or_compute(&id, || async { panic!("build should not run on a cache hit") })
            .await;
        assert!(result.is_ok());
    }

    // Minimal stand-in for `futures::future::join_all` to avoid adding the
    // `futures` crate for a single test helper.
    async fn futures_join_all<T>(handles: Vec<tokio::task::JoinHandle<T>>) -> Vec<Result<T, tokio::task::JoinError>> {
        let mut out = Vec::with_capacity(handles.len());
        for h in handles {
            out.push(h.await);
        }
        out
    }
}
