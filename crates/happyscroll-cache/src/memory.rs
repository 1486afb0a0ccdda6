//! In-process fallback backend (§4.6): a mutex-guarded map with explicit
//! per-entry expiry, used when no shared backend is configured or reachable.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

use happyscroll_core::error::CacheBackendError;
use happyscroll_core::identity::VideoId;
use happyscroll_core::model::Verdict;

use crate::backend::CacheBackend;

struct Entry {
    verdict: Verdict,
    expires_at: Instant,
}

#[derive(Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<VideoId, Entry>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn get(&self, key: &VideoId) -> Result<Option<Verdict>, CacheBackendError> {
        let mut entries = self.entries.lock().await;
        let expired = matches!(entries.get(key), Some(e) if e.expires_at <= Instant::now());
        if expired {
            entries.remove(key);
            return Ok(None);
        }
        Ok(entries.get(key).map(|e| e.verdict.clone()))
    }

    async fn put(&self, key: &VideoId, verdict: &Verdict, ttl: Duration) -> Result<(), CacheBackendError> {
        let mut entries = self.entries.lock().await;
        entries.insert(
            key.clone(),
            Entry {
                verdict: verdict.clone(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn remove(&self, key: &VideoId) -> Result<(), CacheBackendError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<usize, CacheBackendError> {
        let mut entries = self.entries.lock().await;
        let n = entries.len();
        entries.clear();
        Ok(n)
    }

    async fn approx_size(&self) -> Result<Option<usize>, CacheBackendError> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        entries.retain(|_, e| e.expires_at > now);
        Ok(Some(entries.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use happyscroll_core::identity::extract_video_id;

    fn verdict() -> Verdict {
        Verdict {
            video_id: extract_video_id("https://youtu.be/dQw4w9WgXcQ").unwrap(),
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
    async fn put_then_get_roundtrips() {
        let backend = MemoryBackend::new();
        let v = verdict();
        backend.put(&v.video_id, &v, Duration::from_secs(60)).await.unwrap();
        let got = backend.get(&v.video_id).await.unwrap();
        assert_eq!(got.unwrap().video_id, v.video_id);
    }

    #[tokio::test]
    async fn expired_entry_is_not_returned() {
        let backend = MemoryBackend::new();
        let v = verdict();
        backend.put(&v.video_id, &v, Duration::from_millis(1)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(backend.get(&v.video_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn clear_reports_count_and_empties() {
        let backend = MemoryBackend::new();
        let v = verdict();
        backend.put(&v.video_id, &v, Duration::from_secs(60)).await.unwrap();
        assert_eq!(backend.clear().await.unwrap(), 1);
        assert!(backend.get(&v.video_id).await.unwrap().is_none());
    }
}
