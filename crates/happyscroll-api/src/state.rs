//! Application state (§4.6, §4.7, §9): the cache and rate-limit gate are
//! the only shared mutable state in the process, each mediated entirely
//! through its own component API. Everything else held here is read-only
//! configuration or a stateless upstream client.

use std::sync::Arc;

use tracing::{info, warn};

use happyscroll_cache::{CacheBackend, MemoryBackend, RedisBackend, VerdictCache};
use happyscroll_classifiers::{ThumbnailAnalyzer, ThumbnailAnalyzerConfig, TranscriptAnalyzer, TranscriptAnalyzerConfig};
use happyscroll_metadata::{MetadataClient, MetadataClientConfig};
use happyscroll_ratelimit::{CounterBackend, InMemoryCounterBackend, RateLimitGate, RedisCounterBackend};

use crate::config::AppConfig;

pub type Gate = RateLimitGate<Arc<dyn CounterBackend>>;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub cache: Arc<VerdictCache>,
    pub rate_gate: Arc<Gate>,
    pub metadata: Arc<MetadataClient>,
    pub thumbnail: Arc<ThumbnailAnalyzer>,
    pub transcript: Arc<TranscriptAnalyzer>,
}

impl AppState {
    /// Build application state, selecting the cache/counter backend per
    /// §4.6: a configured shared backend is used if reachable at startup,
    /// otherwise the in-process fallback is used. A reachability failure
    /// here is not fatal — it only changes which backend serves the
    /// process, matching "under no circumstance does a cache failure fail
    /// the overall request."
    pub async fn new(config: AppConfig) -> Self {
        let (cache_backend, counter_backend): (Arc<dyn CacheBackend>, Arc<dyn CounterBackend>) =
            match &config.cache_backend_url {
                Some(url) => match RedisBackend::connect(url).await {
                    Ok(backend) => {
                        info!("connected to shared Redis cache backend");
                        let counters = match RedisCounterBackend::connect(url).await {
                            Ok(c) => {
                                info!("rate-limit counters backed by shared Redis store (strict multi-process cap)");
                                Arc::new(c) as Arc<dyn CounterBackend>
                            }
                            Err(e) => {
                                warn!(error = %e, "redis counter backend unreachable, falling back to in-process counters");
                                Arc::new(InMemoryCounterBackend::new()) as Arc<dyn CounterBackend>
                            }
                        };
                        (Arc::new(backend) as Arc<dyn CacheBackend>, counters)
                    }
                    Err(e) => {
                        warn!(error = %e, "shared cache backend unreachable at startup, falling back to in-process cache");
                        (
                            Arc::new(MemoryBackend::new()) as Arc<dyn CacheBackend>,
                            Arc::new(InMemoryCounterBackend::new()) as Arc<dyn CounterBackend>,
                        )
                    }
                },
                None => {
                    info!("no CACHE_BACKEND_URL configured, using in-process cache and rate counters");
                    (
                        Arc::new(MemoryBackend::new()) as Arc<dyn CacheBackend>,
                        Arc::new(InMemoryCounterBackend::new()) as Arc<dyn CounterBackend>,
                    )
                }
            };

        let cache = Arc::new(VerdictCache::new(cache_backend, config.cache_ttl));
        let rate_gate = Arc::new(RateLimitGate::new(
            counter_backend,
            config.global_daily_limit,
            config.client_daily_limit,
            config.window_tz,
        ));

        let metadata = Arc::new(
            MetadataClient::from_env().unwrap_or_else(|e| {
                warn!(error = %e, "metadata client credentials not fully configured at startup");
                MetadataClient::new(MetadataClientConfig {
                    api_key: String::new(),
                    base_url: "https://www.googleapis.com/youtube/v3".to_string(),
                })
            }),
        );
        let thumbnail = Arc::new(ThumbnailAnalyzer::new(ThumbnailAnalyzerConfig {
            threshold: config.image_safety_threshold,
            ..ThumbnailAnalyzerConfig::from_env()
        }));
        let transcript = Arc::new(TranscriptAnalyzer::new(TranscriptAnalyzerConfig::from_env()));

        Self {
            config: Arc::new(config),
            cache,
            rate_gate,
            metadata,
            thumbnail,
            transcript,
        }
    }
}
