//! Cache statistics (§4.6): "for operator visibility, not load-bearing for
//! correctness."

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Rough calibration for the reported time-saved estimate: the approximate
/// wall-clock cost of one upstream build (metadata fetch plus two classifier
/// calls run concurrently). Not measured per-request; a fixed estimate.
const ESTIMATED_BUILD_COST_MS: u64 = 1_500;

#[derive(Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    puts: AtomicU64,
    clears: AtomicU64,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_put(&self) {
        self.puts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_clear(&self) {
        self.clears.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CacheStatsSnapshot {
        let hits = self.hits.load(Ordering::Relaxed);
        CacheStatsSnapshot {
            hits,
            misses: self.misses.load(Ordering::Relaxed),
            puts: self.puts.load(Ordering::Relaxed),
            clears: self.clears.load(Ordering::Relaxed),
            estimated_time_saved_ms: hits * ESTIMATED_BUILD_COST_MS,
            size: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub puts: u64,
    pub clears: u64,
    pub estimated_time_saved_ms: u64,
    pub size: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_saved_scales_with_hits() {
        let stats = CacheStats::new();
        stats.record_hit();
        stats.record_hit();
        let snap = stats.snapshot();
        assert_eq!(snap.hits, 2);
        assert_eq!(snap.estimated_time_saved_ms, 2 * ESTIMATED_BUILD_COST_MS);
    }
}
