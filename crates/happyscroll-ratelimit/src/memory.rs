//! In-process counter backend: a mutex-guarded map keyed by civil-date
//! window. Default when no shared cache backend is configured (§9 Open
//! Question: each process then has its own counter, so the effective cap
//! in a multi-process deployment is `N_global × num_processes`).

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::backend::{CounterBackend, IncrementOutcome};
use crate::error::CounterBackendError;

#[derive(Default)]
pub struct InMemoryCounterBackend {
    counts: Mutex<HashMap<String, u32>>,
}

impl InMemoryCounterBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterBackend for InMemoryCounterBackend {
    async fn current(&self, key: &str) -> Result<u32, CounterBackendError> {
        Ok(self.counts.lock().await.get(key).copied().unwrap_or(0))
    }

    async fn increment_if_under(&self, key: &str, limit: u32) -> Result<IncrementOutcome, CounterBackendError> {
        let mut counts = self.counts.lock().await;
        let entry = counts.entry(key.to_string()).or_insert(0);
        if *entry >= limit {
            return Ok(IncrementOutcome::Exhausted(*entry));
        }
        *entry += 1;
        Ok(IncrementOutcome::Committed(*entry))
    }
}
