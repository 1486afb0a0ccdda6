//! C7 rate-limit gate (§4.7): a global daily budget on new analyses, plus an
//! optional per-client daily budget the server may additionally enforce.

use chrono_tz::Tz;
use tracing::warn;

use happyscroll_core::error::RateLimitError;
use happyscroll_core::window::today_window_key;

use crate::backend::{CounterBackend, IncrementOutcome};

/// Default when `GLOBAL_DAILY_LIMIT` is unset (§6.2).
pub const DEFAULT_GLOBAL_LIMIT: u32 = 150;

/// Default per-client budget (§4.7); edge-enforced by the browser
/// extension, optionally mirrored server-side when a client id is supplied.
pub const DEFAULT_CLIENT_LIMIT: u32 = 8;

/// Outcome of a non-mutating budget check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrecheckOutcome {
    Ok,
    Limited { count: u32, limit: u32 },
}

pub struct RateLimitGate<C: CounterBackend> {
    counter: C,
    global_limit: u32,
    client_limit: u32,
    tz: Tz,
}

impl<C: CounterBackend> RateLimitGate<C> {
    pub fn new(counter: C, global_limit: u32, client_limit: u32, tz: Tz) -> Self {
        Self {
            counter,
            global_limit,
            client_limit,
            tz,
        }
    }

    fn window_key(&self) -> String {
        today_window_key(self.tz)
    }

    fn global_key(&self) -> String {
        format!("global:{}", self.window_key())
    }

    fn client_key(&self, client_id: &str) -> String {
        format!("client:{client_id}:{}", self.window_key())
    }

    /// Read-only budget check (§4.8 step 2). Does not mutate state; a
    /// backend failure fails open (returns `Ok`) since `precheck` is
    /// advisory — `commit` is the authoritative gate on the miss path.
    pub async fn precheck(&self) -> PrecheckOutcome {
        match self.counter.current(&self.global_key()).await {
            Ok(count) if count >= self.global_limit => PrecheckOutcome::Limited {
                count,
                limit: self.global_limit,
            },
            Ok(_) => PrecheckOutcome::Ok,
            Err(e) => {
                warn!(error = %e, "rate-limit precheck failed, proceeding optimistically");
                PrecheckOutcome::Ok
            }
        }
    }

    /// Atomically increment the global counter (§4.8 step 4, only reached
    /// on a cache miss). A backend failure fails open: availability is
    /// preferred over strict enforcement, matching this codebase's cache
    /// failure policy (§9).
    pub async fn commit(&self) -> Result<u32, RateLimitError> {
        match self.counter.increment_if_under(&self.global_key(), self.global_limit).await {
            Ok(IncrementOutcome::Committed(count)) => Ok(count),
            Ok(IncrementOutcome::Exhausted(count)) => Err(RateLimitError::BudgetExhausted {
                limit: self.global_limit,
                count_today: count,
            }),
            Err(e) => {
                warn!(error = %e, "rate-limit commit failed, proceeding without a server-side count");
                Ok(0)
            }
        }
    }

    /// Optional server-side mirror of the per-client budget (§4.7). Callers
    /// skip this entirely when no client identity header was supplied.
    pub async fn commit_for_client(&self, client_id: &str) -> Result<u32, RateLimitError> {
        match self
            .counter
            .increment_if_under(&self.client_key(client_id), self.client_limit)
            .await
        {
            Ok(IncrementOutcome::Committed(count)) => Ok(count),
            Ok(IncrementOutcome::Exhausted(count)) => Err(RateLimitError::BudgetExhausted {
                limit: self.client_limit,
                count_today: count,
            }),
            Err(e) => {
                warn!(error = %e, client_id, "per-client rate-limit commit failed, proceeding without a server-side count");
                Ok(0)
            }
        }
    }
}
