//! Counter backend failures (§4.7). Distinct from
//! [`happyscroll_core::error::RateLimitError`], which signals a budget
//! decision rather than a storage failure.

use thiserror::Error;

#[derive(Debug, Error)]
#[error("rate-limit counter backend error: {0}")]
pub struct CounterBackendError(pub String);
