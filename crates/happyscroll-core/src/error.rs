//! Error taxonomy shared by every component in the verdict pipeline.
//!
//! Each component owns a narrow error enum; `happyscroll-api`'s `VerdictError`
//! is the only place these get converted into an HTTP response (see §7 / §10.2
//! of the design: branch-local errors from C3/C4 never reach that boundary,
//! they are captured into `BranchResult::Err` instead).

use thiserror::Error;

/// C1 identity extraction failures. Pure, no I/O.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("URL does not reference a supported video platform host")]
    InvalidUrl,
    #[error("host recognized but no valid video id could be extracted")]
    UnextractableId,
}

/// C2 metadata client failures. A failure here aborts the whole request:
/// neither downstream branch can run without metadata.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("video not found")]
    VideoNotFound,
    #[error("metadata unavailable: {0}")]
    MetadataUnavailable(String),
    #[error("upstream metadata service unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("permission denied by upstream metadata service")]
    PermissionDenied,
}

/// C3/C4 classifier failures. Always captured into a `BranchResult::Err`,
/// never propagated as a request failure.
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("failed to fetch thumbnail image: {0}")]
    ImageFetchFailed(String),
    #[error("image classifier unavailable: {0}")]
    ClassifierUnavailable(String),
    #[error("image classifier rejected the request: {0}")]
    ClassifierRejected(String),
    #[error("classifier response contained no recognizable verdict")]
    ClassifierUnparseable,
}

/// C7 rate-limit gate failures.
#[derive(Debug, Clone, Error)]
pub enum RateLimitError {
    #[error("daily analysis budget exhausted ({count_today}/{limit})")]
    BudgetExhausted { limit: u32, count_today: u32 },
}

/// C6 cache backend failures. Per §4.6/§7 these are always non-fatal: the
/// caller treats them as a miss (on `get`) or as a best-effort write (on
/// `put`) and logs, never fails the request.
#[derive(Debug, Error)]
#[error("cache backend error: {0}")]
pub struct CacheBackendError(pub String);
