//! C8 — Verdict orchestrator (§4.8): the single public operation,
//! `get_verdict`, that ties C1/C6/C7 gating together with the C2→(C3‖C4)→C5
//! build pipeline.

use tracing::{info, warn};

use happyscroll_core::combiner::combine;
use happyscroll_core::error::RateLimitError;
use happyscroll_core::identity::{extract_video_id, VideoId};
use happyscroll_core::model::{BranchResult, Verdict};
use happyscroll_ratelimit::PrecheckOutcome;

use crate::error::VerdictError;
use crate::metrics::record_rate_limit_rejection;
use crate::security::validate_outbound_url;
use crate::state::AppState;

/// `get_verdict(input_url) -> Verdict` (§4.8).
///
/// Ordering follows §4.8/§9 exactly, with one simplification: rather than
/// performing two separate cache lookups (one to decide whether a budget
/// rejection should be short-circuited, one to serve an actual hit — §4.8
/// steps 2 and 3), a single `cache.get` stands in for both. A cache hit
/// always wins regardless of the precheck outcome (a cached verdict is
/// never denied for budget reasons, §4.7); a cache miss falls through to
/// the precheck's verdict. This collapses two cache reads that would
/// otherwise double-count `stats()` hits/misses for the same request
/// without changing any externally observable ordering guarantee.
pub async fn get_verdict(state: &AppState, input_url: &str, client_id: Option<&str>) -> Result<Verdict, VerdictError> {
    let video_id = extract_video_id(input_url)?;

    let precheck = state.rate_gate.precheck().await;

    if let Some(cached) = state.cache.get(&video_id).await {
        return Ok(cached);
    }

    if let PrecheckOutcome::Limited { count, limit } = precheck {
        record_rate_limit_rejection("global_precheck");
        return Err(VerdictError::RateLimit(RateLimitError::BudgetExhausted {
            limit,
            count_today: count,
        }));
    }

    if let Some(id) = client_id {
        if let Err(e) = state.rate_gate.commit_for_client(id).await {
            record_rate_limit_rejection("per_client");
            return Err(VerdictError::RateLimit(e));
        }
    }
    if let Err(e) = state.rate_gate.commit().await {
        record_rate_limit_rejection("global_commit");
        return Err(e.into());
    }

    let verdict = state
        .cache
        .get_or_compute(&video_id, || build(state, &video_id))
        .await?;

    Ok(verdict)
}

/// The single-flight build closure (§4.8 step 5): C2, then fan out to
/// C3‖C4, then C5. No branch is cancelled on the other's failure (§5).
async fn build(state: &AppState, video_id: &VideoId) -> Result<Verdict, VerdictError> {
    let meta = state.metadata.fetch(video_id).await.map_err(|e| {
        warn!(video_id = %video_id, error = %e, "metadata fetch failed, aborting build");
        VerdictError::Metadata(e)
    })?;

    // An outbound-safety rejection is a thumbnail-branch-local failure
    // (§4.5, §5): it must not cancel the transcript branch or fail the
    // whole request, so it is folded into that branch's `BranchResult`
    // rather than propagated as a `VerdictError`.
    let thumbnail_branch = async {
        if let Err(reason) = validate_outbound_url(&meta.thumbnail_url) {
            warn!(video_id = %video_id, reason, "thumbnail URL failed outbound safety check");
            return BranchResult::err(
                "ImageFetchFailed",
                format!("thumbnail URL rejected by outbound safety check: {reason}"),
            );
        }
        state.thumbnail.analyze(&meta.thumbnail_url).await
    };

    let (transcript_result, thumbnail_result) = tokio::join!(
        state.transcript.analyze(&meta.caption_text, &meta.title, &meta.channel),
        thumbnail_branch,
    );

    let verdict = combine(transcript_result, thumbnail_result, &meta);
    info!(
        video_id = %video_id,
        is_safe = verdict.is_safe,
        "built new verdict"
    );
    Ok(verdict)
}
