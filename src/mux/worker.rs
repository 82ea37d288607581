// src/mux/worker.rs
// =============================================================================
// A fetch worker: fetches one URL of a batch and records the outcome.
//
// For URL `i`:
// - batch already cancelled   -> report Cancelled
// - fetch fails or is cancelled -> report the error, cancel the batch
// - fetch succeeds             -> write the body into slot `i`
//
// The fetch is raced against the batch token, so a sibling's failure drops
// the outstanding request instead of waiting for it.
//
// The worker holds its outbound permit until it returns, whatever the
// outcome. Errors name the URL exactly as the client sent it.
//
// Rust concepts:
// - Arc: every worker of a batch shares the same sink and slots
// - Moving the Permit into the function ties the slot to the worker's life
// =============================================================================

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::sink::ErrorSink;
use super::slots::ResultSlots;
use crate::batch::BatchEntry;
use crate::fetch::{FetchError, Fetcher};
use crate::limiter::Permit;

/// Everything the workers of one batch share.
#[derive(Clone)]
pub(crate) struct BatchContext {
    pub fetcher: Arc<dyn Fetcher>,
    pub token: CancellationToken,
    pub sink: Arc<ErrorSink>,
    pub slots: Arc<ResultSlots>,
}

/// How one worker finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WorkerOutcome {
    /// The body is in the worker's slot.
    Filled,
    /// The worker failed. `surfaced` is true if its error won the sink.
    Failed { surfaced: bool },
}

pub(crate) async fn run(
    index: usize,
    entry: BatchEntry,
    ctx: BatchContext,
    permit: Permit,
) -> WorkerOutcome {
    let _permit = permit;
    let BatchEntry { raw, url } = entry;

    if ctx.token.is_cancelled() {
        return fail(&ctx, FetchError::cancelled(&raw));
    }

    let result = tokio::select! {
        biased;
        _ = ctx.token.cancelled() => Err(FetchError::cancelled(&raw)),
        result = ctx.fetcher.fetch(&url) => result.map_err(|e| e.with_url(&raw)),
    };

    match result {
        Ok(body) => {
            debug!(index, %url, bytes = body.len(), "fetched");
            ctx.slots.fill(index, body);
            WorkerOutcome::Filled
        }
        Err(error) => fail(&ctx, error),
    }
}

// Report before cancelling, so the real cause beats the Cancelled errors
// it triggers in siblings
fn fail(ctx: &BatchContext, error: FetchError) -> WorkerOutcome {
    let surfaced = ctx.sink.report(error.clone());
    if surfaced {
        warn!(url = error.url(), %error, "fetch failed, cancelling batch");
    } else {
        debug!(url = error.url(), %error, "fetch failed after batch error was recorded");
    }
    ctx.token.cancel();
    WorkerOutcome::Failed { surfaced }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why is `_permit` never used?
//    - Binding it keeps it alive until the function returns
//    - When it drops, the outbound slot goes back to the limiter
//    - A plain `_` binding would drop it immediately
//
// 2. What happens to the fetch future when the token wins the select?
//    - It is dropped, and dropping a reqwest future aborts the request
//    - This is why Fetcher implementations must be cancel-safe
// -----------------------------------------------------------------------------
