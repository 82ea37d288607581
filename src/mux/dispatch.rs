// src/mux/dispatch.rs
// =============================================================================
// The fan-out dispatcher: runs one worker per URL of a validated batch.
//
// For each URL, in batch order:
// 1. Wait for an outbound slot (at most `outbound` fetches in flight)
// 2. Spawn a worker that owns the slot until it finishes
//
// Then wait for every spawned worker through the JoinSet. The join does not
// depend on the limiter's count, so batches larger or smaller than the
// limit finish the same way.
//
// If the batch is cancelled while waiting for a slot, the remaining URLs
// are never dispatched.
//
// Rust concepts:
// - JoinSet: owns spawned tasks, aborts them if dropped
// - tokio::select!: waits on whichever future finishes first
// =============================================================================

use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::aggregate::{self, BatchOutcome};
use super::sink::ErrorSink;
use super::slots::ResultSlots;
use super::worker::{self, BatchContext, WorkerOutcome};
use crate::batch::Batch;
use crate::fetch::Fetcher;
use crate::limiter::CountingLimiter;

/// Fetches every URL of `batch` and aggregates the results.
pub(crate) async fn dispatch(
    batch: Batch,
    fetcher: Arc<dyn Fetcher>,
    outbound: &CountingLimiter,
    token: CancellationToken,
) -> BatchOutcome {
    let entries = batch.into_entries();
    let total = entries.len();
    let ctx = BatchContext {
        fetcher,
        token: token.clone(),
        sink: Arc::new(ErrorSink::new()),
        slots: Arc::new(ResultSlots::new(total)),
    };

    let mut workers = JoinSet::new();

    for (index, entry) in entries.iter().enumerate() {
        let permit = tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!(dispatched = index, total, "batch cancelled during dispatch");
                break;
            }
            permit = outbound.acquire() => permit,
        };

        workers.spawn(worker::run(index, entry.clone(), ctx.clone(), permit));
    }

    let (mut filled, mut surfaced, mut swallowed) = (0, 0, 0);
    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok(WorkerOutcome::Filled) => filled += 1,
            Ok(WorkerOutcome::Failed { surfaced: true }) => surfaced += 1,
            Ok(WorkerOutcome::Failed { surfaced: false }) => swallowed += 1,
            Err(join_err) => {
                // A panicked worker leaves its slot empty; stop the siblings
                warn!(error = %join_err, "fetch worker did not finish");
                token.cancel();
            }
        }
    }

    // At most one worker error wins the sink; the rest are only logged
    debug_assert!(surfaced <= 1);
    debug!(filled, surfaced, swallowed, total, "batch joined");

    let BatchContext { sink, slots, .. } = ctx;
    aggregate::aggregate(&entries, &sink, slots, token.is_cancelled())
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why acquire the permit here and not inside the worker?
//    - The loop itself waits, so URL i+1 is not even spawned until a slot
//      frees up
//    - At most `outbound` tasks exist per batch, not just `outbound` fetches
//
// 2. What does `biased;` do in select!?
//    - Branches are polled top to bottom instead of in random order
//    - A cancelled batch stops dispatching even if a permit is free
//
// 3. Why a JoinSet instead of counting permits?
//    - join_next() returns None once every spawned task has finished
//    - Dropping the JoinSet aborts whatever is still running, so a dropped
//      request leaves no orphaned fetches behind
// -----------------------------------------------------------------------------
