// src/mux/mod.rs
// =============================================================================
// The multiplexer: validates a batch, fans it out, and fans the results
// back in.
//
// Submodules:
// - dispatch: spawns one worker per URL under the outbound limiter
// - worker: fetches a single URL
// - aggregate: turns the joined batch into one outcome
// - sink: first-writer-wins error store
// - slots: per-index result storage
//
// `Multiplexer::handle` is the whole per-batch flow:
//
//   inbound gate -> validate -> dispatch -> aggregate -> release gate
//
// `Multiplexer::drain` is the shutdown half: refuse new batches, wait for
// the running ones, and cancel them if they outlast the grace period.
//
// Rust concepts:
// - CancellationToken::child_token: one token per batch, all under one root
// - DropGuard: cancels the batch if the request future is dropped
// =============================================================================

mod aggregate;
mod dispatch;
mod sink;
mod slots;
mod worker;

pub use crate::error::MuxError;
pub use sink::ErrorSink;
pub use slots::ResultSlots;

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::batch;
use crate::config::MuxConfig;
use crate::fetch::Fetcher;
use crate::limiter::CountingLimiter;

/// Serves batches. One instance is shared by every request of a server.
pub struct Multiplexer {
    fetcher: Arc<dyn Fetcher>,
    inbound: CountingLimiter,
    outbound_limit: usize,
    max_urls: usize,
    shutdown: CancellationToken,
    draining: CancellationToken,
}

impl Multiplexer {
    /// Creates a multiplexer whose batches are all cancelled when
    /// `shutdown` is cancelled.
    pub fn new(
        config: &MuxConfig,
        fetcher: Arc<dyn Fetcher>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            fetcher,
            inbound: CountingLimiter::new(config.inbound_limit),
            outbound_limit: config.outbound_limit,
            max_urls: config.max_urls,
            shutdown,
            draining: CancellationToken::new(),
        }
    }

    /// Runs one batch from raw payload to ordered bodies.
    ///
    /// Waits (never fails) while the inbound limit is reached. Dropping the
    /// returned future cancels every outstanding fetch of the batch.
    ///
    /// Once [`drain`](Self::drain) has started, new batches are refused
    /// with [`MuxError::ShuttingDown`].
    pub async fn handle(&self, payload: &[u8]) -> Result<Vec<String>, MuxError> {
        if self.draining.is_cancelled() {
            return Err(MuxError::ShuttingDown);
        }
        let _inbound = self.inbound.acquire().await;

        let batch = batch::validate(payload, self.max_urls)?;
        debug!(urls = batch.entries().len(), "batch accepted");

        let token = self.shutdown.child_token();
        let _cancel_on_drop = token.clone().drop_guard();
        let outbound = CountingLimiter::new(self.outbound_limit);

        dispatch::dispatch(batch, Arc::clone(&self.fetcher), &outbound, token).await
    }

    /// Stops taking batches and waits up to `grace` for the running ones.
    ///
    /// Returns true if they all finished in time. Otherwise the shutdown
    /// token is cancelled, the stragglers fail with a cancellation error,
    /// and this returns false once they have answered.
    pub async fn drain(&self, grace: Duration) -> bool {
        self.draining.cancel();
        info!(in_flight = self.inbound.in_use(), "draining in-flight batches");

        if tokio::time::timeout(grace, self.inbound.wait_idle()).await.is_ok() {
            return true;
        }

        warn!(
            grace_ms = grace.as_millis() as u64,
            in_flight = self.inbound.in_use(),
            "grace period elapsed, cancelling in-flight batches"
        );
        self.shutdown.cancel();
        self.inbound.wait_idle().await;
        false
    }

    /// The server-wide batch gate.
    pub fn inbound(&self) -> &CountingLimiter {
        &self.inbound
    }
}
