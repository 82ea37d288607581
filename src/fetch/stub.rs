// src/fetch/stub.rs
// =============================================================================
// Scripted fetchers for tests (compiled only under `cargo test`).
//
// Each URL is answered by a closure returning a Reply:
// - Body: succeed with a body after a delay
// - Fail: fail with a transport error after a delay
// - Hang: never answer, until the fetch future is dropped
//
// The stub counts calls, completions, and the peak number of fetches
// running at once, so tests can check the concurrency caps.
//
// Rust concepts:
// - Atomics: counters shared by many tasks without a lock
// - Drop guard: decrements the in-flight count even when cancelled
// =============================================================================

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use url::Url;

use super::{FetchError, Fetcher};

/// What the stub does for one URL.
pub(crate) enum Reply {
    Body(String, Duration),
    Fail(Duration),
    Hang,
}

type Script = Box<dyn Fn(&Url) -> Reply + Send + Sync>;

pub(crate) struct StubFetcher {
    script: Script,
    calls: AtomicUsize,
    in_flight: Arc<AtomicUsize>,
    peak: AtomicUsize,
    completed: AtomicUsize,
}

// Decrements the in-flight count even when the fetch future is dropped
struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl StubFetcher {
    pub(crate) fn new(script: impl Fn(&Url) -> Reply + Send + Sync + 'static) -> Self {
        Self {
            script: Box::new(script),
            calls: AtomicUsize::new(0),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
        }
    }

    /// Answers `http://a` with `resp-a`, and so on for every host.
    pub(crate) fn echo_host(delay: Duration) -> Self {
        Self::new(move |url| Reply::Body(format!("resp-{}", url.host_str().unwrap_or("")), delay))
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Fetches that ran to the end instead of being dropped.
    pub(crate) fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

impl Fetcher for StubFetcher {
    fn fetch<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<String, FetchError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            let _guard = InFlight(Arc::clone(&self.in_flight));
            self.peak.fetch_max(now, Ordering::SeqCst);

            let result = match (self.script)(url) {
                Reply::Body(body, delay) => {
                    tokio::time::sleep(delay).await;
                    Ok(body)
                }
                Reply::Fail(delay) => {
                    tokio::time::sleep(delay).await;
                    Err(FetchError::TransportFailed {
                        url: url.to_string(),
                        cause: "stub failure".to_string(),
                    })
                }
                Reply::Hang => std::future::pending().await,
            };

            self.completed.fetch_add(1, Ordering::SeqCst);
            result
        })
    }
}
