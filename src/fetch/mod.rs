// src/fetch/mod.rs
// =============================================================================
// The pluggable fetch capability: "fetch(url) -> body or error".
//
// Submodules:
// - http: the real transport, backed by a shared reqwest Client
// - stub: scripted fetchers for tests (test builds only)
//
// The multiplexer only ever sees `Arc<dyn Fetcher>`, so tests can swap in
// a stub that counts calls and concurrency without touching the network.
//
// Rust concepts:
// - Trait objects: `dyn Fetcher` hides which transport is in use
// - BoxFuture: lets a trait method return a future without async-trait
// =============================================================================

mod http;

#[cfg(test)]
pub(crate) mod stub;

pub use http::HttpFetcher;

use futures::future::BoxFuture;
use thiserror::Error;
use url::Url;

/// A failed fetch. Every variant names the URL it was fetching.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("build request to {url}: {cause}")]
    RequestBuildFailed { url: String, cause: String },

    #[error("request to {url} failed: {cause}")]
    TransportFailed { url: String, cause: String },

    #[error("read response body from {url}: {cause}")]
    BodyReadFailed { url: String, cause: String },

    #[error("request to {url} was cancelled")]
    Cancelled { url: String },
}

impl FetchError {
    /// The URL whose fetch failed.
    pub fn url(&self) -> &str {
        match self {
            FetchError::RequestBuildFailed { url, .. }
            | FetchError::TransportFailed { url, .. }
            | FetchError::BodyReadFailed { url, .. }
            | FetchError::Cancelled { url } => url,
        }
    }

    pub fn cancelled(url: &str) -> Self {
        FetchError::Cancelled {
            url: url.to_string(),
        }
    }

    /// Replaces the URL the error names, keeping the cause.
    pub fn with_url(self, url: &str) -> Self {
        let url = url.to_string();
        match self {
            FetchError::RequestBuildFailed { cause, .. } => {
                FetchError::RequestBuildFailed { url, cause }
            }
            FetchError::TransportFailed { cause, .. } => FetchError::TransportFailed { url, cause },
            FetchError::BodyReadFailed { cause, .. } => FetchError::BodyReadFailed { url, cause },
            FetchError::Cancelled { .. } => FetchError::Cancelled { url },
        }
    }
}

/// Fetches the full body of one URL.
///
/// Implementations must be cancel-safe: the worker drops the returned
/// future as soon as its batch is cancelled.
pub trait Fetcher: Send + Sync + 'static {
    fn fetch<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<String, FetchError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_url_keeps_variant_and_cause() {
        let err = FetchError::BodyReadFailed {
            url: "http://example.com/a%7e%20b".to_string(),
            cause: "reset".to_string(),
        }
        .with_url("HTTP://Example.COM/a%7e b");

        assert_eq!(
            err,
            FetchError::BodyReadFailed {
                url: "HTTP://Example.COM/a%7e b".to_string(),
                cause: "reset".to_string(),
            }
        );
        assert_eq!(
            FetchError::cancelled("http://x/").with_url("http://x").url(),
            "http://x"
        );
    }
}
