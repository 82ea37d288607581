// src/fetch/http.rs
// =============================================================================
// The real fetch transport: a GET request per URL over a shared reqwest
// Client.
//
// Steps for one URL:
// 1. Build the GET request          -> RequestBuildFailed on error
// 2. Send it (bounded by a timeout) -> TransportFailed on error
// 3. Read the whole body            -> BodyReadFailed on error
//
// By default any status code counts as success and its body is returned.
// With `reject_error_status` set, a non-2xx status is a TransportFailed.
//
// Rust concepts:
// - BoxFuture: a heap-allocated future, so the trait stays object safe
// - Client clones share one connection pool
// =============================================================================

use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::Client;
use tracing::debug;
use url::Url;

use super::{FetchError, Fetcher};

/// Fetches URLs with reqwest.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    reject_error_status: bool,
}

impl HttpFetcher {
    /// Creates a fetcher whose requests (including the body read) time out
    /// after `timeout`.
    pub fn new(timeout: Duration, reject_error_status: bool) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self {
            client,
            reject_error_status,
        })
    }

    async fn fetch_body(&self, url: &Url) -> Result<String, FetchError> {
        let request = self
            .client
            .get(url.clone())
            .build()
            .map_err(|e| FetchError::RequestBuildFailed {
                url: url.to_string(),
                cause: e.to_string(),
            })?;

        debug!(%url, "requesting");

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| FetchError::TransportFailed {
                url: url.to_string(),
                cause: describe_error(&e),
            })?;

        let status = response.status();
        if self.reject_error_status && !status.is_success() {
            return Err(FetchError::TransportFailed {
                url: url.to_string(),
                cause: format!("HTTP {}", status.as_u16()),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::BodyReadFailed {
                url: url.to_string(),
                cause: describe_error(&e),
            })?;

        debug!(%url, status = status.as_u16(), bytes = body.len(), "response read");

        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

impl Fetcher for HttpFetcher {
    fn fetch<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<String, FetchError>> {
        Box::pin(self.fetch_body(url))
    }
}

// Turns a reqwest error into a short cause for the batch error message
fn describe_error(error: &reqwest::Error) -> String {
    let error_string = error.to_string();

    if error.is_timeout() {
        "request timed out".to_string()
    } else if error.is_redirect() {
        "too many redirects".to_string()
    } else if error.is_connect() {
        format!("connection failed: {}", error_string)
    } else {
        error_string
    }
}
