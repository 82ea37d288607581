// src/config.rs
// =============================================================================
// Runtime configuration of the multiplexer.
//
// The CLI (src/cli.rs) parses flags and MUX_* environment variables; this
// file turns them into a MuxConfig and checks the values make sense.
//
// Rust concepts:
// - From<&Cli>: a conversion that borrows instead of consuming the CLI
// - Default: the same defaults the CLI falls back to
// =============================================================================

use std::time::Duration;

use anyhow::{bail, Result};

use crate::cli::Cli;

/// Limits and timeouts for the server and its batches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MuxConfig {
    /// Port to listen on
    pub port: u16,

    /// Batches processed at once, server-wide
    pub inbound_limit: usize,

    /// Fetches in flight per batch
    pub outbound_limit: usize,

    /// URLs allowed in one batch
    pub max_urls: usize,

    /// Timeout for one fetch, body included
    pub fetch_timeout: Duration,

    /// Time in-flight batches get after a shutdown signal
    pub shutdown_grace: Duration,

    /// Fail the fetch on a non-2xx status instead of returning its body
    pub reject_error_status: bool,
}

impl Default for MuxConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            inbound_limit: 100,
            outbound_limit: 4,
            max_urls: 20,
            fetch_timeout: Duration::from_secs(1),
            shutdown_grace: Duration::from_secs(30),
            reject_error_status: false,
        }
    }
}

impl From<&Cli> for MuxConfig {
    fn from(cli: &Cli) -> Self {
        Self {
            port: cli.port,
            inbound_limit: cli.inbound_limit,
            outbound_limit: cli.outbound_limit,
            max_urls: cli.max_urls,
            fetch_timeout: Duration::from_millis(cli.fetch_timeout_ms),
            shutdown_grace: Duration::from_secs(cli.shutdown_grace_secs),
            reject_error_status: cli.reject_error_status,
        }
    }
}

impl MuxConfig {
    /// Rejects limits and timeouts that would make every batch fail or hang.
    pub fn validate(&self) -> Result<()> {
        if self.inbound_limit == 0 {
            bail!("inbound limit must be at least 1");
        }
        if self.outbound_limit == 0 {
            bail!("outbound limit must be at least 1");
        }
        if self.max_urls == 0 {
            bail!("max URLs per batch must be at least 1");
        }
        if self.fetch_timeout.is_zero() {
            bail!("fetch timeout must be greater than zero");
        }
        Ok(())
    }
}
