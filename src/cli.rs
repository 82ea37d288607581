// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Every flag can also come from a MUX_* environment variable, so the
// service can be configured the same way in a terminal or a container.
// =============================================================================

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "url-multiplexer",
    version,
    about = "Fetch a batch of URLs concurrently and return their bodies in order",
    long_about = "url-multiplexer accepts POST / with a JSON array of URLs, fetches them \
                  concurrently under inbound and outbound concurrency caps, and answers \
                  with the response bodies in the same order, or a single error."
)]
pub struct Cli {
    /// Port to listen on
    #[arg(long, env = "MUX_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Maximum number of batches processed at once, server-wide
    #[arg(long, env = "MUX_INBOUND_LIMIT", default_value_t = 100)]
    pub inbound_limit: usize,

    /// Maximum number of fetches in flight per batch
    #[arg(long, env = "MUX_OUTBOUND_LIMIT", default_value_t = 4)]
    pub outbound_limit: usize,

    /// Maximum number of URLs in one batch
    #[arg(long, env = "MUX_MAX_URLS", default_value_t = 20)]
    pub max_urls: usize,

    /// Timeout for a single fetch, in milliseconds
    #[arg(long, env = "MUX_FETCH_TIMEOUT_MS", default_value_t = 1000)]
    pub fetch_timeout_ms: u64,

    /// How long in-flight batches may run after a shutdown signal, in seconds
    #[arg(long, env = "MUX_SHUTDOWN_GRACE_SECS", default_value_t = 30)]
    pub shutdown_grace_secs: u64,

    /// Treat a non-2xx response as a failed fetch
    ///
    /// Without this flag the body of any response is returned as-is.
    #[arg(long, env = "MUX_REJECT_ERROR_STATUS")]
    pub reject_error_status: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["url-multiplexer"]).unwrap();
        assert_eq!(cli.port, 8080);
        assert_eq!(cli.inbound_limit, 100);
        assert_eq!(cli.outbound_limit, 4);
        assert_eq!(cli.max_urls, 20);
        assert_eq!(cli.fetch_timeout_ms, 1000);
        assert_eq!(cli.shutdown_grace_secs, 30);
        assert!(!cli.reject_error_status);
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "url-multiplexer",
            "--port",
            "9000",
            "--outbound-limit",
            "8",
            "--reject-error-status",
        ])
        .unwrap();
        assert_eq!(cli.port, 9000);
        assert_eq!(cli.outbound_limit, 8);
        assert!(cli.reject_error_status);
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
