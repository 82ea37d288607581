// src/main.rs
// =============================================================================
// This is the entry point of the url-multiplexer service.
//
// What happens here:
// 1. Parse command-line arguments (and MUX_* environment variables)
// 2. Set up logging
// 3. Build the fetcher and the multiplexer
// 4. Serve POST / until SIGINT or SIGTERM, then shut down gracefully
// 5. Exit with a non-zero code if startup or serving failed
// =============================================================================

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use url_multiplexer::{cli::Cli, server, HttpFetcher, Multiplexer, MuxConfig};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("url_multiplexer=info,tower_http=info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    let config = MuxConfig::from(&cli);
    config.validate().context("invalid configuration")?;

    let fetcher = HttpFetcher::new(config.fetch_timeout, config.reject_error_status)
        .context("failed to create HTTP client")?;

    // Root of every batch's cancellation token; cancelled if the grace
    // period runs out at shutdown
    let shutdown = CancellationToken::new();
    let mux = Arc::new(Multiplexer::new(&config, Arc::new(fetcher), shutdown));

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!(
        %addr,
        inbound_limit = config.inbound_limit,
        outbound_limit = config.outbound_limit,
        max_urls = config.max_urls,
        fetch_timeout_ms = config.fetch_timeout.as_millis() as u64,
        "url-multiplexer v{} listening",
        env!("CARGO_PKG_VERSION")
    );

    server::serve(listener, mux, config.shutdown_grace, shutdown_signal()).await
}

// Resolves on Ctrl+C, or on SIGTERM where the platform has it
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "could not listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
