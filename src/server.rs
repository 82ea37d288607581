// src/server.rs
// =============================================================================
// The HTTP surface: a single `POST /` endpoint in front of the multiplexer.
//
// - 200 + JSON array of bodies when every fetch succeeds
// - 400 with an empty body when the batch is rejected
// - 500 + {"error": "..."} when a fetch fails
//
// `serve` also owns shutdown. After the stop signal:
// 1. New batches are refused with 503
// 2. In-flight batches get the grace period to finish
// 3. Whatever is still fetching is cancelled and answers 500
// 4. Only then does the listener close
//
// Rust concepts:
// - impl Future parameter: the caller decides what "stop" means
//   (Ctrl+C in main, a oneshot channel in tests)
// =============================================================================

use std::future::{Future, IntoFuture};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::error::MuxError;
use crate::mux::Multiplexer;

/// Builds the router around a shared multiplexer.
pub fn router(mux: Arc<Multiplexer>) -> Router {
    Router::new()
        .route("/", post(multiplex))
        .layer(TraceLayer::new_for_http())
        .with_state(mux)
}

async fn multiplex(
    State(mux): State<Arc<Multiplexer>>,
    body: Bytes,
) -> Result<Response, MuxError> {
    let bodies = mux.handle(&body).await?;
    let encoded = serde_json::to_vec(&bodies)?;
    Ok(([(header::CONTENT_TYPE, "application/json")], encoded).into_response())
}

/// Serves until `signal` resolves, then drains for up to `grace`.
///
/// Connections stay open while the multiplexer drains, so a batch that
/// finishes inside the grace period still gets its response. Batches that
/// outlast it are cancelled and answer 500 before the server stops.
pub async fn serve(
    listener: TcpListener,
    mux: Arc<Multiplexer>,
    grace: Duration,
    signal: impl Future<Output = ()>,
) -> Result<()> {
    let stop_accepting = CancellationToken::new();
    let server = {
        let stop = stop_accepting.clone();
        axum::serve(listener, router(Arc::clone(&mux)))
            .with_graceful_shutdown(async move { stop.cancelled().await })
    };
    let mut server = tokio::spawn(server.into_future());

    tokio::select! {
        joined = &mut server => {
            joined.context("server task failed")?.context("server error")?;
            info!("server stopped");
            return Ok(());
        }
        _ = signal => {
            info!("shutdown signal received");
        }
    }

    if !mux.drain(grace).await {
        warn!("some batches were cancelled at shutdown");
    }

    stop_accepting.cancel();
    server
        .await
        .context("server task failed")?
        .context("server error")?;

    info!("server stopped");
    Ok(())
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why not rely on axum's graceful shutdown alone?
//    - Once triggered, it stops reading from open connections, and a request
//      still being handled can lose its response
//    - So the multiplexer drains first, and axum is only told to stop once
//      no batch is left to answer
//
// 2. Why spawn the server instead of awaiting it here?
//    - select! needs to watch the server and the signal at the same time,
//      and the server must keep running while we drain
// -----------------------------------------------------------------------------
