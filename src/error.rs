// src/error.rs
// =============================================================================
// Batch-level errors and their HTTP mapping.
//
// - Validation    -> 400, empty body
// - Fetch         -> 500, {"error": "<message naming the URL>"}
// - Incomplete    -> 500, {"error": "..."}
// - ShuttingDown  -> 503, {"error": "..."}
// - Encoding      -> 500, empty body (logged)
//
// Rust concepts:
// - thiserror: derives Display and Error from the #[error(...)] attributes
// - IntoResponse: lets a handler return Result<_, MuxError> directly
// =============================================================================

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::batch::ValidationError;
use crate::fetch::FetchError;

/// Why a batch produced no result array.
#[derive(Debug, thiserror::Error)]
pub enum MuxError {
    /// The payload was rejected before any fetch started
    #[error("invalid batch: {0}")]
    Validation(#[from] ValidationError),

    /// A fetch failed; the whole batch fails with it
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A result slot stayed empty with no error recorded
    #[error("result {index} of the batch was never produced")]
    Incomplete { index: usize },

    /// The server is draining and takes no new batches
    #[error("server is shutting down")]
    ShuttingDown,

    /// The result array could not be serialized
    #[error("encode response: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// JSON body of a failed batch.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl ErrorBody {
    fn response(status: StatusCode, err: &MuxError) -> Response {
        let body = ErrorBody {
            error: err.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl IntoResponse for MuxError {
    fn into_response(self) -> Response {
        match &self {
            MuxError::Validation(e) => {
                warn!(error = %e, "rejected batch");
                StatusCode::BAD_REQUEST.into_response()
            }
            MuxError::Fetch(_) | MuxError::Incomplete { .. } => {
                warn!(error = %self, "batch failed");
                ErrorBody::response(StatusCode::INTERNAL_SERVER_ERROR, &self)
            }
            MuxError::ShuttingDown => {
                info!("refused batch while shutting down");
                ErrorBody::response(StatusCode::SERVICE_UNAVAILABLE, &self)
            }
            MuxError::Encoding(e) => {
                error!(error = %e, "could not encode batch response");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
