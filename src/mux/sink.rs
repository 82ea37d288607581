// src/mux/sink.rs
// =============================================================================
// The batch error sink: a single-assignment cell where the first failing
// worker records its error.
//
// - report() never blocks, however many workers fail at the same time
// - only the first report is kept, later ones are dropped
//
// Rust concepts:
// - OnceLock::set: returns Err for every writer after the first
// =============================================================================

use std::sync::OnceLock;

use crate::fetch::FetchError;

/// First-writer-wins store for one batch's error.
#[derive(Debug, Default)]
pub struct ErrorSink {
    first: OnceLock<FetchError>,
}

impl ErrorSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `error` if nothing was recorded yet.
    ///
    /// Returns `true` if this call's error is the one that will be surfaced.
    pub fn report(&self, error: FetchError) -> bool {
        self.first.set(error).is_ok()
    }

    pub fn get(&self) -> Option<&FetchError> {
        self.first.get()
    }

    #[cfg(test)]
    pub fn is_set(&self) -> bool {
        self.first.get().is_some()
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why not a channel with room for one error?
//    - A full channel makes the second sender wait, and a waiting worker
//      never releases its permit
//    - OnceLock::set returns at once, whether or not it won
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn failure(url: &str) -> FetchError {
        FetchError::TransportFailed {
            url: url.to_string(),
            cause: "boom".to_string(),
        }
    }

    #[test]
    fn test_first_report_wins() {
        let sink = ErrorSink::new();
        assert!(!sink.is_set());

        assert!(sink.report(failure("http://first")));
        assert!(!sink.report(failure("http://second")));

        assert_eq!(sink.get().map(FetchError::url), Some("http://first"));
    }

    #[tokio::test]
    async fn test_concurrent_reports_never_block() {
        let sink = Arc::new(ErrorSink::new());
        let mut handles = Vec::new();

        for i in 0..64 {
            let sink = Arc::clone(&sink);
            handles.push(tokio::spawn(async move {
                sink.report(failure(&format!("http://url-{}", i)))
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }

        assert_eq!(winners, 1);
        assert!(sink.is_set());
    }
}
