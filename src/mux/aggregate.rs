// src/mux/aggregate.rs
// =============================================================================
// Turns a joined batch into its single outcome.
//
// - An error was recorded  -> that error, whatever the slots hold
// - Every slot is filled   -> the bodies, in batch order
// - A slot is still empty  -> Cancelled (batch cancelled from outside)
//                             or Incomplete (a worker panicked)
//
// Rust concepts:
// - Arc::try_unwrap (inside into_bodies): takes the slots back without a copy
//   once the workers' clones are gone
// =============================================================================

use std::sync::Arc;

use super::sink::ErrorSink;
use super::slots::ResultSlots;
use super::MuxError;
use crate::batch::BatchEntry;
use crate::fetch::FetchError;

pub(crate) type BatchOutcome = Result<Vec<String>, MuxError>;

/// Must only run after every worker of the batch has finished.
///
/// An empty slot without a recorded error means the batch was cancelled
/// from outside (or a worker panicked); the first such URL is reported.
pub(crate) fn aggregate(
    entries: &[BatchEntry],
    sink: &ErrorSink,
    slots: Arc<ResultSlots>,
    cancelled: bool,
) -> BatchOutcome {
    if let Some(error) = sink.get() {
        return Err(MuxError::Fetch(error.clone()));
    }

    ResultSlots::into_bodies(slots).map_err(|index| match entries.get(index) {
        Some(entry) if cancelled => MuxError::Fetch(FetchError::cancelled(&entry.raw)),
        _ => MuxError::Incomplete { index },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn entries() -> Vec<BatchEntry> {
        ["http://a", "http://b"]
            .iter()
            .map(|u| BatchEntry {
                raw: u.to_string(),
                url: Url::parse(u).unwrap(),
            })
            .collect()
    }

    #[test]
    fn test_all_filled_returns_bodies() {
        let slots = Arc::new(ResultSlots::new(2));
        slots.fill(0, "resp-a".to_string());
        slots.fill(1, "resp-b".to_string());

        let bodies = aggregate(&entries(), &ErrorSink::new(), slots, false).unwrap();
        assert_eq!(bodies, vec!["resp-a", "resp-b"]);
    }

    #[test]
    fn test_recorded_error_wins_over_bodies() {
        let slots = Arc::new(ResultSlots::new(2));
        slots.fill(0, "resp-a".to_string());
        let sink = ErrorSink::new();
        sink.report(FetchError::BodyReadFailed {
            url: "http://b".to_string(),
            cause: "reset".to_string(),
        });

        match aggregate(&entries(), &sink, slots, true) {
            Err(MuxError::Fetch(FetchError::BodyReadFailed { url, .. })) => {
                assert_eq!(url, "http://b")
            }
            other => panic!("expected BodyReadFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_slot_after_cancellation() {
        let slots = Arc::new(ResultSlots::new(2));
        slots.fill(0, "resp-a".to_string());

        match aggregate(&entries(), &ErrorSink::new(), slots, true) {
            Err(MuxError::Fetch(FetchError::Cancelled { url })) => assert_eq!(url, "http://b"),
            other => panic!("expected Cancelled, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_slot_without_cancellation_is_incomplete() {
        let slots = Arc::new(ResultSlots::new(2));
        assert!(matches!(
            aggregate(&entries(), &ErrorSink::new(), slots, false),
            Err(MuxError::Incomplete { index: 0 })
        ));
    }
}
