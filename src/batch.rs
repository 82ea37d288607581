// src/batch.rs
// =============================================================================
// Batch validation: turns a raw request payload into a Batch of URLs.
//
// Checks, in order, stopping at the first failure:
// 1. The payload is a JSON array of strings
// 2. The array is not empty and holds at most `max_urls` entries
// 3. Every entry parses as a URL
//
// Nothing here touches the network. A payload either becomes a Batch or
// is rejected as a whole before any fetch starts.
// =============================================================================

use thiserror::Error;
use url::Url;

/// Why a payload was rejected. All variants map to 400 Bad Request.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("payload is not a JSON array of strings: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("batch is empty")]
    Empty,

    #[error("batch has {count} URLs, limit is {max}")]
    TooManyUrls { count: usize, max: usize },

    #[error("entry {index} is not a valid URL ({url:?}): {source}")]
    BadUrl {
        index: usize,
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// One URL of a batch: the string the client sent and its parsed form.
///
/// Errors name `raw`; the fetcher gets `url`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    pub raw: String,
    pub url: Url,
}

/// An ordered, validated list of URLs. Position `i` is result slot `i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    entries: Vec<BatchEntry>,
}

impl Batch {
    pub fn entries(&self) -> &[BatchEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<BatchEntry> {
        self.entries
    }
}

/// Validates a raw payload into a [`Batch`] of at most `max_urls` URLs.
pub fn validate(payload: &[u8], max_urls: usize) -> Result<Batch, ValidationError> {
    let raw: Vec<String> = serde_json::from_slice(payload)?;

    if raw.is_empty() {
        return Err(ValidationError::Empty);
    }
    if raw.len() > max_urls {
        return Err(ValidationError::TooManyUrls {
            count: raw.len(),
            max: max_urls,
        });
    }

    let entries = raw
        .into_iter()
        .enumerate()
        .map(|(index, raw)| match Url::parse(&raw) {
            Ok(url) => Ok(BatchEntry { raw, url }),
            Err(source) => Err(ValidationError::BadUrl {
                index,
                url: raw,
                source,
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Batch { entries })
}
