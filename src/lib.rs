// src/lib.rs
// =============================================================================
// url-multiplexer: fetch a batch of URLs concurrently, answer in order.
//
// A client POSTs a JSON array of up to 20 URLs. Each URL is fetched under
// two concurrency caps (batches server-wide, fetches per batch). The
// response is either every body in input order, or one error naming the
// first URL that failed. A failure cancels the rest of its batch.
//
//   POST / ["http://a","http://b"]  ->  200 ["<body of a>","<body of b>"]
//
// The binary (src/main.rs) only wires these modules together.
// =============================================================================

pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod limiter;
pub mod mux;
pub mod server;

pub use config::MuxConfig;
pub use error::MuxError;
pub use fetch::{FetchError, Fetcher, HttpFetcher};
pub use mux::Multiplexer;
