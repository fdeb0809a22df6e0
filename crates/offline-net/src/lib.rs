//! Offline Worker Networking
//!
//! HTTP implementation of the worker's `Fetcher`.

mod fetcher;

pub use fetcher::{FetcherConfig, HttpFetcher, HttpFetcherBuilder, response_kind};
