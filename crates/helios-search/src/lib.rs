//! helios-search - Search cluster backends
//!
//! This crate provides the [`SearchBackend`] implementations used by Helios:
//!
//! - [`ElasticsearchClient`]: runs fused retriever requests against an
//!   Elasticsearch cluster over HTTP, authenticating with an API key.
//! - [`StaticSearchBackend`]: answers from memory with a canned response,
//!   for tests and offline runs.

mod elastic;
mod mock;

pub use elastic::ElasticsearchClient;
pub use mock::{SearchCall, StaticSearchBackend};

// Re-export the SearchBackend trait for convenience
pub use helios_core::SearchBackend;
