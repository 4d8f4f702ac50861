//! helios-query - Fused retrieval and context flattening
//!
//! This crate turns a question into a single reciprocal-rank-fusion search
//! request spanning every configured index, and flattens the ranked hits the
//! cluster returns into the context block handed to the language model.
//!
//! # Features
//!
//! - One nested sparse-vector sub-retriever per index
//! - Inner hits named `<index>.<field>` so chunks map back to their index
//! - Order-preserving, deterministic flattening
//! - Bounded retrieval time, no retries
//!
//! # Example
//!
//! ```rust,ignore
//! use helios_query::{RetrievalConfig, Retriever};
//! use std::sync::Arc;
//!
//! let retriever = Retriever::new(Arc::new(backend), Arc::new(registry), RetrievalConfig::default());
//! let context = retriever.context_for("pharmacy near 123456").await?;
//! ```

mod engine;
mod flatten;
mod fusion;

pub use engine::{RetrievalConfig, Retriever};
pub use flatten::{flatten_context, FRAGMENT_SEPARATOR};
pub use fusion::{FusedQueryBuilder, DEFAULT_INNER_HITS_SIZE};

// Re-export for convenience
pub use helios_core::{SearchHit, SearchRequest, SearchResponse};
