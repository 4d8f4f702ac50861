//! Retrieval engine: builds the fused request, runs it, flattens the hits.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use helios_core::{
    HeliosError, IndexRegistry, Result, SearchBackend, SearchConfig, SearchRequest,
    SearchResponse,
};

use crate::flatten::flatten_context;
use crate::fusion::{FusedQueryBuilder, DEFAULT_INNER_HITS_SIZE};

/// Configuration for retrieval.
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Inference endpoint that embeds the query server-side.
    pub inference_id: String,

    /// Candidates per sub-retriever considered before fusion.
    pub rank_window_size: u32,

    /// Number of fused documents returned.
    pub size: u32,

    /// Matching chunks returned per document.
    pub inner_hits_size: u32,

    /// Optional RRF rank constant.
    pub rank_constant: Option<u32>,

    /// Upper bound on a single search call.
    pub timeout: Duration,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            inference_id: "hackathon".to_string(),
            rank_window_size: 100,
            size: 100,
            inner_hits_size: DEFAULT_INNER_HITS_SIZE,
            rank_constant: None,
            timeout: Duration::from_secs(10),
        }
    }
}

impl From<&SearchConfig> for RetrievalConfig {
    fn from(config: &SearchConfig) -> Self {
        Self {
            inference_id: config.inference_id.clone(),
            rank_window_size: config.rank_window_size,
            size: config.size,
            inner_hits_size: config.inner_hits_size,
            rank_constant: config.rank_constant,
            timeout: config.timeout(),
        }
    }
}

/// Fused retrieval over every configured index.
///
/// Turns a question into one RRF search request, runs it against the backend
/// under a timeout, and flattens the ranked hits into prompt context. Nothing
/// is retried.
pub struct Retriever<S> {
    /// Search backend.
    backend: Arc<S>,

    /// Indices searched on every call.
    registry: Arc<IndexRegistry>,

    /// Index name to primary field, computed once.
    index_fields: HashMap<String, String>,

    builder: FusedQueryBuilder,

    config: RetrievalConfig,
}

impl<S> Retriever<S>
where
    S: SearchBackend,
{
    /// Create a new retriever.
    pub fn new(backend: Arc<S>, registry: Arc<IndexRegistry>, config: RetrievalConfig) -> Self {
        let builder = FusedQueryBuilder::new(config.inference_id.clone())
            .with_inner_hits_size(config.inner_hits_size)
            .with_rank_constant(config.rank_constant);
        let index_fields = registry.primary_fields();

        Self {
            backend,
            registry,
            index_fields,
            builder,
            config,
        }
    }

    pub fn registry(&self) -> &IndexRegistry {
        &self.registry
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Build the fused request for `query` without sending it.
    pub fn build_request(&self, query: &str) -> Result<SearchRequest> {
        self.builder.build(
            query,
            self.registry.descriptors(),
            self.config.rank_window_size,
            self.config.size,
        )
    }

    /// Run the fused search and return ranked hits.
    pub async fn retrieve(&self, query: &str) -> Result<SearchResponse> {
        let start = Instant::now();

        info!("Retrieving for: {:?}", query);

        let request = self.build_request(query)?;
        let indices = self.registry.names();

        let response = tokio::time::timeout(
            self.config.timeout,
            self.backend.search(&indices, &request),
        )
        .await
        .map_err(|_| HeliosError::RetrievalTimeout {
            timeout_ms: self.config.timeout.as_millis() as u64,
        })??;

        if response.timed_out {
            warn!("Search backend timed out; using {} partial hits", response.len());
        }

        debug!(
            "Search returned {} hits in {}ms (backend took {:?}ms)",
            response.len(),
            start.elapsed().as_millis(),
            response.took_ms
        );

        Ok(response)
    }

    /// Flatten a response into context text.
    pub fn flatten(&self, response: &SearchResponse) -> Result<String> {
        flatten_context(&response.hits, &self.index_fields)
    }

    /// Retrieve and flatten in one step.
    pub async fn context_for(&self, query: &str) -> Result<String> {
        let response = self.retrieve(query).await?;
        self.flatten(&response)
    }
}
