//! Reciprocal Rank Fusion request construction.
//!
//! Every configured index contributes one sparse-vector sub-retriever over its
//! primary semantic field; the cluster fuses their rankings with RRF.

use helios_core::{
    HeliosError, IndexDescriptor, InnerHitsSpec, NestedQuery, Query, Result, Retriever,
    RrfRetriever, SearchRequest, SparseVectorQuery, StandardRetriever,
};

/// Matching chunks returned per document unless configured otherwise.
pub const DEFAULT_INNER_HITS_SIZE: u32 = 2;

/// Builds fused sparse-vector search requests.
#[derive(Debug, Clone)]
pub struct FusedQueryBuilder {
    /// Inference endpoint that embeds the query text.
    inference_id: String,

    /// Inner hits requested per document and index.
    inner_hits_size: u32,

    /// Optional RRF rank constant.
    rank_constant: Option<u32>,
}

impl FusedQueryBuilder {
    pub fn new(inference_id: impl Into<String>) -> Self {
        Self {
            inference_id: inference_id.into(),
            inner_hits_size: DEFAULT_INNER_HITS_SIZE,
            rank_constant: None,
        }
    }

    pub fn with_inner_hits_size(mut self, size: u32) -> Self {
        self.inner_hits_size = size;
        self
    }

    pub fn with_rank_constant(mut self, rank_constant: Option<u32>) -> Self {
        self.rank_constant = rank_constant;
        self
    }

    /// Build the fused request for `query` over `indices`.
    ///
    /// # Arguments
    /// * `query` - Raw user question, sent verbatim to every sub-retriever
    /// * `indices` - Indices to search; one sub-retriever each, in this order
    /// * `window_size` - Candidates per sub-retriever considered by RRF
    /// * `result_size` - Maximum number of fused documents returned
    pub fn build(
        &self,
        query: &str,
        indices: &[IndexDescriptor],
        window_size: u32,
        result_size: u32,
    ) -> Result<SearchRequest> {
        if query.trim().is_empty() {
            return Err(HeliosError::invalid_argument("query must not be empty"));
        }
        if indices.is_empty() {
            return Err(HeliosError::invalid_argument(
                "at least one index is required to build a query",
            ));
        }

        let retrievers = indices
            .iter()
            .map(|index| self.semantic_retriever(query, index))
            .collect::<Result<Vec<_>>>()?;

        Ok(SearchRequest {
            retriever: Retriever::Rrf(RrfRetriever {
                retrievers,
                rank_window_size: window_size,
                rank_constant: self.rank_constant,
            }),
            size: result_size,
        })
    }

    /// Nested sparse-vector retriever over the index's primary field.
    fn semantic_retriever(&self, query: &str, index: &IndexDescriptor) -> Result<Retriever> {
        index.validate()?;
        let field = index.primary_field();
        let chunks = format!("{}.inference.chunks", field);

        Ok(Retriever::Standard(StandardRetriever {
            query: Query::Nested(NestedQuery {
                query: Box::new(Query::SparseVector(SparseVectorQuery {
                    inference_id: self.inference_id.clone(),
                    field: format!("{}.embeddings", chunks),
                    query: query.to_string(),
                })),
                inner_hits: Some(InnerHitsSpec {
                    size: self.inner_hits_size,
                    name: index.inner_hit_key(),
                    source: vec![format!("{}.text", chunks)],
                }),
                path: chunks,
            }),
        }))
    }
}
