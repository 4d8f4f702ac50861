//! Search request body types.
//!
//! These mirror the retriever tree accepted by the search cluster's `_search`
//! endpoint. Enums are externally tagged so a `Retriever::Rrf(..)` serializes
//! as `{"rrf": {...}}`.

use serde::{Deserialize, Serialize};

/// Top-level `_search` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub retriever: Retriever,

    /// Maximum number of fused documents returned.
    pub size: u32,
}

/// A node in the retriever tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Retriever {
    Rrf(RrfRetriever),
    Standard(StandardRetriever),
}

/// Reciprocal rank fusion over child retrievers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RrfRetriever {
    pub retrievers: Vec<Retriever>,

    /// Candidates considered per child retriever before fusion.
    pub rank_window_size: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank_constant: Option<u32>,
}

/// A plain query retriever.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardRetriever {
    pub query: Query,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Query {
    Nested(NestedQuery),
    SparseVector(SparseVectorQuery),
}

/// Query over nested chunk objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedQuery {
    pub path: String,
    pub query: Box<Query>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner_hits: Option<InnerHitsSpec>,
}

/// Sparse-vector match computed server-side by an inference endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseVectorQuery {
    pub inference_id: String,
    pub field: String,
    pub query: String,
}

/// Which matching chunks to return alongside each parent hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InnerHitsSpec {
    pub size: u32,
    pub name: String,

    #[serde(rename = "_source")]
    pub source: Vec<String>,
}

impl SearchRequest {
    /// Child retrievers of the top-level fusion retriever.
    pub fn sub_retrievers(&self) -> &[Retriever] {
        match &self.retriever {
            Retriever::Rrf(rrf) => &rrf.retrievers,
            Retriever::Standard(_) => &[],
        }
    }
}

impl Retriever {
    /// Name of the inner-hit group this retriever requests, if any.
    pub fn inner_hits_name(&self) -> Option<&str> {
        match self {
            Self::Standard(standard) => match &standard.query {
                Query::Nested(nested) => nested.inner_hits.as_ref().map(|h| h.name.as_str()),
                Query::SparseVector(_) => None,
            },
            Self::Rrf(_) => None,
        }
    }
}
