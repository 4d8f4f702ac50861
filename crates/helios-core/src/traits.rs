//! Core traits defining the seams to external services.

use async_trait::async_trait;

use crate::error::Result;
use crate::request::SearchRequest;
use crate::types::SearchResponse;

/// Search cluster client.
///
/// Implementations are long-lived handles shared across sessions.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Run `request` against the named indices and return hits in rank order.
    async fn search(&self, indices: &[&str], request: &SearchRequest) -> Result<SearchResponse>;
}

/// Hosted language model.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Complete a single prompt and return the model's text.
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Identifier of the underlying model.
    fn model_id(&self) -> &str;
}
