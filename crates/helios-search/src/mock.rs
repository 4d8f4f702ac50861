//! In-memory search backend returning a canned response.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use helios_core::{HeliosError, Result, SearchBackend, SearchRequest, SearchResponse};

/// A recorded call to [`StaticSearchBackend`].
#[derive(Debug, Clone)]
pub struct SearchCall {
    pub indices: Vec<String>,
    pub request: SearchRequest,
}

/// Search backend that answers every request with the same response.
///
/// Records each request so callers can inspect what would have been sent.
pub struct StaticSearchBackend {
    outcome: std::result::Result<SearchResponse, String>,
    delay: Option<Duration>,
    calls: Mutex<Vec<SearchCall>>,
}

impl StaticSearchBackend {
    /// Backend that always returns `response`.
    pub fn new(response: SearchResponse) -> Self {
        Self {
            outcome: Ok(response),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Backend that always fails with a retrieval error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            outcome: Err(message.into()),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Sleep before answering, to simulate a slow cluster.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Requests received so far.
    pub fn calls(&self) -> Vec<SearchCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl SearchBackend for StaticSearchBackend {
    async fn search(&self, indices: &[&str], request: &SearchRequest) -> Result<SearchResponse> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(SearchCall {
                indices: indices.iter().map(|s| s.to_string()).collect(),
                request: request.clone(),
            });
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.outcome {
            Ok(response) => Ok(response.clone()),
            Err(message) => Err(HeliosError::retrieval(message.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helios_core::{Retriever, RrfRetriever, SearchHit};

    fn request() -> SearchRequest {
        SearchRequest {
            retriever: Retriever::Rrf(RrfRetriever {
                retrievers: Vec::new(),
                rank_window_size: 10,
                rank_constant: None,
            }),
            size: 10,
        }
    }

    #[tokio::test]
    async fn test_static_backend_records_calls() {
        let response = SearchResponse::new(vec![SearchHit::flat("a", serde_json::Map::new())]);
        let backend = StaticSearchBackend::new(response.clone());

        let result = backend.search(&["a", "b"], &request()).await.unwrap();
        assert_eq!(result, response);

        let calls = backend.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].indices, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_failing_backend() {
        let backend = StaticSearchBackend::failing("down");
        let err = backend.search(&["a"], &request()).await.unwrap_err();
        assert_eq!(err.error_code(), "RETRIEVAL_ERROR");
        assert_eq!(backend.calls().len(), 1);
    }
}
