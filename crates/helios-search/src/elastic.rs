//! Elasticsearch `_search` client.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, info};

use helios_core::{
    HeliosError, InnerHitFragment, Result, SearchBackend, SearchConfig, SearchHit,
    SearchRequest, SearchResponse,
};

/// Search backend talking to an Elasticsearch cluster over HTTP.
///
/// Cloning is cheap; the underlying connection pool is shared.
#[derive(Clone)]
pub struct ElasticsearchClient {
    client: Client,
    endpoint: Url,
    api_key: String,
    timeout: Duration,
}

impl std::fmt::Debug for ElasticsearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElasticsearchClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ElasticsearchClient {
    /// Create a client for the cluster at `endpoint`.
    pub fn new(endpoint: &str, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            HeliosError::config(format!("invalid search endpoint '{}': {}", endpoint, e))
        })?;
        if endpoint.cannot_be_a_base() {
            return Err(HeliosError::config(format!(
                "search endpoint '{}' is not a base URL",
                endpoint
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HeliosError::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            api_key: api_key.into(),
            timeout,
        })
    }

    /// Create a client from validated search configuration.
    pub fn from_config(config: &SearchConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .as_deref()
            .ok_or_else(|| HeliosError::config("search endpoint is not set"))?;
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| HeliosError::config("search API key is not set"))?;
        Self::new(endpoint, api_key, config.timeout())
    }

    /// `<endpoint>/<index,index,...>/_search`
    fn search_url(&self, indices: &[&str]) -> Result<Url> {
        if indices.is_empty() {
            return Err(HeliosError::invalid_argument("no indices to search"));
        }

        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| HeliosError::config("search endpoint is not a base URL"))?
            .pop_if_empty()
            .push(&indices.join(","))
            .push("_search");
        Ok(url)
    }

    fn transport_error(&self, err: reqwest::Error, what: &str) -> HeliosError {
        if err.is_timeout() {
            HeliosError::RetrievalTimeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else {
            HeliosError::retrieval(format!("{}: {}", what, err))
        }
    }
}

#[async_trait]
impl SearchBackend for ElasticsearchClient {
    async fn search(&self, indices: &[&str], request: &SearchRequest) -> Result<SearchResponse> {
        let start = Instant::now();
        let url = self.search_url(indices)?;

        info!("Searching {} indices at {}", indices.len(), url.path());

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("ApiKey {}", self.api_key))
            .json(request)
            .send()
            .await
            .map_err(|err| self.transport_error(err, "search request failed"))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| self.transport_error(err, "failed to read search response"))?;

        if !status.is_success() {
            return Err(map_http_error(status, &body));
        }

        let parsed = decode_response(&body)?;

        debug!(
            "Decoded {} hits in {}ms",
            parsed.len(),
            start.elapsed().as_millis()
        );

        Ok(parsed)
    }
}

#[derive(Deserialize)]
struct RawSearchResponse {
    #[serde(default)]
    took: Option<u64>,
    #[serde(default)]
    timed_out: bool,
    hits: RawHits,
}

#[derive(Deserialize)]
struct RawHits {
    #[serde(default)]
    hits: Vec<RawHit>,
}

#[derive(Deserialize)]
struct RawHit {
    #[serde(rename = "_index")]
    index: String,
    #[serde(rename = "_score", default)]
    score: Option<f64>,
    #[serde(rename = "_source", default)]
    source: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    inner_hits: Option<HashMap<String, RawInnerHits>>,
}

#[derive(Deserialize)]
struct RawInnerHits {
    hits: RawInnerHitList,
}

#[derive(Deserialize)]
struct RawInnerHitList {
    #[serde(default)]
    hits: Vec<RawInnerHit>,
}

#[derive(Deserialize)]
struct RawInnerHit {
    #[serde(rename = "_source")]
    source: InnerHitFragment,
}

/// Decode a `_search` response body into ranked hits.
pub(crate) fn decode_response(body: &str) -> Result<SearchResponse> {
    let raw: RawSearchResponse = serde_json::from_str(body)
        .map_err(|e| HeliosError::retrieval(format!("malformed search response: {}", e)))?;

    let hits = raw
        .hits
        .hits
        .into_iter()
        .map(|hit| SearchHit {
            index: hit.index,
            score: hit.score,
            source: hit.source,
            inner_hits: hit.inner_hits.map(|groups| {
                groups
                    .into_iter()
                    .map(|(name, group)| {
                        let fragments = group.hits.hits.into_iter().map(|h| h.source).collect();
                        (name, fragments)
                    })
                    .collect()
            }),
        })
        .collect();

    Ok(SearchResponse {
        hits,
        took_ms: raw.took,
        timed_out: raw.timed_out,
    })
}

fn map_http_error(status: StatusCode, body: &str) -> HeliosError {
    let reason = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/reason")
                .and_then(|r| r.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.chars().take(500).collect());

    HeliosError::retrieval(format!("search cluster returned {}: {}", status, reason))
}
