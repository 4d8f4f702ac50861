//! Bedrock runtime client for Anthropic models.
//!
//! Calls `InvokeModel` with an Anthropic messages body and a bearer token.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use helios_core::{CompletionModel, HeliosError, LlmConfig, Result};

const ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";

/// Completion model served through the Bedrock runtime API.
#[derive(Clone)]
pub struct BedrockClient {
    client: Client,
    endpoint: Url,
    api_key: String,
    model_id: String,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
}

impl std::fmt::Debug for BedrockClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BedrockClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("model_id", &self.model_id)
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}

impl BedrockClient {
    /// Create a client from validated model configuration.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| HeliosError::config("model credential is not set"))?;

        let endpoint_str = config.endpoint();
        let endpoint = Url::parse(&endpoint_str).map_err(|e| {
            HeliosError::config(format!("invalid model endpoint '{}': {}", endpoint_str, e))
        })?;
        if endpoint.cannot_be_a_base() {
            return Err(HeliosError::config(format!(
                "model endpoint '{}' is not a base URL",
                endpoint_str
            )));
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| HeliosError::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            api_key,
            model_id: config.model_id.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: config.timeout(),
        })
    }

    /// `<endpoint>/model/<model-id>/invoke`
    fn invoke_url(&self) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| HeliosError::config("model endpoint is not a base URL"))?
            .pop_if_empty()
            .push("model")
            .push(&self.model_id)
            .push("invoke");
        Ok(url)
    }

    fn build_request<'a>(&self, prompt: &'a str) -> InvokeRequest<'a> {
        InvokeRequest {
            anthropic_version: ANTHROPIC_VERSION,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            messages: vec![Message {
                role: "user",
                content: vec![ContentBlock::Text { text: prompt }],
            }],
        }
    }

    async fn send_request(&self, body: &InvokeRequest<'_>) -> Result<String> {
        let url = self.invoke_url()?;

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .header("accept", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|err| self.transport_error("request failed", err))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| self.transport_error("failed to read response", err))?;

        if !status.is_success() {
            return Err(map_http_error(status, &text));
        }

        let parsed: InvokeResponse = serde_json::from_str(&text).map_err(|err| {
            HeliosError::completion(format!("failed to parse model response: {}", err))
        })?;

        extract_text_response(parsed)
    }

    fn transport_error(&self, what: &str, err: reqwest::Error) -> HeliosError {
        if err.is_timeout() {
            HeliosError::completion(format!(
                "model call timed out after {}s",
                self.timeout.as_secs()
            ))
        } else {
            HeliosError::completion(format!("model {}: {}", what, err))
        }
    }
}

#[async_trait]
impl CompletionModel for BedrockClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let start = Instant::now();

        info!("Invoking {} ({} prompt bytes)", self.model_id, prompt.len());

        let request = self.build_request(prompt);
        let completion = self.send_request(&request).await?;

        debug!(
            "Completion of {} bytes in {}ms",
            completion.len(),
            start.elapsed().as_millis()
        );

        Ok(completion)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[derive(Debug, Serialize)]
struct InvokeRequest<'a> {
    anthropic_version: &'static str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: Vec<ContentBlock<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock<'a> {
    Text { text: &'a str },
}

#[derive(Debug, Deserialize)]
struct InvokeResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

fn extract_text_response(response: InvokeResponse) -> Result<String> {
    let text = response
        .content
        .into_iter()
        .filter_map(|block| match block {
            ResponseBlock::Text { text } => Some(text),
            ResponseBlock::Other => None,
        })
        .collect::<Vec<_>>()
        .join("");

    if text.trim().is_empty() {
        return Err(HeliosError::completion(format!(
            "model returned no text (stop reason: {})",
            response.stop_reason.as_deref().unwrap_or("unknown")
        )));
    }

    Ok(text)
}

fn map_http_error(status: StatusCode, body: &str) -> HeliosError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("Message"))
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.chars().take(500).collect());

    let kind = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => "credential rejected",
        StatusCode::TOO_MANY_REQUESTS => "throttled",
        StatusCode::BAD_REQUEST => "request rejected",
        s if s.is_server_error() => "service error",
        _ => "unexpected status",
    };

    HeliosError::completion(format!("{} ({}): {}", kind, status, message))
}
