//! Configuration types for the Helios assistant.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{HeliosError, Result};
use crate::types::{IndexDescriptor, IndexRegistry};

/// Main configuration for the Helios assistant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeliosConfig {
    /// Search cluster configuration.
    #[serde(default)]
    pub search: SearchConfig,

    /// Language model configuration.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Chat session configuration.
    #[serde(default)]
    pub chat: ChatConfig,
}

/// Search cluster configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Cluster URL, e.g. `https://my-deployment.es.example.com:443`.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// API key sent as `Authorization: ApiKey <key>`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Inference endpoint that embeds the query server-side.
    #[serde(default = "default_inference_id")]
    pub inference_id: String,

    /// Indices to search, in query order.
    #[serde(default = "default_indices")]
    pub indices: Vec<IndexDescriptor>,

    /// Candidates per sub-retriever considered before fusion.
    #[serde(default = "default_documents_size")]
    pub rank_window_size: u32,

    /// Number of fused documents returned.
    #[serde(default = "default_documents_size")]
    pub size: u32,

    /// Matching chunks returned per document.
    #[serde(default = "default_inner_hits_size")]
    pub inner_hits_size: u32,

    /// RRF rank constant; the cluster default applies when unset.
    #[serde(default)]
    pub rank_constant: Option<u32>,

    /// Search request timeout in seconds.
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            inference_id: default_inference_id(),
            indices: default_indices(),
            rank_window_size: 100,
            size: 100,
            inner_hits_size: 2,
            rank_constant: None,
            timeout_secs: 10,
        }
    }
}

impl SearchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Build the index registry, validating every descriptor.
    pub fn registry(&self) -> Result<IndexRegistry> {
        IndexRegistry::new(self.indices.clone())
    }
}

/// Language model configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Region hosting the model runtime.
    #[serde(default = "default_region")]
    pub region: String,

    /// Runtime URL override; derived from the region when unset.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Bearer token for the runtime API.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model identifier.
    #[serde(default = "default_model_id")]
    pub model_id: String,

    /// Sampling temperature (0.0 to 1.0).
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Completion request timeout in seconds.
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            endpoint: None,
            api_key: None,
            model_id: default_model_id(),
            temperature: 0.7,
            max_tokens: 4096,
            timeout_secs: 120,
        }
    }
}

impl LlmConfig {
    /// Runtime base URL.
    pub fn endpoint(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://bedrock-runtime.{}.amazonaws.com", self.region),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Chat session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Synthetic assistant message that opens every session.
    #[serde(default = "default_greeting")]
    pub greeting: String,

    /// Path to the fixed instruction block.
    #[serde(default = "default_instructions_path")]
    pub instructions_path: PathBuf,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            greeting: default_greeting(),
            instructions_path: default_instructions_path(),
        }
    }
}

// Default value functions

fn default_inference_id() -> String {
    "hackathon".to_string()
}

fn default_indices() -> Vec<IndexDescriptor> {
    ["aa-postal_code", "opendata-chat"]
        .into_iter()
        .map(|name| IndexDescriptor {
            name: name.to_string(),
            semantic_fields: vec!["semantic_field".to_string()],
        })
        .collect()
}

fn default_documents_size() -> u32 {
    100
}

fn default_inner_hits_size() -> u32 {
    2
}

fn default_search_timeout() -> u64 {
    10
}

fn default_region() -> String {
    "us-west-2".to_string()
}

fn default_model_id() -> String {
    "anthropic.claude-3-5-sonnet-20240620-v1:0".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_llm_timeout() -> u64 {
    120
}

fn default_greeting() -> String {
    "How can I help you?".to_string()
}

fn default_instructions_path() -> PathBuf {
    PathBuf::from("prompts").join("instructions.txt")
}

/// Parse `name:field[+field..]` entries separated by commas.
fn parse_indices(spec: &str) -> Result<Vec<IndexDescriptor>> {
    spec.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (name, fields) = entry.split_once(':').ok_or_else(|| {
                HeliosError::config(format!(
                    "index entry '{}' must look like name:field[+field]",
                    entry
                ))
            })?;
            IndexDescriptor::new(
                name.trim(),
                fields.split('+').map(str::trim).filter(|f| !f.is_empty()),
            )
        })
        .collect()
}

impl HeliosConfig {
    /// Load configuration from file.
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| HeliosError::Config {
            message: format!("Failed to parse config: {}", e),
        })?;
        Ok(config)
    }

    /// Load configuration from default paths.
    pub fn load_default() -> Result<Self> {
        // Try user config first
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("helios").join("config.toml");
            if user_config.exists() {
                return Self::load(&user_config);
            }
        }

        // Try local config
        let local_config = PathBuf::from("helios.toml");
        if local_config.exists() {
            return Self::load(&local_config);
        }

        // Return defaults
        Ok(Self::default())
    }

    /// Override settings from process environment variables.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Override settings from an arbitrary variable lookup.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(endpoint) = var("ES_URL") {
            self.search.endpoint = Some(endpoint);
        }
        if let Some(key) = var("ES_API_KEY") {
            self.search.api_key = Some(key);
        }
        if let Some(inference_id) = var("HELIOS_INFERENCE_ID") {
            self.search.inference_id = inference_id;
        }
        if let Some(indices) = var("HELIOS_INDICES") {
            self.search.indices = parse_indices(&indices)?;
        }
        if let Some(region) = var("AWS_REGION") {
            self.llm.region = region;
        }
        if let Some(token) = var("AWS_BEARER_TOKEN_BEDROCK") {
            self.llm.api_key = Some(token);
        }
        if let Some(model_id) = var("HELIOS_MODEL_ID") {
            self.llm.model_id = model_id;
        }
        if let Some(path) = var("HELIOS_INSTRUCTIONS") {
            self.chat.instructions_path = PathBuf::from(path);
        }

        Ok(())
    }

    /// Check that everything needed to serve a turn is present.
    pub fn validate(&self) -> Result<()> {
        if self.search.endpoint.as_deref().map_or(true, |e| e.trim().is_empty()) {
            return Err(HeliosError::config(
                "search endpoint is not set (search.endpoint or ES_URL)",
            ));
        }
        if self.search.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            return Err(HeliosError::config(
                "search API key is not set (search.api_key or ES_API_KEY)",
            ));
        }
        if self.llm.region.trim().is_empty() {
            return Err(HeliosError::config("llm.region must not be empty"));
        }
        if self.llm.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            return Err(HeliosError::config(
                "model credential is not set (llm.api_key or AWS_BEARER_TOKEN_BEDROCK); \
                 AWS_ACCESS_KEY/AWS_SECRET_KEY key pairs are not read, \
                 create a Bedrock API key instead",
            ));
        }
        self.validate_query_settings()
    }

    /// Check the settings used to build search requests.
    ///
    /// Needs no credentials, so dry runs can check just this part.
    pub fn validate_query_settings(&self) -> Result<()> {
        self.search.registry()?;

        if self.search.inference_id.trim().is_empty() {
            return Err(HeliosError::config("search.inference_id must not be empty"));
        }
        if self.search.timeout_secs == 0 {
            return Err(HeliosError::config("search.timeout_secs must be at least 1"));
        }
        if self.llm.timeout_secs == 0 {
            return Err(HeliosError::config("llm.timeout_secs must be at least 1"));
        }
        if self.search.size == 0 {
            return Err(HeliosError::config("search.size must be at least 1"));
        }
        if self.search.rank_window_size < self.search.size {
            return Err(HeliosError::config(format!(
                "search.rank_window_size ({}) must be >= search.size ({})",
                self.search.rank_window_size, self.search.size
            )));
        }
        if !(0.0..=1.0).contains(&self.llm.temperature) {
            return Err(HeliosError::config(format!(
                "llm.temperature ({}) must be between 0.0 and 1.0",
                self.llm.temperature
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn complete_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("ES_URL", "https://search.example.com:443"),
            ("ES_API_KEY", "es-key"),
            ("AWS_BEARER_TOKEN_BEDROCK", "llm-token"),
        ])
    }

    #[test]
    fn test_default_config() {
        let config = HeliosConfig::default();
        assert_eq!(config.search.indices.len(), 2);
        assert_eq!(config.search.inference_id, "hackathon");
        assert_eq!(config.search.rank_window_size, 100);
        assert_eq!(config.search.inner_hits_size, 2);
        assert_eq!(config.search.timeout(), Duration::from_secs(10));
        assert_eq!(config.chat.greeting, "How can I help you?");
    }

    #[test]
    fn test_llm_endpoint_from_region() {
        let mut config = LlmConfig::default();
        assert_eq!(
            config.endpoint(),
            "https://bedrock-runtime.us-west-2.amazonaws.com"
        );

        config.endpoint = Some("http://localhost:9000/".to_string());
        assert_eq!(config.endpoint(), "http://localhost:9000");
    }

    #[test]
    fn test_defaults_fail_validation_without_credentials() {
        let err = HeliosConfig::default().validate().unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
        assert!(err.to_string().contains("ES_URL"));
    }

    #[test]
    fn test_env_overrides_complete_config() {
        let env = complete_env();
        let mut config = HeliosConfig::default();
        config
            .apply_env_with(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.search.api_key.as_deref(), Some("es-key"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_indices_parsing() {
        let mut config = HeliosConfig::default();
        config
            .apply_env_with(|key| {
                (key == "HELIOS_INDICES").then(|| "a:semantic_field, b:body+title".to_string())
            })
            .unwrap();

        let registry = config.search.registry().unwrap();
        assert_eq!(registry.names(), vec!["a", "b"]);
        assert_eq!(
            registry.get("b").unwrap().semantic_fields,
            vec!["body".to_string(), "title".to_string()]
        );
    }

    #[test]
    fn test_env_index_without_field_is_rejected() {
        let mut config = HeliosConfig::default();
        let result = config.apply_env_with(|key| {
            (key == "HELIOS_INDICES").then(|| "a:,b:semantic_field".to_string())
        });
        assert!(result.is_err());

        let result = config
            .apply_env_with(|key| (key == "HELIOS_INDICES").then(|| "a".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_window_smaller_than_size_is_rejected() {
        let mut config = HeliosConfig::default();
        config.search.rank_window_size = 10;
        config.search.size = 20;
        assert!(config.validate_query_settings().is_err());
    }

    #[test]
    fn test_zero_timeouts_are_rejected() {
        let mut config = HeliosConfig::default();
        config.search.timeout_secs = 0;
        let err = config.validate_query_settings().unwrap_err();
        assert!(err.to_string().contains("search.timeout_secs"));

        let mut config = HeliosConfig::default();
        config.llm.timeout_secs = 0;
        let err = config.validate_query_settings().unwrap_err();
        assert!(err.to_string().contains("llm.timeout_secs"));
    }

    #[test]
    fn test_missing_model_credential_names_key_pair() {
        let env = HashMap::from([
            ("ES_URL", "https://search.example.com:443"),
            ("ES_API_KEY", "es-key"),
            ("AWS_ACCESS_KEY", "AKIAEXAMPLE"),
            ("AWS_SECRET_KEY", "secret"),
        ]);
        let mut config = HeliosConfig::default();
        config
            .apply_env_with(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        let err = config.validate().unwrap_err();
        let text = err.to_string();
        assert!(text.contains("AWS_BEARER_TOKEN_BEDROCK"));
        assert!(text.contains("AWS_ACCESS_KEY"));
        assert!(text.contains("AWS_SECRET_KEY"));
    }

    #[test]
    fn test_env_file_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"# deployment secrets
ES_URL=https://search.example.com:443
ES_API_KEY="es-key"
AWS_BEARER_TOKEN_BEDROCK=llm-token
AWS_REGION=ap-southeast-1
"#
        )
        .unwrap();

        let vars: HashMap<String, String> = dotenvy::from_path_iter(file.path())
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap();

        let mut config = HeliosConfig::default();
        config
            .apply_env_with(|key| vars.get(key).cloned())
            .unwrap();

        assert_eq!(config.search.api_key.as_deref(), Some("es-key"));
        assert_eq!(config.llm.region, "ap-southeast-1");
        assert_eq!(
            config.llm.endpoint(),
            "https://bedrock-runtime.ap-southeast-1.amazonaws.com"
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[search]
endpoint = "https://search.example.com"
inference_id = "elser"
size = 20
rank_window_size = 50

[[search.indices]]
name = "docs"
semantic_fields = ["content"]

[llm]
temperature = 0.2
"#
        )
        .unwrap();

        let config = HeliosConfig::load(file.path()).unwrap();
        assert_eq!(config.search.inference_id, "elser");
        assert_eq!(config.search.indices.len(), 1);
        assert_eq!(config.search.indices[0].primary_field(), "content");
        assert_eq!(config.search.inner_hits_size, 2);
        assert_eq!(config.search.size, 20);
        assert!((config.llm.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.llm.max_tokens, 4096);
        assert!(config.validate_query_settings().is_ok());
    }

    #[test]
    fn test_load_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[search\nsize = ").unwrap();
        let err = HeliosConfig::load(file.path()).unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
    }
}
