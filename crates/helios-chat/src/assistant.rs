//! Wiring the production clients into an orchestrator.

use std::sync::Arc;

use tracing::info;

use helios_core::{HeliosConfig, Result};
use helios_llm::BedrockClient;
use helios_query::{RetrievalConfig, Retriever};
use helios_search::ElasticsearchClient;

use crate::prompt::PromptTemplate;
use crate::session::Orchestrator;

/// Orchestrator backed by Elasticsearch and Bedrock.
pub type HeliosAssistant = Orchestrator<ElasticsearchClient, BedrockClient>;

/// Build a retriever against the configured search cluster.
pub fn connect_retriever(config: &HeliosConfig) -> Result<Retriever<ElasticsearchClient>> {
    let registry = Arc::new(config.search.registry()?);
    let backend = Arc::new(ElasticsearchClient::from_config(&config.search)?);
    Ok(Retriever::new(
        backend,
        registry,
        RetrievalConfig::from(&config.search),
    ))
}

/// Validate `config` and build a ready-to-use assistant.
///
/// Fails with a configuration error if any endpoint, credential or asset is
/// missing.
pub fn connect(config: &HeliosConfig) -> Result<HeliosAssistant> {
    config.validate()?;

    let retriever = connect_retriever(config)?;
    let model = Arc::new(BedrockClient::from_config(&config.llm)?);
    let template = PromptTemplate::load(&config.chat.instructions_path)?;

    info!(
        "Assistant ready: {} indices, model {}",
        retriever.registry().len(),
        config.llm.model_id
    );

    Ok(Orchestrator::new(retriever, model, template))
}
