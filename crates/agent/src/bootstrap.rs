use std::sync::Arc;
use std::time::Duration;

use autostream_core::config::{AppConfig, EmbeddingProvider};
use autostream_core::knowledge::{load_knowledge_base, KnowledgeBaseError};
use autostream_store::{CsvLeadRepository, LeadRepository};
use thiserror::Error;
use tracing::info;

use crate::embedding::{Embedder, EmbeddingError, HashingEmbedder, HuggingFaceEmbedder};
use crate::llm::{HuggingFaceChatClient, LlmClient};
use crate::prompts::PromptLibrary;
use crate::retrieval::Retriever;
use crate::runtime::{AgentParts, AgentRuntime};

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("http client could not be built: {0}")]
    HttpClient(#[source] reqwest::Error),
    #[error(transparent)]
    KnowledgeBase(#[from] KnowledgeBaseError),
    #[error("knowledge base could not be indexed: {0}")]
    Indexing(#[from] EmbeddingError),
    #[error("prompt templates failed to compile: {0}")]
    Templates(#[from] tera::Error),
}

/// Wires the hosted model clients, the knowledge base index and the CSV lead store.
pub async fn build_runtime(config: &AppConfig) -> Result<AgentRuntime, BootstrapError> {
    info!(
        event_name = "agent.bootstrap.start",
        model = %config.llm.model,
        embedding_provider = config.embedding.provider.as_str(),
        "building agent runtime"
    );

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.llm.timeout_secs))
        .build()
        .map_err(BootstrapError::HttpClient)?;

    let classifier_llm: Arc<dyn LlmClient> =
        Arc::new(HuggingFaceChatClient::new(http.clone(), &config.llm, config.llm.classifier));
    let response_llm: Arc<dyn LlmClient> =
        Arc::new(HuggingFaceChatClient::new(http.clone(), &config.llm, config.llm.response));

    let embedder: Arc<dyn Embedder> = match config.embedding.provider {
        EmbeddingProvider::HuggingFace => {
            Arc::new(HuggingFaceEmbedder::new(http, &config.embedding, &config.llm))
        }
        EmbeddingProvider::Hashing => Arc::new(HashingEmbedder::new(config.embedding.dimensions)),
    };

    let leads: Arc<dyn LeadRepository> =
        Arc::new(CsvLeadRepository::new(config.leads.csv_path.clone()));

    assemble_runtime(config, classifier_llm, response_llm, embedder, leads).await
}

/// Shared tail of bootstrap; takes pre-built clients so callers can substitute them.
pub async fn assemble_runtime(
    config: &AppConfig,
    classifier_llm: Arc<dyn LlmClient>,
    response_llm: Arc<dyn LlmClient>,
    embedder: Arc<dyn Embedder>,
    leads: Arc<dyn LeadRepository>,
) -> Result<AgentRuntime, BootstrapError> {
    let documents = load_knowledge_base(&config.knowledge_base.path)?;
    info!(
        event_name = "agent.bootstrap.knowledge_base_loaded",
        path = %config.knowledge_base.path.display(),
        documents = documents.len(),
        "knowledge base loaded"
    );

    let retriever = Retriever::build(documents, embedder, config.embedding.top_k).await?;
    let prompts = Arc::new(PromptLibrary::new()?);

    let runtime = AgentRuntime::new(AgentParts {
        classifier_llm,
        response_llm,
        prompts,
        retriever: Arc::new(retriever),
        leads,
        memory_window: config.conversation.memory_window,
        prompt_window: config.conversation.prompt_window,
    });

    info!(
        event_name = "agent.bootstrap.ready",
        lead_store = %runtime.lead_store_location(),
        "agent runtime ready"
    );
    Ok(runtime)
}
