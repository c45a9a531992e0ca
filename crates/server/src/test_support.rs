use std::fs;
use std::sync::Arc;

use async_trait::async_trait;
use autostream_agent::embedding::HashingEmbedder;
use autostream_agent::llm::{LlmClient, LlmError};
use autostream_agent::{assemble_runtime, AgentRuntime};
use autostream_core::config::AppConfig;
use autostream_store::InMemoryLeadRepository;
use tempfile::TempDir;

pub struct Offline;

#[async_trait]
impl LlmClient for Offline {
    async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
        Err(LlmError::Unavailable("offline".to_string()))
    }
}

/// Offline runtime over a two-document corpus; keep the `TempDir` alive while it is used.
pub async fn offline_agent() -> (TempDir, AgentRuntime) {
    let dir = TempDir::new().expect("tempdir");
    let kb_path = dir.path().join("knowledge_base.json");
    fs::write(
        &kb_path,
        r#"{"documents": [
            {"title": "Pricing", "content": "Basic plan: $29/month. Pro plan: $79/month."},
            {"title": "Policies", "content": "No refunds after 7 days. 24/7 support on Pro only."}
        ]}"#,
    )
    .expect("write knowledge base");

    let mut config = AppConfig::default();
    config.knowledge_base.path = kb_path;

    let agent = assemble_runtime(
        &config,
        Arc::new(Offline),
        Arc::new(Offline),
        Arc::new(HashingEmbedder::new(64)),
        Arc::new(InMemoryLeadRepository::default()),
    )
    .await
    .expect("offline agent");

    (dir, agent)
}
