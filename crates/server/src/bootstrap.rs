use std::sync::Arc;

use autostream_agent::{build_runtime, AgentRuntime, BootstrapError as AgentBootstrapError};
use autostream_core::config::{AppConfig, ConfigError};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;

/// The single conversation every request shares; the lock serializes turns.
pub type SharedAgent = Arc<Mutex<AgentRuntime>>;

pub struct Application {
    pub config: AppConfig,
    pub agent: SharedAgent,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("agent runtime failed to start: {0}")]
    Agent(#[from] AgentBootstrapError),
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let agent = build_runtime(&config).await?;
    info!(
        event_name = "system.bootstrap.agent_ready",
        correlation_id = "bootstrap",
        documents = agent.retriever().documents().len(),
        lead_store = %agent.lead_store_location(),
        "agent runtime initialized"
    );

    Ok(Application { config, agent: Arc::new(Mutex::new(agent)) })
}
