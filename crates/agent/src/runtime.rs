use std::sync::Arc;

use autostream_core::domain::conversation::{ConversationTurn, Intent};
use autostream_core::domain::lead::Lead;
use autostream_store::{LeadRepository, RepositoryError};
use thiserror::Error;
use tracing::{info, warn};

use crate::conversation::ConversationMemory;
use crate::intent::{ClassificationSource, IntentClassifier};
use crate::llm::LlmClient;
use crate::prompts::PromptLibrary;
use crate::responder::{ResponseGenerator, ResponseInputs};
use crate::retrieval::{RetrievedContext, Retriever};

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("message must not be empty")]
    EmptyMessage,
    #[error("lead repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Everything the runtime needs, already built.
pub struct AgentParts {
    pub classifier_llm: Arc<dyn LlmClient>,
    pub response_llm: Arc<dyn LlmClient>,
    pub prompts: Arc<PromptLibrary>,
    pub retriever: Arc<Retriever>,
    pub leads: Arc<dyn LeadRepository>,
    pub memory_window: usize,
    pub prompt_window: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AgentReply {
    pub response: String,
    pub intent: Intent,
    pub classification_source: ClassificationSource,
    pub turn_count: usize,
    pub lead_capture_requested: bool,
    /// Titles of the knowledge base documents the answer was grounded on.
    pub sources: Vec<String>,
}

pub struct AgentRuntime {
    classifier: IntentClassifier,
    responder: ResponseGenerator,
    retriever: Arc<Retriever>,
    leads: Arc<dyn LeadRepository>,
    memory: ConversationMemory,
}

impl AgentRuntime {
    pub fn new(parts: AgentParts) -> Self {
        Self {
            classifier: IntentClassifier::new(parts.classifier_llm, parts.prompts.clone()),
            responder: ResponseGenerator::new(parts.response_llm, parts.prompts),
            retriever: parts.retriever,
            leads: parts.leads,
            memory: ConversationMemory::new(parts.memory_window, parts.prompt_window),
        }
    }

    pub async fn process_message(&mut self, user_message: &str) -> Result<AgentReply, AgentError> {
        let user_message = user_message.trim();
        if user_message.is_empty() {
            return Err(AgentError::EmptyMessage);
        }

        let classification =
            self.classifier.classify(user_message, &self.memory.classifier_context()).await;
        let intent = classification.intent;

        let context = if intent == Intent::ProductInquiry {
            self.retrieve(user_message).await
        } else {
            RetrievedContext::default()
        };

        let chat_history = self.memory.transcript();
        let response = self
            .responder
            .respond(
                intent,
                ResponseInputs {
                    user_message,
                    chat_history: chat_history.as_deref(),
                    context: Some(&context),
                },
            )
            .await;

        self.memory.record(user_message, intent, &response);

        info!(
            event_name = "agent.turn.completed",
            intent = intent.as_str(),
            source = classification.source.as_str(),
            turn_count = self.memory.turn_count(),
            retrieved = context.documents.len(),
            "conversation turn processed"
        );

        Ok(AgentReply {
            response,
            intent,
            classification_source: classification.source,
            turn_count: self.memory.turn_count(),
            lead_capture_requested: intent.is_high_intent(),
            sources: context.titles(),
        })
    }

    async fn retrieve(&self, query: &str) -> RetrievedContext {
        match self.retriever.retrieve(query).await {
            Ok(context) => context,
            Err(error) => {
                warn!(
                    event_name = "retrieval.query.failed",
                    error = %error,
                    "query embedding failed; answering without knowledge base context"
                );
                RetrievedContext::default()
            }
        }
    }

    pub fn clear(&mut self) {
        self.memory.clear();
        info!(event_name = "agent.conversation.cleared", "conversation history cleared");
    }

    pub fn turn_count(&self) -> usize {
        self.memory.turn_count()
    }

    pub fn recent_turns(&self) -> Vec<ConversationTurn> {
        self.memory.turns().cloned().collect()
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub async fn record_lead(&self, lead: &Lead) -> Result<(), AgentError> {
        self.leads.append(lead).await?;
        info!(
            event_name = "lead.captured",
            platform = lead.platform(),
            location = %self.leads.location(),
            "lead persisted"
        );
        Ok(())
    }

    pub async fn leads(&self) -> Result<Vec<Lead>, AgentError> {
        Ok(self.leads.list().await?)
    }

    pub fn lead_store_location(&self) -> String {
        self.leads.location()
    }
}
