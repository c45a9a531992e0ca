use std::sync::Arc;

use autostream_core::domain::conversation::Intent;
use tracing::warn;

use crate::llm::{clean_completion, LlmClient};
use crate::prompts::PromptLibrary;
use crate::retrieval::RetrievedContext;

pub const GREETING_FALLBACK: &str = "Hello! I'm the AutoStream AI assistant. I can help you learn about our automated video editing platform for content creators. What would you like to know?";
pub const HIGH_INTENT_FALLBACK: &str = "That's fantastic! I'd love to help you get started with AutoStream. Let me collect a few details to set up your account.";
pub const APOLOGY_FALLBACK: &str = "I apologize, but I'm having trouble responding right now. Please try asking your question again.";

const CONTEXT_PREVIEW_CHARS: usize = 300;

/// Everything a template may draw on besides the intent itself.
#[derive(Clone, Copy, Debug, Default)]
pub struct ResponseInputs<'a> {
    pub user_message: &'a str,
    pub chat_history: Option<&'a str>,
    pub context: Option<&'a RetrievedContext>,
}

pub struct ResponseGenerator {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptLibrary>,
}

impl ResponseGenerator {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: Arc<PromptLibrary>) -> Self {
        Self { llm, prompts }
    }

    pub async fn respond(&self, intent: Intent, inputs: ResponseInputs<'_>) -> String {
        let context_text = inputs
            .context
            .filter(|context| !context.is_empty())
            .map(RetrievedContext::as_prompt_text);

        let rendered = match intent {
            Intent::Greeting => self.prompts.render_greeting(inputs.user_message),
            Intent::ProductInquiry => self.prompts.render_inquiry(
                inputs.user_message,
                context_text.as_deref(),
                inputs.chat_history,
            ),
            Intent::HighIntent => {
                self.prompts.render_high_intent(inputs.user_message, inputs.chat_history)
            }
        };

        let prompt = match rendered {
            Ok(prompt) => prompt,
            Err(error) => {
                warn!(
                    event_name = "response.prompt.render_failed",
                    intent = intent.as_str(),
                    error = %error,
                    "response prompt could not be rendered"
                );
                return fallback_response(intent, context_text.as_deref());
            }
        };

        match self.llm.complete(&prompt).await.map(|raw| clean_completion(&raw)) {
            Ok(response) if !response.is_empty() => response,
            Ok(_) => fallback_response(intent, context_text.as_deref()),
            Err(error) => {
                warn!(
                    event_name = "response.model.failed",
                    intent = intent.as_str(),
                    error = %error,
                    "response model unavailable; using fallback text"
                );
                fallback_response(intent, context_text.as_deref())
            }
        }
    }
}

pub fn fallback_response(intent: Intent, context_text: Option<&str>) -> String {
    match intent {
        Intent::Greeting => GREETING_FALLBACK.to_string(),
        Intent::HighIntent => HIGH_INTENT_FALLBACK.to_string(),
        Intent::ProductInquiry => match context_text.filter(|text| !text.is_empty()) {
            Some(text) => {
                let preview = text.chars().take(CONTEXT_PREVIEW_CHARS).collect::<String>();
                format!("Based on our documentation: {preview}...")
            }
            None => APOLOGY_FALLBACK.to_string(),
        },
    }
}
