use std::sync::Arc;

use autostream_core::domain::conversation::Intent;
use tracing::{debug, warn};

use crate::llm::LlmClient;
use crate::prompts::PromptLibrary;

const GREETING_KEYWORDS: [&str; 7] =
    ["hi", "hello", "hey", "greetings", "good morning", "good afternoon", "good evening"];

const HIGH_INTENT_KEYWORDS: [&str; 10] = [
    "sign up",
    "signup",
    "register",
    "want to try",
    "get started",
    "i want",
    "i'd like",
    "purchase",
    "buy",
    "subscribe",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClassificationSource {
    /// Model output named an intent.
    Model,
    /// Model answered but named no intent.
    ModelDefault,
    /// Model call failed; keyword rules decided.
    KeywordFallback,
}

impl ClassificationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::ModelDefault => "model_default",
            Self::KeywordFallback => "keyword_fallback",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Classification {
    pub intent: Intent,
    pub source: ClassificationSource,
}

pub struct IntentClassifier {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptLibrary>,
}

impl IntentClassifier {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: Arc<PromptLibrary>) -> Self {
        Self { llm, prompts }
    }

    /// Single attempt against the model; any failure drops to keyword rules.
    pub async fn classify(&self, user_message: &str, conversation_context: &str) -> Classification {
        let prompt = match self.prompts.render_intent(user_message, conversation_context) {
            Ok(prompt) => prompt,
            Err(error) => {
                warn!(
                    event_name = "intent.prompt.render_failed",
                    error = %error,
                    "intent prompt could not be rendered; using keyword rules"
                );
                return fallback(user_message);
            }
        };

        match self.llm.complete(&prompt).await {
            Ok(output) => {
                let classification = parse_model_output(&output);
                debug!(
                    event_name = "intent.classified",
                    intent = classification.intent.as_str(),
                    source = classification.source.as_str(),
                    "intent classified by model"
                );
                classification
            }
            Err(error) => {
                warn!(
                    event_name = "intent.model.failed",
                    error = %error,
                    "intent model unavailable; using keyword rules"
                );
                fallback(user_message)
            }
        }
    }
}

fn fallback(user_message: &str) -> Classification {
    Classification {
        intent: keyword_intent(user_message),
        source: ClassificationSource::KeywordFallback,
    }
}

/// First intent (in declaration order) whose name appears in the model output.
pub fn parse_model_output(output: &str) -> Classification {
    let lowered = output.to_lowercase();
    match Intent::ALL.into_iter().find(|intent| lowered.contains(intent.as_str())) {
        Some(intent) => Classification { intent, source: ClassificationSource::Model },
        None => Classification {
            intent: Intent::ProductInquiry,
            source: ClassificationSource::ModelDefault,
        },
    }
}

/// Greeting keywords win over high-intent keywords; everything else is an inquiry.
///
/// Keywords match anywhere in the lowercased message, so "Hellooo" greets and
/// "signups" signals intent.
pub fn keyword_intent(user_message: &str) -> Intent {
    let lowered = user_message.to_lowercase().replace('\u{2019}', "'");
    if contains_any(&lowered, &GREETING_KEYWORDS) {
        Intent::Greeting
    } else if contains_any(&lowered, &HIGH_INTENT_KEYWORDS) {
        Intent::HighIntent
    } else {
        Intent::ProductInquiry
    }
}

fn contains_any(lowered: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| lowered.contains(keyword))
}
