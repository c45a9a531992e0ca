use async_trait::async_trait;
use autostream_core::config::{GenerationConfig, LlmConfig};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Instruction markers some instruct models echo back into their output.
const INSTRUCTION_MARKERS: [&str; 4] = ["[INST]", "[/INST]", "<s>", "</s>"];

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("llm request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("llm endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("llm unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Hugging Face inference router, OpenAI-compatible chat completions.
pub struct HuggingFaceChatClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_token: SecretString,
    generation: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl HuggingFaceChatClient {
    pub fn new(http: reqwest::Client, config: &LlmConfig, generation: GenerationConfig) -> Self {
        Self {
            http,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            api_token: config.api_token.clone(),
            generation,
        }
    }
}

#[async_trait]
impl LlmClient for HuggingFaceChatClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: [ChatMessage { role: "user", content: prompt }],
            max_tokens: self.generation.max_new_tokens,
            temperature: self.generation.temperature,
            stream: false,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(self.api_token.expose_secret())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status { status: status.as_u16(), body: truncate(&body, 200) });
        }

        let payload: ChatCompletionResponse = response.json().await?;
        let content = payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        // An empty answer is still an answer; callers decide what it means.
        Ok(clean_completion(&content))
    }
}

/// Strips echoed instruction markers and surrounding whitespace.
pub fn clean_completion(raw: &str) -> String {
    let mut cleaned = raw.to_string();
    for marker in INSTRUCTION_MARKERS {
        cleaned = cleaned.replace(marker, "");
    }
    cleaned.trim().to_string()
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
