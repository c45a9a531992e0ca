//! Prompt templates for intent classification and the three response branches.
//!
//! Templates are registered once under names without an `.html` suffix, so tera
//! leaves user text unescaped.

use autostream_core::domain::conversation::Intent;
use serde::Serialize;
use tera::{Context, Tera};

pub const NO_HISTORY: &str = "No previous conversation.";
pub const NO_CONTEXT: &str = "No specific information found.";

const INTENT_TEMPLATE: &str = r#"You are an intent classifier for AutoStream, a video editing SaaS platform.

Analyze the user's message and classify it into ONE of these intents:
{% for intent in intents %}- {{ intent.name }}: {{ intent.description }}
{% endfor %}
Conversation Context:
{{ conversation_context }}

Current user message: "{{ user_message }}"

Respond with ONLY ONE WORD - the intent name: greeting, product_inquiry, or high_intent"#;

const GREETING_TEMPLATE: &str = r#"You are a friendly AI assistant for AutoStream, an automated video editing platform for content creators.

The user just greeted you: "{{ user_message }}"

Respond warmly and briefly introduce AutoStream's value proposition. Keep it short (1-2 sentences) and friendly."#;

const INQUIRY_TEMPLATE: &str = r#"You are a helpful assistant for AutoStream, an automated video editing platform.

Conversation History:
{{ chat_history }}

Knowledge Base Information:
{{ retrieved_context }}

User's Question: "{{ user_message }}"

Provide a helpful, accurate response (2-4 sentences) based on the retrieved information. Be conversational and focus on how AutoStream helps content creators."#;

const HIGH_INTENT_TEMPLATE: &str = r#"You are an enthusiastic sales assistant for AutoStream.

Conversation History:
{{ chat_history }}

The user has shown HIGH INTENT to sign up or try the product: "{{ user_message }}"

Respond enthusiastically (1-2 sentences) and let them know you'll help them get started by collecting a few details."#;

#[derive(Serialize)]
struct IntentOption {
    name: &'static str,
    description: &'static str,
}

pub struct PromptLibrary {
    tera: Tera,
}

impl PromptLibrary {
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            ("intent", INTENT_TEMPLATE),
            ("greeting", GREETING_TEMPLATE),
            ("inquiry", INQUIRY_TEMPLATE),
            ("high_intent", HIGH_INTENT_TEMPLATE),
        ])?;
        Ok(Self { tera })
    }

    pub fn render_intent(
        &self,
        user_message: &str,
        conversation_context: &str,
    ) -> Result<String, tera::Error> {
        let intents = Intent::ALL
            .iter()
            .map(|intent| IntentOption { name: intent.as_str(), description: intent.description() })
            .collect::<Vec<_>>();

        let mut context = Context::new();
        context.insert("intents", &intents);
        context.insert("conversation_context", conversation_context);
        context.insert("user_message", user_message);
        self.tera.render("intent", &context)
    }

    pub fn render_greeting(&self, user_message: &str) -> Result<String, tera::Error> {
        let mut context = Context::new();
        context.insert("user_message", user_message);
        self.tera.render("greeting", &context)
    }

    pub fn render_inquiry(
        &self,
        user_message: &str,
        retrieved_context: Option<&str>,
        chat_history: Option<&str>,
    ) -> Result<String, tera::Error> {
        let mut context = Context::new();
        context.insert("user_message", user_message);
        context.insert("retrieved_context", retrieved_context.unwrap_or(NO_CONTEXT));
        context.insert("chat_history", chat_history.unwrap_or(NO_HISTORY));
        self.tera.render("inquiry", &context)
    }

    pub fn render_high_intent(
        &self,
        user_message: &str,
        chat_history: Option<&str>,
    ) -> Result<String, tera::Error> {
        let mut context = Context::new();
        context.insert("user_message", user_message);
        context.insert("chat_history", chat_history.unwrap_or(NO_HISTORY));
        self.tera.render("high_intent", &context)
    }
}

#[cfg(test)]
mod tests {
    use super::{PromptLibrary, NO_CONTEXT, NO_HISTORY};

    fn library() -> PromptLibrary {
        PromptLibrary::new().expect("templates should compile")
    }

    #[test]
    fn intent_prompt_lists_every_intent_and_the_message() {
        let prompt = library()
            .render_intent("do you support 4K?", "No previous conversation.")
            .expect("render");

        assert!(prompt.contains("- greeting: Casual greeting or introduction\n"));
        assert!(prompt.contains("- product_inquiry: Product features"));
        assert!(prompt.contains("- high_intent: User is ready to sign up"));
        assert!(prompt.contains("Current user message: \"do you support 4K?\""));
    }

    #[test]
    fn inquiry_prompt_falls_back_to_placeholders() {
        let prompt = library().render_inquiry("refunds?", None, None).expect("render");
        assert!(prompt.contains(NO_CONTEXT));
        assert!(prompt.contains(NO_HISTORY));
    }

    #[test]
    fn user_text_is_not_html_escaped() {
        let prompt = library().render_greeting("hi <team> & \"friends\"").expect("render");
        assert!(prompt.contains("hi <team> & \"friends\""));
    }

    #[test]
    fn high_intent_prompt_embeds_history() {
        let history = "User: what is pro?\nAgent: Pro is $79/month.";
        let prompt = library().render_high_intent("sign me up", Some(history)).expect("render");
        assert!(prompt.contains(history));
        assert!(prompt.contains("\"sign me up\""));
    }
}
