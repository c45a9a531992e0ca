//! Conversational sales agent for AutoStream.
//!
//! Each message runs through a fixed pipeline:
//! 1. **Intent** (`intent`) - hosted model classification with keyword fallback
//! 2. **Retrieval** (`retrieval`) - top-k knowledge base passages for product questions
//! 3. **Response** (`responder`) - one prompt template per intent, fixed text on failure
//! 4. **Lead form** (`lead_capture`) - validated name, email and platform on high intent
//!
//! `AgentRuntime` owns the conversation memory and the lead repository handle;
//! `bootstrap::build_runtime` wires it from an `AppConfig`.

pub mod bootstrap;
pub mod conversation;
pub mod embedding;
pub mod intent;
pub mod lead_capture;
pub mod llm;
pub mod prompts;
pub mod responder;
pub mod retrieval;
pub mod runtime;

pub use bootstrap::{assemble_runtime, build_runtime, BootstrapError};
pub use runtime::{AgentError, AgentReply, AgentRuntime};
