use std::collections::VecDeque;
use std::fs;
use std::io::{self, Cursor};
use std::sync::Arc;

use async_trait::async_trait;
use autostream_agent::embedding::HashingEmbedder;
use autostream_agent::llm::{LlmClient, LlmError};
use autostream_agent::{assemble_runtime, AgentRuntime};
use autostream_cli::session::{ChatSession, LineSource, SessionSummary, BANNER, FAREWELL};
use autostream_core::config::AppConfig;
use autostream_store::CsvLeadRepository;
use tempfile::TempDir;
use tokio::runtime::Runtime;

struct Offline;

#[async_trait]
impl LlmClient for Offline {
    async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
        Err(LlmError::Unavailable("offline".to_string()))
    }
}

struct Fixture {
    _dir: TempDir,
    config: AppConfig,
    runtime: Runtime,
    agent: AgentRuntime,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().expect("tempdir");
    let kb_path = dir.path().join("knowledge_base.json");
    fs::write(
        &kb_path,
        r#"{"documents": [{"title": "Pricing", "content": "Pro plan: $79/month with 4K export."}]}"#,
    )
    .expect("write knowledge base");

    let mut config = AppConfig::default();
    config.knowledge_base.path = kb_path;
    config.leads.csv_path = dir.path().join("data").join("leads.csv");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime");
    let agent = runtime
        .block_on(assemble_runtime(
            &config,
            Arc::new(Offline),
            Arc::new(Offline),
            Arc::new(HashingEmbedder::new(64)),
            Arc::new(CsvLeadRepository::new(config.leads.csv_path.clone())),
        ))
        .expect("agent");

    Fixture { _dir: dir, config, runtime, agent }
}

fn drive(fixture: &mut Fixture, script: &str) -> (SessionSummary, String) {
    let mut session =
        ChatSession::new(&fixture.runtime, &mut fixture.agent, Cursor::new(script.to_string()), Vec::new());
    let summary = session.run().expect("session io");
    let transcript = String::from_utf8(session.into_output()).expect("utf8 transcript");
    (summary, transcript)
}

#[test]
fn signup_conversation_captures_a_validated_lead() {
    let mut fixture = fixture();
    let script = "hello\n\nI want to sign up for Pro\nAda\nada@example\nada@example.com\n\nYouTube\nleads\nquit\n";

    let (summary, transcript) = drive(&mut fixture, script);

    assert_eq!(summary, SessionSummary { messages: 2, leads_captured: 1 });
    assert!(transcript.starts_with(BANNER));
    assert!(transcript.contains("Assistant: Hello! I'm the AutoStream AI assistant."));
    assert!(transcript.contains("[Conversation turns: 1]"));
    assert!(transcript.contains("[Conversation turns: 2]"));
    assert!(transcript.contains("Please enter a valid email address (e.g., user@example.com)"));
    assert!(transcript.contains("Platform is required. Please specify your platform."));
    assert!(transcript.contains("Lead captured successfully!"));
    assert!(transcript.contains("Thank you, Ada!"));
    assert!(transcript.contains("Lead #1"));
    assert!(transcript.contains("Thank you for chatting with AutoStream!"));

    let csv = fs::read_to_string(&fixture.config.leads.csv_path).expect("csv written");
    let lines = csv.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "timestamp,name,email,platform");
    assert!(lines[1].ends_with(",Ada,ada@example.com,YouTube"));
}

#[test]
fn interrupted_lead_form_writes_nothing() {
    let mut fixture = fixture();

    let (summary, transcript) = drive(&mut fixture, "sign up please\nAda\n");

    assert_eq!(summary, SessionSummary { messages: 1, leads_captured: 0 });
    assert!(transcript.contains("Lead capture cancelled."));
    assert!(transcript.contains("Chat interrupted. Goodbye!"));
    assert!(!fixture.config.leads.csv_path.exists());
}

#[test]
fn clear_resets_the_turn_counter() {
    let mut fixture = fixture();

    let (summary, transcript) =
        drive(&mut fixture, "What does Pro cost?\nDo you offer 4K?\nCLEAR\nAny refunds?\nexit\n");

    assert_eq!(summary.messages, 3);
    assert!(transcript.contains("[Conversation turns: 2]"));
    assert!(transcript.contains("Conversation history cleared."));
    assert_eq!(transcript.matches("[Conversation turns: 1]").count(), 2);
    assert_eq!(fixture.agent.turn_count(), 1);
}

/// Typed lines where `None` stands for a ctrl-c at that prompt.
struct Keystrokes(VecDeque<Option<&'static str>>);

impl LineSource for Keystrokes {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        Ok(self.0.pop_front().flatten().map(str::to_string))
    }
}

#[test]
fn interrupt_during_lead_form_cancels_and_keeps_chatting() {
    let mut fixture = fixture();
    let keystrokes = Keystrokes(VecDeque::from([
        Some("I want to sign up"),
        Some("Ada"),
        None,
        Some("What does Pro cost?"),
        Some("quit"),
    ]));

    let mut session = ChatSession::new(&fixture.runtime, &mut fixture.agent, keystrokes, Vec::new());
    let summary = session.run().expect("session io");
    let transcript = String::from_utf8(session.into_output()).expect("utf8 transcript");

    assert_eq!(summary, SessionSummary { messages: 2, leads_captured: 0 });
    assert!(transcript.contains("Lead capture cancelled."));
    assert!(transcript.contains("[Conversation turns: 2]"));
    assert!(transcript.ends_with(&format!("{FAREWELL}\n")));
    assert!(!transcript.contains("Chat interrupted. Goodbye!"));
    assert!(!fixture.config.leads.csv_path.exists());
}
