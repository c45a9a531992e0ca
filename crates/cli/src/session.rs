//! Interactive chat loop over any line-oriented input and writer.

use std::fmt::Display;
use std::io::{self, BufRead, Write};

use autostream_agent::lead_capture::{collect_lead, CaptureOutcome, FieldPrompt, FieldPrompter};
use autostream_agent::AgentRuntime;
use autostream_core::domain::lead::{Lead, LeadValidationError};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::runtime::Runtime;
use tracing::{info, warn};

use crate::commands::leads::render_leads;

const RECEIPT_RULE: &str = "============================================================";

pub const BANNER: &str = "================================================================================
Welcome to AutoStream AI Assistant!
================================================================================

AutoStream - Automated Video Editing for Content Creators

I can help you with:
- Pricing and plan information
- Product features and capabilities
- Getting started with AutoStream
- Signing up for a trial or plan

Commands:
  'quit'  - Exit the chat
  'leads' - View captured leads
  'clear' - Reset conversation history
================================================================================
";

pub const FAREWELL: &str = "\nThank you for chatting with AutoStream! Have a great day!\n";
pub const INTERRUPTED: &str = "\n\nChat interrupted. Goodbye!\n";

#[derive(Clone, Debug, PartialEq, Eq)]
enum ChatInput {
    Quit,
    Leads,
    Clear,
    Message(String),
}

impl ChatInput {
    /// `None` for blank lines, which are skipped.
    fn parse(line: &str) -> Option<Self> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(match trimmed.to_lowercase().as_str() {
            "quit" | "exit" | "bye" => Self::Quit,
            "leads" => Self::Leads,
            "clear" => Self::Clear,
            _ => Self::Message(trimmed.to_string()),
        })
    }
}

/// Where typed lines come from. `Ok(None)` means the input ended or the user
/// interrupted; the chat loop exits on it, the lead form cancels.
pub trait LineSource {
    fn next_line(&mut self) -> io::Result<Option<String>>;
}

impl<R: BufRead> LineSource for R {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

/// Stdin raced against ctrl-c, so an interrupt ends the current prompt
/// instead of the process.
pub struct TerminalInput<'a> {
    runtime: &'a Runtime,
    lines: Lines<BufReader<Stdin>>,
}

impl<'a> TerminalInput<'a> {
    pub fn new(runtime: &'a Runtime) -> Self {
        Self { runtime, lines: BufReader::new(tokio::io::stdin()).lines() }
    }
}

impl LineSource for TerminalInput<'_> {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        let lines = &mut self.lines;
        self.runtime.block_on(async {
            tokio::select! {
                line = lines.next_line() => line,
                signal = tokio::signal::ctrl_c() => {
                    signal?;
                    info!(event_name = "cli.chat.interrupted", "ctrl-c received at prompt");
                    Ok(None)
                }
            }
        })
    }
}

/// Line reader plus writer; also answers the lead form.
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: LineSource, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// `Ok(None)` on end of input or interrupt.
    pub fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;
        self.input.next_line()
    }

    pub fn say(&mut self, text: impl Display) -> io::Result<()> {
        writeln!(self.output, "{text}")
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: LineSource, W: Write> FieldPrompter for Console<R, W> {
    fn introduce(&mut self, prompt: &FieldPrompt) {
        if let Some(hint) = prompt.hint {
            let _ = self.say(format!("\n{hint}"));
        }
    }

    fn ask(&mut self, prompt: &FieldPrompt) -> Option<String> {
        match self.read_line(prompt.label) {
            Ok(answer) => answer,
            Err(error) => {
                warn!(
                    event_name = "cli.lead_form.read_failed",
                    field = prompt.field.as_str(),
                    error = %error,
                    "could not read lead form input"
                );
                None
            }
        }
    }

    fn reject(&mut self, _prompt: &FieldPrompt, error: &LeadValidationError) {
        let _ = self.say(format!("  {error}"));
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub messages: usize,
    pub leads_captured: usize,
}

pub struct ChatSession<'a, R, W> {
    runtime: &'a Runtime,
    agent: &'a mut AgentRuntime,
    console: Console<R, W>,
}

impl<'a, R: LineSource, W: Write> ChatSession<'a, R, W> {
    pub fn new(runtime: &'a Runtime, agent: &'a mut AgentRuntime, input: R, output: W) -> Self {
        Self { runtime, agent, console: Console::new(input, output) }
    }

    pub fn run(&mut self) -> io::Result<SessionSummary> {
        self.console.say(BANNER)?;
        let mut summary = SessionSummary::default();

        loop {
            let Some(line) = self.console.read_line("You: ")? else {
                self.console.say(INTERRUPTED)?;
                break;
            };

            match ChatInput::parse(&line) {
                None => continue,
                Some(ChatInput::Quit) => {
                    self.console.say(FAREWELL)?;
                    break;
                }
                Some(ChatInput::Leads) => self.show_leads()?,
                Some(ChatInput::Clear) => {
                    self.agent.clear();
                    self.console.say("\nConversation history cleared.\n")?;
                }
                Some(ChatInput::Message(message)) => {
                    self.handle_message(&message, &mut summary)?;
                }
            }
        }

        Ok(summary)
    }

    pub fn into_output(self) -> W {
        self.console.into_output()
    }

    fn handle_message(&mut self, message: &str, summary: &mut SessionSummary) -> io::Result<()> {
        let reply = match self.runtime.block_on(self.agent.process_message(message)) {
            Ok(reply) => reply,
            Err(error) => {
                return self
                    .console
                    .say(format!("\nError processing message: {error}\nPlease try again.\n"));
            }
        };
        summary.messages += 1;

        self.console.say(format!("\nAssistant: {}\n", reply.response))?;
        self.console.say(format!("[Conversation turns: {}]", reply.turn_count))?;

        if reply.lead_capture_requested && self.capture_lead()? {
            summary.leads_captured += 1;
        }
        Ok(())
    }

    /// `Ok(true)` only when a complete lead was persisted.
    fn capture_lead(&mut self) -> io::Result<bool> {
        self.console.say("\nGreat! Let me collect a few details to get you started:\n")?;

        let lead = match collect_lead(&mut self.console) {
            Ok(CaptureOutcome::Captured(lead)) => lead,
            Ok(CaptureOutcome::Cancelled { .. }) => {
                self.console.say("\n  Lead capture cancelled.")?;
                return Ok(false);
            }
            Err(error) => {
                self.console.say(format!("  {error}"))?;
                return Ok(false);
            }
        };

        match self.runtime.block_on(self.agent.record_lead(&lead)) {
            Ok(()) => {
                let location = self.agent.lead_store_location();
                self.console.say(render_receipt(&lead, &location))?;
                Ok(true)
            }
            Err(error) => {
                self.console.say(format!("\nCould not save your details: {error}\n"))?;
                Ok(false)
            }
        }
    }

    fn show_leads(&mut self) -> io::Result<()> {
        match self.runtime.block_on(self.agent.leads()) {
            Ok(leads) => self.console.say(format!("\n{}\n", render_leads(&leads))),
            Err(error) => self.console.say(format!("\nCould not read leads: {error}\n")),
        }
    }
}

fn render_receipt(lead: &Lead, location: &str) -> String {
    [
        String::new(),
        RECEIPT_RULE.to_string(),
        "Lead captured successfully!".to_string(),
        RECEIPT_RULE.to_string(),
        format!("Name: {}", lead.name()),
        format!("Email: {}", lead.email()),
        format!("Creator Platform: {}", lead.platform()),
        RECEIPT_RULE.to_string(),
        String::new(),
        format!("Lead saved to {location}"),
        String::new(),
        format!("Thank you, {}!", lead.name()),
        format!(
            "Our team will contact you at {} shortly to help you get started with AutoStream!\n",
            lead.email()
        ),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use autostream_agent::lead_capture::{collect_lead, CaptureOutcome};

    use super::{ChatInput, Console};

    #[test]
    fn commands_are_case_insensitive_and_blank_lines_skip() {
        assert_eq!(ChatInput::parse("  QUIT "), Some(ChatInput::Quit));
        assert_eq!(ChatInput::parse("Bye"), Some(ChatInput::Quit));
        assert_eq!(ChatInput::parse("exit"), Some(ChatInput::Quit));
        assert_eq!(ChatInput::parse("Leads"), Some(ChatInput::Leads));
        assert_eq!(ChatInput::parse("CLEAR"), Some(ChatInput::Clear));
        assert_eq!(ChatInput::parse("   \t"), None);
        assert_eq!(
            ChatInput::parse(" clear my doubts "),
            Some(ChatInput::Message("clear my doubts".to_string()))
        );
    }

    #[test]
    fn console_lead_form_prints_platform_hint_once() {
        let input = Cursor::new("Ada\nada@example.com\n\nYouTube\n");
        let mut console = Console::new(input, Vec::new());

        let outcome = collect_lead(&mut console).expect("valid lead");
        assert!(matches!(outcome, CaptureOutcome::Captured(_)));

        let transcript = String::from_utf8(console.into_output()).expect("utf8");
        assert_eq!(transcript.matches("Which platform do you create content for?").count(), 1);
        assert!(transcript.contains("Platform is required. Please specify your platform."));
        assert_eq!(transcript.matches("Creator Platform: ").count(), 2);
    }

    #[test]
    fn end_of_input_cancels_the_form() {
        let mut console = Console::new(Cursor::new("Ada\n"), Vec::new());
        let outcome = collect_lead(&mut console).expect("no validation error");
        assert!(matches!(outcome, CaptureOutcome::Cancelled { .. }));
    }
}
