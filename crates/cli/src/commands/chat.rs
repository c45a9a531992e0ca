use std::io;

use autostream_agent::build_runtime;
use autostream_core::config::{AppConfig, LoadOptions};
use tracing::info;

use super::{current_thread_runtime, CommandResult};
use crate::logging;
use crate::session::{ChatSession, TerminalInput};

pub fn run(options: LoadOptions) -> CommandResult {
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("chat", "config_validation", error.to_string(), 2);
        }
    };
    logging::init(&config.logging);

    let runtime = match current_thread_runtime() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "chat",
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                1,
            );
        }
    };

    let mut agent = match runtime.block_on(build_runtime(&config)) {
        Ok(agent) => agent,
        Err(error) => return CommandResult::failure("chat", "bootstrap", error.to_string(), 3),
    };

    let input = TerminalInput::new(&runtime);
    let stdout = io::stdout();
    let mut session = ChatSession::new(&runtime, &mut agent, input, stdout.lock());

    match session.run() {
        Ok(summary) => {
            info!(
                event_name = "cli.chat.finished",
                messages = summary.messages,
                leads_captured = summary.leads_captured,
                "chat session ended"
            );
            CommandResult::finished()
        }
        Err(error) => CommandResult::failure("chat", "terminal_io", error.to_string(), 1),
    }
}
