pub mod commands;
pub mod logging;
pub mod session;

use std::path::PathBuf;
use std::process::ExitCode;

use autostream_core::config::LoadOptions;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "autostream",
    about = "AutoStream sales assistant",
    long_about = "Chat with the AutoStream assistant, review captured leads, and inspect runtime readiness.",
    after_help = "Examples:\n  autostream\n  autostream leads --json\n  autostream doctor\n  autostream config"
)]
pub struct Cli {
    #[arg(long, global = true, value_name = "PATH", help = "Load configuration from this TOML file")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Start an interactive conversation (default)")]
    Chat,
    #[command(about = "List captured leads from the CSV store")]
    Leads {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Validate config, knowledge base, and lead storage readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    // A missing .env is normal; real env vars still apply.
    let _ = dotenvy::dotenv();

    let options = load_options(cli.config);
    let result = match cli.command.unwrap_or(Command::Chat) {
        Command::Chat => commands::chat::run(options),
        Command::Leads { json } => commands::leads::run(options, json),
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(options, json) }
        }
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run(options) }
        }
    };

    if !result.output.is_empty() {
        println!("{}", result.output);
    }
    ExitCode::from(result.exit_code)
}

fn load_options(config_path: Option<PathBuf>) -> LoadOptions {
    LoadOptions {
        require_file: config_path.is_some(),
        config_path,
        ..LoadOptions::default()
    }
}
