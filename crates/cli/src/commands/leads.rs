use autostream_core::config::{AppConfig, LoadOptions};
use autostream_core::domain::lead::Lead;
use autostream_store::{CsvLeadRepository, LeadRepository};
use serde::Serialize;

use super::{current_thread_runtime, CommandResult};

const RULE: &str =
    "================================================================================";

#[derive(Debug, Serialize)]
struct LeadsReport<'a> {
    location: String,
    count: usize,
    leads: &'a [Lead],
}

/// Reads the CSV store directly; no API token is needed to list leads.
pub fn run(options: LoadOptions, json_output: bool) -> CommandResult {
    let config = match AppConfig::load_unvalidated(options) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("leads", "config_validation", error.to_string(), 2);
        }
    };

    let runtime = match current_thread_runtime() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "leads",
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                1,
            );
        }
    };

    let repository = CsvLeadRepository::new(config.leads.csv_path.clone());
    let leads = match runtime.block_on(repository.list()) {
        Ok(leads) => leads,
        Err(error) => return CommandResult::failure("leads", "lead_store", error.to_string(), 4),
    };

    let output = if json_output {
        let report = LeadsReport { location: repository.location(), count: leads.len(), leads: &leads };
        match serde_json::to_string_pretty(&report) {
            Ok(output) => output,
            Err(error) => {
                return CommandResult::failure("leads", "serialization", error.to_string(), 1);
            }
        }
    } else {
        render_leads(&leads)
    };

    CommandResult { exit_code: 0, output }
}

pub fn render_leads(leads: &[Lead]) -> String {
    if leads.is_empty() {
        return "No leads captured yet.".to_string();
    }

    let mut lines = vec![RULE.to_string(), "CAPTURED LEADS - AUTOSTREAM".to_string(), RULE.to_string()];
    for (index, lead) in leads.iter().enumerate() {
        lines.push(String::new());
        lines.push(format!("Lead #{}", index + 1));
        lines.push(format!("  Timestamp: {}", lead.formatted_timestamp()));
        lines.push(format!("  Name: {}", lead.name()));
        lines.push(format!("  Email: {}", lead.email()));
        lines.push(format!("  Platform: {}", lead.platform()));
    }
    lines.push(String::new());
    lines.push(RULE.to_string());

    lines.join("\n")
}
