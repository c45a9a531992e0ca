use std::path::Path;

use autostream_core::config::{AppConfig, EmbeddingProvider, LoadOptions};
use autostream_core::knowledge::load_knowledge_base;
use autostream_store::{CsvLeadRepository, LeadRepository};
use serde::Serialize;

use super::current_thread_runtime;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(options: LoadOptions, json_output: bool) -> String {
    let report = build_report(options);

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report(options: LoadOptions) -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(options.clone()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_embedding_provider(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
        }
    }

    // Storage checks only need paths, so they still run when the token is missing.
    match AppConfig::load_unvalidated(options) {
        Ok(config) => {
            checks.push(check_knowledge_base(&config.knowledge_base.path));
            checks.push(check_lead_storage(&config.leads.csv_path));
        }
        Err(_) => {
            for name in ["knowledge_base", "lead_storage"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_embedding_provider(config: &AppConfig) -> DoctorCheck {
    let details = match config.embedding.provider {
        EmbeddingProvider::HuggingFace => format!(
            "remote embeddings via `{}` (top_k = {})",
            config.embedding.model, config.embedding.top_k
        ),
        EmbeddingProvider::Hashing => format!(
            "offline feature hashing, {} dimensions (top_k = {})",
            config.embedding.dimensions, config.embedding.top_k
        ),
    };
    DoctorCheck { name: "embedding_provider", status: CheckStatus::Pass, details }
}

fn check_knowledge_base(path: &Path) -> DoctorCheck {
    match load_knowledge_base(path) {
        Ok(documents) if documents.is_empty() => DoctorCheck {
            name: "knowledge_base",
            status: CheckStatus::Fail,
            details: format!("`{}` contains no documents", path.display()),
        },
        Ok(documents) => DoctorCheck {
            name: "knowledge_base",
            status: CheckStatus::Pass,
            details: format!("{} documents loaded from `{}`", documents.len(), path.display()),
        },
        Err(error) => {
            DoctorCheck { name: "knowledge_base", status: CheckStatus::Fail, details: error.to_string() }
        }
    }
}

fn check_lead_storage(path: &Path) -> DoctorCheck {
    let runtime = match current_thread_runtime() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck {
                name: "lead_storage",
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            };
        }
    };

    let repository = CsvLeadRepository::new(path);
    match runtime.block_on(repository.list()) {
        Ok(leads) if path.exists() => DoctorCheck {
            name: "lead_storage",
            status: CheckStatus::Pass,
            details: format!("{} leads readable at `{}`", leads.len(), repository.location()),
        },
        Ok(_) => DoctorCheck {
            name: "lead_storage",
            status: CheckStatus::Pass,
            details: format!("`{}` will be created on first capture", repository.location()),
        },
        Err(error) => {
            DoctorCheck { name: "lead_storage", status: CheckStatus::Fail, details: error.to_string() }
        }
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
