use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use autostream_core::config::{resolve_config_path, AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

/// One rendered setting: dotted key, display value, env vars that can set it.
struct Entry {
    key: &'static str,
    value: String,
    env_keys: &'static [&'static str],
}

pub fn run(options: LoadOptions) -> String {
    let config_file_path: Option<PathBuf> = resolve_config_path(options.config_path.as_deref());
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for entry in entries(&config) {
        let source = field_source(
            entry.key,
            entry.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(entry.key, &entry.value, source));
    }

    lines.join("\n")
}

fn entries(config: &AppConfig) -> Vec<Entry> {
    vec![
        Entry {
            key: "llm.api_token",
            value: redact_token(config.llm.api_token.expose_secret()),
            env_keys: &["AUTOSTREAM_LLM_API_TOKEN", "HF_TOKEN"],
        },
        Entry {
            key: "llm.base_url",
            value: config.llm.base_url.clone(),
            env_keys: &["AUTOSTREAM_LLM_BASE_URL"],
        },
        Entry {
            key: "llm.model",
            value: config.llm.model.clone(),
            env_keys: &["AUTOSTREAM_LLM_MODEL"],
        },
        Entry {
            key: "llm.timeout_secs",
            value: config.llm.timeout_secs.to_string(),
            env_keys: &["AUTOSTREAM_LLM_TIMEOUT_SECS"],
        },
        Entry {
            key: "llm.classifier_max_new_tokens",
            value: config.llm.classifier.max_new_tokens.to_string(),
            env_keys: &[],
        },
        Entry {
            key: "llm.classifier_temperature",
            value: config.llm.classifier.temperature.to_string(),
            env_keys: &[],
        },
        Entry {
            key: "llm.response_max_new_tokens",
            value: config.llm.response.max_new_tokens.to_string(),
            env_keys: &[],
        },
        Entry {
            key: "llm.response_temperature",
            value: config.llm.response.temperature.to_string(),
            env_keys: &[],
        },
        Entry {
            key: "embedding.provider",
            value: config.embedding.provider.as_str().to_string(),
            env_keys: &["AUTOSTREAM_EMBEDDING_PROVIDER"],
        },
        Entry {
            key: "embedding.base_url",
            value: config.embedding.base_url.clone(),
            env_keys: &["AUTOSTREAM_EMBEDDING_BASE_URL"],
        },
        Entry {
            key: "embedding.model",
            value: config.embedding.model.clone(),
            env_keys: &["AUTOSTREAM_EMBEDDING_MODEL"],
        },
        Entry {
            key: "embedding.dimensions",
            value: config.embedding.dimensions.to_string(),
            env_keys: &[],
        },
        Entry {
            key: "embedding.top_k",
            value: config.embedding.top_k.to_string(),
            env_keys: &["AUTOSTREAM_EMBEDDING_TOP_K"],
        },
        Entry {
            key: "knowledge_base.path",
            value: config.knowledge_base.path.display().to_string(),
            env_keys: &["AUTOSTREAM_KNOWLEDGE_BASE_PATH"],
        },
        Entry {
            key: "leads.csv_path",
            value: config.leads.csv_path.display().to_string(),
            env_keys: &["AUTOSTREAM_LEADS_CSV_PATH"],
        },
        Entry {
            key: "conversation.memory_window",
            value: config.conversation.memory_window.to_string(),
            env_keys: &[],
        },
        Entry {
            key: "conversation.prompt_window",
            value: config.conversation.prompt_window.to_string(),
            env_keys: &[],
        },
        Entry {
            key: "server.bind_address",
            value: config.server.bind_address.clone(),
            env_keys: &["AUTOSTREAM_SERVER_BIND_ADDRESS"],
        },
        Entry {
            key: "server.port",
            value: config.server.port.to_string(),
            env_keys: &["AUTOSTREAM_SERVER_PORT"],
        },
        Entry {
            key: "logging.level",
            value: config.logging.level.clone(),
            env_keys: &["AUTOSTREAM_LOGGING_LEVEL", "AUTOSTREAM_LOG_LEVEL"],
        },
        Entry {
            key: "logging.format",
            value: config.logging.format.as_str().to_string(),
            env_keys: &["AUTOSTREAM_LOGGING_FORMAT", "AUTOSTREAM_LOG_FORMAT"],
        },
    ]
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Keeps the `hf_` style prefix so the token kind stays recognisable.
fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('_') {
        return format!("{prefix}_***");
    }

    "<redacted>".to_string()
}

#[cfg(test)]
mod tests {
    use super::{contains_path, redact_token};

    #[test]
    fn tokens_keep_only_their_prefix() {
        assert_eq!(redact_token("hf_abcdef123"), "hf_***");
        assert_eq!(redact_token("opaque"), "<redacted>");
        assert_eq!(redact_token("  "), "<empty>");
    }

    #[test]
    fn nested_keys_are_found_in_toml() {
        let doc = "[llm]\nmodel = \"m\"\n".parse::<toml::Value>().expect("toml");
        assert!(contains_path(&doc, "llm.model"));
        assert!(!contains_path(&doc, "llm.base_url"));
        assert!(!contains_path(&doc, "server.port"));
    }
}
