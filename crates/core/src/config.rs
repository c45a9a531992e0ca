use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Value shipped in the `.env` template; treated the same as a missing token.
pub const PLACEHOLDER_TOKEN: &str = "your_huggingface_token_here";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub knowledge_base: KnowledgeBaseConfig,
    pub leads: LeadsConfig,
    pub conversation: ConversationConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub api_token: SecretString,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub classifier: GenerationConfig,
    pub response: GenerationConfig,
}

/// Sampling settings for one kind of completion.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GenerationConfig {
    pub max_new_tokens: u32,
    pub temperature: f32,
}

#[derive(Clone, Debug)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub base_url: String,
    pub model: String,
    pub dimensions: usize,
    pub top_k: usize,
}

#[derive(Clone, Debug)]
pub struct KnowledgeBaseConfig {
    pub path: PathBuf,
}

#[derive(Clone, Debug)]
pub struct LeadsConfig {
    pub csv_path: PathBuf,
}

#[derive(Clone, Debug)]
pub struct ConversationConfig {
    pub memory_window: usize,
    pub prompt_window: usize,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProvider {
    #[serde(alias = "huggingface")]
    HuggingFace,
    Hashing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub api_token: Option<String>,
    pub llm_model: Option<String>,
    pub embedding_provider: Option<EmbeddingProvider>,
    pub knowledge_base_path: Option<PathBuf>,
    pub leads_csv_path: Option<PathBuf>,
    pub server_port: Option<u16>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                api_token: String::new().into(),
                base_url: "https://router.huggingface.co/v1".to_string(),
                model: "mistralai/Mistral-7B-Instruct-v0.2".to_string(),
                timeout_secs: 30,
                classifier: GenerationConfig { max_new_tokens: 50, temperature: 0.1 },
                response: GenerationConfig { max_new_tokens: 250, temperature: 0.7 },
            },
            embedding: EmbeddingConfig {
                provider: EmbeddingProvider::HuggingFace,
                base_url: "https://router.huggingface.co/hf-inference/models".to_string(),
                model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
                dimensions: 384,
                top_k: 2,
            },
            knowledge_base: KnowledgeBaseConfig {
                path: PathBuf::from("config/knowledge_base.json"),
            },
            leads: LeadsConfig { csv_path: PathBuf::from("data/leads.csv") },
            conversation: ConversationConfig { memory_window: 5, prompt_window: 2 },
            server: ServerConfig { bind_address: "127.0.0.1".to_string(), port: 8080 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl EmbeddingProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HuggingFace => "huggingface",
            Self::Hashing => "hashing",
        }
    }
}

impl std::str::FromStr for EmbeddingProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "huggingface" | "hugging_face" => Ok(Self::HuggingFace),
            "hashing" => Ok(Self::Hashing),
            other => Err(ConfigError::Validation(format!(
                "unsupported embedding provider `{other}` (expected huggingface|hashing)"
            ))),
        }
    }
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let config = Self::load_unvalidated(options)?;
        config.validate()?;
        Ok(config)
    }

    /// Layers defaults, file, env and overrides without running validation.
    /// Used by read-only commands that do not need an API token.
    pub fn load_unvalidated(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from("autostream.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(llm) = patch.llm {
            if let Some(llm_api_token_value) = llm.api_token {
                self.llm.api_token = secret_value(llm_api_token_value);
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = base_url;
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
            if let Some(max_new_tokens) = llm.classifier_max_new_tokens {
                self.llm.classifier.max_new_tokens = max_new_tokens;
            }
            if let Some(temperature) = llm.classifier_temperature {
                self.llm.classifier.temperature = temperature;
            }
            if let Some(max_new_tokens) = llm.response_max_new_tokens {
                self.llm.response.max_new_tokens = max_new_tokens;
            }
            if let Some(temperature) = llm.response_temperature {
                self.llm.response.temperature = temperature;
            }
        }

        if let Some(embedding) = patch.embedding {
            if let Some(provider) = embedding.provider {
                self.embedding.provider = provider;
            }
            if let Some(base_url) = embedding.base_url {
                self.embedding.base_url = base_url;
            }
            if let Some(model) = embedding.model {
                self.embedding.model = model;
            }
            if let Some(dimensions) = embedding.dimensions {
                self.embedding.dimensions = dimensions;
            }
            if let Some(top_k) = embedding.top_k {
                self.embedding.top_k = top_k;
            }
        }

        if let Some(path) = patch.knowledge_base.and_then(|kb| kb.path) {
            self.knowledge_base.path = path;
        }

        if let Some(csv_path) = patch.leads.and_then(|leads| leads.csv_path) {
            self.leads.csv_path = csv_path;
        }

        if let Some(conversation) = patch.conversation {
            if let Some(memory_window) = conversation.memory_window {
                self.conversation.memory_window = memory_window;
            }
            if let Some(prompt_window) = conversation.prompt_window {
                self.conversation.prompt_window = prompt_window;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        let api_token = read_env("AUTOSTREAM_LLM_API_TOKEN").or_else(|| read_env("HF_TOKEN"));
        if let Some(value) = api_token {
            self.llm.api_token = secret_value(value);
        }
        if let Some(value) = read_env("AUTOSTREAM_LLM_BASE_URL") {
            self.llm.base_url = value;
        }
        if let Some(value) = read_env("AUTOSTREAM_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("AUTOSTREAM_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("AUTOSTREAM_LLM_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("AUTOSTREAM_EMBEDDING_PROVIDER") {
            self.embedding.provider = value.parse()?;
        }
        if let Some(value) = read_env("AUTOSTREAM_EMBEDDING_BASE_URL") {
            self.embedding.base_url = value;
        }
        if let Some(value) = read_env("AUTOSTREAM_EMBEDDING_MODEL") {
            self.embedding.model = value;
        }
        if let Some(value) = read_env("AUTOSTREAM_EMBEDDING_TOP_K") {
            self.embedding.top_k = parse_usize("AUTOSTREAM_EMBEDDING_TOP_K", &value)?;
        }

        if let Some(value) = read_env("AUTOSTREAM_KNOWLEDGE_BASE_PATH") {
            self.knowledge_base.path = PathBuf::from(value);
        }
        if let Some(value) = read_env("AUTOSTREAM_LEADS_CSV_PATH") {
            self.leads.csv_path = PathBuf::from(value);
        }

        if let Some(value) = read_env("AUTOSTREAM_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("AUTOSTREAM_SERVER_PORT") {
            self.server.port = parse_u16("AUTOSTREAM_SERVER_PORT", &value)?;
        }

        let log_level =
            read_env("AUTOSTREAM_LOGGING_LEVEL").or_else(|| read_env("AUTOSTREAM_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("AUTOSTREAM_LOGGING_FORMAT").or_else(|| read_env("AUTOSTREAM_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(api_token) = overrides.api_token {
            self.llm.api_token = secret_value(api_token);
        }
        if let Some(llm_model) = overrides.llm_model {
            self.llm.model = llm_model;
        }
        if let Some(provider) = overrides.embedding_provider {
            self.embedding.provider = provider;
        }
        if let Some(path) = overrides.knowledge_base_path {
            self.knowledge_base.path = path;
        }
        if let Some(path) = overrides.leads_csv_path {
            self.leads.csv_path = path;
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_llm(&self.llm)?;
        validate_embedding(&self.embedding)?;
        validate_conversation(&self.conversation)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// Searches the explicit path, then `autostream.toml`, then `config/autostream.toml`.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("autostream.toml"), PathBuf::from("config/autostream.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    let token = llm.api_token.expose_secret().trim();
    if token.is_empty() {
        return Err(ConfigError::Validation(
            "llm.api_token is required. Set HF_TOKEN in the environment or .env file. Get a token from https://huggingface.co/settings/tokens".to_string(),
        ));
    }
    if token == PLACEHOLDER_TOKEN {
        return Err(ConfigError::Validation(
            "llm.api_token still holds the .env template placeholder. Replace it with a real token from https://huggingface.co/settings/tokens".to_string(),
        ));
    }
    if token.chars().any(char::is_whitespace) {
        return Err(ConfigError::Validation(
            "llm.api_token must not contain whitespace".to_string(),
        ));
    }

    validate_http_url("llm.base_url", &llm.base_url)?;

    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    for (name, generation) in [("classifier", llm.classifier), ("response", llm.response)] {
        if generation.max_new_tokens == 0 {
            return Err(ConfigError::Validation(format!(
                "llm.{name}_max_new_tokens must be greater than zero"
            )));
        }
        if !(0.0..=2.0).contains(&generation.temperature) {
            return Err(ConfigError::Validation(format!(
                "llm.{name}_temperature must be in range 0.0..=2.0"
            )));
        }
    }

    Ok(())
}

fn validate_embedding(embedding: &EmbeddingConfig) -> Result<(), ConfigError> {
    if embedding.top_k == 0 {
        return Err(ConfigError::Validation(
            "embedding.top_k must be greater than zero".to_string(),
        ));
    }

    match embedding.provider {
        EmbeddingProvider::HuggingFace => {
            validate_http_url("embedding.base_url", &embedding.base_url)?;
            if embedding.model.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "embedding.model is required for the huggingface provider".to_string(),
                ));
            }
        }
        EmbeddingProvider::Hashing => {
            if embedding.dimensions == 0 {
                return Err(ConfigError::Validation(
                    "embedding.dimensions must be greater than zero for the hashing provider"
                        .to_string(),
                ));
            }
        }
    }

    Ok(())
}

fn validate_conversation(conversation: &ConversationConfig) -> Result<(), ConfigError> {
    if conversation.memory_window == 0 {
        return Err(ConfigError::Validation(
            "conversation.memory_window must be greater than zero".to_string(),
        ));
    }
    if conversation.prompt_window > conversation.memory_window {
        return Err(ConfigError::Validation(
            "conversation.prompt_window must not exceed conversation.memory_window".to_string(),
        ));
    }
    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn validate_http_url(key: &str, value: &str) -> Result<(), ConfigError> {
    if !value.starts_with("http://") && !value.starts_with("https://") {
        return Err(ConfigError::Validation(format!("{key} must start with http:// or https://")));
    }
    Ok(())
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    llm: Option<LlmPatch>,
    embedding: Option<EmbeddingPatch>,
    knowledge_base: Option<KnowledgeBasePatch>,
    leads: Option<LeadsPatch>,
    conversation: Option<ConversationPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    api_token: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    classifier_max_new_tokens: Option<u32>,
    classifier_temperature: Option<f32>,
    response_max_new_tokens: Option<u32>,
    response_temperature: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
struct EmbeddingPatch {
    provider: Option<EmbeddingProvider>,
    base_url: Option<String>,
    model: Option<String>,
    dimensions: Option<usize>,
    top_k: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct KnowledgeBasePatch {
    path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct LeadsPatch {
    csv_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct ConversationPatch {
    memory_window: Option<usize>,
    prompt_window: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{
        AppConfig, ConfigError, ConfigOverrides, EmbeddingProvider, LoadOptions, LogFormat,
    };

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    const TOKEN_VARS: [&str; 2] = ["AUTOSTREAM_LLM_API_TOKEN", "HF_TOKEN"];

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&TOKEN_VARS);

        env::set_var("TEST_AUTOSTREAM_TOKEN", "hf_from_env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("autostream.toml");
            fs::write(
                &path,
                r#"
[llm]
api_token = "${TEST_AUTOSTREAM_TOKEN}"

[embedding]
provider = "hashing"
top_k = 3
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.llm.api_token.expose_secret() == "hf_from_env",
                "token should be interpolated from environment",
            )?;
            ensure(
                config.embedding.provider == EmbeddingProvider::Hashing,
                "embedding provider should come from file",
            )?;
            ensure(config.embedding.top_k == 3, "top_k should come from file")?;
            Ok(())
        })();

        clear_vars(&["TEST_AUTOSTREAM_TOKEN"]);
        result
    }

    #[test]
    fn hf_token_alias_is_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&TOKEN_VARS);

        env::set_var("HF_TOKEN", "hf_alias_token");
        env::set_var("AUTOSTREAM_LOG_LEVEL", "warn");
        env::set_var("AUTOSTREAM_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.llm.api_token.expose_secret() == "hf_alias_token",
                "HF_TOKEN should populate llm.api_token",
            )?;
            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(&["HF_TOKEN", "AUTOSTREAM_LOG_LEVEL", "AUTOSTREAM_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&TOKEN_VARS);

        env::set_var("AUTOSTREAM_LLM_API_TOKEN", "hf_from_env");
        env::set_var("AUTOSTREAM_LEADS_CSV_PATH", "env/leads.csv");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("autostream.toml");
            fs::write(
                &path,
                r#"
[llm]
api_token = "hf_from_file"
model = "file/model"

[leads]
csv_path = "file/leads.csv"

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.llm.model == "file/model", "file model should beat the default")?;
            ensure(
                config.leads.csv_path == PathBuf::from("env/leads.csv"),
                "env csv path should win over file",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(
                config.llm.api_token.expose_secret() == "hf_from_env",
                "env token should win over file and defaults",
            )?;
            Ok(())
        })();

        clear_vars(&["AUTOSTREAM_LLM_API_TOKEN", "AUTOSTREAM_LEADS_CSV_PATH"]);
        result
    }

    #[test]
    fn missing_token_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&TOKEN_VARS);

        let error = match AppConfig::load(LoadOptions::default()) {
            Ok(_) => return Err("expected validation failure but config load succeeded".into()),
            Err(error) => error,
        };
        let has_message = matches!(
            error,
            ConfigError::Validation(ref message) if message.contains("llm.api_token")
        );
        ensure(has_message, "validation failure should mention llm.api_token")
    }

    #[test]
    fn unvalidated_load_tolerates_missing_token() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&TOKEN_VARS);

        let config = AppConfig::load_unvalidated(LoadOptions::default())
            .map_err(|err| format!("unvalidated load failed: {err}"))?;
        ensure(
            config.llm.api_token.expose_secret().is_empty(),
            "token should stay empty without env or file",
        )?;
        ensure(config.validate().is_err(), "validation should still reject the empty token")
    }

    #[test]
    fn placeholder_token_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&TOKEN_VARS);

        env::set_var("HF_TOKEN", super::PLACEHOLDER_TOKEN);
        let result = AppConfig::load(LoadOptions::default());
        clear_vars(&["HF_TOKEN"]);

        ensure(
            matches!(result, Err(ConfigError::Validation(ref message)) if message.contains("placeholder")),
            "placeholder token should fail validation",
        )
    }

    #[test]
    fn prompt_window_cannot_exceed_memory_window() -> Result<(), String> {
        let mut config = AppConfig::default();
        config.llm.api_token = "hf_test".to_string().into();
        config.conversation.prompt_window = 6;

        ensure(
            matches!(config.validate(), Err(ConfigError::Validation(ref message)) if message.contains("prompt_window")),
            "prompt window larger than memory window should fail validation",
        )
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&TOKEN_VARS);

        env::set_var("AUTOSTREAM_LLM_API_TOKEN", "hf_secret_value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(!debug.contains("hf_secret_value"), "debug output should not contain token")?;
            ensure(
                matches!(config.logging.format, LogFormat::Compact),
                "default logging format should be compact",
            )?;
            ensure(config.conversation.memory_window == 5, "default memory window is five turns")?;
            ensure(config.conversation.prompt_window == 2, "default prompt window is two turns")?;
            Ok(())
        })();

        clear_vars(&["AUTOSTREAM_LLM_API_TOKEN"]);
        result
    }
}
