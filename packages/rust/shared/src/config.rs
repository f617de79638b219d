//! Application configuration for Newsdesk.
//!
//! User config lives at `~/.newsdesk/newsdesk.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{NewsdeskError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "newsdesk.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".newsdesk";

// ---------------------------------------------------------------------------
// Config structs (matching newsdesk.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// AWS connection settings.
    #[serde(default)]
    pub aws: AwsConfig,

    /// Knowledge base used by the research stage and `get_show_detail`.
    #[serde(default)]
    pub knowledge_base: KnowledgeBaseConfig,

    /// Per-stage model profiles.
    #[serde(default)]
    pub models: ModelsConfig,

    /// Article writer settings.
    #[serde(default)]
    pub writer: WriterConfig,

    /// HTTP runtime settings.
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// `[aws]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwsConfig {
    #[serde(default = "default_region")]
    pub region: String,

    /// Needed to build the inference-profile ARN when `model_arn` is unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,

    /// Name of the env var holding the bearer token (never store the token itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// JSON secret file with a `bearer_access_token` field, used when the env var is unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_file: Option<String>,

    /// Override for `https://bedrock-runtime.{region}.amazonaws.com`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_endpoint: Option<String>,

    /// Override for `https://bedrock-agent-runtime.{region}.amazonaws.com`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_runtime_endpoint: Option<String>,

    /// Per-request HTTP timeout.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            account_id: None,
            api_key_env: default_api_key_env(),
            secret_file: None,
            runtime_endpoint: None,
            agent_runtime_endpoint: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl AwsConfig {
    pub fn runtime_base(&self) -> String {
        self.runtime_endpoint
            .clone()
            .unwrap_or_else(|| format!("https://bedrock-runtime.{}.amazonaws.com", self.region))
    }

    pub fn agent_runtime_base(&self) -> String {
        self.agent_runtime_endpoint.clone().unwrap_or_else(|| {
            format!("https://bedrock-agent-runtime.{}.amazonaws.com", self.region)
        })
    }
}

fn default_region() -> String {
    "us-east-1".into()
}
fn default_api_key_env() -> String {
    "AWS_BEARER_TOKEN_BEDROCK".into()
}
fn default_request_timeout() -> u64 {
    120
}

/// `[knowledge_base]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeBaseConfig {
    /// Knowledge base id. Takes precedence over `id_env`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Env var consulted when `id` is unset.
    #[serde(default = "default_kb_id_env")]
    pub id_env: String,

    /// Model that synthesizes the retrieve-and-generate answer.
    #[serde(default = "default_kb_model")]
    pub model_id: String,

    /// Explicit generation model ARN; built from region/account/model when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_arn: Option<String>,

    #[serde(default = "default_number_of_results")]
    pub number_of_results: u32,

    /// `HYBRID` or `SEMANTIC`.
    #[serde(default = "default_search_type")]
    pub search_type: String,
}

impl Default for KnowledgeBaseConfig {
    fn default() -> Self {
        Self {
            id: None,
            id_env: default_kb_id_env(),
            model_id: default_kb_model(),
            model_arn: None,
            number_of_results: default_number_of_results(),
            search_type: default_search_type(),
        }
    }
}

fn default_kb_id_env() -> String {
    "NEWSDESK_KB_ID".into()
}
fn default_kb_model() -> String {
    "us.amazon.nova-micro-v1:0".into()
}
fn default_number_of_results() -> u32 {
    5
}
fn default_search_type() -> String {
    "HYBRID".into()
}

/// Model id plus sampling parameters for one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelProfile {
    pub model_id: String,
    pub temperature: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    pub max_tokens: u32,
}

impl ModelProfile {
    fn validate(&self, stage: &str) -> Result<()> {
        if self.model_id.trim().is_empty() {
            return Err(NewsdeskError::config(format!("models.{stage}.model_id is empty")));
        }
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(NewsdeskError::config(format!(
                "models.{stage}.temperature must be within [0, 1], got {}",
                self.temperature
            )));
        }
        if let Some(top_p) = self.top_p {
            if !(0.0..=1.0).contains(&top_p) {
                return Err(NewsdeskError::config(format!(
                    "models.{stage}.top_p must be within [0, 1], got {top_p}"
                )));
            }
        }
        if self.max_tokens == 0 {
            return Err(NewsdeskError::config(format!(
                "models.{stage}.max_tokens must be positive"
            )));
        }
        Ok(())
    }
}

/// `[models.*]` sections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    #[serde(default = "default_extraction_profile")]
    pub extraction: ModelProfile,
    #[serde(default = "default_research_query_profile")]
    pub research_query: ModelProfile,
    #[serde(default = "default_writer_profile")]
    pub writer: ModelProfile,
    #[serde(default = "default_reviewer_profile")]
    pub reviewer: ModelProfile,
    /// Media assistant answering title questions over the gateway tools.
    #[serde(default = "default_assistant_profile")]
    pub assistant: ModelProfile,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            extraction: default_extraction_profile(),
            research_query: default_research_query_profile(),
            writer: default_writer_profile(),
            reviewer: default_reviewer_profile(),
            assistant: default_assistant_profile(),
        }
    }
}

fn default_extraction_profile() -> ModelProfile {
    ModelProfile {
        model_id: "us.amazon.nova-lite-v1:0".into(),
        temperature: 1.0,
        top_p: None,
        top_k: None,
        max_tokens: 2048,
    }
}
fn default_research_query_profile() -> ModelProfile {
    ModelProfile {
        model_id: "us.amazon.nova-micro-v1:0".into(),
        temperature: 0.0,
        top_p: Some(1.0),
        top_k: None,
        max_tokens: 4096,
    }
}
fn default_writer_profile() -> ModelProfile {
    ModelProfile {
        model_id: "us.amazon.nova-pro-v1:0".into(),
        temperature: 0.5,
        top_p: Some(1.0),
        top_k: Some(1),
        max_tokens: 4096,
    }
}
fn default_reviewer_profile() -> ModelProfile {
    ModelProfile {
        model_id: "us.amazon.nova-micro-v1:0".into(),
        temperature: 0.1,
        top_p: Some(1.0),
        top_k: Some(1),
        max_tokens: 4096,
    }
}
fn default_assistant_profile() -> ModelProfile {
    ModelProfile {
        model_id: "us.amazon.nova-premier-v1:0".into(),
        temperature: 0.5,
        top_p: Some(0.9),
        top_k: None,
        max_tokens: 4096,
    }
}

/// `[writer]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriterConfig {
    /// Approximate article length requested from the writer.
    #[serde(default = "default_target_words")]
    pub target_words: u32,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            target_words: default_target_words(),
        }
    }
}

fn default_target_words() -> u32 {
    800
}

/// `[runtime]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Deadline for one `/invocations` request.
    #[serde(default = "default_invocation_timeout")]
    pub invocation_timeout_secs: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            invocation_timeout_secs: default_invocation_timeout(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8080
}
fn default_invocation_timeout() -> u64 {
    600
}

impl AppConfig {
    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        self.models.extraction.validate("extraction")?;
        self.models.research_query.validate("research_query")?;
        self.models.writer.validate("writer")?;
        self.models.reviewer.validate("reviewer")?;
        self.models.assistant.validate("assistant")?;

        let kb = &self.knowledge_base;
        if !(1..=100).contains(&kb.number_of_results) {
            return Err(NewsdeskError::config(format!(
                "knowledge_base.number_of_results must be within 1..=100, got {}",
                kb.number_of_results
            )));
        }
        if !matches!(kb.search_type.as_str(), "HYBRID" | "SEMANTIC") {
            return Err(NewsdeskError::config(format!(
                "knowledge_base.search_type must be HYBRID or SEMANTIC, got '{}'",
                kb.search_type
            )));
        }
        if self.writer.target_words == 0 {
            return Err(NewsdeskError::config("writer.target_words must be positive"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.newsdesk/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| NewsdeskError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.newsdesk/newsdesk.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| NewsdeskError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        NewsdeskError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    config.validate()?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| NewsdeskError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| NewsdeskError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| NewsdeskError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("AWS_BEARER_TOKEN_BEDROCK"));
        assert!(toml_str.contains("us.amazon.nova-pro-v1:0"));
    }

    #[test]
    fn defaults_match_stage_profiles() {
        let config = AppConfig::default();
        assert_eq!(config.models.extraction.temperature, 1.0);
        assert_eq!(config.models.extraction.max_tokens, 2048);
        assert_eq!(config.models.research_query.temperature, 0.0);
        assert_eq!(config.models.writer.top_k, Some(1));
        assert_eq!(config.models.assistant.model_id, "us.amazon.nova-premier-v1:0");
        assert_eq!(config.knowledge_base.number_of_results, 5);
        assert_eq!(config.knowledge_base.search_type, "HYBRID");
        assert_eq!(config.writer.target_words, 800);
        config.validate().expect("defaults are valid");
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let toml_str = r#"
[aws]
region = "eu-west-1"

[knowledge_base]
id = "KB12345"

[models.writer]
model_id = "us.anthropic.claude-3-5-haiku-20241022-v1:0"
temperature = 0.3
max_tokens = 2048
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.aws.region, "eu-west-1");
        assert_eq!(config.aws.runtime_base(), "https://bedrock-runtime.eu-west-1.amazonaws.com");
        assert_eq!(config.knowledge_base.id.as_deref(), Some("KB12345"));
        assert_eq!(config.models.writer.top_k, None);
        assert_eq!(config.models.reviewer.model_id, "us.amazon.nova-micro-v1:0");
    }

    #[test]
    fn endpoint_overrides_win() {
        let mut aws = AwsConfig::default();
        aws.agent_runtime_endpoint = Some("http://127.0.0.1:9000".into());
        assert_eq!(aws.agent_runtime_base(), "http://127.0.0.1:9000");
        assert_eq!(aws.runtime_base(), "https://bedrock-runtime.us-east-1.amazonaws.com");
    }

    #[test]
    fn out_of_range_values_fail_validation() {
        let mut config = AppConfig::default();
        config.models.reviewer.temperature = 1.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("models.reviewer.temperature"));

        let mut config = AppConfig::default();
        config.knowledge_base.search_type = "FUZZY".into();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.knowledge_base.number_of_results = 0;
        assert!(config.validate().is_err());
    }
}
