//! Startup-time credential and parameter resolution.
//!
//! Everything here runs once, from `setup()`; nothing in the request path
//! reads the environment or the filesystem.

use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use newsdesk_shared::{AwsConfig, KnowledgeBaseConfig, NewsdeskError, Result};

/// Bearer credentials for the Bedrock endpoints.
#[derive(Clone)]
pub struct Credentials {
    bearer_token: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("bearer_token", &"<redacted>")
            .finish()
    }
}

/// Shape of the JSON secret file.
#[derive(Deserialize)]
struct SecretDocument {
    bearer_access_token: String,
}

impl Credentials {
    pub fn from_token(token: impl Into<String>) -> Self {
        Self {
            bearer_token: token.into(),
        }
    }

    /// Resolve the token from the configured env var, falling back to the
    /// secret file when one is configured.
    pub fn resolve(aws: &AwsConfig) -> Result<Self> {
        if let Ok(token) = std::env::var(&aws.api_key_env) {
            if !token.trim().is_empty() {
                debug!(var = %aws.api_key_env, "bearer token read from environment");
                return Ok(Self::from_token(token.trim()));
            }
        }

        match &aws.secret_file {
            Some(path) => Self::from_secret_file(Path::new(path)),
            None => Err(NewsdeskError::config(format!(
                "Bedrock credentials not found. Set the {} environment variable \
                 or configure aws.secret_file.",
                aws.api_key_env
            ))),
        }
    }

    /// Read a `{"bearer_access_token": "..."}` secret document.
    pub fn from_secret_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| NewsdeskError::io(path, e))?;
        let doc: SecretDocument = serde_json::from_str(&content).map_err(|e| {
            NewsdeskError::config(format!("invalid secret file {}: {e}", path.display()))
        })?;
        if doc.bearer_access_token.trim().is_empty() {
            return Err(NewsdeskError::config(format!(
                "secret file {} has an empty bearer_access_token",
                path.display()
            )));
        }
        info!(path = %path.display(), "bearer token read from secret file");
        Ok(Self::from_token(doc.bearer_access_token.trim()))
    }

    pub(crate) fn authorization(&self) -> String {
        format!("Bearer {}", self.bearer_token)
    }
}

/// Knowledge base id from config, or from the configured env var.
pub fn resolve_knowledge_base_id(kb: &KnowledgeBaseConfig) -> Result<String> {
    if let Some(id) = kb.id.as_deref().filter(|id| !id.trim().is_empty()) {
        return Ok(id.trim().to_string());
    }
    match std::env::var(&kb.id_env) {
        Ok(id) if !id.trim().is_empty() => Ok(id.trim().to_string()),
        _ => Err(NewsdeskError::config(format!(
            "knowledge base id not configured. Set knowledge_base.id or the {} environment variable.",
            kb.id_env
        ))),
    }
}

/// Generation model ARN for retrieve-and-generate.
///
/// An explicit `model_arn` wins; otherwise the inference-profile ARN is built
/// from the region, account id and model id.
pub fn resolve_model_arn(aws: &AwsConfig, kb: &KnowledgeBaseConfig) -> Result<String> {
    if let Some(arn) = kb.model_arn.as_deref().filter(|a| !a.trim().is_empty()) {
        return Ok(arn.trim().to_string());
    }
    let account = aws
        .account_id
        .as_deref()
        .filter(|a| !a.trim().is_empty())
        .ok_or_else(|| {
            NewsdeskError::config(
                "aws.account_id is required to build the knowledge base model ARN \
                 (or set knowledge_base.model_arn)",
            )
        })?;
    Ok(format!(
        "arn:aws:bedrock:{}:{}:inference-profile/{}",
        aws.region,
        account.trim(),
        kb.model_id
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("newsdesk-{}-{name}", std::process::id()))
    }

    #[test]
    fn debug_output_redacts_token() {
        let creds = Credentials::from_token("super-secret");
        let debug = format!("{creds:?}");
        assert!(!debug.contains("super-secret"));
        assert_eq!(creds.authorization(), "Bearer super-secret");
    }

    #[test]
    fn missing_credentials_name_the_env_var() {
        let aws = AwsConfig {
            api_key_env: "ND_TEST_NONEXISTENT_TOKEN_98765".into(),
            ..AwsConfig::default()
        };
        let err = Credentials::resolve(&aws).unwrap_err();
        assert!(err.to_string().contains("ND_TEST_NONEXISTENT_TOKEN_98765"));
    }

    #[test]
    fn secret_file_supplies_token() {
        let path = temp_path("secret.json");
        std::fs::write(&path, r#"{"bearer_access_token": "from-file"}"#).unwrap();
        let aws = AwsConfig {
            api_key_env: "ND_TEST_NONEXISTENT_TOKEN_98765".into(),
            secret_file: Some(path.to_string_lossy().into_owned()),
            ..AwsConfig::default()
        };
        let creds = Credentials::resolve(&aws).unwrap();
        assert_eq!(creds.authorization(), "Bearer from-file");
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn malformed_secret_file_is_config_error() {
        let path = temp_path("bad-secret.json");
        std::fs::write(&path, r#"{"token": "x"}"#).unwrap();
        let err = Credentials::from_secret_file(&path).unwrap_err();
        assert!(matches!(err, NewsdeskError::Config { .. }));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn knowledge_base_id_prefers_config() {
        let kb = KnowledgeBaseConfig {
            id: Some("KB0042".into()),
            ..KnowledgeBaseConfig::default()
        };
        assert_eq!(resolve_knowledge_base_id(&kb).unwrap(), "KB0042");

        let kb = KnowledgeBaseConfig {
            id_env: "ND_TEST_NONEXISTENT_KB_98765".into(),
            ..KnowledgeBaseConfig::default()
        };
        assert!(resolve_knowledge_base_id(&kb).is_err());
    }

    #[test]
    fn model_arn_is_built_from_account() {
        let aws = AwsConfig {
            account_id: Some("123456789012".into()),
            ..AwsConfig::default()
        };
        let kb = KnowledgeBaseConfig::default();
        assert_eq!(
            resolve_model_arn(&aws, &kb).unwrap(),
            "arn:aws:bedrock:us-east-1:123456789012:inference-profile/us.amazon.nova-micro-v1:0"
        );

        assert!(resolve_model_arn(&AwsConfig::default(), &kb).is_err());
    }
}
