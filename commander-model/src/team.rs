//! # Model Team
//!
//! Four independently configured endpoints with one configuration shape:
//! - **Reasoning**: plans the next step in free text
//! - **Structured**: turns a plan into `{"command": ...}` (JSON mode)
//! - **Security**: judges a command safe or unsafe (JSON mode)
//! - **Actor**: writes the final answer for the user

use crate::provider::{LlmProvider, OpenAIProvider, ProviderConfig, ProviderError};
use commander_error::{Error, ErrorKind, Result};
use serde::Deserialize;

/// Credentials and model id for one endpoint, as written in the config file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub model_id: String,
    pub base_url: String,
    pub token: String,
}

impl ModelConfig {
    /// Names of the required fields that are absent or blank
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.model_id.trim().is_empty() {
            missing.push("model_id");
        }
        if self.base_url.trim().is_empty() {
            missing.push("base_url");
        }
        if self.token.trim().is_empty() {
            missing.push("token");
        }
        missing
    }

    /// Fail with every missing field named when the block is incomplete
    pub fn validate(&self, name: &str) -> Result<()> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            return Ok(());
        }

        Err(Error::config_invalid(format!(
            "{} model configuration is incomplete: missing [{}]",
            name,
            missing.join(", ")
        ))
        .with_operation("config::validate")
        .with_context("model", name.to_string()))
    }

    /// Provider settings for this endpoint
    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig::new(&self.base_url, &self.model_id).with_api_key(&self.token)
    }
}

/// The four model blocks of the config file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TeamConfig {
    pub reasoning_model: ModelConfig,
    pub structured_model: ModelConfig,
    pub security_model: ModelConfig,
    pub actor_model: ModelConfig,
}

impl TeamConfig {
    /// Validate the blocks in order; the first incomplete one is reported
    pub fn validate(&self) -> Result<()> {
        self.reasoning_model.validate("reasoning")?;
        self.structured_model.validate("structured")?;
        self.security_model.validate("security")?;
        self.actor_model.validate("actor")?;
        Ok(())
    }
}

/// One provider per role
pub struct Team<P: LlmProvider> {
    pub reasoning: P,
    pub structured: P,
    pub security: P,
    pub actor: P,
}

impl<P: LlmProvider> Team<P> {
    pub fn new(reasoning: P, structured: P, security: P, actor: P) -> Self {
        Self {
            reasoning,
            structured,
            security,
            actor,
        }
    }
}

impl Team<OpenAIProvider> {
    /// Build the four OpenAI-compatible endpoints. Structured and Security
    /// answer in JSON-object mode.
    pub fn from_config(config: &TeamConfig) -> Result<Self> {
        let build = |name: &'static str, cfg: ProviderConfig| {
            OpenAIProvider::new(cfg).map_err(|e| {
                Error::config_invalid(format!("{} model initialization failed", name))
                    .with_operation("team::from_config")
                    .set_source(e)
            })
        };

        Ok(Self::new(
            build("reasoning", config.reasoning_model.provider_config())?,
            build("structured", config.structured_model.provider_config().json_mode())?,
            build("security", config.security_model.provider_config().json_mode())?,
            build("actor", config.actor_model.provider_config())?,
        ))
    }
}

/// Convert a transport-level failure into the workspace error type.
pub fn provider_error(err: ProviderError, operation: &'static str, model: &str) -> Error {
    let kind = match &err {
        ProviderError::Network(_) => ErrorKind::NetworkFailed,
        ProviderError::RateLimited { .. } => ErrorKind::RateLimited,
        ProviderError::AuthenticationFailed => ErrorKind::AuthenticationFailed,
        ProviderError::Parse(_) => ErrorKind::ParseFailed,
        ProviderError::Api { .. } | ProviderError::EmptyResponse | ProviderError::Other(_) => {
            ErrorKind::InferenceFailed
        }
    };
    Error::new(kind, err.to_string())
        .with_operation(operation)
        .with_context("model", model.to_string())
        .set_source(err)
}
