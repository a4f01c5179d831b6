//! Provider configuration

use crate::LlmError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Environment variable consulted when no API key is configured
pub const API_KEY_ENV: &str = "LLM_API_KEY";

/// Default timeout for a completion call
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default timeout for OpenRouter and for question answering
pub const EXTENDED_TIMEOUT_SECS: u64 = 120;

/// OpenAI API base URL
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Anthropic API base URL
pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";

/// OpenRouter API base URL
pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Supported provider kinds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI-compatible server on localhost
    #[default]
    Local,
    /// OpenAI
    OpenAi,
    /// Anthropic
    Anthropic,
    /// OpenRouter
    OpenRouter,
}

impl ProviderKind {
    /// Provider name as written in configuration files
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Local => "local",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::OpenRouter => "openrouter",
        }
    }

    /// Whether calls must carry an API key
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, ProviderKind::Local)
    }

    /// Timeout used when none is configured
    pub fn default_timeout_secs(&self) -> u64 {
        match self {
            ProviderKind::OpenRouter => EXTENDED_TIMEOUT_SECS,
            _ => DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional sampling knobs, sent only when set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    /// Maximum completion tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Nucleus sampling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Top-k sampling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    /// Min-p sampling (not supported by Anthropic)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_p: Option<f32>,
}

/// Settings for one model backend
///
/// # Examples
///
/// ```
/// use zotllm_llm::{ProviderConfig, ProviderKind};
///
/// let config = ProviderConfig::local("qwen3-8b", 1234);
/// assert_eq!(config.base_url().unwrap(), "http://localhost:1234/v1");
/// assert_eq!(config.timeout().as_secs(), 60);
///
/// let remote = ProviderConfig::remote(ProviderKind::OpenRouter, "meta/llama", "key");
/// assert_eq!(remote.timeout().as_secs(), 120);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider kind
    #[serde(default)]
    pub provider: ProviderKind,

    /// Model identifier (required)
    #[serde(default)]
    pub model: String,

    /// Port of the local server (required for `local`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Base URL override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// API key; falls back to `LLM_API_KEY`
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Timeout override in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Sampling knobs
    #[serde(flatten)]
    pub sampling: SamplingParams,
}

impl ProviderConfig {
    /// Configuration for a local OpenAI-compatible server
    pub fn local(model: impl Into<String>, port: u16) -> Self {
        Self {
            provider: ProviderKind::Local,
            model: model.into(),
            port: Some(port),
            ..Default::default()
        }
    }

    /// Configuration for a hosted provider
    pub fn remote(provider: ProviderKind, model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            api_key: Some(api_key.into()),
            ..Default::default()
        }
    }

    /// Builder-style base URL override
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Builder-style timeout override
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Effective timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(
            self.timeout_secs
                .unwrap_or_else(|| self.provider.default_timeout_secs()),
        )
    }

    /// Base URL the provider talks to
    pub fn base_url(&self) -> Result<String, LlmError> {
        if let Some(url) = self.base_url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
            return Ok(url.trim_end_matches('/').to_string());
        }
        match self.provider {
            ProviderKind::Local => {
                let port = self.port.ok_or_else(|| {
                    LlmError::Config("port is required for the local provider".to_string())
                })?;
                Ok(format!("http://localhost:{}/v1", port))
            }
            ProviderKind::OpenAi => Ok(OPENAI_BASE_URL.to_string()),
            ProviderKind::Anthropic => Ok(ANTHROPIC_BASE_URL.to_string()),
            ProviderKind::OpenRouter => Ok(OPENROUTER_BASE_URL.to_string()),
        }
    }

    /// API key from the configuration or the environment
    pub fn resolved_api_key(&self) -> Option<String> {
        self.resolve_api_key_with(std::env::var(API_KEY_ENV).ok())
    }

    fn resolve_api_key_with(&self, env_value: Option<String>) -> Option<String> {
        self.api_key
            .clone()
            .or(env_value)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
    }

    /// Validate the configuration and resolve the API key
    ///
    /// Returns the key to send, `None` for a local provider without a key.
    pub fn validate(&self) -> Result<Option<String>, LlmError> {
        self.validate_with(std::env::var(API_KEY_ENV).ok())
    }

    pub(crate) fn validate_with(&self, env_value: Option<String>) -> Result<Option<String>, LlmError> {
        if self.model.trim().is_empty() {
            return Err(LlmError::Config(format!(
                "model is required for the {} provider",
                self.provider
            )));
        }
        if self.timeout_secs == Some(0) {
            return Err(LlmError::Config("timeout_secs must be greater than 0".to_string()));
        }
        self.base_url()?;

        let key = self.resolve_api_key_with(env_value);
        if self.provider.requires_api_key() && key.is_none() {
            return Err(LlmError::Auth(format!(
                "API key required for {}: set llm.api_key or {}",
                self.provider, API_KEY_ENV
            )));
        }
        Ok(key)
    }
}
