//! Provider selection from configuration

use crate::anthropic::AnthropicProvider;
use crate::config::{ProviderConfig, ProviderKind};
use crate::openai::OpenAiCompatibleProvider;
use crate::LlmError;
use std::time::Duration;
use zotllm_domain::traits::LlmProvider as LlmProviderTrait;

/// A configured model backend
///
/// Local, OpenAI and OpenRouter share the chat-completions wire format;
/// Anthropic has its own.
pub enum Provider {
    /// local, openai or openrouter
    OpenAiCompatible(OpenAiCompatibleProvider),
    /// anthropic
    Anthropic(AnthropicProvider),
}

impl Provider {
    /// Build the provider a configuration asks for
    ///
    /// # Examples
    ///
    /// ```
    /// use zotllm_llm::{Provider, ProviderConfig};
    ///
    /// let provider = Provider::from_config(&ProviderConfig::local("qwen3-8b", 1234)).unwrap();
    /// assert!(matches!(provider, Provider::OpenAiCompatible(_)));
    /// ```
    pub fn from_config(config: &ProviderConfig) -> Result<Self, LlmError> {
        match config.provider {
            ProviderKind::Anthropic => Ok(Provider::Anthropic(AnthropicProvider::new(config)?)),
            ProviderKind::Local | ProviderKind::OpenAi | ProviderKind::OpenRouter => Ok(
                Provider::OpenAiCompatible(OpenAiCompatibleProvider::new(config)?),
            ),
        }
    }
}

impl LlmProviderTrait for Provider {
    type Error = LlmError;

    fn generate(
        &self,
        system_role: &str,
        user_content: &str,
        timeout: Option<Duration>,
    ) -> Result<String, Self::Error> {
        match self {
            Provider::OpenAiCompatible(p) => p.generate(system_role, user_content, timeout),
            Provider::Anthropic(p) => p.generate(system_role, user_content, timeout),
        }
    }

    fn model_name(&self) -> &str {
        match self {
            Provider::OpenAiCompatible(p) => p.model_name(),
            Provider::Anthropic(p) => p.model_name(),
        }
    }

    fn default_timeout(&self) -> Option<Duration> {
        match self {
            Provider::OpenAiCompatible(p) => p.default_timeout(),
            Provider::Anthropic(p) => p.default_timeout(),
        }
    }
}
