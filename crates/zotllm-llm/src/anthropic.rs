//! Anthropic Messages API provider

use crate::config::{ProviderConfig, ProviderKind, SamplingParams};
use crate::thinking::strip_reasoning;
use crate::LlmError;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;
use zotllm_domain::traits::LlmProvider as LlmProviderTrait;

/// API version header value
pub const ANTHROPIC_API_VERSION: &str = "2023-06-01";

/// `max_tokens` is mandatory for the Messages API
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Provider for Anthropic's Messages API
pub struct AnthropicProvider {
    url: String,
    model: String,
    api_key: String,
    sampling: SamplingParams,
    timeout: Duration,
    client: Client,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: [UserMessage<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
}

#[derive(Serialize)]
struct UserMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl AnthropicProvider {
    /// Create a provider from a configuration
    pub fn new(config: &ProviderConfig) -> Result<Self, LlmError> {
        if config.provider != ProviderKind::Anthropic {
            return Err(LlmError::Config(format!(
                "{} is not an anthropic configuration",
                config.provider
            )));
        }
        let api_key = config
            .validate()?
            .ok_or_else(|| LlmError::Auth("API key required for anthropic".to_string()))?;
        let timeout = config.timeout();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: format!("{}/messages", config.base_url()?),
            model: config.model.clone(),
            api_key,
            sampling: config.sampling.clone(),
            timeout,
            client,
        })
    }

    /// Endpoint the provider posts to
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl LlmProviderTrait for AnthropicProvider {
    type Error = LlmError;

    fn generate(
        &self,
        system_role: &str,
        user_content: &str,
        timeout: Option<Duration>,
    ) -> Result<String, Self::Error> {
        let timeout = timeout.unwrap_or(self.timeout);
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: self.sampling.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            system: Some(system_role).filter(|s| !s.trim().is_empty()),
            messages: [UserMessage {
                role: "user",
                content: user_content,
            }],
            temperature: self.sampling.temperature,
            top_p: self.sampling.top_p,
            top_k: self.sampling.top_k,
        };

        info!(model = %self.model, url = %self.url, "Calling Anthropic messages API");

        let response = self
            .client
            .post(&self.url)
            .timeout(timeout)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_API_VERSION)
            .json(&body)
            .send()
            .map_err(|e| LlmError::from_transport(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::from_status(status.as_u16(), text));
        }

        let parsed: MessagesResponse = response
            .json()
            .map_err(|e| LlmError::Response(format!("Failed to parse response: {}", e)))?;
        let text = parsed
            .content
            .iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text.as_deref())
            .collect::<Vec<_>>()
            .join("\n");

        let cleaned = strip_reasoning(&text);
        if cleaned.is_empty() {
            return Err(LlmError::Response("empty completion".to_string()));
        }
        info!(chars = cleaned.len(), "Completion received");
        Ok(cleaned)
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn default_timeout(&self) -> Option<Duration> {
        Some(self.timeout)
    }
}
