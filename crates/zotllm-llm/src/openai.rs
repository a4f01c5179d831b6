//! OpenAI-compatible Provider Implementation
//!
//! Speaks the chat-completions wire format shared by OpenAI, OpenRouter and
//! local servers such as LM Studio, Ollama and llama.cpp.
//!
//! # Features
//!
//! - Blocking HTTP communication with a per-call timeout
//! - Bearer authentication, optional for local servers
//! - OpenRouter attribution headers
//! - Retry of transient failures (HTTP 429/5xx) with exponential backoff
//!
//! # Examples
//!
//! ```no_run
//! use zotllm_llm::{OpenAiCompatibleProvider, ProviderConfig};
//! use zotllm_domain::traits::LlmProvider;
//!
//! let provider = OpenAiCompatibleProvider::new(&ProviderConfig::local("qwen3-8b", 1234)).unwrap();
//! let text = provider.generate("You are terse.", "Say hello", None).unwrap();
//! ```

use crate::config::{ProviderConfig, ProviderKind, SamplingParams};
use crate::thinking::strip_reasoning;
use crate::LlmError;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};
use zotllm_domain::traits::LlmProvider as LlmProviderTrait;

/// Default number of attempts for transient failures
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;

/// Referer sent to OpenRouter
pub const OPENROUTER_REFERER: &str = "https://github.com/zotero-llm-assistant";

/// Application title sent to OpenRouter
pub const OPENROUTER_TITLE: &str = "Zotero LLM Assistant";

/// Provider for any chat-completions endpoint
pub struct OpenAiCompatibleProvider {
    kind: ProviderKind,
    url: String,
    model: String,
    api_key: Option<String>,
    sampling: SamplingParams,
    timeout: Duration,
    client: Client,
    max_attempts: u32,
}

/// Request body for the chat-completions API
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(flatten)]
    sampling: &'a SamplingParams,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Response from the chat-completions API
#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Resolve the chat-completions URL from a base URL
///
/// Bases ending in `/chat/completions` are used as given, bases ending in `/v1`
/// get the path appended, anything else gets `/v1/chat/completions`.
pub fn completions_url(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if base.ends_with("/chat/completions") {
        base.to_string()
    } else if base.ends_with("/v1") || base.ends_with("/api/v1") {
        format!("{}/chat/completions", base)
    } else {
        format!("{}/v1/chat/completions", base)
    }
}

impl OpenAiCompatibleProvider {
    /// Create a provider from a validated configuration
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Config` for an incomplete configuration and
    /// `LlmError::Auth` when a hosted provider has no API key.
    pub fn new(config: &ProviderConfig) -> Result<Self, LlmError> {
        if config.provider == ProviderKind::Anthropic {
            return Err(LlmError::Config(
                "anthropic does not speak the chat-completions format".to_string(),
            ));
        }
        let api_key = config.validate()?;
        let timeout = config.timeout();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            kind: config.provider,
            url: completions_url(&config.base_url()?),
            model: config.model.clone(),
            api_key,
            sampling: config.sampling.clone(),
            timeout,
            client,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        })
    }

    /// Set the maximum number of attempts for transient failures
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Endpoint the provider posts to
    pub fn url(&self) -> &str {
        &self.url
    }

    fn send_once(&self, body: &ChatRequest<'_>, timeout: Duration) -> Result<String, LlmError> {
        let mut request = self.client.post(&self.url).timeout(timeout).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        if self.kind == ProviderKind::OpenRouter {
            request = request
                .header("HTTP-Referer", OPENROUTER_REFERER)
                .header("X-Title", OPENROUTER_TITLE);
        }

        let response = request
            .send()
            .map_err(|e| LlmError::from_transport(e, timeout))?;
        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .unwrap_or_else(|_| "Unknown error".to_string());
            if status.as_u16() == 402 && self.kind == ProviderKind::OpenRouter {
                return Err(LlmError::Http {
                    status: 402,
                    body: "insufficient OpenRouter credits".to_string(),
                });
            }
            return Err(LlmError::from_status(status.as_u16(), text));
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| LlmError::Response(format!("Failed to parse response: {}", e)))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::Response("completion has no content".to_string()))
    }
}

impl LlmProviderTrait for OpenAiCompatibleProvider {
    type Error = LlmError;

    fn generate(
        &self,
        system_role: &str,
        user_content: &str,
        timeout: Option<Duration>,
    ) -> Result<String, Self::Error> {
        let timeout = timeout.unwrap_or(self.timeout);
        let mut messages = Vec::with_capacity(2);
        if !system_role.trim().is_empty() {
            messages.push(ChatMessage {
                role: "system",
                content: system_role,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: user_content,
        });
        let body = ChatRequest {
            model: &self.model,
            messages,
            sampling: &self.sampling,
        };

        info!(provider = %self.kind, model = %self.model, url = %self.url, "Calling chat completions");

        let mut attempts = 0;
        let raw = loop {
            attempts += 1;
            match self.send_once(&body, timeout) {
                Ok(text) => break text,
                Err(e) if e.is_transient() && attempts < self.max_attempts => {
                    // Exponential backoff: 1s, 2s, 4s, etc.
                    let delay = Duration::from_secs(2u64.pow(attempts - 1));
                    warn!(error = %e, attempt = attempts, "Transient provider failure, retrying");
                    std::thread::sleep(delay);
                }
                Err(e) => return Err(e),
            }
        };

        let cleaned = strip_reasoning(&raw);
        if cleaned.len() != raw.len() {
            debug!(before = raw.len(), after = cleaned.len(), "Removed reasoning traces");
        }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completions_url() {
        assert_eq!(
            completions_url("http://localhost:1234/v1"),
            "http://localhost:1234/v1/chat/completions"
        );
        assert_eq!(
            completions_url("http://localhost:1234"),
            "http://localhost:1234/v1/chat/completions"
        );
        assert_eq!(
            completions_url("https://openrouter.ai/api/v1/"),
            "https://openrouter.ai/api/v1/chat/completions"
        );
        assert_eq!(
            completions_url("http://h/custom/chat/completions"),
            "http://h/custom/chat/completions"
        );
    }

    #[test]
    fn test_provider_creation() {
        let provider = OpenAiCompatibleProvider::new(&ProviderConfig::local("llama", 8080)).unwrap();
        assert_eq!(provider.url(), "http://localhost:8080/v1/chat/completions");
        assert_eq!(provider.model_name(), "llama");
        assert_eq!(provider.max_attempts, DEFAULT_MAX_ATTEMPTS);
        assert!(provider.api_key.is_none());
    }

    #[test]
    fn test_rejects_anthropic() {
        let config = ProviderConfig::remote(ProviderKind::Anthropic, "claude", "k");
        assert!(matches!(
            OpenAiCompatibleProvider::new(&config),
            Err(LlmError::Config(_))
        ));
    }

    #[test]
    fn test_with_max_attempts_floor() {
        let provider = OpenAiCompatibleProvider::new(&ProviderConfig::local("llama", 8080))
            .unwrap()
            .with_max_attempts(0);
        assert_eq!(provider.max_attempts, 1);
    }

    #[test]
    fn test_unreachable_local_server() {
        // Port 9 (discard) is not expected to run an HTTP server
        let provider = OpenAiCompatibleProvider::new(&ProviderConfig::local("llama", 9))
            .unwrap()
            .with_max_attempts(1);
        let result = provider.generate("", "test", Some(Duration::from_secs(2)));
        assert!(matches!(
            result,
            Err(LlmError::Unreachable(_)) | Err(LlmError::Timeout(_))
        ));
    }

    #[test]
    fn test_request_serialization_skips_unset_sampling() {
        let sampling = SamplingParams {
            temperature: Some(0.5),
            ..Default::default()
        };
        let body = ChatRequest {
            model: "m",
            messages: vec![ChatMessage { role: "user", content: "hi" }],
            sampling: &sampling,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["temperature"], 0.5);
        assert!(json.get("top_p").is_none());
        assert_eq!(json["messages"][0]["role"], "user");
    }
}
