//! Zotero LLM Assistant Provider Layer
//!
//! Pluggable LLM provider implementations behind the `LlmProvider` trait from
//! `zotllm-domain`.
//!
//! # Providers
//!
//! - `OpenAiCompatibleProvider`: chat-completions wire format, used for a local
//!   server (LM Studio, Ollama, llama.cpp), OpenAI and OpenRouter
//! - `AnthropicProvider`: the Messages API
//! - `Provider`: tagged variant built from a [`ProviderConfig`]
//! - `MockProvider`: deterministic mock for testing
//!
//! # Examples
//!
//! ```
//! use zotllm_llm::MockProvider;
//! use zotllm_domain::traits::LlmProvider;
//!
//! let provider = MockProvider::new("Hello from LLM!");
//! let result = provider.generate("system", "user", None).unwrap();
//! assert_eq!(result, "Hello from LLM!");
//! ```

#![warn(missing_docs)]

pub mod anthropic;
pub mod config;
pub mod openai;
pub mod provider;
pub mod thinking;

use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use zotllm_domain::traits::LlmProvider as LlmProviderTrait;

pub use anthropic::AnthropicProvider;
pub use config::{ProviderConfig, ProviderKind, SamplingParams};
pub use openai::OpenAiCompatibleProvider;
pub use provider::Provider;
pub use thinking::strip_reasoning;

/// Errors that can occur during LLM operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// Provider settings are missing or invalid
    #[error("Provider configuration error: {0}")]
    Config(String),

    /// Connection-level failure, e.g. the local server is not running
    #[error("Provider unreachable: {0}")]
    Unreachable(String),

    /// Missing or rejected API key
    #[error("Provider authentication failed: {0}")]
    Auth(String),

    /// The call exceeded its timeout
    #[error("Provider timed out after {0}s")]
    Timeout(u64),

    /// Malformed or empty completion
    #[error("Invalid provider response: {0}")]
    Response(String),

    /// Any other non-success HTTP status
    #[error("Provider returned HTTP {status}: {body}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Response body or explanation
        body: String,
    },
}

impl LlmError {
    /// Classify a transport error, given the timeout that was in force
    pub(crate) fn from_transport(e: reqwest::Error, timeout: Duration) -> Self {
        if e.is_timeout() {
            LlmError::Timeout(timeout.as_secs())
        } else if e.is_connect() {
            LlmError::Unreachable(e.to_string())
        } else if e.is_decode() {
            LlmError::Response(e.to_string())
        } else {
            LlmError::Unreachable(e.to_string())
        }
    }

    /// Classify a non-success HTTP status
    pub(crate) fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => LlmError::Auth(format!("HTTP {}: {}", status, body)),
            _ => LlmError::Http { status, body },
        }
    }

    /// Whether a retry may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, LlmError::Http { status, .. } if *status == 429 || *status >= 500)
    }
}

/// Mock LLM provider for deterministic testing
///
/// This provider returns pre-configured responses without making any network
/// calls. Responses are keyed by a substring of the user content, so tests can
/// steer individual items of a batch.
///
/// # Examples
///
/// ```
/// use zotllm_llm::{LlmError, MockProvider};
/// use zotllm_domain::traits::LlmProvider;
///
/// // Simple fixed response
/// let provider = MockProvider::new("Fixed response");
/// assert_eq!(provider.generate("", "any prompt", None).unwrap(), "Fixed response");
///
/// // Per-content responses and failures
/// let mut provider = MockProvider::default();
/// provider.add_response("Paper A", "summary of A");
/// provider.add_error("Paper B", LlmError::Timeout(60));
/// assert_eq!(provider.generate("", "Title: Paper A", None).unwrap(), "summary of A");
/// assert!(provider.generate("", "Title: Paper B", None).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    model: String,
    default_response: String,
    default_timeout: Option<Duration>,
    responses: Arc<Mutex<Vec<(String, Result<String, LlmError>)>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

/// A call seen by [`MockProvider`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// System role passed to the call
    pub system_role: String,
    /// User content passed to the call
    pub user_content: String,
    /// Timeout override passed to the call
    pub timeout: Option<Duration>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            model: "mock-model".to_string(),
            default_response: response.into(),
            default_timeout: None,
            responses: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Report `timeout` as the provider's own timeout
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    /// Add a response for user content containing `needle`
    pub fn add_response(&mut self, needle: impl Into<String>, response: impl Into<String>) {
        self.lock_responses().push((needle.into(), Ok(response.into())));
    }

    /// Fail calls whose user content contains `needle`
    pub fn add_error(&mut self, needle: impl Into<String>, error: LlmError) {
        self.lock_responses().push((needle.into(), Err(error)));
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        self.lock_calls().len()
    }

    /// Every call made so far
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock_calls().clone()
    }

    /// Reset the recorded calls
    pub fn reset_call_count(&self) {
        self.lock_calls().clear();
    }

    fn lock_responses(&self) -> std::sync::MutexGuard<'_, Vec<(String, Result<String, LlmError>)>> {
        self.responses.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, Vec<RecordedCall>> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

impl LlmProviderTrait for MockProvider {
    type Error = LlmError;

    fn generate(
        &self,
        system_role: &str,
        user_content: &str,
        timeout: Option<Duration>,
    ) -> Result<String, Self::Error> {
        self.lock_calls().push(RecordedCall {
            system_role: system_role.to_string(),
            user_content: user_content.to_string(),
            timeout,
        });

        let responses = self.lock_responses();
        if let Some((_, outcome)) = responses
            .iter()
            .find(|(needle, _)| user_content.contains(needle.as_str()))
        {
            return outcome.clone();
        }

        Ok(self.default_response.clone())
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn default_timeout(&self) -> Option<Duration> {
        self.default_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_provider_default() {
        let provider = MockProvider::new("Test response");
        let result = provider.generate("sys", "any prompt", None);
        assert_eq!(result.unwrap(), "Test response");
    }

    #[test]
    fn test_mock_provider_specific_responses() {
        let mut provider = MockProvider::default();
        provider.add_response("hello", "world");
        provider.add_response("foo", "bar");

        assert_eq!(provider.generate("", "say hello", None).unwrap(), "world");
        assert_eq!(provider.generate("", "foo!", None).unwrap(), "bar");
        assert_eq!(provider.generate("", "unknown", None).unwrap(), "Default mock response");
    }

    #[test]
    fn test_mock_provider_records_calls() {
        let provider = MockProvider::new("test");
        assert_eq!(provider.call_count(), 0);

        provider
            .generate("role", "prompt1", Some(Duration::from_secs(120)))
            .unwrap();
        provider.generate("role", "prompt2", None).unwrap();
        assert_eq!(provider.call_count(), 2);
        assert_eq!(provider.calls()[0].timeout, Some(Duration::from_secs(120)));

        provider.reset_call_count();
        assert_eq!(provider.call_count(), 0);
    }

    #[test]
    fn test_mock_provider_error() {
        let mut provider = MockProvider::default();
        provider.add_error("bad", LlmError::Unreachable("refused".into()));

        let result = provider.generate("", "bad prompt", None);
        assert!(matches!(result, Err(LlmError::Unreachable(_))));
    }

    #[test]
    fn test_mock_provider_clone_shares_state() {
        let provider1 = MockProvider::new("test");
        let provider2 = provider1.clone();

        provider1.generate("", "test", None).unwrap();
        assert_eq!(provider1.call_count(), 1);
        assert_eq!(provider2.call_count(), 1);
    }

    #[test]
    fn test_status_classification() {
        assert!(matches!(LlmError::from_status(401, "no".into()), LlmError::Auth(_)));
        assert!(LlmError::from_status(503, String::new()).is_transient());
        assert!(!LlmError::from_status(400, String::new()).is_transient());
    }
}
