//! Error types for the CLI application.

use thiserror::Error;
use zotllm_engine::EngineError;
use zotllm_library::LibraryError;
use zotllm_llm::LlmError;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Task engine error
    #[error("{0}")]
    Engine(#[from] EngineError),

    /// Library error raised outside a task run
    #[error("Zotero error: {0}")]
    Library(#[from] LibraryError),

    /// Model provider error raised outside a task run
    #[error("Model provider error: {0}")]
    Llm(#[from] LlmError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_message_passes_through() {
        let err: CliError = EngineError::InvalidScope("no item matches 'x'".to_string()).into();
        assert!(err.to_string().contains("no item matches 'x'"));
    }

    #[test]
    fn test_library_error_wrapped() {
        let err: CliError = LibraryError::Auth("invalid key".to_string()).into();
        assert!(err.to_string().starts_with("Zotero error"));
    }
}
