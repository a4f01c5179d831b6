//! Error types for task runs
//!
//! [`EngineError`] aborts a whole invocation. Problems with one item are
//! [`ItemFailure`] values collected in the run report instead.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt;
use thiserror::Error;
use zotllm_library::LibraryError;
use zotllm_llm::LlmError;

/// Errors that abort a task invocation
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration or argument error, detected before any work
    #[error("Configuration error: {0}")]
    Config(String),

    /// Scope selection is missing, ambiguous or unusable for the task
    #[error("Invalid scope: {0}")]
    InvalidScope(String),

    /// No collection path could be resolved
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    /// Library access failed while resolving the scope
    #[error("Library error: {0}")]
    Library(#[from] LibraryError),

    /// The only item of a single-item invocation failed
    #[error("Item {key} failed: {reason}")]
    ItemFailed {
        /// Item key
        key: String,
        /// Failure description
        reason: String,
    },
}

/// Why one item could not be processed
#[derive(Debug, Clone, PartialEq)]
pub enum FailureKind {
    /// Full text required but no attachment has indexed text
    MissingFullText,
    /// No prior summary note to aggregate
    MissingPriorSummary,
    /// Assembled prompt exceeds the configured limit
    PromptTooLarge {
        /// Prompt length in characters
        chars: usize,
        /// Configured maximum
        limit: usize,
    },
    /// Model backend failed
    Provider(LlmError),
    /// Generated content could not be written back
    LibraryWrite {
        /// Library failure
        error: LibraryError,
        /// Model output that was not saved, kept so it reaches the report
        content: Option<String>,
    },
    /// Reading the item's data failed
    Library(LibraryError),
}

impl FailureKind {
    /// Write failure of generated content
    pub fn unsaved(error: LibraryError, content: impl Into<String>) -> Self {
        FailureKind::LibraryWrite {
            error,
            content: Some(content.into()),
        }
    }

    /// Write failure with nothing generated to lose
    pub fn write(error: LibraryError) -> Self {
        FailureKind::LibraryWrite {
            error,
            content: None,
        }
    }

    /// Model output that failed to be written back
    pub fn unsaved_content(&self) -> Option<&str> {
        match self {
            FailureKind::LibraryWrite { content, .. } => content.as_deref(),
            _ => None,
        }
    }

    /// Whether the item was skipped for lack of content rather than failing
    pub fn is_missing_content(&self) -> bool {
        matches!(
            self,
            FailureKind::MissingFullText | FailureKind::MissingPriorSummary
        )
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::MissingFullText => write!(f, "no attachment with indexed full text"),
            FailureKind::MissingPriorSummary => write!(f, "no prior llm_summary note"),
            FailureKind::PromptTooLarge { chars, limit } => write!(
                f,
                "prompt too large ({} characters, maximum {}); raise tasks.max_prompt_chars or use a shorter document",
                chars, limit
            ),
            FailureKind::Provider(e) => write!(f, "model backend: {}", e),
            FailureKind::LibraryWrite { error, .. } => write!(f, "write-back: {}", error),
            FailureKind::Library(e) => write!(f, "library: {}", e),
        }
    }
}

/// A per-item failure recorded in a run report
///
/// Serializes as `key`, `label` and `reason`, plus `unsaved_content` when
/// generated text could not be written back.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemFailure {
    /// Item key, or the scope description for scope-level QA failures
    pub key: String,
    /// Human-readable item label
    pub label: String,
    /// What went wrong
    pub kind: FailureKind,
}

impl ItemFailure {
    /// Create a failure record
    pub fn new(key: impl Into<String>, label: impl Into<String>, kind: FailureKind) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            kind,
        }
    }
}

impl Serialize for ItemFailure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let unsaved = self.kind.unsaved_content();
        let len = if unsaved.is_some() { 4 } else { 3 };
        let mut state = serializer.serialize_struct("ItemFailure", len)?;
        state.serialize_field("key", &self.key)?;
        state.serialize_field("label", &self.label)?;
        state.serialize_field("reason", &self.kind.to_string())?;
        if let Some(content) = unsaved {
            state.serialize_field("unsaved_content", content)?;
        }
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_content_classification() {
        assert!(FailureKind::MissingFullText.is_missing_content());
        assert!(FailureKind::MissingPriorSummary.is_missing_content());
        assert!(!FailureKind::Provider(LlmError::Timeout(60)).is_missing_content());
    }

    #[test]
    fn test_failure_serializes_reason() {
        let failure = ItemFailure::new("K1", "Paper (2020)", FailureKind::MissingFullText);
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["key"], "K1");
        assert_eq!(json["reason"], "no attachment with indexed full text");
    }

    #[test]
    fn test_unsaved_content_serialized() {
        let failure = ItemFailure::new(
            "K1",
            "Paper (2020)",
            FailureKind::unsaved(LibraryError::Write("rejected".to_string()), "Generated summary."),
        );
        assert_eq!(failure.kind.unsaved_content(), Some("Generated summary."));
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["unsaved_content"], "Generated summary.");
        assert_eq!(json["reason"], "write-back: Write failed: rejected");
    }

    #[test]
    fn test_tag_write_failure_has_no_content() {
        let failure = ItemFailure::new("K1", "Paper", FailureKind::write(LibraryError::NotFound("K1".to_string())));
        let json = serde_json::to_value(&failure).unwrap();
        assert!(json.get("unsaved_content").is_none());
    }
}
