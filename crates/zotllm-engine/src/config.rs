//! Task and prompt configuration
//!
//! Both sections come from the `tasks` and `prompts` blocks of the
//! configuration file; every field has a default.

use crate::prompt::{default_template, PromptTemplate};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use zotllm_domain::TaskKind;

/// Behaviour shared by the tasks
///
/// # Examples
///
/// ```
/// use zotllm_engine::TaskConfig;
///
/// let config = TaskConfig::default();
/// assert!(config.include_fulltext);
/// assert_eq!(config.qa_timeout_secs, 120);
/// assert_eq!(config.qa_fallback_collection, "Miscellaneous");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Send attachment full text to the model for per-item tasks
    #[serde(default = "default_include_fulltext")]
    pub include_fulltext: bool,

    /// Fail an item whose prompt is longer than this many characters
    #[serde(default)]
    pub max_prompt_chars: Option<usize>,

    /// Model timeout for question answering, in seconds
    ///
    /// A longer provider timeout wins.
    #[serde(default = "default_qa_timeout_secs")]
    pub qa_timeout_secs: u64,

    /// Add key-reference notes to the QA aggregate
    #[serde(default = "default_qa_include_references")]
    pub qa_include_references: bool,

    /// QA destination when the scope has no single top-level collection
    #[serde(default = "default_qa_fallback_collection")]
    pub qa_fallback_collection: String,
}

fn default_include_fulltext() -> bool {
    true
}

fn default_qa_timeout_secs() -> u64 {
    120
}

fn default_qa_include_references() -> bool {
    true
}

fn default_qa_fallback_collection() -> String {
    "Miscellaneous".to_string()
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            include_fulltext: default_include_fulltext(),
            max_prompt_chars: None,
            qa_timeout_secs: default_qa_timeout_secs(),
            qa_include_references: default_qa_include_references(),
            qa_fallback_collection: default_qa_fallback_collection(),
        }
    }
}

impl TaskConfig {
    /// Model timeout for question answering
    pub fn qa_timeout(&self) -> Duration {
        Duration::from_secs(self.qa_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.qa_timeout_secs == 0 {
            return Err("tasks.qa_timeout_secs must be positive".to_string());
        }
        if self.max_prompt_chars == Some(0) {
            return Err("tasks.max_prompt_chars must be positive when set".to_string());
        }
        if self.qa_fallback_collection.trim().is_empty() {
            return Err("tasks.qa_fallback_collection must not be empty".to_string());
        }
        Ok(())
    }
}

/// Override of one task's prompt; unset fields keep the built-in text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptOverride {
    /// System role sent with every request
    #[serde(default)]
    pub system_role: Option<String>,
    /// Instruction placed at the top of the user content
    #[serde(default)]
    pub instruction: Option<String>,
}

/// Per-task prompt overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptConfig {
    /// llm_summary prompt
    #[serde(default)]
    pub llm_summary: Option<PromptOverride>,
    /// key_references prompt
    #[serde(default)]
    pub key_references: Option<PromptOverride>,
    /// summary_qa prompt
    #[serde(default)]
    pub summary_qa: Option<PromptOverride>,
}

impl PromptConfig {
    /// Effective template for a task
    pub fn template(&self, kind: TaskKind) -> PromptTemplate {
        let mut template = default_template(kind);
        let custom = match kind {
            TaskKind::LlmSummary => self.llm_summary.as_ref(),
            TaskKind::KeyReferences => self.key_references.as_ref(),
            TaskKind::SummaryQa => self.summary_qa.as_ref(),
            TaskKind::MissingPdf => None,
        };
        if let Some(custom) = custom {
            if let Some(role) = custom.system_role.as_ref().filter(|s| !s.trim().is_empty()) {
                template.system_role = role.clone();
            }
            if let Some(instruction) = custom.instruction.as_ref().filter(|s| !s.trim().is_empty()) {
                template.instruction = instruction.clone();
            }
        }
        template
    }
}

/// Everything a [`crate::TaskEngine`] needs besides its collaborators
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Task behaviour
    #[serde(default)]
    pub tasks: TaskConfig,
    /// Prompt overrides
    #[serde(default)]
    pub prompts: PromptConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_deserialization() {
        let config: TaskConfig = serde_json::from_str(r#"{"max_prompt_chars": 50000}"#).unwrap();
        assert_eq!(config.max_prompt_chars, Some(50000));
        assert!(config.include_fulltext);
        assert!(config.qa_include_references);
    }

    #[test]
    fn test_validation() {
        assert!(TaskConfig::default().validate().is_ok());
        let config = TaskConfig {
            qa_timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        let config = TaskConfig {
            qa_fallback_collection: " ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_prompt_override() {
        let prompts = PromptConfig {
            llm_summary: Some(PromptOverride {
                system_role: None,
                instruction: Some("Summarize in three bullets.".to_string()),
            }),
            ..Default::default()
        };
        let template = prompts.template(TaskKind::LlmSummary);
        assert_eq!(template.instruction, "Summarize in three bullets.");
        assert_eq!(
            template.system_role,
            default_template(TaskKind::LlmSummary).system_role
        );
        assert_eq!(
            prompts.template(TaskKind::KeyReferences),
            default_template(TaskKind::KeyReferences)
        );
    }
}
