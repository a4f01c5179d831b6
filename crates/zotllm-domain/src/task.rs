//! Task kinds, their marker tags, and task results

use std::fmt;

/// Name of the root collection that holds question-answering notes
pub const QA_ROOT_COLLECTION: &str = "#LLM QA";

/// The four supported tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Per-item summary
    LlmSummary,
    /// Per-item key-reference extraction
    KeyReferences,
    /// Library-wide missing-PDF audit
    MissingPdf,
    /// Question answering over a collection scope
    SummaryQa,
}

impl TaskKind {
    /// All task kinds
    pub const ALL: [TaskKind; 4] = [
        TaskKind::LlmSummary,
        TaskKind::KeyReferences,
        TaskKind::MissingPdf,
        TaskKind::SummaryQa,
    ];

    /// Task name as used on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::LlmSummary => "llm_summary",
            TaskKind::KeyReferences => "key_references",
            TaskKind::MissingPdf => "missing_pdf",
            TaskKind::SummaryQa => "summary_qa",
        }
    }

    /// Parse a task name
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s.trim())
    }

    /// Tag written to mark the task's work
    pub fn marker_tag(&self) -> &'static str {
        match self {
            TaskKind::LlmSummary => "llm_summary",
            TaskKind::KeyReferences => "key_references",
            TaskKind::MissingPdf => "missing_pdf",
            TaskKind::SummaryQa => "llm_qa",
        }
    }

    /// Heading of the notes the task writes, if it writes notes
    pub fn note_title(&self) -> Option<&'static str> {
        match self {
            TaskKind::LlmSummary => Some("LLM Summary"),
            TaskKind::KeyReferences => Some("Key References"),
            TaskKind::MissingPdf => None,
            TaskKind::SummaryQa => Some("LLM QA"),
        }
    }

    /// Whether the task calls a model backend
    pub fn uses_model(&self) -> bool {
        !matches!(self, TaskKind::MissingPdf)
    }

    /// Whether the task writes one note per item and is skipped once tagged
    pub fn is_per_item(&self) -> bool {
        matches!(self, TaskKind::LlmSummary | TaskKind::KeyReferences)
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a note is written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteTarget {
    /// Child note of an existing item
    Item(String),
    /// Standalone note inside a collection
    Collection(String),
}

/// Generated content waiting to be written back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskResult {
    /// Task that produced the content
    pub kind: TaskKind,
    /// Keys of the items the content was generated from
    pub sources: Vec<String>,
    /// HTML note body
    pub body: String,
    /// Tags applied to the note
    pub tags: Vec<String>,
    /// Note destination
    pub target: NoteTarget,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trip() {
        for kind in TaskKind::ALL {
            assert_eq!(TaskKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(TaskKind::parse("analyze_item"), None);
    }

    #[test]
    fn test_markers() {
        assert_eq!(TaskKind::SummaryQa.marker_tag(), "llm_qa");
        assert_eq!(TaskKind::KeyReferences.note_title(), Some("Key References"));
        assert!(TaskKind::MissingPdf.note_title().is_none());
        assert!(!TaskKind::MissingPdf.uses_model());
        assert!(TaskKind::LlmSummary.is_per_item());
        assert!(!TaskKind::SummaryQa.is_per_item());
    }
}
