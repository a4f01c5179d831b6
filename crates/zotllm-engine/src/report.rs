//! Outcome of a task run
//!
//! Every item in a run ends up in exactly one bucket: processed, skipped
//! because already done, skipped for missing content, or failed.

use crate::error::ItemFailure;
use serde::Serialize;
use zotllm_domain::TaskKind;

/// An item reference in a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemRef {
    /// Item key
    pub key: String,
    /// Item label
    pub label: String,
}

/// An item the task completed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessedItem {
    /// Item key
    pub key: String,
    /// Item label
    pub label: String,
    /// Note written for the item, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note_key: Option<String>,
    /// Whether an existing note was overwritten instead of created
    pub note_updated: bool,
}

/// Direction of a `missing_pdf` tag change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PdfChange {
    /// Tag added: the item has no PDF
    Tagged,
    /// Tag removed: a PDF is attached now
    Untagged,
}

/// A `missing_pdf` change with the item's location in the library
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PdfChangeRecord {
    /// Item key
    pub key: String,
    /// Item title
    pub title: String,
    /// Full paths of the collections holding the item
    pub collection_paths: Vec<String>,
    /// What changed
    pub change: PdfChange,
}

/// Where a question-answering note was written
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QaNote {
    /// Note key
    pub note_key: String,
    /// Destination collection key
    pub collection_key: String,
    /// Destination path, e.g. `#LLM QA/Complex Networks`
    pub collection_path: String,
}

/// Results of one task invocation
#[derive(Debug, Clone, Serialize)]
pub struct TaskReport {
    /// Task name
    pub task: String,
    /// Scope description
    pub scope: String,
    /// Completed items
    pub processed: Vec<ProcessedItem>,
    /// Items already carrying the task's marker tag
    pub skipped_done: Vec<ItemRef>,
    /// Items that failed or lacked content
    pub failures: Vec<ItemFailure>,
    /// QA: items left out of the aggregate for lack of a prior summary
    pub excluded: Vec<ItemFailure>,
    /// missing_pdf: tag changes
    pub pdf_changes: Vec<PdfChangeRecord>,
    /// summary_qa: the note written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qa_note: Option<QaNote>,
    /// Collection paths that did not resolve
    pub unresolved_paths: Vec<String>,
}

impl TaskReport {
    /// Create an empty report
    pub fn new(kind: TaskKind, scope: impl Into<String>) -> Self {
        Self {
            task: kind.as_str().to_string(),
            scope: scope.into(),
            processed: Vec::new(),
            skipped_done: Vec::new(),
            failures: Vec::new(),
            excluded: Vec::new(),
            pdf_changes: Vec::new(),
            qa_note: None,
            unresolved_paths: Vec::new(),
        }
    }

    /// Record a completed item
    pub fn record_processed(&mut self, item: ProcessedItem) {
        self.processed.push(item);
    }

    /// Record an item skipped because it is already done
    pub fn record_skipped(&mut self, key: impl Into<String>, label: impl Into<String>) {
        self.skipped_done.push(ItemRef {
            key: key.into(),
            label: label.into(),
        });
    }

    /// Record a per-item failure
    pub fn record_failure(&mut self, failure: ItemFailure) {
        self.failures.push(failure);
    }

    /// Number of completed items
    pub fn processed_count(&self) -> usize {
        self.processed.len()
    }

    /// Number of items skipped as already done
    pub fn skipped_done_count(&self) -> usize {
        self.skipped_done.len()
    }

    /// Number of items skipped for missing content, QA exclusions included
    pub fn skipped_missing_content_count(&self) -> usize {
        self.failures
            .iter()
            .filter(|f| f.kind.is_missing_content())
            .count()
            + self.excluded.len()
    }

    /// Number of failed items
    pub fn failed_count(&self) -> usize {
        self.failures
            .iter()
            .filter(|f| !f.kind.is_missing_content())
            .count()
    }

    /// Whether nothing failed
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Plain-text summary of the counts
    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!("Task: {} ({})", self.task, self.scope),
            format!("Processed: {}", self.processed_count()),
            format!("Skipped (already done): {}", self.skipped_done_count()),
            format!(
                "Skipped (missing content): {}",
                self.skipped_missing_content_count()
            ),
            format!("Failed: {}", self.failed_count()),
        ];

        if !self.pdf_changes.is_empty() {
            let tagged = self
                .pdf_changes
                .iter()
                .filter(|c| c.change == PdfChange::Tagged)
                .count();
            lines.push(format!(
                "missing_pdf: {} tagged, {} untagged",
                tagged,
                self.pdf_changes.len() - tagged
            ));
        }
        if let Some(note) = &self.qa_note {
            lines.push(format!("Answer written to {}", note.collection_path));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use zotllm_llm::LlmError;

    #[test]
    fn test_report_creation() {
        let report = TaskReport::new(TaskKind::LlmSummary, "item K1");
        assert_eq!(report.task, "llm_summary");
        assert_eq!(report.processed_count(), 0);
        assert!(report.is_clean());
    }

    #[test]
    fn test_counts_by_bucket() {
        let mut report = TaskReport::new(TaskKind::LlmSummary, "collections Research");
        report.record_processed(ProcessedItem {
            key: "A".into(),
            label: "a".into(),
            note_key: Some("N1".into()),
            note_updated: false,
        });
        report.record_skipped("B", "b");
        report.record_failure(ItemFailure::new("C", "c", FailureKind::MissingFullText));
        report.record_failure(ItemFailure::new(
            "D",
            "d",
            FailureKind::Provider(LlmError::Timeout(60)),
        ));

        assert_eq!(report.processed_count(), 1);
        assert_eq!(report.skipped_done_count(), 1);
        assert_eq!(report.skipped_missing_content_count(), 1);
        assert_eq!(report.failed_count(), 1);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_summary() {
        let mut report = TaskReport::new(TaskKind::MissingPdf, "library");
        report.pdf_changes.push(PdfChangeRecord {
            key: "A".into(),
            title: "a".into(),
            collection_paths: vec!["Research/AI".into()],
            change: PdfChange::Tagged,
        });
        let summary = report.summary();
        assert!(summary.contains("Task: missing_pdf (library)"));
        assert!(summary.contains("missing_pdf: 1 tagged, 0 untagged"));
    }

    #[test]
    fn test_json_shape() {
        let report = TaskReport::new(TaskKind::SummaryQa, "collections X");
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["task"], "summary_qa");
        assert!(json.get("qa_note").is_none());
        assert!(json["excluded"].as_array().unwrap().is_empty());
    }
}
