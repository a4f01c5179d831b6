//! Output formatting for the CLI.

use crate::cli::OutputFormat;
use crate::error::Result;
use colored::*;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};
use zotllm_engine::{ItemFailure, PdfChange, PdfChangeRecord, TaskReport};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format a run report.
    pub fn format_report(&self, report: &TaskReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => self.format_report_json(report),
            OutputFormat::Table => Ok(self.format_report_table(report)),
        }
    }

    fn format_report_json(&self, report: &TaskReport) -> Result<String> {
        let mut value = serde_json::to_value(report)?;
        if let Some(object) = value.as_object_mut() {
            object.insert(
                "counts".to_string(),
                serde_json::json!({
                    "processed": report.processed_count(),
                    "skipped_done": report.skipped_done_count(),
                    "skipped_missing_content": report.skipped_missing_content_count(),
                    "failed": report.failed_count(),
                }),
            );
        }
        Ok(serde_json::to_string_pretty(&value)?)
    }

    fn format_report_table(&self, report: &TaskReport) -> String {
        let mut sections = vec![self.info(&format!("{} on {}", report.task, report.scope))];

        let mut builder = Builder::default();
        builder.push_record(["Outcome", "Items"]);
        builder.push_record(["Processed".to_string(), report.processed_count().to_string()]);
        builder.push_record([
            "Skipped (already done)".to_string(),
            report.skipped_done_count().to_string(),
        ]);
        builder.push_record([
            "Skipped (missing content)".to_string(),
            report.skipped_missing_content_count().to_string(),
        ]);
        builder.push_record(["Failed".to_string(), report.failed_count().to_string()]);
        sections.push(styled(builder));

        for path in &report.unresolved_paths {
            sections.push(self.warning(&format!("Collection path not found: {}", path)));
        }

        let failures: Vec<&ItemFailure> = report.failures.iter().chain(&report.excluded).collect();
        if !failures.is_empty() {
            sections.push(self.failures_table(&failures));
        }

        for failure in &report.failures {
            if let Some(content) = failure.kind.unsaved_content() {
                sections.push(self.warning(&format!(
                    "Unsaved output for {} ({}):",
                    failure.key, failure.label
                )));
                sections.push(content.to_string());
            }
        }

        if !report.pdf_changes.is_empty() {
            sections.push(self.pdf_changes_table(&report.pdf_changes));
        }

        if let Some(note) = &report.qa_note {
            sections.push(self.success(&format!(
                "Answer written to {} (note {})",
                note.collection_path, note.note_key
            )));
        } else if report.failed_count() == 0 {
            sections.push(self.success("Done"));
        }

        sections.join("\n")
    }

    fn failures_table(&self, failures: &[&ItemFailure]) -> String {
        let mut builder = Builder::default();
        builder.push_record(["Item", "Title", "Reason"]);
        for failure in failures {
            let mut reason = failure.kind.to_string();
            if failure.kind.unsaved_content().is_some() {
                reason.push_str(" (output shown below)");
            }
            builder.push_record([failure.key.clone(), failure.label.clone(), reason]);
        }
        styled(builder)
    }

    fn pdf_changes_table(&self, changes: &[PdfChangeRecord]) -> String {
        let mut builder = Builder::default();
        builder.push_record(["Change", "Title", "Collections"]);
        for change in changes {
            let label = match change.change {
                PdfChange::Tagged => self.colorize("tagged", "yellow"),
                PdfChange::Untagged => self.colorize("untagged", "green"),
            };
            let paths = if change.collection_paths.is_empty() {
                "(unfiled)".to_string()
            } else {
                change.collection_paths.join("\n")
            };
            builder.push_record([label, change.title.clone(), paths]);
        }
        styled(builder)
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

fn styled(builder: Builder) -> String {
    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}
