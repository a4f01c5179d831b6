//! Prompt construction for the model-backed tasks

use crate::assembler::QaEntry;
use crate::error::FailureKind;
use zotllm_domain::{LibraryItem, TaskKind};

/// System role and instruction for one task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    /// System role sent alongside the user content
    pub system_role: String,
    /// Instruction that opens the user content
    pub instruction: String,
}

const DEFAULT_SYSTEM_ROLE: &str =
    "You are an AI assistant specialized in analyzing research documents.";

const SUMMARY_INSTRUCTION: &str = r#"Summarize the research paper below for a researcher deciding whether to read it in full.
Cover the research question, the methods, the main findings and their limitations.
Write plain prose without preamble."#;

const KEY_REFERENCES_INSTRUCTION: &str = r#"List the key references of the research paper below: the prior work it builds on most directly and the works it compares itself against.
Give one reference per line as "Authors (Year). Title", followed by one sentence on why it matters to this paper.
Only list references that appear in the text."#;

const QA_INSTRUCTION: &str = r#"Answer the question using only the document summaries below.
Cite documents by their bracketed number, say where they disagree, and state plainly when the summaries do not contain the answer."#;

const QA_SYSTEM_ROLE: &str =
    "You are an AI assistant answering questions across a collection of research papers.";

/// Built-in template for a task
pub fn default_template(kind: TaskKind) -> PromptTemplate {
    let (system_role, instruction) = match kind {
        TaskKind::LlmSummary => (DEFAULT_SYSTEM_ROLE, SUMMARY_INSTRUCTION),
        TaskKind::KeyReferences => (DEFAULT_SYSTEM_ROLE, KEY_REFERENCES_INSTRUCTION),
        TaskKind::SummaryQa => (QA_SYSTEM_ROLE, QA_INSTRUCTION),
        TaskKind::MissingPdf => (DEFAULT_SYSTEM_ROLE, ""),
    };
    PromptTemplate {
        system_role: system_role.to_string(),
        instruction: instruction.to_string(),
    }
}

/// Builds the user content of a model request
///
/// # Examples
///
/// ```
/// use zotllm_domain::LibraryItem;
/// use zotllm_engine::PromptBuilder;
///
/// let item = LibraryItem::new("K1", "Scaling laws");
/// let prompt = PromptBuilder::new("Summarize.")
///     .with_item(&item)
///     .with_full_text(Some("We find that..."))
///     .build();
/// assert!(prompt.starts_with("Summarize."));
/// assert!(prompt.contains("Title: Scaling laws"));
/// assert!(prompt.contains("Full Text:\nWe find that..."));
/// ```
pub struct PromptBuilder {
    instruction: String,
    sections: Vec<(String, String)>,
}

impl PromptBuilder {
    /// Create a builder with the task instruction
    pub fn new(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            sections: Vec::new(),
        }
    }

    /// Add a titled section
    pub fn with_section(mut self, heading: impl Into<String>, body: impl Into<String>) -> Self {
        self.sections.push((heading.into(), body.into()));
        self
    }

    /// Add the item's bibliographic metadata
    pub fn with_item(self, item: &LibraryItem) -> Self {
        let mut details = format!("Title: {}\n", item.title);
        details.push_str(&format!("Authors: {}\n", item.authors()));
        if let Some(year) = item.year() {
            details.push_str(&format!("Year: {}\n", year));
        }
        details.push_str(&format!("Item Type: {}\n", item.item_type));
        details.push_str(&format!("Abstract: {}", item.abstract_note));
        self.with_section("Research Paper Details", details)
    }

    /// Add the full text, when there is one
    pub fn with_full_text(self, full_text: Option<&str>) -> Self {
        match full_text {
            Some(text) => self.with_section("Full Text", text.trim()),
            None => self,
        }
    }

    /// Add the user's question
    pub fn with_question(self, question: &str) -> Self {
        self.with_section("Question", question.trim())
    }

    /// Add numbered document summaries and their key references
    pub fn with_documents(self, entries: &[QaEntry]) -> Self {
        let mut body = String::new();
        for (i, entry) in entries.iter().enumerate() {
            body.push_str(&format!("[{}] {}\n", i + 1, entry.label));
            body.push_str("Summary:\n");
            body.push_str(entry.summary.trim());
            body.push('\n');
            if let Some(references) = &entry.references {
                body.push_str("Key References:\n");
                body.push_str(references.trim());
                body.push('\n');
            }
            body.push('\n');
        }
        self.with_section("Documents", body.trim_end())
    }

    /// Build the complete prompt
    pub fn build(&self) -> String {
        let mut prompt = String::new();
        prompt.push_str(self.instruction.trim());

        for (heading, body) in &self.sections {
            prompt.push_str("\n\n");
            prompt.push_str(heading);
            prompt.push_str(":\n");
            prompt.push_str(body);
        }
        prompt.push('\n');
        prompt
    }
}

/// Reject prompts longer than `limit` characters
pub fn check_prompt_size(prompt: &str, limit: Option<usize>) -> Result<(), FailureKind> {
    let chars = prompt.chars().count();
    match limit {
        Some(limit) if chars > limit => Err(FailureKind::PromptTooLarge { chars, limit }),
        _ => Ok(()),
    }
}
