//! Content assembly: what the model gets to read

use crate::error::{FailureKind, ItemFailure};
use crate::notes::note_text;
use tracing::{debug, warn};
use zotllm_domain::traits::LibraryClient;
use zotllm_domain::{ItemChildren, LibraryItem, ScopedItem, TaskKind};
use zotllm_library::LibraryError;

/// One document in a question-answering aggregate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QaEntry {
    /// Item key
    pub key: String,
    /// Item label shown to the model
    pub label: String,
    /// Plain text of the item's summary note
    pub summary: String,
    /// Plain text of the item's key-references note, when requested and present
    pub references: Option<String>,
}

/// The prior summaries of a scope, plus what had to be left out
#[derive(Debug, Clone, Default)]
pub struct QaAggregate {
    /// Documents with a prior summary, in scope order
    pub entries: Vec<QaEntry>,
    /// Items without a prior summary
    pub excluded: Vec<ItemFailure>,
    /// Items whose notes could not be read
    pub failures: Vec<ItemFailure>,
}

/// Gathers model input from the library
pub struct ContentAssembler<'a, L> {
    library: &'a L,
    include_fulltext: bool,
}

impl<'a, L> ContentAssembler<'a, L>
where
    L: LibraryClient<Error = LibraryError>,
{
    /// Create an assembler
    pub fn new(library: &'a L, include_fulltext: bool) -> Self {
        Self {
            library,
            include_fulltext,
        }
    }

    /// Full text for a single-document task
    ///
    /// Returns `Ok(None)` when full text is disabled. PDF attachments are
    /// tried in order and the first with indexed text wins.
    pub fn full_text(
        &self,
        item: &LibraryItem,
        children: &ItemChildren,
    ) -> Result<Option<String>, FailureKind> {
        if !self.include_fulltext {
            return Ok(None);
        }

        if item.is_attachment() {
            return match self.library.get_full_text(&item.key) {
                Ok(Some(text)) => Ok(Some(text)),
                Ok(None) => Err(FailureKind::MissingFullText),
                Err(e) => Err(FailureKind::Library(e)),
            };
        }

        for attachment in children.pdf_attachments() {
            match self.library.get_full_text(&attachment.key) {
                Ok(Some(text)) => {
                    debug!(item = %item.key, attachment = %attachment.key, chars = text.len(), "Using full text");
                    return Ok(Some(text));
                }
                Ok(None) => {
                    debug!(item = %item.key, attachment = %attachment.key, "Attachment has no indexed text");
                }
                Err(e) => {
                    warn!(item = %item.key, attachment = %attachment.key, error = %e, "Failed to read full text");
                }
            }
        }
        Err(FailureKind::MissingFullText)
    }

    /// Prior summaries (and optionally key references) across a scope
    pub fn qa_aggregate(&self, items: &[ScopedItem], include_references: bool) -> QaAggregate {
        let summary = TaskKind::LlmSummary;
        let references = TaskKind::KeyReferences;
        let mut aggregate = QaAggregate::default();

        for scoped in items {
            let item = &scoped.item;
            let label = item.label();
            let children = match self.library.get_children(&item.key) {
                Ok(children) => children,
                Err(e) => {
                    warn!(item = %item.key, title = %item.title, error = %e, "Failed to read notes");
                    aggregate
                        .failures
                        .push(ItemFailure::new(&item.key, label, FailureKind::Library(e)));
                    continue;
                }
            };

            let summary_text = children
                .find_note(summary.marker_tag(), summary.note_title().unwrap_or_default())
                .map(|n| note_text(&n.body))
                .filter(|t| !t.is_empty());
            let Some(summary_text) = summary_text else {
                warn!(item = %item.key, title = %item.title, "No prior summary, excluded from aggregate");
                aggregate.excluded.push(ItemFailure::new(
                    &item.key,
                    label,
                    FailureKind::MissingPriorSummary,
                ));
                continue;
            };

            let references_text = if include_references {
                children
                    .find_note(references.marker_tag(), references.note_title().unwrap_or_default())
                    .map(|n| note_text(&n.body))
                    .filter(|t| !t.is_empty())
            } else {
                None
            };

            aggregate.entries.push(QaEntry {
                key: item.key.clone(),
                label,
                summary: summary_text,
                references: references_text,
            });
        }
        aggregate
    }
}
