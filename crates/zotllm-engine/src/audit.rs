//! `missing_pdf`: reconcile the marker tag with attachment presence
//!
//! Items without a PDF gain the tag, items that have one again lose it, and
//! everything else is left alone. No model is involved.

use crate::error::{EngineError, FailureKind, ItemFailure};
use crate::report::{PdfChange, PdfChangeRecord, ProcessedItem, TaskReport};
use tracing::{error, info};
use zotllm_domain::traits::LibraryClient;
use zotllm_domain::{Attachment, CollectionTree, LibraryItem, TaskKind};
use zotllm_library::LibraryError;

/// Audit every regular item in the library
///
/// # Errors
///
/// Only listing failures abort the run; per-item write failures are
/// recorded in the report. Attachments are listed once for the whole
/// library rather than read item by item.
pub fn run_missing_pdf<L>(library: &L) -> Result<TaskReport, EngineError>
where
    L: LibraryClient<Error = LibraryError>,
{
    let kind = TaskKind::MissingPdf;
    let marker = kind.marker_tag();
    let tree = CollectionTree::new(library.list_collections()?);
    let items: Vec<LibraryItem> = library
        .list_all_items()?
        .into_iter()
        .filter(LibraryItem::is_regular)
        .collect();
    let attachments = library.list_attachments()?;
    info!(
        items = items.len(),
        collections = tree.len(),
        with_attachments = attachments.len(),
        "Auditing attachments"
    );

    let mut report = TaskReport::new(kind, "entire library");
    for item in items {
        let has_pdf = attachments
            .get(&item.key)
            .is_some_and(|found| found.iter().any(Attachment::is_pdf));

        let change = match (has_pdf, item.has_tag(marker)) {
            (false, false) => PdfChange::Tagged,
            (true, true) => PdfChange::Untagged,
            _ => {
                report.record_skipped(&item.key, item.label());
                continue;
            }
        };

        let written = match change {
            PdfChange::Tagged => library.add_tag(&item.key, marker),
            PdfChange::Untagged => library.remove_tag(&item.key, marker),
        };
        if let Err(e) = written {
            error!(item = %item.key, title = %item.title, error = %e, "Failed to update tag");
            report.record_failure(ItemFailure::new(&item.key, item.label(), FailureKind::write(e)));
            continue;
        }

        let collection_paths: Vec<String> = item
            .collections
            .iter()
            .filter_map(|key| tree.path(key))
            .collect();
        info!(
            item = %item.key,
            title = %item.title,
            change = ?change,
            paths = %collection_paths.join("; "),
            "missing_pdf updated"
        );
        report.record_processed(ProcessedItem {
            key: item.key.clone(),
            label: item.label(),
            note_key: None,
            note_updated: false,
        });
        report.pdf_changes.push(PdfChangeRecord {
            key: item.key,
            title: item.title,
            collection_paths,
            change,
        });
    }
    Ok(report)
}
