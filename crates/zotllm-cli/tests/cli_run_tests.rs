//! Parsed command lines run end to end against an in-memory library

use clap::Parser;
use zotllm_cli::{run_command, Cli, CliError, Formatter, OutputFormat};
use zotllm_domain::{Attachment, LibraryItem, Note};
use zotllm_engine::{render_note, EngineConfig, EngineError, TaskReport};
use zotllm_library::InMemoryLibrary;
use zotllm_llm::MockProvider;

fn library() -> InMemoryLibrary {
    let library = InMemoryLibrary::new();
    library.add_collection("R", "Research", None);
    library.add_collection("NET", "Networks", Some("R"));

    library.add_item(LibraryItem::new("P1", "Scaling in cities").in_collection("NET"));
    library.add_attachment("P1", Attachment::pdf("P1-PDF"), Some("Cities scale."));
    library.add_item(LibraryItem::new("P2", "Preferential attachment").in_collection("NET"));
    library.add_attachment("P2", Attachment::pdf("P2-PDF"), Some("Rich get richer."));
    library.add_item(LibraryItem::new("P3", "Unfiled draft"));
    library
}

fn run(
    args: &[&str],
    library: &InMemoryLibrary,
    provider: &MockProvider,
) -> Result<TaskReport, CliError> {
    let cli = Cli::parse_from(args.iter().copied());
    run_command(&cli.command, library, provider, EngineConfig::default())
}

#[test]
fn test_llm_summary_over_collection_path() {
    let library = library();
    let provider = MockProvider::new("A summary.");

    let report = run(
        &["zotllm", "llm_summary", "collection", "--collection-path", "Research/Networks"],
        &library,
        &provider,
    )
    .unwrap();

    assert_eq!(report.processed_count(), 2);
    assert_eq!(library.notes_of("P1").len(), 1);
    assert!(library.item("P2").unwrap().has_tag("llm_summary"));
    assert_eq!(provider.call_count(), 2);
}

#[test]
fn test_no_skip_analyzed_reruns_tagged_items() {
    let library = library();
    let provider = MockProvider::new("Refs.");
    let args = ["zotllm", "key_references", "item", "--item-id", "P1"];

    run(&args, &library, &provider).unwrap();
    let skipped = run(&args, &library, &provider).unwrap();
    assert_eq!(skipped.skipped_done_count(), 1);

    let forced = run(
        &["zotllm", "key_references", "item", "--item-id", "P1", "--no-skip-analyzed"],
        &library,
        &provider,
    )
    .unwrap();
    assert_eq!(forced.processed_count(), 1);
    assert_eq!(library.notes_of("P1").len(), 1);
    assert_eq!(provider.call_count(), 2);
}

#[test]
fn test_missing_pdf_command() {
    let library = library();
    let provider = MockProvider::default();

    let report = run(&["zotllm", "missing_pdf"], &library, &provider).unwrap();

    assert_eq!(report.pdf_changes.len(), 1);
    assert_eq!(report.pdf_changes[0].key, "P3");
    assert!(library.item("P3").unwrap().has_tag("missing_pdf"));
    assert_eq!(provider.call_count(), 0);

    let formatter = Formatter::new(OutputFormat::Table, false);
    let output = formatter.format_report(&report).unwrap();
    assert!(output.contains("Unfiled draft"));
}

#[test]
fn test_summary_qa_requires_question() {
    let library = library();
    let provider = MockProvider::default();

    let err = run(
        &["zotllm", "summary_qa", "collection", "--collection-path", "Research"],
        &library,
        &provider,
    )
    .unwrap_err();
    assert!(matches!(err, CliError::Config(_)));
}

#[test]
fn test_summary_qa_rejects_item_selector() {
    let library = library();
    let provider = MockProvider::default();

    let err = run(
        &["zotllm", "summary_qa", "item", "--item-id", "P1", "--question", "Why?"],
        &library,
        &provider,
    )
    .unwrap_err();
    assert!(matches!(err, CliError::Engine(EngineError::InvalidScope(_))));
    assert_eq!(provider.call_count(), 0);
}

#[test]
fn test_summary_qa_writes_answer() {
    let library = library();
    for key in ["P1", "P2"] {
        library.add_note(
            key,
            Note::new(format!("{}-SUM", key), render_note("LLM Summary", "m", "Prior summary."))
                .with_tag("llm_summary"),
        );
    }
    let provider = MockProvider::new("Both papers describe scaling.");

    let report = run(
        &[
            "zotllm",
            "summary_qa",
            "collection",
            "--collection-path",
            "Research/Networks",
            "--question",
            "What do these papers share?",
        ],
        &library,
        &provider,
    )
    .unwrap();

    let note = report.qa_note.expect("answer note written");
    assert_eq!(note.collection_path, "#LLM QA/Research");
    assert_eq!(library.notes_in_collection(&note.collection_key).len(), 1);
    assert_eq!(provider.call_count(), 1);
}

#[test]
fn test_unknown_collection_is_fatal() {
    let library = library();
    let provider = MockProvider::default();

    let err = run(
        &["zotllm", "llm_summary", "collection", "--collection-path", "Nope"],
        &library,
        &provider,
    )
    .unwrap_err();
    assert!(matches!(err, CliError::Engine(EngineError::CollectionNotFound(_))));
}

#[test]
fn test_no_selector_is_invalid_scope() {
    let library = library();
    let provider = MockProvider::default();

    let err = run(&["zotllm", "llm_summary", "item"], &library, &provider).unwrap_err();
    assert!(matches!(err, CliError::Engine(EngineError::InvalidScope(_))));
}
