//! CLI command definitions and argument parsing.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use zotllm_domain::{ScopeRequest, TaskKind};

/// Zotero LLM assistant - Run model-backed tasks over a Zotero library.
#[derive(Debug, Parser)]
#[command(name = "zotllm")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path (YAML or TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging and print error causes
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format for the run report
    #[arg(short, long, value_enum, global = true, default_value = "table")]
    pub format: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Report output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
}

/// Tasks.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Summarize items and attach the summary as a note
    #[command(name = "llm_summary")]
    LlmSummary(DocumentTaskArgs),

    /// Extract the key references of items into a note
    #[command(name = "key_references")]
    KeyReferences(DocumentTaskArgs),

    /// Tag items without a PDF attachment and untag items that gained one
    #[command(name = "missing_pdf")]
    MissingPdf,

    /// Answer a question from the summaries of a collection scope
    #[command(name = "summary_qa")]
    SummaryQa(QaArgs),
}

impl Command {
    /// The task this command runs.
    pub fn task(&self) -> TaskKind {
        match self {
            Command::LlmSummary(_) => TaskKind::LlmSummary,
            Command::KeyReferences(_) => TaskKind::KeyReferences,
            Command::MissingPdf => TaskKind::MissingPdf,
            Command::SummaryQa(_) => TaskKind::SummaryQa,
        }
    }
}

/// Object selector.
#[derive(Debug, Subcommand)]
pub enum Target {
    /// Work on a single item
    Item(ItemArgs),

    /// Work on collections or the unfiled items
    Collection(CollectionArgs),
}

impl Target {
    /// Scope request for the engine.
    pub fn scope_request(&self) -> ScopeRequest {
        match self {
            Target::Item(args) => ScopeRequest {
                item_id: args.item_id.clone(),
                query: args.query.clone(),
                ..Default::default()
            },
            Target::Collection(args) => ScopeRequest {
                collection_paths: args.collection_path.clone(),
                unfiled: args.unfiled,
                all_collections: args.all_collections,
                ..Default::default()
            },
        }
    }
}

/// Single-item selection.
#[derive(Debug, Args)]
pub struct ItemArgs {
    /// Item key (an attachment key selects its parent)
    #[arg(long)]
    pub item_id: Option<String>,

    /// Search query; the first matching item is used
    #[arg(long)]
    pub query: Option<String>,
}

/// Collection selection.
#[derive(Debug, Args)]
pub struct CollectionArgs {
    /// Collection path such as "Research/Complex Networks" (repeatable)
    #[arg(long, value_name = "PATH", num_args = 1..)]
    pub collection_path: Vec<String>,

    /// Items that belong to no collection
    #[arg(long)]
    pub unfiled: bool,

    /// Every item filed in any collection
    #[arg(long)]
    pub all_collections: bool,
}

/// Arguments for `llm_summary` and `key_references`.
#[derive(Debug, Args)]
pub struct DocumentTaskArgs {
    #[command(subcommand)]
    pub target: Target,

    /// Skip items already carrying the task tag (default)
    #[arg(long, global = true, overrides_with = "no_skip_analyzed")]
    pub skip_analyzed: bool,

    /// Process items even when they carry the task tag
    #[arg(long, global = true, overrides_with = "skip_analyzed")]
    pub no_skip_analyzed: bool,
}

impl DocumentTaskArgs {
    /// Whether already-processed items are run again.
    pub fn force(&self) -> bool {
        self.no_skip_analyzed && !self.skip_analyzed
    }
}

/// Arguments for `summary_qa`.
#[derive(Debug, Args)]
pub struct QaArgs {
    #[command(subcommand)]
    pub target: Target,

    /// Question to answer
    #[arg(long, global = true)]
    pub question: Option<String>,

    /// Add key-reference notes to the context
    #[arg(long, global = true, overrides_with = "no_references")]
    pub references: bool,

    /// Leave key-reference notes out of the context
    #[arg(long, global = true, overrides_with = "references")]
    pub no_references: bool,
}

impl QaArgs {
    /// Command-line override of `tasks.qa_include_references`.
    pub fn include_references(&self) -> Option<bool> {
        match (self.references, self.no_references) {
            (true, false) => Some(true),
            (false, true) => Some(false),
            _ => None,
        }
    }
}
