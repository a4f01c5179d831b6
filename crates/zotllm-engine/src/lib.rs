//! Zotero LLM task engine
//!
//! Orchestrates the four tasks (`llm_summary`, `key_references`,
//! `missing_pdf`, `summary_qa`) over a [`LibraryClient`] and an
//! [`LlmProvider`].
//!
//! # Overview
//!
//! - **Scope resolution**: item key, search query, collection paths, unfiled
//!   items or every collection, expanded into an ordered, duplicate-free
//!   item list
//! - **Skip filter**: marker tags on the library are the only record of
//!   finished work, read fresh on every run
//! - **Content assembly**: metadata plus PDF full text for single items,
//!   prior summaries for question answering
//! - **Write-back**: HTML notes and marker tags; QA answers go to
//!   `#LLM QA/<TopLevel>`
//!
//! Items are processed one at a time in scope order. A failing item is
//! recorded in the [`TaskReport`] and does not stop the run.
//!
//! [`LibraryClient`]: zotllm_domain::traits::LibraryClient
//! [`LlmProvider`]: zotllm_domain::traits::LlmProvider

#![warn(missing_docs)]

mod assembler;
mod audit;
mod config;
mod engine;
mod error;
mod filter;
mod notes;
mod organizer;
mod prompt;
mod report;
mod resolver;

pub use assembler::{ContentAssembler, QaAggregate, QaEntry};
pub use audit::run_missing_pdf;
pub use config::{EngineConfig, PromptConfig, PromptOverride, TaskConfig};
pub use engine::TaskEngine;
pub use error::{EngineError, FailureKind, ItemFailure};
pub use filter::partition_done;
pub use notes::{escape_html, html_to_text, note_text, render_note, render_qa_note};
pub use organizer::{destination_name, QaOrganizer};
pub use prompt::{check_prompt_size, default_template, PromptBuilder, PromptTemplate};
pub use report::{ItemRef, PdfChange, PdfChangeRecord, ProcessedItem, QaNote, TaskReport};
pub use resolver::ScopeResolver;
