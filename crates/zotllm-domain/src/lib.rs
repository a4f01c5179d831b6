//! Zotero LLM Assistant Domain Layer
//!
//! This crate contains the data model shared by every other crate in the
//! workspace. It has ZERO external dependencies and defines the value types and
//! trait seams that the infrastructure crates implement.
//!
//! ## Key Concepts
//!
//! - **LibraryItem**: A parent item in the reference library, with its tags and
//!   collection memberships
//! - **Collection**: A node in the library's collection forest
//! - **Scope**: The resolved, de-duplicated set of items a task runs over
//! - **TaskKind**: One of the four supported tasks, with its marker tag
//!
//! ## Architecture
//!
//! - No external crate dependencies
//! - Pure data and small helpers only
//! - `LibraryClient` and `LlmProvider` are implemented in other crates

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod collection;
pub mod item;
pub mod scope;
pub mod task;
pub mod traits;

// Re-exports for convenience
pub use collection::{split_path, Collection, CollectionTree, PATH_SEPARATOR};
pub use item::{Attachment, Creator, ItemChildren, LibraryItem, Note, ATTACHMENT_TYPE, NOTE_TYPE, PDF_CONTENT_TYPE};
pub use scope::{Provenance, Scope, ScopeRequest, ScopeSelector, ScopedItem};
pub use task::{NoteTarget, TaskKind, TaskResult, QA_ROOT_COLLECTION};
