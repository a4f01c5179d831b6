//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the task engine and the outside
//! world. Implementations live in other crates.

use crate::{Attachment, Collection, ItemChildren, LibraryItem, NoteTarget};
use std::collections::HashMap;
use std::time::Duration;

/// Trait for reading and writing the reference library
///
/// Implemented by the infrastructure layer (zotllm-library). All calls are
/// blocking; implementations that keep state use interior mutability.
pub trait LibraryClient {
    /// Error type for library operations
    type Error;

    /// Fetch one item by key
    fn get_item(&self, key: &str) -> Result<LibraryItem, Self::Error>;

    /// Full-text search over non-attachment items, best match first
    fn search_items(&self, query: &str, limit: usize) -> Result<Vec<LibraryItem>, Self::Error>;

    /// Every collection in the library
    fn list_collections(&self) -> Result<Vec<Collection>, Self::Error>;

    /// Direct children of `parent`, or the top-level collections for `None`
    fn list_child_collections(&self, parent: Option<&str>) -> Result<Vec<Collection>, Self::Error>;

    /// Top-level items directly in a collection (no subcollections)
    fn list_collection_items(&self, collection_key: &str) -> Result<Vec<LibraryItem>, Self::Error>;

    /// Top-level items that belong to no collection
    fn list_unfiled_items(&self) -> Result<Vec<LibraryItem>, Self::Error>;

    /// Every top-level item in the library
    fn list_all_items(&self) -> Result<Vec<LibraryItem>, Self::Error>;

    /// Child notes and attachments of an item
    fn get_children(&self, key: &str) -> Result<ItemChildren, Self::Error>;

    /// Every child attachment in the library, grouped by parent item key
    ///
    /// One listing in place of a `get_children` call per item.
    fn list_attachments(&self) -> Result<HashMap<String, Vec<Attachment>>, Self::Error>;

    /// Indexed full text of an attachment, `None` when nothing is indexed
    fn get_full_text(&self, attachment_key: &str) -> Result<Option<String>, Self::Error>;

    /// Add a tag to an item; adding a present tag is a no-op
    fn add_tag(&self, key: &str, tag: &str) -> Result<(), Self::Error>;

    /// Remove a tag from an item; removing an absent tag is a no-op
    fn remove_tag(&self, key: &str, tag: &str) -> Result<(), Self::Error>;

    /// Create a note and return its key
    fn create_note(&self, target: &NoteTarget, body: &str, tags: &[&str]) -> Result<String, Self::Error>;

    /// Replace the body of an existing note
    fn update_note(&self, note_key: &str, body: &str) -> Result<(), Self::Error>;

    /// Create a collection below `parent` (top level for `None`)
    fn create_collection(&self, parent: Option<&str>, name: &str) -> Result<Collection, Self::Error>;
}

/// Trait for LLM provider operations
///
/// Implemented by the infrastructure layer (zotllm-llm)
pub trait LlmProvider {
    /// Error type for LLM operations
    type Error;

    /// Generate a completion for a system role and user content
    ///
    /// `timeout` overrides the provider's configured timeout for this call.
    fn generate(
        &self,
        system_role: &str,
        user_content: &str,
        timeout: Option<Duration>,
    ) -> Result<String, Self::Error>;

    /// Model identifier, recorded in generated notes
    fn model_name(&self) -> &str;

    /// Timeout applied when `generate` gets no override
    fn default_timeout(&self) -> Option<Duration> {
        None
    }
}
