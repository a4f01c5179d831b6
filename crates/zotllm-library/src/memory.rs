//! In-memory library
//!
//! A [`LibraryClient`] backed by plain collections. The engine's tests run
//! against it, and it counts every write so idempotence can be asserted.

use crate::LibraryError;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use zotllm_domain::traits::LibraryClient;
use zotllm_domain::{
    Attachment, Collection, ItemChildren, LibraryItem, Note, NoteTarget, ATTACHMENT_TYPE,
};

/// Writes performed against an [`InMemoryLibrary`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    /// Notes created
    pub notes_created: usize,
    /// Note bodies replaced
    pub notes_updated: usize,
    /// Tags actually added (no-op adds are not counted)
    pub tags_added: usize,
    /// Tags actually removed (no-op removals are not counted)
    pub tags_removed: usize,
    /// Collections created
    pub collections_created: usize,
}

impl WriteStats {
    /// Total writes of any kind
    pub fn total(&self) -> usize {
        self.notes_created
            + self.notes_updated
            + self.tags_added
            + self.tags_removed
            + self.collections_created
    }
}

#[derive(Default)]
struct State {
    items: Vec<LibraryItem>,
    collections: Vec<Collection>,
    children: HashMap<String, ItemChildren>,
    attachment_parents: HashMap<String, String>,
    full_text: HashMap<String, String>,
    collection_notes: HashMap<String, Vec<Note>>,
    failing_writes: HashSet<String>,
    children_reads: usize,
    next_key: usize,
    stats: WriteStats,
}

impl State {
    fn mint_key(&mut self, prefix: &str) -> String {
        self.next_key += 1;
        format!("{}{:06}", prefix, self.next_key)
    }

    fn item_mut(&mut self, key: &str) -> Result<&mut LibraryItem, LibraryError> {
        self.items
            .iter_mut()
            .find(|i| i.key == key)
            .ok_or_else(|| LibraryError::NotFound(format!("item {}", key)))
    }

    fn check_writable(&self, key: &str) -> Result<(), LibraryError> {
        if self.failing_writes.contains(key) {
            return Err(LibraryError::Write(format!("writes to {} are rejected", key)));
        }
        Ok(())
    }

    fn note_mut(&mut self, key: &str) -> Option<&mut Note> {
        self.children
            .values_mut()
            .flat_map(|c| c.notes.iter_mut())
            .chain(self.collection_notes.values_mut().flat_map(|n| n.iter_mut()))
            .find(|n| n.key == key)
    }
}

/// A library held entirely in memory
///
/// Items keep insertion order, which is also listing order.
#[derive(Default)]
pub struct InMemoryLibrary {
    state: RefCell<State>,
}

impl InMemoryLibrary {
    /// Create an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a collection
    pub fn add_collection(&self, key: &str, name: &str, parent: Option<&str>) {
        self.state
            .borrow_mut()
            .collections
            .push(Collection::new(key, name, parent));
    }

    /// Add a top-level item
    pub fn add_item(&self, item: LibraryItem) {
        self.state.borrow_mut().items.push(item);
    }

    /// Attach a file to an item, optionally with indexed full text
    pub fn add_attachment(&self, parent: &str, attachment: Attachment, full_text: Option<&str>) {
        let mut state = self.state.borrow_mut();
        if let Some(text) = full_text {
            state.full_text.insert(attachment.key.clone(), text.to_string());
        }
        state
            .attachment_parents
            .insert(attachment.key.clone(), parent.to_string());
        state
            .children
            .entry(parent.to_string())
            .or_default()
            .attachments
            .push(attachment);
    }

    /// Add a child note to an item
    pub fn add_note(&self, parent: &str, note: Note) {
        self.state
            .borrow_mut()
            .children
            .entry(parent.to_string())
            .or_default()
            .notes
            .push(note);
    }

    /// Make every write touching `key` fail with `LibraryError::Write`
    pub fn fail_writes_for(&self, key: &str) {
        self.state.borrow_mut().failing_writes.insert(key.to_string());
    }

    /// Current state of an item
    pub fn item(&self, key: &str) -> Option<LibraryItem> {
        self.state
            .borrow()
            .items
            .iter()
            .find(|i| i.key == key)
            .cloned()
    }

    /// Number of `get_children` calls served so far
    pub fn children_reads(&self) -> usize {
        self.state.borrow().children_reads
    }

    /// Child notes of an item
    pub fn notes_of(&self, key: &str) -> Vec<Note> {
        self.state
            .borrow()
            .children
            .get(key)
            .map(|c| c.notes.clone())
            .unwrap_or_default()
    }

    /// Standalone notes filed in a collection
    pub fn notes_in_collection(&self, collection_key: &str) -> Vec<Note> {
        self.state
            .borrow()
            .collection_notes
            .get(collection_key)
            .cloned()
            .unwrap_or_default()
    }

    /// Every collection, including ones created through the client
    pub fn collections(&self) -> Vec<Collection> {
        self.state.borrow().collections.clone()
    }

    /// Writes performed so far
    pub fn stats(&self) -> WriteStats {
        self.state.borrow().stats
    }
}

impl LibraryClient for InMemoryLibrary {
    type Error = LibraryError;

    fn get_item(&self, key: &str) -> Result<LibraryItem, Self::Error> {
        let state = self.state.borrow();
        if let Some(item) = state.items.iter().find(|i| i.key == key) {
            return Ok(item.clone());
        }
        let parent = state
            .attachment_parents
            .get(key)
            .ok_or_else(|| LibraryError::NotFound(format!("item {}", key)))?;
        let title = state
            .children
            .get(parent)
            .and_then(|c| c.attachments.iter().find(|a| a.key == key))
            .map(|a| a.title.clone())
            .unwrap_or_default();
        Ok(LibraryItem {
            key: key.to_string(),
            title,
            item_type: ATTACHMENT_TYPE.to_string(),
            parent_item: Some(parent.clone()),
            ..Default::default()
        })
    }

    fn search_items(&self, query: &str, limit: usize) -> Result<Vec<LibraryItem>, Self::Error> {
        let needle = query.to_lowercase();
        Ok(self
            .state
            .borrow()
            .items
            .iter()
            .filter(|i| i.is_regular())
            .filter(|i| {
                i.title.to_lowercase().contains(&needle)
                    || i.authors().to_lowercase().contains(&needle)
                    || i.date.contains(query)
            })
            .take(limit)
            .cloned()
            .collect())
    }

    fn list_collections(&self) -> Result<Vec<Collection>, Self::Error> {
        Ok(self.collections())
    }

    fn list_child_collections(&self, parent: Option<&str>) -> Result<Vec<Collection>, Self::Error> {
        let state = self.state.borrow();
        if let Some(key) = parent {
            if !state.collections.iter().any(|c| c.key == key) {
                return Err(LibraryError::NotFound(format!("collection {}", key)));
            }
        }
        Ok(state
            .collections
            .iter()
            .filter(|c| c.parent.as_deref() == parent)
            .cloned()
            .collect())
    }

    fn list_collection_items(&self, collection_key: &str) -> Result<Vec<LibraryItem>, Self::Error> {
        let state = self.state.borrow();
        if !state.collections.iter().any(|c| c.key == collection_key) {
            return Err(LibraryError::NotFound(format!("collection {}", collection_key)));
        }
        Ok(state
            .items
            .iter()
            .filter(|i| i.collections.iter().any(|c| c == collection_key))
            .cloned()
            .collect())
    }

    fn list_unfiled_items(&self) -> Result<Vec<LibraryItem>, Self::Error> {
        Ok(self
            .state
            .borrow()
            .items
            .iter()
            .filter(|i| i.collections.is_empty())
            .cloned()
            .collect())
    }

    fn list_all_items(&self) -> Result<Vec<LibraryItem>, Self::Error> {
        Ok(self.state.borrow().items.clone())
    }

    fn get_children(&self, key: &str) -> Result<ItemChildren, Self::Error> {
        let mut state = self.state.borrow_mut();
        state.children_reads += 1;
        if !state.items.iter().any(|i| i.key == key) {
            return Err(LibraryError::NotFound(format!("item {}", key)));
        }
        Ok(state.children.get(key).cloned().unwrap_or_default())
    }

    fn list_attachments(&self) -> Result<HashMap<String, Vec<Attachment>>, Self::Error> {
        Ok(self
            .state
            .borrow()
            .children
            .iter()
            .filter(|(_, children)| !children.attachments.is_empty())
            .map(|(parent, children)| (parent.clone(), children.attachments.clone()))
            .collect())
    }

    fn get_full_text(&self, attachment_key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self
            .state
            .borrow()
            .full_text
            .get(attachment_key)
            .filter(|t| !t.trim().is_empty())
            .cloned())
    }

    fn add_tag(&self, key: &str, tag: &str) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();
        state.check_writable(key)?;
        let item = state.item_mut(key)?;
        if item.has_tag(tag) {
            return Ok(());
        }
        item.tags.insert(tag.to_string());
        item.version += 1;
        state.stats.tags_added += 1;
        Ok(())
    }

    fn remove_tag(&self, key: &str, tag: &str) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();
        state.check_writable(key)?;
        let item = state.item_mut(key)?;
        let before = item.tags.len();
        item.tags.retain(|t| !t.eq_ignore_ascii_case(tag));
        if item.tags.len() == before {
            return Ok(());
        }
        item.version += 1;
        state.stats.tags_removed += 1;
        Ok(())
    }

    fn create_note(&self, target: &NoteTarget, body: &str, tags: &[&str]) -> Result<String, Self::Error> {
        let mut state = self.state.borrow_mut();
        let key = state.mint_key("NOTE");
        let mut note = Note::new(key.clone(), body);
        note.tags = tags.iter().map(|t| t.to_string()).collect();

        match target {
            NoteTarget::Item(parent) => {
                state.check_writable(parent)?;
                if !state.items.iter().any(|i| &i.key == parent) {
                    return Err(LibraryError::Write(format!("parent item {} does not exist", parent)));
                }
                state.children.entry(parent.clone()).or_default().notes.push(note);
            }
            NoteTarget::Collection(collection) => {
                state.check_writable(collection)?;
                if !state.collections.iter().any(|c| &c.key == collection) {
                    return Err(LibraryError::Write(format!(
                        "collection {} does not exist",
                        collection
                    )));
                }
                state
                    .collection_notes
                    .entry(collection.clone())
                    .or_default()
                    .push(note);
            }
        }
        state.stats.notes_created += 1;
        Ok(key)
    }

    fn update_note(&self, note_key: &str, body: &str) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();
        state.check_writable(note_key)?;
        let note = state
            .note_mut(note_key)
            .ok_or_else(|| LibraryError::NotFound(format!("note {}", note_key)))?;
        note.body = body.to_string();
        note.version += 1;
        state.stats.notes_updated += 1;
        Ok(())
    }

    fn create_collection(&self, parent: Option<&str>, name: &str) -> Result<Collection, Self::Error> {
        let mut state = self.state.borrow_mut();
        if let Some(key) = parent {
            if !state.collections.iter().any(|c| c.key == key) {
                return Err(LibraryError::Write(format!("parent collection {} does not exist", key)));
            }
        }
        let key = state.mint_key("COLL");
        let collection = Collection::new(key, name, parent);
        state.collections.push(collection.clone());
        state.stats.collections_created += 1;
        Ok(collection)
    }
}
