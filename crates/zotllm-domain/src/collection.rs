//! Collections and the collection forest

use std::collections::HashMap;

/// Separator between segments of a collection path
pub const PATH_SEPARATOR: char = '/';

/// A collection in the library
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collection {
    /// Collection key
    pub key: String,
    /// Display name
    pub name: String,
    /// Parent collection key, `None` for top-level collections
    pub parent: Option<String>,
}

impl Collection {
    /// Create a collection
    pub fn new(key: impl Into<String>, name: impl Into<String>, parent: Option<&str>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            parent: parent.map(str::to_string),
        }
    }

    /// Whether the collection sits at the top of the forest
    pub fn is_top_level(&self) -> bool {
        self.parent.is_none()
    }
}

/// Split a user-supplied path into trimmed, non-empty segments
///
/// # Examples
///
/// ```
/// use zotllm_domain::split_path;
///
/// assert_eq!(split_path("/Research/ AI Papers /"), vec!["Research", "AI Papers"]);
/// assert!(split_path(" / ").is_empty());
/// ```
pub fn split_path(path: &str) -> Vec<String> {
    path.split(PATH_SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// An in-memory view of every collection in a library
///
/// Built from a single listing and used to render full collection paths.
#[derive(Debug, Clone, Default)]
pub struct CollectionTree {
    by_key: HashMap<String, Collection>,
}

impl CollectionTree {
    /// Build the tree from a flat listing
    pub fn new(collections: Vec<Collection>) -> Self {
        Self {
            by_key: collections
                .into_iter()
                .map(|c| (c.key.clone(), c))
                .collect(),
        }
    }

    /// Look up a collection by key
    pub fn get(&self, key: &str) -> Option<&Collection> {
        self.by_key.get(key)
    }

    /// Number of collections
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    /// Whether the library has no collections
    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    /// Segment names from the root down to `key`
    ///
    /// Unknown parents end the walk; a parent cycle is cut at the first repeat.
    pub fn path_segments(&self, key: &str) -> Vec<String> {
        let mut segments = Vec::new();
        let mut seen = Vec::new();
        let mut current = self.by_key.get(key);
        while let Some(collection) = current {
            if seen.contains(&collection.key.as_str()) {
                break;
            }
            seen.push(collection.key.as_str());
            segments.push(collection.name.clone());
            current = collection
                .parent
                .as_deref()
                .and_then(|parent| self.by_key.get(parent));
        }
        segments.reverse();
        segments
    }

    /// Full path of `key` joined with [`PATH_SEPARATOR`]
    pub fn path(&self, key: &str) -> Option<String> {
        if !self.by_key.contains_key(key) {
            return None;
        }
        Some(self.path_segments(key).join(&PATH_SEPARATOR.to_string()))
    }
}
