//! Scope selection and resolved scopes

use crate::item::LibraryItem;
use std::collections::HashSet;

/// Raw scope flags as supplied by the user
///
/// Exactly one selector must be set; [`ScopeRequest::selector`] enforces that.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeRequest {
    /// A single item key
    pub item_id: Option<String>,
    /// Free-text query expected to match one item
    pub query: Option<String>,
    /// One or more collection paths
    pub collection_paths: Vec<String>,
    /// Items without any collection membership
    pub unfiled: bool,
    /// Every top-level collection and its subtree
    pub all_collections: bool,
}

impl ScopeRequest {
    /// Validate the flags and turn them into a selector
    ///
    /// # Examples
    ///
    /// ```
    /// use zotllm_domain::{ScopeRequest, ScopeSelector};
    ///
    /// let request = ScopeRequest { unfiled: true, ..Default::default() };
    /// assert_eq!(request.selector().unwrap(), ScopeSelector::Unfiled);
    ///
    /// let empty = ScopeRequest::default();
    /// assert!(empty.selector().is_err());
    /// ```
    pub fn selector(&self) -> Result<ScopeSelector, String> {
        let item_id = non_blank(self.item_id.as_deref());
        let query = non_blank(self.query.as_deref());
        let paths: Vec<String> = self
            .collection_paths
            .iter()
            .filter(|p| !p.trim().is_empty())
            .cloned()
            .collect();

        let supplied = [
            item_id.is_some(),
            query.is_some(),
            !paths.is_empty(),
            self.unfiled,
            self.all_collections,
        ]
        .iter()
        .filter(|set| **set)
        .count();

        match supplied {
            0 => Err("no scope given: use one of --item-id, --query, --collection-path, --unfiled, --all-collections".to_string()),
            1 => Ok(if let Some(id) = item_id {
                ScopeSelector::Item(id.to_string())
            } else if let Some(q) = query {
                ScopeSelector::Query(q.to_string())
            } else if !paths.is_empty() {
                ScopeSelector::CollectionPaths(paths)
            } else if self.unfiled {
                ScopeSelector::Unfiled
            } else {
                ScopeSelector::AllCollections
            }),
            n => Err(format!("{} scope selectors given, exactly one is allowed", n)),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// A validated scope selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeSelector {
    /// One item by key
    Item(String),
    /// One item by search query
    Query(String),
    /// The subtrees of one or more collection paths
    CollectionPaths(Vec<String>),
    /// Items with no collection membership
    Unfiled,
    /// Every collection subtree in the library
    AllCollections,
}

impl ScopeSelector {
    /// Whether the selector names a single item
    pub fn is_single_item(&self) -> bool {
        matches!(self, ScopeSelector::Item(_) | ScopeSelector::Query(_))
    }

    /// Short description for logs and reports
    pub fn describe(&self) -> String {
        match self {
            ScopeSelector::Item(id) => format!("item {}", id),
            ScopeSelector::Query(q) => format!("query '{}'", q),
            ScopeSelector::CollectionPaths(paths) => format!("collections {}", paths.join(", ")),
            ScopeSelector::Unfiled => "unfiled items".to_string(),
            ScopeSelector::AllCollections => "all collections".to_string(),
        }
    }
}

/// Where an item in a resolved scope came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provenance {
    /// Named directly by key or query
    Direct,
    /// Found below a collection; segments from the root down
    Collection(Vec<String>),
    /// Found among unfiled items
    Unfiled,
}

impl Provenance {
    /// Name of the top-level collection the item came through
    pub fn top_level(&self) -> Option<&str> {
        match self {
            Provenance::Collection(segments) => segments.first().map(String::as_str),
            _ => None,
        }
    }
}

/// An item together with its provenance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedItem {
    /// The item
    pub item: LibraryItem,
    /// How the item entered the scope
    pub provenance: Provenance,
}

/// A resolved scope: ordered, duplicate-free items plus provenance
#[derive(Debug, Clone)]
pub struct Scope {
    selector: ScopeSelector,
    items: Vec<ScopedItem>,
    seen: HashSet<String>,
    unresolved_paths: Vec<String>,
}

impl Scope {
    /// Create an empty scope for a selector
    pub fn new(selector: ScopeSelector) -> Self {
        Self {
            selector,
            items: Vec::new(),
            seen: HashSet::new(),
            unresolved_paths: Vec::new(),
        }
    }

    /// Append an item unless its key is already present
    ///
    /// Returns `true` when the item was added. The first occurrence wins, so
    /// provenance reflects the first path an item was reached through.
    pub fn push(&mut self, item: LibraryItem, provenance: Provenance) -> bool {
        if !self.seen.insert(item.key.clone()) {
            return false;
        }
        self.items.push(ScopedItem { item, provenance });
        true
    }

    /// Record a collection path that could not be resolved
    pub fn mark_unresolved(&mut self, path: impl Into<String>) {
        self.unresolved_paths.push(path.into());
    }

    /// The selector the scope was resolved from
    pub fn selector(&self) -> &ScopeSelector {
        &self.selector
    }

    /// Items in resolution order
    pub fn items(&self) -> &[ScopedItem] {
        &self.items
    }

    /// Consume the scope, yielding its items
    pub fn into_items(self) -> Vec<ScopedItem> {
        self.items
    }

    /// Paths that failed to resolve
    pub fn unresolved_paths(&self) -> &[String] {
        &self.unresolved_paths
    }

    /// Item keys in resolution order
    pub fn keys(&self) -> Vec<&str> {
        self.items.iter().map(|s| s.item.key.as_str()).collect()
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the scope is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Distinct top-level collection names the items came through
    ///
    /// `None` stands for an item that did not come through a collection.
    pub fn top_level_ancestors(&self) -> Vec<Option<&str>> {
        let mut ancestors: Vec<Option<&str>> = Vec::new();
        for scoped in &self.items {
            let top = scoped.provenance.top_level();
            if !ancestors.contains(&top) {
                ancestors.push(top);
            }
        }
        ancestors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exactly_one_selector() {
        let request = ScopeRequest {
            item_id: Some("K1".to_string()),
            unfiled: true,
            ..Default::default()
        };
        let err = request.selector().unwrap_err();
        assert!(err.contains("exactly one"));
    }

    #[test]
    fn test_blank_values_do_not_count() {
        let request = ScopeRequest {
            item_id: Some("  ".to_string()),
            collection_paths: vec!["Research".to_string(), " ".to_string()],
            ..Default::default()
        };
        assert_eq!(
            request.selector().unwrap(),
            ScopeSelector::CollectionPaths(vec!["Research".to_string()])
        );
    }

    #[test]
    fn test_push_deduplicates_first_seen() {
        let mut scope = Scope::new(ScopeSelector::Unfiled);
        assert!(scope.push(LibraryItem::new("A", "a"), Provenance::Collection(vec!["X".into()])));
        assert!(scope.push(LibraryItem::new("B", "b"), Provenance::Unfiled));
        assert!(!scope.push(LibraryItem::new("A", "a"), Provenance::Collection(vec!["Y".into()])));

        assert_eq!(scope.keys(), vec!["A", "B"]);
        assert_eq!(scope.items()[0].provenance.top_level(), Some("X"));
    }

    #[test]
    fn test_top_level_ancestors() {
        let mut scope = Scope::new(ScopeSelector::AllCollections);
        scope.push(
            LibraryItem::new("A", "a"),
            Provenance::Collection(vec!["Complex Networks".into(), "Scaling laws".into()]),
        );
        scope.push(
            LibraryItem::new("B", "b"),
            Provenance::Collection(vec!["Complex Networks".into(), "Other".into()]),
        );
        assert_eq!(scope.top_level_ancestors(), vec![Some("Complex Networks")]);

        scope.push(LibraryItem::new("C", "c"), Provenance::Unfiled);
        assert_eq!(scope.top_level_ancestors().len(), 2);
    }

    #[test]
    fn test_single_item_selectors() {
        assert!(ScopeSelector::Item("K".into()).is_single_item());
        assert!(ScopeSelector::Query("q".into()).is_single_item());
        assert!(!ScopeSelector::Unfiled.is_single_item());
    }
}
