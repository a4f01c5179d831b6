//! Scope resolution: from user selectors to concrete items

use crate::EngineError;
use std::collections::HashSet;
use tracing::{debug, info, warn};
use zotllm_domain::traits::LibraryClient;
use zotllm_domain::{split_path, Collection, LibraryItem, Provenance, Scope, ScopeSelector};
use zotllm_library::LibraryError;

/// Hits requested when resolving a search query
const SEARCH_LIMIT: usize = 10;

/// Expands a [`ScopeSelector`] into an ordered, duplicate-free [`Scope`]
///
/// Collection paths are walked from the top level one segment at a time,
/// matching child names exactly. Only regular items enter a scope.
pub struct ScopeResolver<'a, L> {
    library: &'a L,
}

impl<'a, L> ScopeResolver<'a, L>
where
    L: LibraryClient<Error = LibraryError>,
{
    /// Create a resolver over a library
    pub fn new(library: &'a L) -> Self {
        Self { library }
    }

    /// Resolve a selector
    ///
    /// # Errors
    ///
    /// - `InvalidScope` for an unknown item or a query without hits
    /// - `CollectionNotFound` when no requested path resolves
    /// - `Library` when the library cannot be read
    pub fn resolve(&self, selector: ScopeSelector) -> Result<Scope, EngineError> {
        let mut scope = Scope::new(selector.clone());
        match selector {
            ScopeSelector::Item(key) => {
                let item = self.resolve_item(&key)?;
                scope.push(item, Provenance::Direct);
            }
            ScopeSelector::Query(query) => {
                let hits = self.library.search_items(&query, SEARCH_LIMIT)?;
                let Some(first) = hits.first() else {
                    return Err(EngineError::InvalidScope(format!(
                        "no item matches query '{}'",
                        query
                    )));
                };
                if hits.len() > 1 {
                    warn!(query = %query, hits = hits.len(), chosen = %first.key, "Query matched several items, using the first");
                }
                scope.push(first.clone(), Provenance::Direct);
            }
            ScopeSelector::CollectionPaths(paths) => {
                for path in &paths {
                    match self.find_collection_by_path(path) {
                        Ok((collection, segments)) => {
                            let mut visited = HashSet::new();
                            self.gather(&collection, segments, &mut scope, &mut visited)?;
                        }
                        Err(EngineError::CollectionNotFound(reason)) => {
                            warn!(path = %path, reason = %reason, "Collection path not resolved");
                            scope.mark_unresolved(path.clone());
                        }
                        Err(e) => return Err(e),
                    }
                }
                if scope.unresolved_paths().len() == paths.len() {
                    return Err(EngineError::CollectionNotFound(
                        scope.unresolved_paths().join(", "),
                    ));
                }
            }
            ScopeSelector::Unfiled => {
                for item in self.library.list_unfiled_items()? {
                    if item.is_regular() {
                        scope.push(item, Provenance::Unfiled);
                    }
                }
            }
            ScopeSelector::AllCollections => {
                let mut visited = HashSet::new();
                for top in self.library.list_child_collections(None)? {
                    let segments = vec![top.name.clone()];
                    self.gather(&top, segments, &mut scope, &mut visited)?;
                }
            }
        }

        info!(scope = %scope.selector().describe(), items = scope.len(), "Scope resolved");
        Ok(scope)
    }

    /// Look up an item; an attachment resolves to its parent
    fn resolve_item(&self, key: &str) -> Result<LibraryItem, EngineError> {
        let item = match self.library.get_item(key) {
            Ok(item) => item,
            Err(LibraryError::NotFound(_)) => {
                return Err(EngineError::InvalidScope(format!("item {} not found", key)))
            }
            Err(e) => return Err(e.into()),
        };
        match (&item.parent_item, item.is_regular()) {
            (Some(parent), false) => {
                info!(item = %key, parent = %parent, "Item is an attachment, using its parent");
                self.resolve_item(parent)
            }
            _ => Ok(item),
        }
    }

    /// Find the collection a slash-separated path names
    ///
    /// Returns the collection and the path's segments. Segments are trimmed
    /// and empty ones ignored; names match case-sensitively.
    pub fn find_collection_by_path(
        &self,
        path: &str,
    ) -> Result<(Collection, Vec<String>), EngineError> {
        let segments = split_path(path);
        if segments.is_empty() {
            return Err(EngineError::CollectionNotFound(format!("empty path '{}'", path)));
        }

        let mut current: Option<Collection> = None;
        for (depth, segment) in segments.iter().enumerate() {
            let parent_key = current.as_ref().map(|c| c.key.as_str());
            let children = self.library.list_child_collections(parent_key)?;
            match children.into_iter().find(|c| c.name.trim() == segment.as_str()) {
                Some(child) => current = Some(child),
                None => {
                    let under = if depth == 0 {
                        "the top level".to_string()
                    } else {
                        format!("'{}'", segments[..depth].join("/"))
                    };
                    return Err(EngineError::CollectionNotFound(format!(
                        "no collection '{}' under {}",
                        segment, under
                    )));
                }
            }
        }

        match current {
            Some(collection) => Ok((collection, segments)),
            None => Err(EngineError::CollectionNotFound(path.to_string())),
        }
    }

    /// Items of a collection, optionally including every descendant
    pub fn list_items_in_collection(
        &self,
        collection: &Collection,
        recursive: bool,
    ) -> Result<Vec<LibraryItem>, EngineError> {
        if !recursive {
            return Ok(self
                .library
                .list_collection_items(&collection.key)?
                .into_iter()
                .filter(LibraryItem::is_regular)
                .collect());
        }
        let mut scope = Scope::new(ScopeSelector::CollectionPaths(vec![collection.name.clone()]));
        let mut visited = HashSet::new();
        self.gather(collection, vec![collection.name.clone()], &mut scope, &mut visited)?;
        Ok(scope.into_items().into_iter().map(|s| s.item).collect())
    }

    /// Depth-first walk: the collection's own items, then each subcollection
    fn gather(
        &self,
        collection: &Collection,
        segments: Vec<String>,
        scope: &mut Scope,
        visited: &mut HashSet<String>,
    ) -> Result<(), EngineError> {
        if !visited.insert(collection.key.clone()) {
            return Ok(());
        }

        let items = self.library.list_collection_items(&collection.key)?;
        debug!(collection = %segments.join("/"), items = items.len(), "Collecting items");
        for item in items.into_iter().filter(LibraryItem::is_regular) {
            scope.push(item, Provenance::Collection(segments.clone()));
        }

        for child in self.library.list_child_collections(Some(&collection.key))? {
            let mut child_segments = segments.clone();
            child_segments.push(child.name.clone());
            self.gather(&child, child_segments, scope, visited)?;
        }
        Ok(())
    }
}
