//! Destination collections for question-answering notes
//!
//! QA notes live in `#LLM QA/<TopLevel>`, where `<TopLevel>` is the top-level
//! collection the question was asked about. Both levels are found or created
//! on demand and remembered for the rest of the run.

use std::collections::HashMap;
use tracing::{debug, info};
use zotllm_domain::traits::LibraryClient;
use zotllm_domain::{Collection, Scope, QA_ROOT_COLLECTION};
use zotllm_library::LibraryError;

/// Name of the QA subcollection for a scope
///
/// The single top-level collection all items came through, or `fallback`
/// for unfiled or mixed scopes.
pub fn destination_name(scope: &Scope, fallback: &str) -> String {
    match scope.top_level_ancestors().as_slice() {
        [Some(name)] => name.to_string(),
        _ => fallback.to_string(),
    }
}

/// Finds or creates the QA collections
pub struct QaOrganizer<'a, L> {
    library: &'a L,
    known: HashMap<(Option<String>, String), Collection>,
}

impl<'a, L> QaOrganizer<'a, L>
where
    L: LibraryClient<Error = LibraryError>,
{
    /// Create an organizer with an empty memo
    pub fn new(library: &'a L) -> Self {
        Self {
            library,
            known: HashMap::new(),
        }
    }

    /// Ensure `#LLM QA/<name>` exists and return the leaf collection
    pub fn ensure_destination(&mut self, name: &str) -> Result<Collection, LibraryError> {
        let root = self.find_or_create(None, QA_ROOT_COLLECTION)?;
        self.find_or_create(Some(&root.key), name)
    }

    /// Find a child collection by name, creating it when absent
    ///
    /// Names compare case-insensitively after trimming, so repeated runs
    /// reuse a collection even if its capitalisation was edited by hand.
    fn find_or_create(&mut self, parent: Option<&str>, name: &str) -> Result<Collection, LibraryError> {
        let memo_key = (parent.map(str::to_string), name.trim().to_lowercase());
        if let Some(collection) = self.known.get(&memo_key) {
            return Ok(collection.clone());
        }

        let existing = self
            .library
            .list_child_collections(parent)?
            .into_iter()
            .find(|c| c.name.trim().eq_ignore_ascii_case(name.trim()));

        let collection = match existing {
            Some(collection) => {
                debug!(name, key = %collection.key, "Reusing collection");
                collection
            }
            None => {
                let created = self.library.create_collection(parent, name.trim())?;
                info!(name, key = %created.key, "Created collection");
                created
            }
        };
        self.known.insert(memo_key, collection.clone());
        Ok(collection)
    }
}
