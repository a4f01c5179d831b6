//! Blocking client for the Zotero Web API v3

use crate::config::LibraryConfig;
use crate::error::LibraryError;
use crate::wire::{
    ApiCollection, ApiItem, ApiTag, FullTextResponse, NewCollection, NewNote, WriteResponse,
};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};
use zotllm_domain::traits::LibraryClient;
use zotllm_domain::{
    Attachment, Collection, ItemChildren, LibraryItem, NoteTarget, ATTACHMENT_TYPE, NOTE_TYPE,
};

/// API version sent with every request
pub const API_VERSION: &str = "3";

/// Attempts per request when the server rate-limits us
const MAX_ATTEMPTS: u32 = 2;

/// Wait used when a 429 carries no `Retry-After`
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Longest wait honoured before retrying
const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Zotero Web API client
///
/// Every call is a blocking round trip; nothing is cached between calls.
pub struct ZoteroClient {
    client: Client,
    library_url: String,
    api_key: String,
    page_size: u32,
}

impl ZoteroClient {
    /// Create a client for a validated configuration
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::Config` or `LibraryError::Auth` when the
    /// configuration is incomplete.
    pub fn new(config: &LibraryConfig) -> Result<Self, LibraryError> {
        let api_key = config.validate()?;
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| LibraryError::Config(format!("Failed to build HTTP client: {}", e)))?;

        info!(library = %config.library_url(), "Zotero client ready");
        Ok(Self {
            client,
            library_url: config.library_url(),
            api_key,
            page_size: config.page_size,
        })
    }

    /// URL prefix of the library this client talks to
    pub fn library_url(&self) -> &str {
        &self.library_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.library_url, path))
            .header("Zotero-API-Version", API_VERSION)
            .header("Zotero-API-Key", &self.api_key)
    }

    /// Send a request, retrying once when rate-limited
    fn send<F>(&self, build: F) -> Result<Response, LibraryError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let response = build().send()?;
            let status = response.status().as_u16();

            if status == 429 || (status == 503 && response.headers().contains_key("Retry-After")) {
                let retry_after = header_secs(&response, "Retry-After");
                if attempts < MAX_ATTEMPTS {
                    let delay = retry_after.unwrap_or(DEFAULT_RETRY_DELAY).min(MAX_RETRY_DELAY);
                    warn!(status, delay_secs = delay.as_secs(), "Rate limited by Zotero, retrying");
                    std::thread::sleep(delay);
                    continue;
                }
                return Err(LibraryError::RateLimited { retry_after });
            }

            if let Some(backoff) = header_secs(&response, "Backoff") {
                warn!(backoff_secs = backoff.as_secs(), "Zotero requested backoff");
            }

            if !response.status().is_success() {
                let url = response.url().path().to_string();
                let body = response.text().unwrap_or_default();
                let detail = if body.trim().is_empty() { url } else { body };
                return Err(LibraryError::from_status(status, detail));
            }
            return Ok(response);
        }
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, LibraryError> {
        debug!(path, "GET");
        let response = self.send(|| self.request(Method::GET, path).query(query))?;
        Ok(response.json()?)
    }

    /// Fetch every page of a listing endpoint
    fn get_paged<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, LibraryError> {
        let mut all = Vec::new();
        let mut start = 0usize;
        let limit = self.page_size.to_string();

        loop {
            let offset = start.to_string();
            debug!(path, start, "GET page");
            let response = self.send(|| {
                self.request(Method::GET, path)
                    .query(query)
                    .query(&[("start", offset.as_str()), ("limit", limit.as_str())])
            })?;
            let total = response
                .headers()
                .get("Total-Results")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<usize>().ok());
            let page: Vec<T> = response.json()?;
            let fetched = page.len();
            all.extend(page);
            start += fetched;

            let done = match total {
                Some(total) => start >= total,
                None => fetched < self.page_size as usize,
            };
            if fetched == 0 || done {
                break;
            }
        }
        Ok(all)
    }

    fn fetch_raw(&self, key: &str) -> Result<ApiItem, LibraryError> {
        self.get_json(&format!("/items/{}", key), &[])
    }

    fn patch_item<T: Serialize>(
        &self,
        key: &str,
        version: u64,
        body: &T,
    ) -> Result<(), LibraryError> {
        let path = format!("/items/{}", key);
        let version = version.to_string();
        debug!(key, "PATCH");
        self.send(|| {
            self.request(Method::PATCH, &path)
                .header("If-Unmodified-Since-Version", version.as_str())
                .json(body)
        })?;
        Ok(())
    }

    fn post_one<T: Serialize>(&self, path: &str, object: &T) -> Result<String, LibraryError> {
        debug!(path, "POST");
        let response = self.send(|| self.request(Method::POST, path).json(&[object]))?;
        let written: WriteResponse = response.json()?;
        written.created_key().map_err(LibraryError::Write)
    }
}

fn header_secs(response: &Response, name: &str) -> Option<Duration> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

impl LibraryClient for ZoteroClient {
    type Error = LibraryError;

    fn get_item(&self, key: &str) -> Result<LibraryItem, Self::Error> {
        Ok(self.fetch_raw(key)?.into_item())
    }

    fn search_items(&self, query: &str, limit: usize) -> Result<Vec<LibraryItem>, Self::Error> {
        let limit = limit.clamp(1, 100).to_string();
        let items: Vec<ApiItem> = self.get_json(
            "/items",
            &[("q", query), ("itemType", "-attachment"), ("limit", limit.as_str())],
        )?;
        Ok(items
            .into_iter()
            .map(ApiItem::into_item)
            .filter(LibraryItem::is_regular)
            .collect())
    }

    fn list_collections(&self) -> Result<Vec<Collection>, Self::Error> {
        let collections: Vec<ApiCollection> = self.get_paged("/collections", &[])?;
        Ok(collections.into_iter().map(ApiCollection::into_collection).collect())
    }

    fn list_child_collections(&self, parent: Option<&str>) -> Result<Vec<Collection>, Self::Error> {
        let path = match parent {
            Some(key) => format!("/collections/{}/collections", key),
            None => "/collections/top".to_string(),
        };
        let collections: Vec<ApiCollection> = self.get_paged(&path, &[])?;
        Ok(collections.into_iter().map(ApiCollection::into_collection).collect())
    }

    fn list_collection_items(&self, collection_key: &str) -> Result<Vec<LibraryItem>, Self::Error> {
        let items: Vec<ApiItem> =
            self.get_paged(&format!("/collections/{}/items/top", collection_key), &[])?;
        Ok(items.into_iter().map(ApiItem::into_item).collect())
    }

    fn list_unfiled_items(&self) -> Result<Vec<LibraryItem>, Self::Error> {
        Ok(self
            .list_all_items()?
            .into_iter()
            .filter(|item| item.collections.is_empty())
            .collect())
    }

    fn list_all_items(&self) -> Result<Vec<LibraryItem>, Self::Error> {
        let items: Vec<ApiItem> = self.get_paged("/items/top", &[])?;
        Ok(items.into_iter().map(ApiItem::into_item).collect())
    }

    fn get_children(&self, key: &str) -> Result<ItemChildren, Self::Error> {
        let children: Vec<ApiItem> = self.get_paged(&format!("/items/{}/children", key), &[])?;
        let mut result = ItemChildren::default();
        for child in children {
            if child.data.item_type == NOTE_TYPE {
                result.notes.push(child.into_note());
            } else {
                result.attachments.push(child.into_attachment());
            }
        }
        Ok(result)
    }

    fn list_attachments(&self) -> Result<HashMap<String, Vec<Attachment>>, Self::Error> {
        let items: Vec<ApiItem> = self.get_paged("/items", &[("itemType", ATTACHMENT_TYPE)])?;
        let mut grouped: HashMap<String, Vec<Attachment>> = HashMap::new();
        for item in items {
            // standalone attachments have no parent to credit
            if let Some(parent) = item.data.parent_item.clone() {
                grouped.entry(parent).or_default().push(item.into_attachment());
            }
        }
        debug!(parents = grouped.len(), "Listed attachments");
        Ok(grouped)
    }

    fn get_full_text(&self, attachment_key: &str) -> Result<Option<String>, Self::Error> {
        match self.get_json::<FullTextResponse>(&format!("/items/{}/fulltext", attachment_key), &[]) {
            Ok(full_text) if full_text.content.trim().is_empty() => Ok(None),
            Ok(full_text) => Ok(Some(full_text.content)),
            Err(LibraryError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn add_tag(&self, key: &str, tag: &str) -> Result<(), Self::Error> {
        let item = self.fetch_raw(key)?;
        if item.data.tags.iter().any(|t| t.tag.eq_ignore_ascii_case(tag)) {
            return Ok(());
        }
        let mut tags = item.data.tags.clone();
        tags.push(ApiTag::manual(tag));
        self.patch_item(key, item.version, &serde_json::json!({ "tags": tags }))
    }

    fn remove_tag(&self, key: &str, tag: &str) -> Result<(), Self::Error> {
        let item = self.fetch_raw(key)?;
        let before = item.data.tags.len();
        let tags: Vec<ApiTag> = item
            .data
            .tags
            .iter()
            .filter(|t| !t.tag.eq_ignore_ascii_case(tag))
            .cloned()
            .collect();
        if tags.len() == before {
            return Ok(());
        }
        self.patch_item(key, item.version, &serde_json::json!({ "tags": tags }))
    }

    fn create_note(&self, target: &NoteTarget, body: &str, tags: &[&str]) -> Result<String, Self::Error> {
        let (parent_item, collections) = match target {
            NoteTarget::Item(key) => (Some(key.as_str()), Vec::new()),
            NoteTarget::Collection(key) => (None, vec![key.as_str()]),
        };
        let note = NewNote {
            item_type: NOTE_TYPE,
            note: body,
            parent_item,
            collections,
            tags: tags.iter().map(|t| ApiTag::manual(t)).collect(),
        };
        let key = self.post_one("/items", &note)?;
        info!(note = %key, "Created note");
        Ok(key)
    }

    fn update_note(&self, note_key: &str, body: &str) -> Result<(), Self::Error> {
        let note = self.fetch_raw(note_key)?;
        self.patch_item(note_key, note.version, &serde_json::json!({ "note": body }))?;
        info!(note = %note_key, "Updated note");
        Ok(())
    }

    fn create_collection(&self, parent: Option<&str>, name: &str) -> Result<Collection, Self::Error> {
        let collection = NewCollection {
            name,
            parent_collection: parent
                .map(|p| serde_json::Value::String(p.to_string()))
                .unwrap_or(serde_json::Value::Bool(false)),
        };
        let key = self.post_one("/collections", &collection)?;
        info!(collection = %key, name, "Created collection");
        Ok(Collection::new(key, name, parent))
    }
}
