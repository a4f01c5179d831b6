//! JSON shapes of the Zotero Web API v3

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use zotllm_domain::{Attachment, Collection, Creator, LibraryItem, Note};

/// An item envelope: `{key, version, data: {...}}`
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiItem {
    pub key: String,
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub data: ItemData,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct ItemData {
    pub item_type: String,
    pub title: String,
    pub creators: Vec<ApiCreator>,
    pub date: String,
    pub abstract_note: String,
    pub tags: Vec<ApiTag>,
    pub collections: Vec<String>,
    pub parent_item: Option<String>,
    pub note: String,
    pub content_type: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct ApiCreator {
    pub first_name: String,
    pub last_name: String,
    pub name: Option<String>,
}

/// Tag entry; `type` 1 marks automatic tags and is preserved on writes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub(crate) struct ApiTag {
    pub tag: String,
    #[serde(rename = "type", default, skip_serializing_if = "is_manual")]
    pub kind: u8,
}

fn is_manual(kind: &u8) -> bool {
    *kind == 0
}

impl ApiTag {
    pub fn manual(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            kind: 0,
        }
    }
}

impl ApiItem {
    pub fn into_item(self) -> LibraryItem {
        let data = self.data;
        LibraryItem {
            key: self.key,
            version: self.version,
            item_type: data.item_type,
            title: data.title,
            creators: data
                .creators
                .into_iter()
                .map(|c| Creator {
                    first_name: c.first_name,
                    last_name: c.last_name,
                    name: c.name,
                })
                .collect(),
            date: data.date,
            abstract_note: data.abstract_note,
            tags: data.tags.into_iter().map(|t| t.tag).collect(),
            collections: data.collections,
            parent_item: data.parent_item,
        }
    }

    pub fn into_note(self) -> Note {
        Note {
            key: self.key,
            version: self.version,
            body: self.data.note,
            tags: self.data.tags.into_iter().map(|t| t.tag).collect(),
        }
    }

    pub fn into_attachment(self) -> Attachment {
        Attachment {
            key: self.key,
            title: self.data.title,
            content_type: self.data.content_type,
        }
    }
}

/// A collection envelope; `parentCollection` is `false` at the top level
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiCollection {
    pub key: String,
    #[serde(default)]
    pub data: CollectionData,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct CollectionData {
    pub name: String,
    pub parent_collection: serde_json::Value,
}

impl ApiCollection {
    pub fn into_collection(self) -> Collection {
        Collection {
            key: self.key,
            name: self.data.name,
            parent: self.data.parent_collection.as_str().map(str::to_string),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct FullTextResponse {
    #[serde(default)]
    pub content: String,
}

/// New child or standalone note
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NewNote<'a> {
    pub item_type: &'static str,
    pub note: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_item: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub collections: Vec<&'a str>,
    pub tags: Vec<ApiTag>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NewCollection<'a> {
    pub name: &'a str,
    pub parent_collection: serde_json::Value,
}

/// Result of a multi-object write
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WriteResponse {
    pub successful: HashMap<String, serde_json::Value>,
    pub success: HashMap<String, String>,
    pub failed: HashMap<String, WriteFailure>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WriteFailure {
    pub code: u16,
    pub message: String,
}

impl WriteResponse {
    /// Key of the single object written, or the server's failure reason
    pub fn created_key(&self) -> Result<String, String> {
        if let Some(failure) = self.failed.get("0") {
            return Err(format!("{} (code {})", failure.message, failure.code));
        }
        self.success
            .get("0")
            .cloned()
            .or_else(|| {
                self.successful
                    .get("0")
                    .and_then(|v| v.get("key"))
                    .and_then(|k| k.as_str())
                    .map(str::to_string)
            })
            .ok_or_else(|| "write response carried no key".to_string())
    }
}
