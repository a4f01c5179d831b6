//! Library items and their child notes and attachments

use std::collections::BTreeSet;

/// Item type of file attachments
pub const ATTACHMENT_TYPE: &str = "attachment";

/// Item type of notes
pub const NOTE_TYPE: &str = "note";

/// MIME type that marks an attachment as a PDF
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// A creator (author, editor, ...) of a library item
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Creator {
    /// Given name, empty for single-field creators
    pub first_name: String,
    /// Family name, empty for single-field creators
    pub last_name: String,
    /// Single-field name (institutions)
    pub name: Option<String>,
}

impl Creator {
    /// Create a two-field creator
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            name: None,
        }
    }

    /// Name as shown in prompts: "First Last" or the single-field name
    pub fn display_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// An item in the reference library
///
/// Tags are a set keyed by name; collection memberships are collection keys.
/// Items are never cached beyond a single task run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryItem {
    /// Opaque item key
    pub key: String,
    /// Library version of the item, used for conditional writes
    pub version: u64,
    /// Item type (journalArticle, book, attachment, note, ...)
    pub item_type: String,
    /// Title, empty when the item has none
    pub title: String,
    /// Creators in library order
    pub creators: Vec<Creator>,
    /// Free-form date field
    pub date: String,
    /// Abstract
    pub abstract_note: String,
    /// Tag names
    pub tags: BTreeSet<String>,
    /// Keys of the collections the item belongs to
    pub collections: Vec<String>,
    /// Parent key for attachments and child notes
    pub parent_item: Option<String>,
}

impl LibraryItem {
    /// Create a regular item with a key and a title
    ///
    /// # Examples
    ///
    /// ```
    /// use zotllm_domain::LibraryItem;
    ///
    /// let item = LibraryItem::new("ABCD1234", "Scaling laws").with_tag("llm_summary");
    /// assert!(item.has_tag("LLM_Summary"));
    /// assert!(item.is_regular());
    /// ```
    pub fn new(key: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            item_type: "journalArticle".to_string(),
            ..Default::default()
        }
    }

    /// Builder-style tag addition
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Builder-style collection membership
    pub fn in_collection(mut self, collection_key: impl Into<String>) -> Self {
        self.collections.push(collection_key.into());
        self
    }

    /// Whether the item is a file attachment
    pub fn is_attachment(&self) -> bool {
        self.item_type == ATTACHMENT_TYPE
    }

    /// Whether the item is a note
    pub fn is_note(&self) -> bool {
        self.item_type == NOTE_TYPE
    }

    /// Whether the item is a regular (bibliographic) item
    pub fn is_regular(&self) -> bool {
        !self.is_attachment() && !self.is_note()
    }

    /// Whether the item carries `tag`, compared case-insensitively
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// The first four-digit run of the date field
    pub fn year(&self) -> Option<&str> {
        let bytes = self.date.as_bytes();
        (0..bytes.len().saturating_sub(3))
            .find(|&i| bytes[i..i + 4].iter().all(u8::is_ascii_digit))
            .map(|i| &self.date[i..i + 4])
    }

    /// Comma-separated creator names
    pub fn authors(&self) -> String {
        self.creators
            .iter()
            .map(Creator::display_name)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Short human label: "Title (Year)", or the key when the title is empty
    pub fn label(&self) -> String {
        let title = if self.title.trim().is_empty() {
            self.key.as_str()
        } else {
            self.title.as_str()
        };
        match self.year() {
            Some(year) => format!("{} ({})", title, year),
            None => title.to_string(),
        }
    }
}

/// A file attachment below a parent item
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attachment {
    /// Attachment key
    pub key: String,
    /// Attachment title (often the file name)
    pub title: String,
    /// MIME type, empty for links without a file
    pub content_type: String,
}

impl Attachment {
    /// Create a PDF attachment
    pub fn pdf(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            title: "Full Text PDF".to_string(),
            content_type: PDF_CONTENT_TYPE.to_string(),
        }
    }

    /// Whether the attachment is a PDF
    pub fn is_pdf(&self) -> bool {
        self.content_type.eq_ignore_ascii_case(PDF_CONTENT_TYPE)
    }
}

/// A note, either below a parent item or standalone in a collection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Note {
    /// Note key
    pub key: String,
    /// Library version of the note
    pub version: u64,
    /// HTML body
    pub body: String,
    /// Tag names
    pub tags: BTreeSet<String>,
}

impl Note {
    /// Create a note with a key and an HTML body
    pub fn new(key: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            body: body.into(),
            ..Default::default()
        }
    }

    /// Builder-style tag addition
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Whether the note carries `tag`, compared case-insensitively
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Whether the body opens with `<h2>{title}</h2>`
    pub fn has_heading(&self, title: &str) -> bool {
        self.body
            .trim_start()
            .starts_with(&format!("<h2>{}</h2>", title))
    }
}

/// Child notes and attachments of one parent item
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemChildren {
    /// Child notes in library order
    pub notes: Vec<Note>,
    /// Child attachments in library order
    pub attachments: Vec<Attachment>,
}

impl ItemChildren {
    /// PDF attachments in library order
    pub fn pdf_attachments(&self) -> impl Iterator<Item = &Attachment> {
        self.attachments.iter().filter(|a| a.is_pdf())
    }

    /// Whether at least one PDF is attached
    pub fn has_pdf(&self) -> bool {
        self.pdf_attachments().next().is_some()
    }

    /// First note tagged `tag` or, failing that, opening with `<h2>{title}</h2>`
    pub fn find_note(&self, tag: &str, title: &str) -> Option<&Note> {
        self.notes
            .iter()
            .find(|n| n.has_tag(tag))
            .or_else(|| self.notes.iter().find(|n| n.has_heading(title)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_extraction() {
        let mut item = LibraryItem::new("K1", "Paper");
        item.date = "March 2019".to_string();
        assert_eq!(item.year(), Some("2019"));

        item.date = "2021-05-04".to_string();
        assert_eq!(item.year(), Some("2021"));

        item.date = "n.d.".to_string();
        assert_eq!(item.year(), None);
    }

    #[test]
    fn test_label_falls_back_to_key() {
        let item = LibraryItem::new("K1", "  ");
        assert_eq!(item.label(), "K1");
    }

    #[test]
    fn test_authors_joined() {
        let mut item = LibraryItem::new("K1", "Paper");
        item.creators.push(Creator::new("Ada", "Lovelace"));
        item.creators.push(Creator {
            name: Some("CERN".to_string()),
            ..Default::default()
        });
        assert_eq!(item.authors(), "Ada Lovelace, CERN");
    }

    #[test]
    fn test_item_kinds() {
        let mut item = LibraryItem::new("K1", "Paper");
        assert!(item.is_regular());
        item.item_type = ATTACHMENT_TYPE.to_string();
        assert!(item.is_attachment());
        assert!(!item.is_regular());
    }

    #[test]
    fn test_find_note_prefers_tag() {
        let children = ItemChildren {
            notes: vec![
                Note::new("N1", "<h2>LLM Summary</h2><p>old</p>"),
                Note::new("N2", "<p>tagged</p>").with_tag("llm_summary"),
            ],
            attachments: vec![],
        };
        assert_eq!(children.find_note("llm_summary", "LLM Summary").unwrap().key, "N2");
    }

    #[test]
    fn test_find_note_by_heading() {
        let children = ItemChildren {
            notes: vec![Note::new("N1", "  <h2>LLM Summary</h2><p>old</p>")],
            attachments: vec![],
        };
        assert_eq!(children.find_note("llm_summary", "LLM Summary").unwrap().key, "N1");
        assert!(children.find_note("key_references", "Key References").is_none());
    }

    #[test]
    fn test_pdf_detection() {
        let mut children = ItemChildren::default();
        assert!(!children.has_pdf());
        children.attachments.push(Attachment {
            key: "A1".to_string(),
            title: "snapshot".to_string(),
            content_type: "text/html".to_string(),
        });
        assert!(!children.has_pdf());
        children.attachments.push(Attachment::pdf("A2"));
        assert!(children.has_pdf());
    }
}
