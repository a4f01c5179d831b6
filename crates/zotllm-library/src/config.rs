//! Connection settings for a Zotero library

use crate::LibraryError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable consulted when no API key is configured
pub const API_KEY_ENV: &str = "ZOTERO_API_KEY";

/// Public Zotero Web API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.zotero.org";

/// Whether the library belongs to a user or a group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LibraryType {
    /// A personal library
    #[default]
    User,
    /// A group library
    Group,
}

impl LibraryType {
    /// URL path segment for this library type
    pub fn path_segment(&self) -> &'static str {
        match self {
            LibraryType::User => "users",
            LibraryType::Group => "groups",
        }
    }
}

/// Zotero connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Numeric user or group ID
    #[serde(default)]
    pub library_id: String,

    /// User or group library
    #[serde(default)]
    pub library_type: LibraryType,

    /// API key; falls back to `ZOTERO_API_KEY`
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Items requested per page when listing
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_page_size() -> u32 {
    100
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            library_id: String::new(),
            library_type: LibraryType::User,
            api_key: None,
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            page_size: default_page_size(),
        }
    }
}

impl LibraryConfig {
    /// Configuration for a personal library
    pub fn user(library_id: impl Into<String>) -> Self {
        Self {
            library_id: library_id.into(),
            ..Default::default()
        }
    }

    /// Configuration for a group library
    pub fn group(library_id: impl Into<String>) -> Self {
        Self {
            library_id: library_id.into(),
            library_type: LibraryType::Group,
            ..Default::default()
        }
    }

    /// Builder-style API key
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Builder-style base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Per-request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// URL prefix of every library-scoped endpoint
    pub fn library_url(&self) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.library_type.path_segment(),
            self.library_id
        )
    }

    /// Check the configuration and return the API key to use
    pub fn validate(&self) -> Result<String, LibraryError> {
        self.validate_with(std::env::var(API_KEY_ENV).ok())
    }

    pub(crate) fn validate_with(&self, env_key: Option<String>) -> Result<String, LibraryError> {
        let id = self.library_id.trim();
        if id.is_empty() {
            return Err(LibraryError::Config("zotero.library_id is required".to_string()));
        }
        if !id.chars().all(|c| c.is_ascii_digit()) {
            return Err(LibraryError::Config(format!(
                "zotero.library_id must be numeric, got '{}'",
                id
            )));
        }
        if self.page_size == 0 || self.page_size > 100 {
            return Err(LibraryError::Config(
                "zotero.page_size must be between 1 and 100".to_string(),
            ));
        }
        let present = |k: &String| !k.trim().is_empty();
        self.api_key
            .clone()
            .filter(present)
            .or_else(|| env_key.filter(present))
            .ok_or_else(|| {
                LibraryError::Auth(format!(
                    "No Zotero API key: set zotero.api_key or {}",
                    API_KEY_ENV
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_url() {
        assert_eq!(
            LibraryConfig::user("42").library_url(),
            "https://api.zotero.org/users/42"
        );
        assert_eq!(
            LibraryConfig::group("7").with_base_url("http://h/").library_url(),
            "http://h/groups/7"
        );
    }

    #[test]
    fn test_validate_prefers_configured_key() {
        let config = LibraryConfig::user("42").with_api_key("file-key");
        assert_eq!(config.validate_with(Some("env-key".into())).unwrap(), "file-key");
    }

    #[test]
    fn test_validate_env_fallback() {
        let config = LibraryConfig::user("42");
        assert_eq!(config.validate_with(Some("env-key".into())).unwrap(), "env-key");
        assert!(matches!(config.validate_with(None), Err(LibraryError::Auth(_))));

        let blank = LibraryConfig::user("42").with_api_key(" ");
        assert_eq!(blank.validate_with(Some("env-key".into())).unwrap(), "env-key");
    }

    #[test]
    fn test_validate_library_id() {
        let config = LibraryConfig::user("").with_api_key("k");
        assert!(matches!(config.validate_with(None), Err(LibraryError::Config(_))));

        let config = LibraryConfig::user("abc").with_api_key("k");
        assert!(matches!(config.validate_with(None), Err(LibraryError::Config(_))));
    }

    #[test]
    fn test_deserialize_defaults() {
        let config: LibraryConfig =
            serde_json::from_str(r#"{"library_id": "9", "library_type": "group"}"#).unwrap();
        assert_eq!(config.library_type, LibraryType::Group);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.page_size, 100);
    }
}
