//! Error types for library access

use std::time::Duration;
use thiserror::Error;

/// Library operation errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LibraryError {
    /// Item, collection or attachment does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// API key missing, invalid or lacking permission
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The server asked us to slow down
    #[error("Rate limited (retry after {retry_after:?})")]
    RateLimited {
        /// Delay requested by the server, if any
        retry_after: Option<Duration>,
    },

    /// Connection error (network, DNS, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// Unexpected status or unparseable body
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// A write was rejected or conflicted with a newer version
    #[error("Write failed: {0}")]
    Write(String),

    /// Library configuration is incomplete
    #[error("Configuration error: {0}")]
    Config(String),
}

impl LibraryError {
    /// Map a non-success HTTP status to an error
    ///
    /// # Examples
    ///
    /// ```
    /// use zotllm_library::LibraryError;
    ///
    /// assert!(matches!(LibraryError::from_status(403, "forbidden".into()), LibraryError::Auth(_)));
    /// assert!(matches!(LibraryError::from_status(404, "items/X".into()), LibraryError::NotFound(_)));
    /// ```
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => LibraryError::Auth(body),
            404 => LibraryError::NotFound(body),
            409 | 412 | 413 => LibraryError::Write(format!("HTTP {}: {}", status, body)),
            429 => LibraryError::RateLimited { retry_after: None },
            _ => LibraryError::InvalidResponse(format!("HTTP {}: {}", status, body)),
        }
    }
}

impl From<reqwest::Error> for LibraryError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            LibraryError::Network(e.to_string())
        } else if e.is_decode() {
            LibraryError::InvalidResponse(format!("Failed to decode body: {}", e))
        } else if let Some(status) = e.status() {
            LibraryError::from_status(status.as_u16(), e.to_string())
        } else {
            LibraryError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for LibraryError {
    fn from(e: serde_json::Error) -> Self {
        LibraryError::InvalidResponse(format!("JSON parsing error: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(LibraryError::from_status(401, String::new()), LibraryError::Auth(_)));
        assert!(matches!(LibraryError::from_status(412, String::new()), LibraryError::Write(_)));
        assert_eq!(
            LibraryError::from_status(429, String::new()),
            LibraryError::RateLimited { retry_after: None }
        );
        assert!(matches!(
            LibraryError::from_status(500, String::new()),
            LibraryError::InvalidResponse(_)
        ));
    }
}
