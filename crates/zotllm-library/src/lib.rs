//! Zotero library access
//!
//! Implementations of [`zotllm_domain::traits::LibraryClient`]: a blocking
//! client for the Zotero Web API v3 and an in-memory library used by tests
//! and dry runs.
//!
//! # Example
//!
//! ```no_run
//! use zotllm_domain::traits::LibraryClient;
//! use zotllm_library::{LibraryConfig, ZoteroClient};
//!
//! let config = LibraryConfig::user("123456").with_api_key("secret");
//! let client = ZoteroClient::new(&config).expect("Failed to build client");
//!
//! let item = client.get_item("ABCD2345").expect("Failed to fetch item");
//! println!("{}", item.label());
//! ```

#![warn(missing_docs)]

mod client;
mod config;
mod error;
mod memory;
mod wire;

pub use client::ZoteroClient;
pub use config::{LibraryConfig, LibraryType, API_KEY_ENV, DEFAULT_BASE_URL};
pub use error::LibraryError;
pub use memory::{InMemoryLibrary, WriteStats};
