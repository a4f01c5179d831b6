//! Zotero LLM assistant CLI library.
//!
//! Argument parsing, configuration loading, logging setup, task dispatch
//! and report rendering for the `zotllm` binary.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod run;

pub use cli::{Cli, Command, OutputFormat};
pub use config::AppConfig;
pub use error::{CliError, Result};
pub use output::Formatter;
pub use run::{execute, run_command};
