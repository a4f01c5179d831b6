//! Configuration file loading and validation.
//!
//! One file holds every section. `.toml` files are parsed as TOML,
//! anything else as YAML.

use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use zotllm_domain::TaskKind;
use zotllm_engine::{EngineConfig, PromptConfig, TaskConfig};
use zotllm_library::LibraryConfig;
use zotllm_llm::ProviderConfig;

/// File looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Zotero connection
    #[serde(default)]
    pub zotero: LibraryConfig,

    /// Model backend
    #[serde(default)]
    pub llm: ProviderConfig,

    /// Task behaviour
    #[serde(default)]
    pub tasks: TaskConfig,

    /// Prompt overrides
    #[serde(default)]
    pub prompts: PromptConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log level when neither the command line nor `RUST_LOG` sets one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

impl AppConfig {
    /// Locate the configuration file.
    ///
    /// An explicit path must exist. Otherwise `config.yaml` in the working
    /// directory is used, then `<config_dir>/zotllm/config.yaml`.
    pub fn locate(explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            if path.is_file() {
                return Ok(path.to_path_buf());
            }
            return Err(CliError::Config(format!(
                "configuration file {} not found",
                path.display()
            )));
        }

        let mut candidates = vec![PathBuf::from(DEFAULT_CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            candidates.push(dir.join("zotllm").join(DEFAULT_CONFIG_FILE));
        }
        candidates
            .iter()
            .find(|p| p.is_file())
            .cloned()
            .ok_or_else(|| {
                let tried: Vec<String> = candidates.iter().map(|p| p.display().to_string()).collect();
                CliError::Config(format!(
                    "no configuration file found (tried {}); pass one with --config",
                    tried.join(", ")
                ))
            })
    }

    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        if is_toml(path) {
            Self::from_toml(&contents)
        } else {
            Self::from_yaml(&contents)
        }
    }

    /// Parse YAML configuration.
    pub fn from_yaml(contents: &str) -> Result<Self> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Parse TOML configuration.
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Check the sections a task needs before anything touches the network.
    ///
    /// The `llm` section is only required by tasks that call the model.
    pub fn validate_for(&self, task: TaskKind) -> Result<()> {
        self.zotero
            .validate()
            .map_err(|e| CliError::Config(format!("zotero: {}", e)))?;
        if task.uses_model() {
            self.llm
                .validate()
                .map_err(|e| CliError::Config(format!("llm: {}", e)))?;
        }
        self.validate_local()
    }

    /// Checks that need no environment lookups.
    fn validate_local(&self) -> Result<()> {
        self.tasks.validate().map_err(CliError::Config)?;
        if let Some(level) = &self.logging.level {
            if level.parse::<tracing::Level>().is_err() {
                return Err(CliError::Config(format!(
                    "logging.level '{}' is not one of error, warn, info, debug, trace",
                    level
                )));
            }
        }
        Ok(())
    }

    /// Engine configuration derived from the task and prompt sections.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            tasks: self.tasks.clone(),
            prompts: self.prompts.clone(),
        }
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
}
