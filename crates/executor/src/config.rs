//! Mediator configuration via `rowgate.toml`
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration.

use std::path::Path;

use rowgate_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Conventional config file name
pub const CONFIG_FILE_NAME: &str = "rowgate.toml";

/// Mediator configuration.
///
/// # Example
///
/// ```toml
/// transaction_name_prefix = "worker"
/// trace_operations = false
/// rollback_on_error = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediatorConfig {
    /// Prefix for generated names of unnamed transactions (`"{prefix}-{n}"`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_name_prefix: Option<String>,
    /// Emit a `debug!` event for every delegated adapter call
    #[serde(default)]
    pub trace_operations: bool,
    /// Roll back explicitly when a `Mediator::transaction` closure fails
    #[serde(default = "default_rollback_on_error")]
    pub rollback_on_error: bool,
}

fn default_rollback_on_error() -> bool {
    true
}

impl Default for MediatorConfig {
    fn default() -> Self {
        Self {
            transaction_name_prefix: None,
            trace_operations: false,
            rollback_on_error: default_rollback_on_error(),
        }
    }
}

impl MediatorConfig {
    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# rowgate mediator configuration
#
# Name unnamed transactions "<prefix>-<n>" (default: unnamed)
# transaction_name_prefix = "app"

# Log every delegated adapter call at debug level (default: false)
trace_operations = false

# Roll back explicitly when a transaction closure returns an error
# (default: true). When false the adapter decides on dispose.
rollback_on_error = true
"#
    }

    /// Parse config from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        toml::from_str(&content).map_err(|e| {
            Error::Config(format!(
                "failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                Error::Config(format!(
                    "failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            Error::Config(format!(
                "failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
