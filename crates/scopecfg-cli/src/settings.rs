//! TOML settings for the `scopecfg` tool itself.
//!
//! Example:
//!
//! ```toml
//! log_level = "debug"
//! format_spec = true
//! backup = false
//! ```
//!
//! Every field is optional; a missing settings file means all defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for loading tool settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("I/O error accessing settings at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Settings of the `scopecfg` tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolSettings {
    /// `tracing` filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Whether `normalize` appends the format description by default.
    #[serde(default)]
    pub format_spec: bool,
    /// Whether `normalize` keeps a `.bak` copy of the original file.
    #[serde(default = "default_true")]
    pub backup: bool,
}

fn default_log_level() -> String {
    "warn".to_string()
}
fn default_true() -> bool {
    true
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            format_spec: false,
            backup: default_true(),
        }
    }
}

/// Loads settings from `path`, or returns the defaults when no path is given
/// or the file does not exist.
///
/// # Errors
///
/// Returns [`SettingsError::Io`] for file-system errors other than "not
/// found", and [`SettingsError::Parse`] if the TOML is malformed.
pub fn load_settings(path: Option<&Path>) -> Result<ToolSettings, SettingsError> {
    let Some(path) = path else {
        return Ok(ToolSettings::default());
    };
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ToolSettings::default()),
        Err(source) => Err(SettingsError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
