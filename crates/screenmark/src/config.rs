//! Configuration management for screenmark.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::export::{ExportOptions, DEFAULT_TITLE};
use crate::storage::StoreOptions;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "screenmark";

/// Default history file name.
const HISTORY_FILE_NAME: &str = "history.json";

/// Largest accepted export indent.
const MAX_INDENT: usize = 8;

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `SCREENMARK_`, nested keys joined by `__`)
/// 2. TOML config file at `~/.config/screenmark/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Capture configuration.
    pub capture: CaptureConfig,
    /// Export configuration.
    pub export: ExportConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the history document.
    /// Defaults to `~/.local/share/screenmark/history.json`
    pub history_path: Option<PathBuf>,
    /// Save after every change.
    pub autosave: bool,
    /// Refuse to start from a corrupt history instead of discarding it.
    pub strict_load: bool,
    /// Keep a copy of a corrupt history next to it.
    pub backup_corrupt: bool,
}

/// Capture-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Snap a ruler onto an axis when the dominant delta is more than this
    /// many times the other one. Set to 0 to disable.
    pub align_ratio: u32,
    /// Search radius in pixels when picking the entry nearest a click.
    pub hit_radius: f64,
}

/// Export-related configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Report title.
    pub title: String,
    /// Spaces per nesting level.
    pub indent: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            history_path: None, // Will be resolved to default at runtime
            autosave: true,
            strict_load: false,
            backup_corrupt: true,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            align_ratio: 10,
            hit_radius: 20.0,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            indent: 2,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `SCREENMARK_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);
        Self::extract(Self::figment(config_file))
    }

    fn extract(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    fn figment(config_file: PathBuf) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed("SCREENMARK_").split("__"))
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if !self.capture.hit_radius.is_finite() || self.capture.hit_radius <= 0.0 {
            return Err(Error::ConfigValidation {
                message: format!(
                    "hit_radius must be a positive number of pixels, got {}",
                    self.capture.hit_radius
                ),
            });
        }

        if self.export.indent > MAX_INDENT {
            return Err(Error::ConfigValidation {
                message: format!(
                    "export indent ({}) cannot be greater than {MAX_INDENT}",
                    self.export.indent
                ),
            });
        }

        if self.export.title.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "export title must not be blank".to_string(),
            });
        }

        Ok(())
    }

    /// Get the history path, resolving defaults if not set.
    #[must_use]
    pub fn history_path(&self) -> PathBuf {
        self.storage
            .history_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(HISTORY_FILE_NAME))
    }

    /// Persistence options for a [`crate::HistoryStore`].
    #[must_use]
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            autosave: self.storage.autosave,
            strict_load: self.storage.strict_load,
            backup_corrupt: self.storage.backup_corrupt,
        }
    }

    /// Presentation options for the text export.
    #[must_use]
    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            title: self.export.title.clone(),
            indent: self.export.indent,
        }
    }
}
