//! Configuration management for ClipShelf
//!
//! This module handles loading, validating, and managing configuration
//! for the clip store, selection capture and library.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::library::DEFAULT_FAVICON_SERVICE;
use crate::store::UpsertPolicy;

/// Environment variable pointing at a config file
pub const CONFIG_ENV: &str = "CLIPSHELF_CONFIG";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading config file
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("Failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("Failed to serialize TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Validation error
    #[error("Config validation failed: {0}")]
    Validation(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Clip store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Selection capture configuration
    #[serde(default)]
    pub capture: CaptureConfig,

    /// Library configuration
    #[serde(default)]
    pub library: LibraryConfig,
}

/// Clip store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite database holding the clips
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    /// Position of a re-saved clip that matches an existing one
    #[serde(default)]
    pub upsert_policy: UpsertPolicy,
}

/// Selection capture configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Quiet period before a selection is evaluated
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// How long the save confirmation stays visible
    #[serde(default = "default_confirmation_ms")]
    pub confirmation_ms: u64,
}

impl CaptureConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn confirmation(&self) -> Duration {
        Duration::from_millis(self.confirmation_ms)
    }
}

/// Library configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// How long toasts stay visible
    #[serde(default = "default_toast_ms")]
    pub toast_ms: u64,

    /// Remote icon lookup for clips without a stored favicon
    #[serde(default = "default_favicon_service")]
    pub favicon_service: String,
}

impl LibraryConfig {
    pub fn toast(&self) -> Duration {
        Duration::from_millis(self.toast_ms)
    }
}

// Default value functions
fn default_store_path() -> PathBuf {
    PathBuf::from("~/.local/share/clipshelf/clips.db")
}

fn default_debounce_ms() -> u64 {
    200
}

fn default_confirmation_ms() -> u64 {
    2000
}

fn default_toast_ms() -> u64 {
    2000
}

fn default_favicon_service() -> String {
    DEFAULT_FAVICON_SERVICE.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            upsert_policy: UpsertPolicy::default(),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            confirmation_ms: default_confirmation_ms(),
        }
    }
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            toast_ms: default_toast_ms(),
            favicon_service: default_favicon_service(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            store: StoreConfig::default(),
            capture: CaptureConfig::default(),
            library: LibraryConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Checks in order:
    /// 1. Path from CLIPSHELF_CONFIG environment variable
    /// 2. ~/.config/clipshelf/config.toml
    /// 3. Falls back to defaults
    pub fn load() -> Result<Self, ConfigError> {
        match Self::find_config_path() {
            Some(path) => Self::load_from_path(&path),
            None => {
                let mut config = Self::default();
                config.expand_paths();
                Ok(config)
            }
        }
    }

    /// Load configuration with an optional explicit path
    pub fn load_config(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        match config_path {
            Some(path) => Self::load_from_path(&path),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(toml_str)?;
        config.expand_paths();
        config.validate_config()?;
        Ok(config)
    }

    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("clipshelf").join("config.toml"))
    }

    fn find_config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        Self::default_path().filter(|p| p.exists())
    }

    fn expand_paths(&mut self) {
        self.store.path = expand_path(&self.store.path);
    }

    /// Validate configuration values
    fn validate_config(&self) -> Result<(), ConfigError> {
        if !(10..=5000).contains(&self.capture.debounce_ms) {
            return Err(ConfigError::Validation(
                "debounce_ms must be between 10 and 5000".to_string(),
            ));
        }

        if !(100..=30_000).contains(&self.capture.confirmation_ms) {
            return Err(ConfigError::Validation(
                "confirmation_ms must be between 100 and 30000".to_string(),
            ));
        }

        if !(100..=30_000).contains(&self.library.toast_ms) {
            return Err(ConfigError::Validation(
                "toast_ms must be between 100 and 30000".to_string(),
            ));
        }

        if url::Url::parse(&self.library.favicon_service).is_err() {
            return Err(ConfigError::Validation(format!(
                "favicon_service is not a valid URL: {}",
                self.library.favicon_service
            )));
        }

        if self.store.path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "store path must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::default_path().ok_or_else(|| {
            ConfigError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not find config directory",
            ))
        })?;
        self.save_to(&path)
    }

    /// Write the commented example configuration to `path`
    pub fn generate_example_config(path: &Path, force: bool) -> Result<(), ConfigError> {
        if !force && path.exists() {
            return Err(ConfigError::Validation(
                "Config file already exists. Use --force to overwrite.".to_string(),
            ));
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, Self::generate_example())?;
        Ok(())
    }

    /// Generate example configuration file
    pub fn generate_example() -> String {
        let config = Config::default();

        format!(
            r#"# ClipShelf Configuration File
# Location: ~/.config/clipshelf/config.toml

# Logging level (trace, debug, info, warn, error)
log_level = "{}"

# Clip store
[store]
# SQLite database holding the clips
path = "{}"
# Where a re-saved clip goes: "keep_position" or "move_to_front"
upsert_policy = "keep_position"

# Selection capture
[capture]
# Quiet period before a selection is evaluated (milliseconds)
debounce_ms = {}
# How long the save confirmation stays visible (milliseconds)
confirmation_ms = {}

# Library
[library]
# How long toasts stay visible (milliseconds)
toast_ms = {}
# Icon lookup for clips without a stored favicon
favicon_service = "{}"
"#,
            config.log_level,
            config.store.path.display(),
            config.capture.debounce_ms,
            config.capture.confirmation_ms,
            config.library.toast_ms,
            config.library.favicon_service,
        )
    }
}

/// Expand tilde in path
fn expand_path(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    let expanded = shellexpand::tilde(path_str.as_ref());
    PathBuf::from(expanded.into_owned())
}
