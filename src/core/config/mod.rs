//! core::config
//!
//! Configuration loading.
//!
//! # Precedence
//!
//! Values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. CLI flags (not handled here)
//!
//! # Locations
//!
//! Searched in order:
//! 1. `$HUBKIT_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/hubkit/config.toml`
//! 3. `~/.hubkit/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use hubkit::core::config::Config;
//!
//! let config = Config::load().unwrap();
//! let forge_config = config.forge_config();
//! println!("API: {}", forge_config.api_base);
//! ```

pub mod schema;

pub use schema::{GlobalConfig, HttpConfig, SecretsConfig, WalkConfig};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::forge::ForgeConfig;
use crate::history::{DuplicatePolicy, WalkOptions};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "HUBKIT_CONFIG";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Loaded configuration with defaults applied through accessors.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: GlobalConfig,
    /// Path the configuration was loaded from (if any)
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed or
    /// fails validation. A missing file is not an error.
    pub fn load() -> Result<Config, ConfigError> {
        let (global, path) = Self::load_global()?;
        global.validate()?;
        Ok(Config { global, path })
    }

    /// Load configuration from an explicit file.
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let global = Self::read_config(path)?;
        global.validate()?;
        Ok(Config {
            global,
            path: Some(path.to_path_buf()),
        })
    }

    fn load_global() -> Result<(GlobalConfig, Option<PathBuf>), ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Ok((Self::read_config(&path)?, Some(path)));
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("hubkit/config.toml");
            if path.exists() {
                return Ok((Self::read_config(&path)?, Some(path)));
            }
        }

        if let Some(home) = dirs::home_dir() {
            let path = home.join(".hubkit/config.toml");
            if path.exists() {
                return Ok((Self::read_config(&path)?, Some(path)));
            }
        }

        Ok((GlobalConfig::default(), None))
    }

    fn read_config(path: &Path) -> Result<GlobalConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    // =========================================================================
    // Accessors with defaults
    // =========================================================================

    /// REST API base URL. Defaults to `https://api.github.com`.
    pub fn api_base(&self) -> &str {
        self.global
            .api_base
            .as_deref()
            .unwrap_or(crate::forge::github::DEFAULT_API_BASE)
    }

    /// Owner used when a command omits one.
    pub fn default_owner(&self) -> Option<&str> {
        self.global.default_owner.as_deref()
    }

    /// Secrets provider. Defaults to "file".
    pub fn secrets_provider(&self) -> &str {
        self.global
            .secrets
            .as_ref()
            .and_then(|s| s.provider.as_deref())
            .unwrap_or(crate::secrets::DEFAULT_PROVIDER)
    }

    /// Adapter settings with defaults filled in.
    pub fn forge_config(&self) -> ForgeConfig {
        let defaults = ForgeConfig::default();
        let http = self.global.http.clone().unwrap_or_default();
        ForgeConfig {
            api_base: self.api_base().trim_end_matches('/').to_string(),
            request_timeout: http
                .request_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            per_page: http.per_page.unwrap_or(defaults.per_page),
            max_pages: http.max_pages.unwrap_or(defaults.max_pages),
        }
    }

    /// Walk limits with defaults filled in.
    pub fn walk_options(&self) -> WalkOptions {
        let defaults = WalkOptions::default();
        let walk = self.global.walk.clone().unwrap_or_default();
        WalkOptions {
            max_depth: walk.max_depth.unwrap_or(defaults.max_depth),
            max_commits: walk.max_commits.unwrap_or(defaults.max_commits),
            deadline: walk
                .deadline_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.deadline),
            duplicates: match walk.dedupe {
                Some(true) => DuplicatePolicy::DedupeByHash,
                Some(false) => DuplicatePolicy::PreserveMultiplicity,
                None => defaults.duplicates,
            },
        }
    }

    /// Get the path the configuration was loaded from.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
