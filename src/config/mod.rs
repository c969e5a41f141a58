//! config
//!
//! Configuration loading.
//!
//! # Locations
//!
//! The first existing file wins:
//! 1. `$FOODCARE_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/foodcare/config.toml`
//! 3. `~/.foodcare/config.toml` (canonical write location)
//!
//! No file means defaults. A file that exists but does not parse or
//! validate is an error.
//!
//! # Example
//!
//! ```no_run
//! use foodcare_session::config::Config;
//!
//! let config = Config::load().unwrap();
//! println!("API: {}", config.base_url());
//! println!("Timeout: {:?}", config.request_timeout());
//! ```

pub mod schema;

pub use schema::{ApiConfig, FileConfig, SecretsConfig, SessionConfig};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::auth::{SessionOptions, ValidationPolicy, DEFAULT_MIN_PASSWORD_LENGTH};
use crate::secrets::DEFAULT_PROVIDER;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "FOODCARE_CONFIG";

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Default request timeout, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default refresh endpoint path.
pub const DEFAULT_REFRESH_PATH: &str = "/refresh";

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

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Loaded configuration with defaults applied by the accessors.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub file: FileConfig,
    loaded_from: Option<PathBuf>,
}

impl Config {
    /// Load from the first existing standard location.
    pub fn load() -> Result<Self, ConfigError> {
        let candidates = search_paths(|key| std::env::var(key).ok(), dirs::home_dir());
        match candidates.into_iter().find(|path| path.exists()) {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load a specific file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let file: FileConfig = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        file.validate()?;

        Ok(Self {
            file,
            loaded_from: Some(path.to_path_buf()),
        })
    }

    /// Canonical config path, `~/.foodcare/config.toml`.
    pub fn global_config_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".foodcare/config.toml"))
    }

    /// Validate and write `file` to the canonical path.
    pub fn write(file: &FileConfig) -> Result<PathBuf, ConfigError> {
        let path = Self::global_config_path()?;
        Self::write_to(&path, file)?;
        Ok(path)
    }

    /// Validate and write `file` to `path` atomically.
    ///
    /// Writes a sibling temp file, syncs it, then renames it over `path`.
    pub fn write_to(path: &Path, file: &FileConfig) -> Result<(), ConfigError> {
        file.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let contents =
            toml::to_string_pretty(file).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        let temp_path = path.with_extension("toml.tmp");
        let mut temp = fs::File::create(&temp_path).map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;
        temp.write_all(contents.as_bytes())
            .map_err(|e| ConfigError::WriteError {
                path: temp_path.clone(),
                source: e,
            })?;
        temp.sync_all().map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Path the configuration was loaded from, if any.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.loaded_from.as_deref()
    }

    // =========================================================================
    // Accessors with defaults
    // =========================================================================

    fn api(&self) -> Option<&ApiConfig> {
        self.file.api.as_ref()
    }

    fn session(&self) -> Option<&SessionConfig> {
        self.file.session.as_ref()
    }

    /// API root. Defaults to `http://localhost:8000`.
    pub fn base_url(&self) -> &str {
        self.api()
            .and_then(|a| a.base_url.as_deref())
            .unwrap_or(DEFAULT_BASE_URL)
    }

    /// Timeout for every request. Defaults to 30 seconds.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.api()
                .and_then(|a| a.request_timeout_secs)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    /// Refresh endpoint path. Defaults to `/refresh`.
    pub fn refresh_path(&self) -> &str {
        self.api()
            .and_then(|a| a.refresh_path.as_deref())
            .unwrap_or(DEFAULT_REFRESH_PATH)
    }

    /// Minimum password length. Defaults to 4.
    pub fn min_password_length(&self) -> usize {
        self.session()
            .and_then(|s| s.min_password_length)
            .unwrap_or(DEFAULT_MIN_PASSWORD_LENGTH)
    }

    /// Whether sessions may live in memory only. Defaults to `false`.
    pub fn allow_memory_only(&self) -> bool {
        self.session()
            .and_then(|s| s.allow_memory_only)
            .unwrap_or(false)
    }

    /// Secret store provider. Defaults to `"file"`.
    pub fn secrets_provider(&self) -> &str {
        self.file
            .secrets
            .as_ref()
            .and_then(|s| s.provider.as_deref())
            .unwrap_or(DEFAULT_PROVIDER)
    }

    /// Options for a [`SessionController`](crate::auth::SessionController).
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            policy: ValidationPolicy::new(self.min_password_length()),
            allow_memory_only: self.allow_memory_only(),
            request_timeout: self.request_timeout(),
        }
    }
}

/// Candidate config files, in lookup order.
fn search_paths(env: impl Fn(&str) -> Option<String>, home: Option<PathBuf>) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(explicit) = env(CONFIG_ENV) {
        paths.push(PathBuf::from(explicit));
    }
    if let Some(xdg_home) = env("XDG_CONFIG_HOME") {
        paths.push(PathBuf::from(xdg_home).join("foodcare/config.toml"));
    }
    if let Some(home) = home {
        paths.push(home.join(".foodcare/config.toml"));
    }
    paths
}
