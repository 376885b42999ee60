//! Layered runtime configuration.
//!
//! # Responsibility
//! - Resolve database path, logging and remote endpoint settings.
//! - Merge built-in defaults, an optional TOML file and environment overrides.
//!
//! # Invariants
//! - Later layers override earlier ones field by field.
//! - Blank environment values are ignored.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const ENV_DB_PATH: &str = "COURSEKIT_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "COURSEKIT_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "COURSEKIT_LOG_DIR";
pub const ENV_API_BASE_URL: &str = "COURSEKIT_API_BASE_URL";

const DEFAULT_DB_FILE_NAME: &str = "coursekit.sqlite3";
const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_API_RESOURCE: &str = "items";

#[derive(Debug)]
pub enum ConfigError {
    Read { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, message: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, message } => {
                write!(f, "invalid config `{}`: {message}", path.display())
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse { .. } => None,
        }
    }
}

/// Remote collection endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub resource: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            resource: DEFAULT_API_RESOURCE.to_string(),
        }
    }
}

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite file backing the persistence slots.
    pub db_path: PathBuf,
    pub log_level: String,
    /// Absolute directory for rolling log files.
    pub log_dir: PathBuf,
    pub api: ApiConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_dir = std::env::temp_dir().join("coursekit");
        Self {
            db_path: data_dir.join(DEFAULT_DB_FILE_NAME),
            log_level: crate::logging::default_log_level().to_string(),
            log_dir: data_dir.join("logs"),
            api: ApiConfig::default(),
        }
    }
}

impl AppConfig {
    /// Resolves defaults, then `path` (if given), then process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parses a TOML file. Missing fields keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|err| err.to_string())
    }

    /// Applies overrides from `lookup`, which maps an env key to its value.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(value) = read(ENV_DB_PATH) {
            self.db_path = PathBuf::from(value);
        }
        if let Some(value) = read(ENV_LOG_LEVEL) {
            self.log_level = value;
        }
        if let Some(value) = read(ENV_LOG_DIR) {
            self.log_dir = PathBuf::from(value);
        }
        if let Some(value) = read(ENV_API_BASE_URL) {
            self.api.base_url = value;
        }
    }

    /// Renders the resolved configuration as TOML.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_else(|err| format!("# render failed: {err}\n"))
    }
}
