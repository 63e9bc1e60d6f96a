//! Application configuration
//!
//! Loaded from `config.toml` in the platform config directory (or `--config`),
//! then overridden by environment variables. A missing file yields defaults.

pub mod repository;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "schedule-admin";

pub const ENV_DATABASE_URL: &str = "SCHEDULE_ADMIN_DATABASE_URL";
pub const ENV_SCHEDULER_URL: &str = "SCHEDULE_ADMIN_SCHEDULER_URL";
pub const ENV_LOG_LEVEL: &str = "SCHEDULE_ADMIN_LOG_LEVEL";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub scheduler: SchedulerConfig,
    pub import: ImportConfig,
    pub results: ResultsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Connection settings for the external scheduling service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Uploads larger than this are rejected before parsing
    pub max_file_bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultsConfig {
    pub default_limit: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let path = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("schedule-admin.db");
        Self {
            url: format!("sqlite://{}", path.display()),
            max_connections: 5,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5002".to_string(),
            timeout_secs: 60,
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: 10 * 1024 * 1024,
        }
    }
}

impl Default for ResultsConfig {
    fn default() -> Self {
        Self { default_limit: 50 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Default location: `<config dir>/schedule-admin/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
    }

    /// Load config from an explicit path, or the default location when `None`.
    /// An explicit path must exist; the default location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(default) if default.exists() => Self::from_file(&default)?,
                _ => Self::default(),
            },
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid config TOML")
    }

    /// Apply overrides from a variable lookup (the process environment in production)
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_DATABASE_URL).filter(|v| !v.is_empty()) {
            self.database.url = url;
        }
        if let Some(url) = lookup(ENV_SCHEDULER_URL).filter(|v| !v.is_empty()) {
            self.scheduler.base_url = url;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL).filter(|v| !v.is_empty()) {
            self.logging.level = level;
        }
    }
}
