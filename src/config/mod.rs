//! Configuration management
//!
//! Configuration is read from a TOML file and can be overridden by
//! environment variables.
//!
//! Configuration precedence (highest to lowest):
//! 1. Environment variables (`DATASTORE_PROJECT_ID`, `DATASTORE_NAMESPACE`)
//! 2. Configuration file (`DATASTORE_CONFIG`, or `~/.datastore/config.toml`)
//! 3. Default values
//!
//! # Example
//!
//! ```toml
//! [project]
//! project_id = "my-todo-project"
//! namespace = "tenant-a"
//!
//! [paging]
//! request_limit = 10
//!
//! [logging]
//! level = "debug"
//! timestamps = false
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "DATASTORE_CONFIG";

/// Environment variable overriding `project.project_id`
pub const PROJECT_ID_ENV: &str = "DATASTORE_PROJECT_ID";

/// Environment variable overriding `project.namespace`
pub const NAMESPACE_ENV: &str = "DATASTORE_NAMESPACE";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Project the queries run in
    #[serde(default)]
    pub project: ProjectConfig,

    /// Pagination behavior
    #[serde(default)]
    pub paging: PagingConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Project and namespace configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project id every query is scoped to
    #[serde(default)]
    pub project_id: String,

    /// Namespace within the project (None for the default namespace)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// Pagination configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PagingConfig {
    /// Maximum follow-up requests per cross-page traversal (None: unbounded)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_limit: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// Enable timestamps in logs
    #[serde(default = "default_log_timestamps")]
    pub timestamps: bool,
}

/// Log level options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

fn default_log_level() -> LogLevel {
    LogLevel::Warn
}

fn default_log_timestamps() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            timestamps: default_log_timestamps(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a file
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file (TOML format)
    ///
    /// # Returns
    /// * `Result<Config>` - Loaded configuration or error
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()).into());
        }
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ConfigError::InvalidFormat(e.to_string()).into())
    }

    /// Load configuration from all sources with proper precedence
    ///
    /// # Returns
    /// * `Result<Config>` - Merged and validated configuration
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::from_file(PathBuf::from(path))?,
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::from_file(path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(PROJECT_ID_ENV).ok(),
            std::env::var(NAMESPACE_ENV).ok(),
        );
    }

    fn apply_overrides(&mut self, project_id: Option<String>, namespace: Option<String>) {
        if let Some(project_id) = project_id {
            self.project.project_id = project_id;
        }
        if let Some(namespace) = namespace {
            self.project.namespace = Some(namespace);
        }
    }

    /// Get the default configuration file path
    ///
    /// # Returns
    /// * `PathBuf` - Path to default configuration file
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".datastore")
            .join("config.toml")
    }

    /// Save configuration to a file
    ///
    /// # Arguments
    /// * `path` - Path where to save the configuration
    ///
    /// # Returns
    /// * `Result<()>` - Success or error
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    ///
    /// # Returns
    /// * `Result<()>` - Ok if valid, error otherwise
    pub fn validate(&self) -> Result<()> {
        if self.project.project_id.trim().is_empty() {
            return Err(ConfigError::MissingField("project.project_id".to_string()).into());
        }
        if let Some(namespace) = &self.project.namespace {
            if namespace.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "project.namespace".to_string(),
                    value: namespace.clone(),
                }
                .into());
            }
        }
        Ok(())
    }
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}
