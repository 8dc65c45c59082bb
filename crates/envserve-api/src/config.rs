//! Configuration loading and typed config structures for an environment
//! service.
//!
//! The configuration lives in a YAML file (`envserve-config.yaml` by
//! default). Every section has defaults, so an empty file yields a
//! cart-pole service on its default port. Selected values can be
//! overridden from the environment so the same file can back both
//! services:
//!
//! - `ENVSERVE_TASK` overrides `task.kind`
//! - `ENVSERVE_SEED` overrides `task.seed`
//! - `ENVSERVE_HOST` overrides `server.host`
//! - `ENVSERVE_PORT` overrides `server.port`

use std::path::Path;

use envserve_sim::TaskConfig;
use serde::Deserialize;

use crate::server::ServerConfig;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// An environment override held an unusable value.
    #[error("invalid value {value:?} for {key}: {reason}")]
    Override {
        /// The environment variable name.
        key: &'static str,
        /// The rejected value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level service configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ServiceConfig {
    /// Which task to host and how.
    #[serde(default)]
    pub task: TaskConfig,

    /// Listen address.
    #[serde(default)]
    pub server: ServerSection,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ServiceConfig {
    /// Load configuration from a YAML file and apply environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if it is not valid YAML, or
    /// [`ConfigError::Override`] if an override variable is malformed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string without consulting the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Override fields from `ENVSERVE_*` environment variables when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Override`] if a variable is set to a value
    /// that cannot be parsed.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Override fields using `lookup` to resolve variable names.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Override`] if a value cannot be parsed.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        if let Some(value) = lookup("ENVSERVE_TASK") {
            self.task.kind = value.parse().map_err(|e| ConfigError::Override {
                key: "ENVSERVE_TASK",
                reason: format!("{e}"),
                value,
            })?;
        }
        if let Some(value) = lookup("ENVSERVE_SEED") {
            let seed = value.trim().parse().map_err(|e| ConfigError::Override {
                key: "ENVSERVE_SEED",
                reason: format!("{e}"),
                value: value.clone(),
            })?;
            self.task.seed = Some(seed);
        }
        if let Some(value) = lookup("ENVSERVE_HOST") {
            self.server.host = value;
        }
        if let Some(value) = lookup("ENVSERVE_PORT") {
            let port = value.trim().parse().map_err(|e| ConfigError::Override {
                key: "ENVSERVE_PORT",
                reason: format!("{e}"),
                value: value.clone(),
            })?;
            self.server.port = Some(port);
        }
        Ok(())
    }

    /// Resolve the listen address, falling back to the task's default
    /// port.
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.server.host.clone(),
            port: self
                .server
                .port
                .unwrap_or_else(|| self.task.kind.default_port()),
        }
    }
}

/// Listen address section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSection {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port. Uses the task's default port when absent.
    #[serde(default)]
    pub port: Option<u16>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: None,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes
    /// precedence when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit logs as JSON lines instead of human-readable text.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_host() -> String {
    String::from("0.0.0.0")
}

fn default_log_level() -> String {
    String::from("info")
}
