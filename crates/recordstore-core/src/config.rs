//! TOML-backed configuration for the record accessor.
//!
//! ```toml
//! [pagination]
//! default_limit = 10
//! max_limit = 100
//!
//! [time_window]
//! day_end = "last_millisecond"   # or "next_midnight"
//!
//! [logging]
//! level = "info"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::window::DayEnd;

/// Error types for configuration operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl ConfigError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RecordStoreConfig {
    #[serde(default)]
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub time_window: TimeWindowConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl RecordStoreConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a TOML file. A missing file yields the defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("Config file does not exist: {:?}", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pagination.default_limit == 0 {
            return Err(ConfigError::validation(
                "pagination.default_limit must be > 0",
            ));
        }
        if self.pagination.max_limit == 0 {
            return Err(ConfigError::validation("pagination.max_limit must be > 0"));
        }
        if self.pagination.default_limit > self.pagination.max_limit {
            return Err(ConfigError::validation(
                "pagination.default_limit must be <= pagination.max_limit",
            ));
        }
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(ConfigError::validation(format!(
                "logging.level must be one of {valid_levels:?}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Page size used when a caller asks for a limit of zero.
    #[serde(default = "default_limit")]
    pub default_limit: u64,
    /// Upper bound for any requested page size.
    #[serde(default = "default_max_limit")]
    pub max_limit: u64,
}

fn default_limit() -> u64 {
    10
}
fn default_max_limit() -> u64 {
    100
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TimeWindowConfig {
    #[serde(default)]
    pub day_end: DayEnd,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `recordstore_repository=debug`.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Let a valid `RUST_LOG` override `level`.
    #[serde(default = "default_true")]
    pub respect_env: bool,
    /// Colored output.
    #[serde(default = "default_true")]
    pub ansi: bool,
    /// Include the event target (module path) in each line.
    #[serde(default = "default_true")]
    pub with_target: bool,
}

fn default_log_level() -> String {
    "info".into()
}
fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            respect_env: true,
            ansi: true,
            with_target: true,
        }
    }
}
