//! Runtime configuration
//!
//! Every field has a default, so an empty JSON object is a valid config.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use stratonea_core::StratoneaError;
use stratonea_guard::FallbackCopy;
use stratonea_present::IndicatorCopy;
use thiserror::Error;

/// Environment variable overriding `log.filter`
pub const LOG_FILTER_ENV: &str = "STRATONEA_LOG";

/// Environment variable overriding `log.format` (`pretty` or `json`)
pub const LOG_FORMAT_ENV: &str = "STRATONEA_LOG_FORMAT";

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

impl From<ConfigError> for StratoneaError {
    fn from(err: ConfigError) -> Self {
        StratoneaError::Config(err.to_string())
    }
}

/// Log output format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" => Some(LogFormat::Pretty),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

/// Logging configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directives
    pub filter: String,
    pub format: LogFormat,
    pub with_file_and_line: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            filter: "info".into(),
            format: LogFormat::Pretty,
            with_file_and_line: false,
        }
    }
}

/// Complete runtime configuration
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub log: LogConfig,
    /// Indicator and advisory text
    pub indicator: IndicatorCopy,
    /// Fault fallback text
    pub fallback: FallbackCopy,
}

impl RuntimeConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Apply `STRATONEA_LOG` and `STRATONEA_LOG_FORMAT` from the process environment
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(filter) = lookup(LOG_FILTER_ENV) {
            if !filter.trim().is_empty() {
                self.log.filter = filter;
            }
        }
        if let Some(format) = lookup(LOG_FORMAT_ENV) {
            self.log.format = LogFormat::parse(&format).ok_or(ConfigError::InvalidValue {
                key: LOG_FORMAT_ENV,
                value: format,
            })?;
        }
        Ok(self)
    }
}
