//! Data models for server configuration.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use formation_api::Credentials;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

/// Seconds between status polls while waiting for an interactive app.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Longest accepted poll interval, in seconds.
pub const MAX_POLL_INTERVAL_SECS: u64 = 3600;

/// Verbosity accepted by `--log-level`, `LOG_LEVEL` and `log_level`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ConfigError::InvalidLogLevel { value: value.to_string() }),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One source of settings. Every field is optional so layers can be stacked;
/// a field set in a higher layer replaces the lower one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConfigLayer {
    pub base_url: Option<String>,
    pub token: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub log_level: Option<String>,
    pub log_json: Option<bool>,
    pub poll_interval: Option<u64>,
}

impl ConfigLayer {
    /// Stack `higher` on top of `self`. Empty strings in `higher` count as unset.
    pub fn overlay(self, higher: ConfigLayer) -> ConfigLayer {
        fn pick(lower: Option<String>, higher: Option<String>) -> Option<String> {
            higher.filter(|value| !value.is_empty()).or(lower)
        }

        ConfigLayer {
            base_url: pick(self.base_url, higher.base_url),
            token: pick(self.token, higher.token),
            username: pick(self.username, higher.username),
            password: pick(self.password, higher.password),
            log_level: pick(self.log_level, higher.log_level),
            log_json: higher.log_json.or(self.log_json),
            poll_interval: higher.poll_interval.or(self.poll_interval),
        }
    }
}

/// Fully resolved settings the server runs with.
#[derive(Clone)]
pub struct FormationConfig {
    /// Base URL without a trailing slash.
    pub base_url: Url,
    pub token: Option<String>,
    pub credentials: Option<Credentials>,
    pub log_level: LogLevel,
    pub log_json: bool,
    pub poll_interval: Duration,
}

impl fmt::Debug for FormationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormationConfig")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("credentials", &self.credentials)
            .field("log_level", &self.log_level)
            .field("log_json", &self.log_json)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

/// Errors raised while assembling configuration. All of them are fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("base URL is required (--base-url, FORMATION_BASE_URL or base_url in the config file)")]
    MissingBaseUrl,

    #[error("either a token or both username and password must be provided")]
    MissingCredentials,

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("invalid log level '{value}' (expected debug, info, warn or error)")]
    InvalidLogLevel { value: String },

    #[error("poll interval must be between 1 and {MAX_POLL_INTERVAL_SECS} seconds")]
    InvalidPollInterval,

    #[error("invalid value '{value}' for environment variable {name}")]
    InvalidEnv { name: &'static str, value: String },

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}
