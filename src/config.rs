//! # Session Configuration
//!
//! Settings for the session controller (endpoint, keep-alive cadence,
//! reconnect behaviour) and for the tracing subscriber.
//!
//! ## Sources
//! - TOML via [`SessionConfig::from_file`] / [`SessionConfig::from_toml`]
//! - `WA_SESSION_*` environment variables via [`SessionConfig::from_env`]
//! - Defaults, optionally patched with [`SessionConfig::default_with_overrides`]
//!
//! ## Reconnect Policy
//! A session that the server closes with a `kind` listed in
//! `no_reconnect_kinds` (by default `replaced`, meaning another client took
//! the session over) is not reconnected even when reconnects are enabled.

use crate::error::{ProtocolError, Result};
use crate::transport::ReconnectPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;

/// Default web socket endpoint of the legacy web protocol
pub const DEFAULT_URL: &str = "wss://web.whatsapp.com/ws";

/// Default interval between keep-alive pings
pub const DEFAULT_KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(60);

/// Default number of consecutive dropped frames tolerated before reconnecting
pub const DEFAULT_MAX_INTEGRITY_FAILURES: u32 = 5;

const ENV_URL: &str = "WA_SESSION_URL";
const ENV_KEEP_ALIVE_MS: &str = "WA_SESSION_KEEP_ALIVE_MS";
const ENV_RECONNECT: &str = "WA_SESSION_RECONNECT";

const MIN_KEEP_ALIVE: Duration = Duration::from_secs(1);
const MAX_KEEP_ALIVE: Duration = Duration::from_secs(3600);
const MAX_APP_NAME_LEN: usize = 64;

fn config_error(context: &str, err: impl std::fmt::Display) -> ProtocolError {
    ProtocolError::ConfigError(format!("{context}: {err}"))
}

/// Complete client configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub client: ClientConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SessionConfig {
    /// Read and parse a TOML file; missing sections fall back to defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| config_error(&format!("Cannot read config file {}", path.display()), e))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| config_error("Invalid TOML config", e))
    }

    /// Defaults overridden by `WA_SESSION_URL`, `WA_SESSION_KEEP_ALIVE_MS`
    /// and `WA_SESSION_RECONNECT`
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var(ENV_URL) {
            config.client.url = url;
        }
        if let Ok(raw) = std::env::var(ENV_KEEP_ALIVE_MS) {
            let millis: u64 = raw.trim().parse().map_err(|e| config_error(ENV_KEEP_ALIVE_MS, e))?;
            config.client.keep_alive_interval = Duration::from_millis(millis);
        }
        if let Ok(raw) = std::env::var(ENV_RECONNECT) {
            config.client.reconnect_when_disconnected = parse_flag(&raw)
                .ok_or_else(|| config_error(ENV_RECONNECT, format!("expected a boolean, got '{raw}'")))?;
        }

        Ok(config)
    }

    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Default configuration rendered as TOML
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let rendered = toml::to_string_pretty(self).map_err(|e| config_error("Cannot render config", e))?;
        std::fs::write(path.as_ref(), rendered)
            .map_err(|e| config_error(&format!("Cannot write config file {}", path.as_ref().display()), e))
    }

    /// Every problem found in the client and logging sections
    pub fn validate(&self) -> Vec<String> {
        self.client
            .validate()
            .into_iter()
            .chain(self.logging.validate())
            .collect()
    }

    /// Like [`validate`](Self::validate), folded into one `ConfigError`
    pub fn validate_strict(&self) -> Result<()> {
        match self.validate().as_slice() {
            [] => Ok(()),
            problems => Err(ProtocolError::ConfigError(format!(
                "Invalid session configuration: {}",
                problems.join("; ")
            ))),
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// Session controller configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// `ws://` or `wss://` endpoint
    pub url: String,

    /// Stored as milliseconds
    #[serde(with = "duration_millis")]
    pub keep_alive_interval: Duration,

    /// Whether to reconnect after the server ends an authenticated session
    pub reconnect_when_disconnected: bool,

    /// Disconnect kinds that never trigger a reconnect
    pub no_reconnect_kinds: Vec<String>,

    /// Consecutive dropped frames tolerated before reconnecting (0 disables)
    pub max_consecutive_integrity_failures: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: String::from(DEFAULT_URL),
            keep_alive_interval: DEFAULT_KEEP_ALIVE_INTERVAL,
            reconnect_when_disconnected: true,
            no_reconnect_kinds: vec![String::from("replaced")],
            max_consecutive_integrity_failures: DEFAULT_MAX_INTEGRITY_FAILURES,
        }
    }
}

impl ClientConfig {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        match self.url.split_once("://") {
            _ if self.url.is_empty() => errors.push("Session URL cannot be empty".to_owned()),
            Some(("ws" | "wss", host)) if !host.is_empty() => {}
            _ => errors.push(format!("Invalid session URL '{}': expected ws:// or wss://", self.url)),
        }

        if self.keep_alive_interval < MIN_KEEP_ALIVE {
            errors.push(format!("Keep-alive interval too short (minimum: {MIN_KEEP_ALIVE:?})"));
        } else if self.keep_alive_interval > MAX_KEEP_ALIVE {
            errors.push(format!("Keep-alive interval too long (maximum: {MAX_KEEP_ALIVE:?})"));
        }

        if self.no_reconnect_kinds.iter().any(String::is_empty) {
            errors.push("no_reconnect_kinds contains an empty kind".to_owned());
        }

        errors
    }

    /// Reconnect policy derived from this configuration.
    ///
    /// Reconnects when enabled and the disconnect kind is not excluded.
    pub fn reconnect_policy(&self) -> Arc<dyn ReconnectPolicy> {
        let enabled = self.reconnect_when_disconnected;
        let excluded = self.no_reconnect_kinds.clone();
        Arc::new(move |kind: &str| enabled && !excluded.iter().any(|k| k == kind))
    }
}

/// Tracing subscriber settings, consumed by [`crate::utils::logging::init_logging`]
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Name reported alongside log records
    pub app_name: String,

    /// Maximum level, overridden by `RUST_LOG` when set
    #[serde(with = "level_name")]
    pub log_level: Level,

    pub log_to_console: bool,

    pub log_to_file: bool,

    /// Required when `log_to_file` is set
    pub log_file_path: Option<String>,

    /// One JSON object per record instead of plain text
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("wa-session"),
            log_level: Level::INFO,
            log_to_console: true,
            log_to_file: false,
            log_file_path: None,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        match self.app_name.len() {
            0 => errors.push("Logging app_name cannot be empty".to_owned()),
            len if len > MAX_APP_NAME_LEN => errors.push(format!(
                "Logging app_name is too long ({len} > {MAX_APP_NAME_LEN})"
            )),
            _ => {}
        }

        match (&self.log_file_path, self.log_to_file) {
            (None, true) => errors.push("log_file_path is required when log_to_file is set".to_owned()),
            (Some(path), true) => {
                let dir = Path::new(path).parent().filter(|dir| !dir.as_os_str().is_empty());
                if let Some(dir) = dir.filter(|dir| !dir.is_dir()) {
                    errors.push(format!("Log directory {} does not exist", dir.display()));
                }
            }
            _ => {}
        }

        if !(self.log_to_console || self.log_to_file) {
            errors.push("Logging needs at least one output (console or file)".to_owned());
        }

        errors
    }
}

/// Durations are written as integer milliseconds
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Levels are written lowercase ("info", "debug", ...)
mod level_name {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use tracing::Level;

    pub fn serialize<S: Serializer>(level: &Level, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&level.as_str().to_ascii_lowercase())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Level, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse()
            .map_err(|_| D::Error::custom(format!("unknown log level '{name}'")))
    }
}
