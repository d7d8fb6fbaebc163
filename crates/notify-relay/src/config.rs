use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

use tokio::fs;

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::aggregator::DEFAULT_MERGE_INTERVAL;
use crate::inbox::DEFAULT_CAPACITY;
use crate::sink::{TelegramSink, TelegramSinkConfig};

// ============================================================================
// Config (root)
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub relay: RelayConfig,
}

impl Config {
    /// Load the YAML config file. A missing file yields defaults.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ConfigError::Io(e)),
        };
        Ok(serde_saphyr::from_str(&contents)?)
    }

    /// Overlay environment variables on top of file values.
    ///
    /// `lookup` is usually `|key| std::env::var(key).ok()`. Empty values are
    /// treated as unset, except `MERGE_INTERVAL` where empty means the default.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(token) = get("TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = Some(token);
        }
        if let Some(chat_id) = get("TELEGRAM_CHAT_ID") {
            self.telegram.chat_id = Some(chat_id);
        }
        if let Some(api_url) = get("TELEGRAM_API_URL") {
            self.telegram.api_url = api_url;
        }
        if let Some(interval) = lookup("MERGE_INTERVAL") {
            self.relay.merge_interval = interval;
        }
        if let Some(host) = get("HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("PORT") {
            self.server.port = parse_setting("PORT", &port)?;
        }
        if let Some(capacity) = get("INBOX_CAPACITY") {
            self.relay.inbox_capacity = parse_setting("INBOX_CAPACITY", &capacity)?;
        }

        Ok(())
    }

    /// Check the settings the relay cannot start without.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.telegram.bot_token.is_none() {
            return Err(ConfigError::MissingSetting("TELEGRAM_BOT_TOKEN"));
        }
        if self.telegram.chat_id.is_none() {
            return Err(ConfigError::MissingSetting("TELEGRAM_CHAT_ID"));
        }
        if self.relay.inbox_capacity == 0 {
            return Err(ConfigError::InvalidSetting {
                key: "INBOX_CAPACITY",
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_setting<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidSetting {
        key,
        value: value.to_string(),
    })
}

// ============================================================================
// ServerConfig
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// How long shutdown waits for the aggregator to flush its last window.
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
            shutdown_grace_seconds: default_shutdown_grace(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    10000
}

fn default_request_timeout() -> u64 {
    30
}

fn default_shutdown_grace() -> u64 {
    5
}

// ============================================================================
// TelegramConfig
// ============================================================================

#[derive(Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: Option<String>,
    #[serde(default)]
    pub chat_id: Option<String>,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_delivery_timeout")]
    pub request_timeout_seconds: u64,
}

impl TelegramConfig {
    /// Sink settings, or the first missing credential.
    pub fn sink_config(&self) -> Result<TelegramSinkConfig, ConfigError> {
        let bot_token = self
            .bot_token
            .clone()
            .ok_or(ConfigError::MissingSetting("TELEGRAM_BOT_TOKEN"))?;
        let chat_id = self
            .chat_id
            .clone()
            .ok_or(ConfigError::MissingSetting("TELEGRAM_CHAT_ID"))?;

        Ok(TelegramSinkConfig {
            api_url: self.api_url.clone(),
            bot_token,
            chat_id,
            request_timeout: Duration::from_secs(self.request_timeout_seconds),
        })
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            api_url: default_api_url(),
            request_timeout_seconds: default_delivery_timeout(),
        }
    }
}

// Hand-written so the bot token never ends up in logs.
impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &self.bot_token.as_ref().map(|_| "<redacted>"))
            .field("chat_id", &self.chat_id)
            .field("api_url", &self.api_url)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .finish()
    }
}

fn default_api_url() -> String {
    TelegramSink::DEFAULT_API_URL.to_string()
}

fn default_delivery_timeout() -> u64 {
    10
}

// ============================================================================
// RelayConfig
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RelayConfig {
    /// Window length as a duration string (`1s`, `500ms`, `1m30s`).
    #[serde(default = "default_merge_interval")]
    pub merge_interval: String,
    #[serde(default = "default_inbox_capacity")]
    pub inbox_capacity: usize,
}

impl RelayConfig {
    /// Parsed window length. Empty or unparsable values fall back to one second.
    pub fn merge_interval(&self) -> Duration {
        parse_merge_interval(&self.merge_interval)
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            merge_interval: default_merge_interval(),
            inbox_capacity: default_inbox_capacity(),
        }
    }
}

fn default_merge_interval() -> String {
    "1s".to_string()
}

fn default_inbox_capacity() -> usize {
    DEFAULT_CAPACITY
}

pub fn parse_merge_interval(raw: &str) -> Duration {
    let raw = raw.trim();
    if raw.is_empty() {
        return DEFAULT_MERGE_INTERVAL;
    }
    match humantime::parse_duration(raw) {
        Ok(interval) if !interval.is_zero() => interval,
        Ok(_) => {
            warn!(value = raw, "MERGE_INTERVAL is zero, defaulting to 1s");
            DEFAULT_MERGE_INTERVAL
        }
        Err(e) => {
            warn!(value = raw, error = %e, "Invalid MERGE_INTERVAL, defaulting to 1s");
            DEFAULT_MERGE_INTERVAL
        }
    }
}

// ============================================================================
// ConfigError
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_saphyr::Error),

    #[error("{0} must be set")]
    MissingSetting(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    InvalidSetting { key: &'static str, value: String },
}

// ============================================================================
// Tests
// ============================================================================
