pub mod api;
pub mod discord;
pub mod error;
pub mod logging;
pub mod notification;
pub mod render;
pub mod utils;
pub mod webhook;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::discord::Dispatcher;
use crate::error::{RelayError, Result};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_LOG_LEVEL: &str = "INFO";

/// Env var naming an optional TOML config file.
pub const CONFIG_PATH_VAR: &str = "PATCHY_CONFIG";

/// Optional file layer. Every key may be omitted; the environment wins over
/// anything set here.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct FileConfig {
    pub discord_token: Option<String>,
    pub discord_channel_id: Option<u64>,
    pub github_webhook_secret: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub debug: Option<bool>,
    pub log_level: Option<String>,
    pub log_dir: Option<PathBuf>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            let path = path.display();
            RelayError::ConfigError(format!("Failed to read config file '{}': {}", path, e))
        })?;
        Ok(toml::from_str(&raw)?)
    }
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub discord_token: String,
    pub discord_channel_id: u64,
    pub github_webhook_secret: String,
    pub host: String,
    pub port: u16,
    pub debug: bool,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            discord_token: String::new(),
            discord_channel_id: 0,
            github_webhook_secret: String::new(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            debug: false,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_dir: None,
        }
    }
}

impl RelayConfig {
    /// Layers `file` over the defaults, then `lookup` over both.
    pub fn from_lookup<F>(lookup: F, file: FileConfig) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let discord_channel_id = match lookup("DISCORD_CHANNEL_ID") {
            Some(raw) => raw.trim().parse().unwrap_or(0),
            None => file.discord_channel_id.unwrap_or(0),
        };
        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse().unwrap_or(DEFAULT_PORT),
            None => file.port.unwrap_or(defaults.port),
        };
        let debug = match lookup("DEBUG") {
            Some(raw) => raw.trim().eq_ignore_ascii_case("true"),
            None => file.debug.unwrap_or(defaults.debug),
        };

        Self {
            discord_token: lookup("DISCORD_TOKEN")
                .or(file.discord_token)
                .unwrap_or(defaults.discord_token),
            discord_channel_id,
            github_webhook_secret: lookup("GITHUB_WEBHOOK_SECRET")
                .or(file.github_webhook_secret)
                .unwrap_or(defaults.github_webhook_secret),
            host: lookup("HOST").or(file.host).unwrap_or(defaults.host),
            port,
            debug,
            log_level: lookup("LOG_LEVEL")
                .or(file.log_level)
                .unwrap_or(defaults.log_level),
            log_dir: lookup("LOG_DIR")
                .filter(|dir| !dir.is_empty())
                .map(PathBuf::from)
                .or(file.log_dir),
        }
    }

    /// Reads the optional file named by `PATCHY_CONFIG`, then the process
    /// environment.
    pub fn load() -> Result<Self> {
        let file = match std::env::var(CONFIG_PATH_VAR) {
            Ok(path) if !path.is_empty() => FileConfig::load(Path::new(&path))?,
            _ => FileConfig::default(),
        };
        Ok(Self::from_lookup(|key| std::env::var(key).ok(), file))
    }

    /// Fails with every missing required key listed at once.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.discord_token.is_empty() {
            missing.push("DISCORD_TOKEN");
        }
        if self.discord_channel_id == 0 {
            missing.push("DISCORD_CHANNEL_ID");
        }
        if self.github_webhook_secret.is_empty() {
            missing.push("GITHUB_WEBHOOK_SECRET");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(RelayError::ConfigError(format!(
                "Missing required environment variables: {}",
                missing.join(", ")
            )))
        }
    }

    /// `DEBUG=true` overrides the configured level.
    pub fn effective_log_level(&self) -> &str {
        if self.debug { "DEBUG" } else { &self.log_level }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

pub struct AppState {
    pub config: RelayConfig,
    pub dispatcher: Dispatcher,
    pub start_time: Instant,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: RelayConfig, dispatcher: Dispatcher) -> Self {
        Self {
            config,
            dispatcher,
            start_time: Instant::now(),
            started_at: Utc::now(),
        }
    }
}

pub type SharedState = Arc<AppState>;
