//! Configuration data structures for the dashboard server.
//!
//! This module defines the schema for startup settings: server binding,
//! storage locations, logging, and the upstream service endpoints. The
//! upstream base URLs are configurable so tests can point the adapters at
//! a local mock server.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The root configuration object for the application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Display title for the dashboard.
    #[serde(default = "default_title")]
    pub title: String,

    /// HTTP server settings (host, port).
    #[serde(default)]
    pub server: ServerConfig,

    /// Filesystem locations for tokens and persisted settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging and observability settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Upstream service endpoints and network behavior.
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

/// Settings for the built-in HTTP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The IP address or hostname the server should bind to.
    /// Default: `127.0.0.1`
    #[serde(default = "default_host")]
    pub host: String,

    /// The port number the server should listen on.
    /// Default: `5000`
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Filesystem layout for persisted state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding per-account token files and `config.json`.
    /// Default: `~/.luach`
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Directory searched for a `client_secret_*.json` installed-app file.
    /// Default: the working directory.
    #[serde(default = "default_client_secret_dir")]
    pub client_secret_dir: PathBuf,
}

impl StorageConfig {
    /// Directory for per-account OAuth token files.
    pub fn tokens_dir(&self) -> PathBuf {
        self.data_dir.join("tokens")
    }

    /// Path of the runtime-mutable settings document.
    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join("config.json")
    }
}

/// Settings for application logging and output format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum log level (`trace`, `debug`, `info`, `warn`, `error`).
    /// Default: `info`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format for logs (`pretty`, `json`, `compact`).
    /// Default: `pretty`
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Upstream service endpoints.
///
/// Base URLs carry no trailing slash; adapters append their paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Gmail REST API base.
    #[serde(default = "default_gmail_base_url")]
    pub gmail_base_url: String,

    /// Google Calendar REST API base.
    #[serde(default = "default_calendar_base_url")]
    pub calendar_base_url: String,

    /// Open-Meteo forecast API base (no key required).
    #[serde(default = "default_open_meteo_base_url")]
    pub open_meteo_base_url: String,

    /// WAQI air-quality API base.
    #[serde(default = "default_waqi_base_url")]
    pub waqi_base_url: String,

    /// Hebcal calendar/zmanim API base.
    #[serde(default = "default_hebcal_base_url")]
    pub hebcal_base_url: String,

    /// Google News RSS base.
    #[serde(default = "default_news_base_url")]
    pub news_base_url: String,

    /// Red-Alert history feed URL. Empty disables the alert endpoints.
    /// Default: the `RED_ALERT_HISTORY_URL` environment variable.
    #[serde(default = "default_alert_history_url")]
    pub alert_history_url: String,

    /// Per-call network timeout in seconds.
    /// Default: `10`
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// User-Agent header sent to keyless upstreams.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
            upstream: UpstreamConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            client_secret_dir: default_client_secret_dir(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            gmail_base_url: default_gmail_base_url(),
            calendar_base_url: default_calendar_base_url(),
            open_meteo_base_url: default_open_meteo_base_url(),
            waqi_base_url: default_waqi_base_url(),
            hebcal_base_url: default_hebcal_base_url(),
            news_base_url: default_news_base_url(),
            alert_history_url: default_alert_history_url(),
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

// Helper functions for serde defaults and shared constants

fn default_title() -> String {
    std::env::var("APP_TITLE").unwrap_or_else(|_| "Hebrew Dashboard".to_string())
}

fn default_host() -> String {
    std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string())
}

fn default_port() -> u16 {
    std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(5000)
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".luach")
}

fn default_client_secret_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_log_level() -> String {
    match std::env::var("DEBUG").ok().as_deref() {
        Some("0") | Some("false") | Some("") | None => "info".to_string(),
        Some(_) => "debug".to_string(),
    }
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_gmail_base_url() -> String {
    "https://gmail.googleapis.com/gmail/v1".to_string()
}

fn default_calendar_base_url() -> String {
    "https://www.googleapis.com/calendar/v3".to_string()
}

fn default_open_meteo_base_url() -> String {
    "https://api.open-meteo.com".to_string()
}

fn default_waqi_base_url() -> String {
    "https://api.waqi.info".to_string()
}

fn default_hebcal_base_url() -> String {
    "https://www.hebcal.com".to_string()
}

fn default_news_base_url() -> String {
    "https://news.google.com".to_string()
}

fn default_alert_history_url() -> String {
    std::env::var("RED_ALERT_HISTORY_URL").unwrap_or_default()
}

fn default_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    "DailyDashboard/1.0".to_string()
}
