// Configuration module

mod models;

pub use models::*;

use crate::error::{DashboardError, Result};
use config::{Config, Environment, File};
use std::path::PathBuf;

impl AppConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Environment variables (prefix: DASHBOARD__)
    /// 2. Config file (`~/.luach/config.toml`)
    /// 3. Defaults (lowest)
    pub fn load() -> Result<Self> {
        let config = Config::builder()
            // Start with defaults
            .add_source(Config::try_from(&Self::default())?)
            // Load from config file if it exists
            .add_source(File::with_name(&Self::default_config_path()).required(false))
            // Override with environment variables (DASHBOARD__SERVER__PORT etc.)
            .add_source(Environment::with_prefix("DASHBOARD").separator("__"))
            .build()
            .map_err(|e| DashboardError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| DashboardError::Config(e.to_string()))
    }

    fn default_config_path() -> String {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".luach")
            .join("config.toml")
            .to_string_lossy()
            .to_string()
    }
}
