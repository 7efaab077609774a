//! Runtime-mutable dashboard settings.
//!
//! A single flat JSON document (`config.json` under the data directory)
//! merged over environment-derived defaults on every read. Last writer
//! wins; there is no versioning. A missing or unreadable file is treated
//! as "nothing persisted yet".

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::PathBuf;
use tracing::warn;

use crate::error::Result;

/// Flat key/value settings document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Email of the account labeled "personal".
    #[serde(default)]
    pub personal: String,

    /// Email of the account labeled "business".
    #[serde(default)]
    pub business: String,

    /// WAQI air-quality API token.
    #[serde(default)]
    pub waqi_token: String,

    #[serde(default)]
    pub google_client_id: String,

    #[serde(default)]
    pub google_client_secret: String,

    #[serde(default)]
    pub google_project_id: String,

    /// Rendering language for the Hebrew date (`english` or `hebrew`).
    #[serde(default = "default_hebrew_language")]
    pub hebrew_date_language: String,
}

fn default_hebrew_language() -> String {
    "english".to_string()
}

impl Settings {
    /// Defaults taken from the process environment. Every field is optional.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).unwrap_or_default();
        Self {
            personal: var("PERSONAL_EMAIL"),
            business: var("BUSINESS_EMAIL"),
            waqi_token: var("WAQI_API_KEY"),
            google_client_id: var("GOOGLE_CLIENT_ID"),
            google_client_secret: var("GOOGLE_CLIENT_SECRET"),
            google_project_id: var("GOOGLE_PROJECT_ID"),
            hebrew_date_language: std::env::var("HEBREW_DATE_LANGUAGE")
                .unwrap_or_else(|_| default_hebrew_language()),
        }
    }
}

/// File-backed settings store.
///
/// The lock serializes read-modify-write cycles against the settings file;
/// it is independent from the credential-override and token-directory locks
/// and never held across either.
pub struct SettingsStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    /// Read the persisted document and merge it over environment defaults.
    /// Keys present in the file win; everything else falls back to the
    /// environment.
    pub fn load(&self) -> Settings {
        let defaults = Settings::from_env();
        let _guard = self.lock.lock();

        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return defaults,
        };

        let overlay: Map<String, Value> = match serde_json::from_str(&raw) {
            Ok(overlay) => overlay,
            Err(e) => {
                warn!("Ignoring malformed settings file {}: {}", self.path.display(), e);
                return defaults;
            }
        };

        let mut merged = match serde_json::to_value(&defaults) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        for (key, value) in overlay {
            merged.insert(key, value);
        }

        serde_json::from_value(Value::Object(merged)).unwrap_or(defaults)
    }

    /// Persist the whole document, replacing any previous contents.
    pub fn save(&self, settings: &Settings) -> Result<()> {
        let _guard = self.lock.lock();
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    /// Read-modify-write under the settings lock.
    pub fn update<F>(&self, mutate: F) -> Result<Settings>
    where
        F: FnOnce(&mut Settings),
    {
        let mut settings = self.load();
        mutate(&mut settings);
        self.save(&settings)?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("config.json"));

        let settings = store.load();
        assert_eq!(settings.hebrew_date_language, "english");
    }

    #[test]
    fn file_keys_override_defaults_and_survive_partial_updates() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("config.json"));

        store
            .update(|s| {
                s.personal = "me@example.com".to_string();
                s.waqi_token = "tok-1".to_string();
            })
            .unwrap();

        // Updating one field leaves the others as persisted.
        store.update(|s| s.waqi_token = "tok-2".to_string()).unwrap();

        let settings = store.load();
        assert_eq!(settings.personal, "me@example.com");
        assert_eq!(settings.waqi_token, "tok-2");
    }

    #[test]
    fn malformed_file_is_treated_as_absent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();

        let store = SettingsStore::new(path);
        let settings = store.load();
        assert_eq!(settings.hebrew_date_language, "english");
    }
}
