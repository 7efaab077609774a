//! OAuth client configuration resolution.
//!
//! One client configuration is active at a time, resolved fresh on each
//! lookup from four tiers in priority order: an in-memory administrative
//! override, process environment variables, the persisted settings
//! document, and finally a `client_secret_*.json` installed-app file
//! discovered in the configured directory. Resolution has no side effects.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::settings::SettingsStore;

const AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const CLIENT_SECRET_PREFIX: &str = "client_secret_";
const DEFAULT_PROJECT: &str = "hebrew-dashboard";

/// Installed-app OAuth client configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default = "default_redirect_uris")]
    pub redirect_uris: Vec<String>,
}

fn default_auth_uri() -> String {
    AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    super::TOKEN_URI.to_string()
}

fn default_redirect_uris() -> Vec<String> {
    vec!["http://localhost".to_string()]
}

impl ClientConfig {
    fn new(client_id: String, client_secret: String, project_id: String) -> Self {
        Self {
            client_id,
            client_secret,
            project_id,
            auth_uri: default_auth_uri(),
            token_uri: default_token_uri(),
            redirect_uris: default_redirect_uris(),
        }
    }

    /// A configuration is usable only with both a client id and a secret.
    pub fn is_usable(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

// client_secret is deliberately absent
impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("client_id", &self.client_id)
            .field("project_id", &self.project_id)
            .finish()
    }
}

/// Which tier produced the active configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialSource {
    Memory,
    Env,
    Config,
    File,
    None,
}

struct Override {
    client_id: String,
    client_secret: String,
    project_id: String,
}

/// Resolver for the active OAuth client configuration.
pub struct CredentialStore {
    override_slot: RwLock<Option<Override>>,
    settings: Arc<SettingsStore>,
    client_secret_dir: PathBuf,
}

impl CredentialStore {
    pub fn new(settings: Arc<SettingsStore>, client_secret_dir: PathBuf) -> Self {
        Self {
            override_slot: RwLock::new(None),
            settings,
            client_secret_dir,
        }
    }

    /// Resolve the active client configuration; first usable tier wins.
    pub fn resolve(&self) -> Option<ClientConfig> {
        if let Some(config) = self.from_override() {
            return Some(config);
        }
        if let Some(config) = Self::from_env() {
            return Some(config);
        }
        if let Some(config) = self.from_settings() {
            return Some(config);
        }
        self.from_secret_file()
    }

    /// Report which tier currently wins, without touching the override.
    pub fn source(&self) -> CredentialSource {
        if self.from_override().is_some() {
            CredentialSource::Memory
        } else if Self::from_env().is_some() {
            CredentialSource::Env
        } else if self.from_settings().is_some() {
            CredentialSource::Config
        } else if self.find_client_secret_file().is_some() {
            CredentialSource::File
        } else {
            CredentialSource::None
        }
    }

    /// Install an in-memory override. Readers observe either the whole
    /// override or none of it.
    pub fn set_override(&self, client_id: &str, client_secret: &str, project_id: Option<&str>) {
        let project_id = project_id
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .or_else(|| std::env::var("GOOGLE_PROJECT_ID").ok())
            .unwrap_or_else(|| DEFAULT_PROJECT.to_string());

        let mut slot = self.override_slot.write();
        *slot = Some(Override {
            client_id: client_id.trim().to_string(),
            client_secret: client_secret.trim().to_string(),
            project_id,
        });
        debug!("Installed in-memory OAuth client override");
    }

    pub fn clear_override(&self) {
        *self.override_slot.write() = None;
    }

    fn from_override(&self) -> Option<ClientConfig> {
        let slot = self.override_slot.read();
        let ov = slot.as_ref()?;
        if ov.client_id.is_empty() || ov.client_secret.is_empty() {
            return None;
        }
        Some(ClientConfig::new(
            ov.client_id.clone(),
            ov.client_secret.clone(),
            ov.project_id.clone(),
        ))
    }

    fn from_env() -> Option<ClientConfig> {
        let client_id = std::env::var("GOOGLE_CLIENT_ID").ok()?;
        let client_secret = std::env::var("GOOGLE_CLIENT_SECRET").ok()?;
        if client_id.is_empty() || client_secret.is_empty() {
            return None;
        }
        let project_id = std::env::var("GOOGLE_PROJECT_ID")
            .ok()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_PROJECT.to_string());
        Some(ClientConfig::new(client_id, client_secret, project_id))
    }

    fn from_settings(&self) -> Option<ClientConfig> {
        let settings = self.settings.load();
        if settings.google_client_id.is_empty() || settings.google_client_secret.is_empty() {
            return None;
        }
        let project_id = if settings.google_project_id.is_empty() {
            DEFAULT_PROJECT.to_string()
        } else {
            settings.google_project_id
        };
        Some(ClientConfig::new(
            settings.google_client_id,
            settings.google_client_secret,
            project_id,
        ))
    }

    fn from_secret_file(&self) -> Option<ClientConfig> {
        let path = self.find_client_secret_file()?;
        let raw = fs::read_to_string(&path).ok()?;
        let document: serde_json::Value = serde_json::from_str(&raw).ok()?;
        let config: ClientConfig =
            serde_json::from_value(document.get("installed")?.clone()).ok()?;
        config.is_usable().then_some(config)
    }

    /// Locate a `client_secret_*.json` file in the configured directory.
    pub fn find_client_secret_file(&self) -> Option<PathBuf> {
        let entries = fs::read_dir(&self.client_secret_dir).ok()?;
        for entry in entries.flatten() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with(CLIENT_SECRET_PREFIX) && name.ends_with(".json") {
                return Some(entry.path());
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store_in(dir: &std::path::Path) -> CredentialStore {
        let settings = Arc::new(SettingsStore::new(dir.join("config.json")));
        CredentialStore::new(settings, dir.to_path_buf())
    }

    #[test]
    fn override_is_all_or_nothing() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        assert!(store.from_override().is_none());

        store.set_override("id-1", "secret-1", Some("proj"));
        let config = store.from_override().unwrap();
        assert_eq!(config.client_id, "id-1");
        assert_eq!(config.project_id, "proj");

        store.clear_override();
        assert!(store.from_override().is_none());
    }

    #[test]
    fn settings_tier_requires_both_fields() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());

        store
            .settings
            .update(|s| s.google_client_id = "id-only".to_string())
            .unwrap();
        assert!(store.from_settings().is_none());

        store
            .settings
            .update(|s| s.google_client_secret = "secret".to_string())
            .unwrap();
        let config = store.from_settings().unwrap();
        assert_eq!(config.client_id, "id-only");
        assert_eq!(config.project_id, DEFAULT_PROJECT);
    }

    #[test]
    fn discovers_client_secret_file() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        assert!(store.find_client_secret_file().is_none());

        let body = serde_json::json!({
            "installed": {
                "client_id": "file-id",
                "client_secret": "file-secret",
                "project_id": "file-project",
                "auth_uri": AUTH_URI,
                "token_uri": crate::oauth::TOKEN_URI,
                "redirect_uris": ["http://localhost"]
            }
        });
        std::fs::write(
            dir.path().join("client_secret_123.json"),
            body.to_string(),
        )
        .unwrap();

        let config = store.from_secret_file().unwrap();
        assert_eq!(config.client_id, "file-id");
        assert_eq!(store.source(), CredentialSource::File);
    }
}
