//! Persisted per-account token storage.
//!
//! One JSON file per account under the tokens directory. Loading walks the
//! directory, refreshes any expired-but-refreshable token against its token
//! endpoint, persists the refreshed document back to the same file, and
//! drops credentials that cannot be made valid. The whole load/refresh/
//! persist cycle is serialized by a single async lock so concurrent callers
//! never interleave file writes.

use chrono::{Duration, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

use super::{token_file_name, AccountToken};
use crate::error::{DashboardError, Result};
use crate::utils::logging::sanitize;
use crate::utils::retry;

pub struct TokenVault {
    dir: PathBuf,
    http: reqwest::Client,
    lock: Mutex<()>,
}

impl TokenVault {
    pub fn new(dir: PathBuf, http: reqwest::Client) -> Self {
        if let Err(e) = fs::create_dir_all(&dir) {
            warn!("Could not create tokens directory {}: {}", dir.display(), e);
        }
        Self {
            dir,
            http,
            lock: Mutex::new(()),
        }
    }

    /// Load every persisted token, refreshing expired ones in place.
    ///
    /// A credential that fails to parse or to refresh is skipped; the rest
    /// of the batch is unaffected. Only valid credentials are returned.
    pub async fn load_all(&self) -> Vec<AccountToken> {
        let _guard = self.lock.lock().await;

        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };

        let mut tokens = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let token: AccountToken = match fs::read_to_string(&path)
                .ok()
                .and_then(|raw| serde_json::from_str(&raw).ok())
            {
                Some(token) => token,
                None => {
                    warn!("Skipping unreadable token file {}", path.display());
                    continue;
                }
            };

            let token = if !token.is_valid() && token.can_refresh() {
                match self.refresh(&token).await {
                    Ok(refreshed) => {
                        if let Err(e) = Self::write_token(&path, &refreshed) {
                            error!("Failed to persist refreshed token {}: {}", path.display(), e);
                        }
                        refreshed
                    }
                    Err(e) => {
                        warn!("Failed to refresh token {}: {}", path.display(), e);
                        continue;
                    }
                }
            } else {
                token
            };

            if token.is_valid() {
                tokens.push(token);
            }
        }
        tokens
    }

    /// Re-validate a single credential, refreshing and persisting it under
    /// the account's token file when expired. `None` if still invalid.
    pub async fn revalidate(&self, token: AccountToken, email: &str) -> Option<AccountToken> {
        if token.is_valid() {
            return Some(token);
        }
        if !token.can_refresh() {
            return None;
        }
        match self.refresh(&token).await {
            Ok(refreshed) => {
                if let Err(e) = self.save(&refreshed, email).await {
                    warn!("Failed to persist refreshed token for {}: {}", email, e);
                }
                refreshed.is_valid().then_some(refreshed)
            }
            Err(e) => {
                warn!("Failed to refresh token for {}: {}", email, e);
                None
            }
        }
    }

    /// Persist a token under the filename derived from the account email.
    pub async fn save(&self, token: &AccountToken, email_hint: &str) -> Result<PathBuf> {
        let _guard = self.lock.lock().await;
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(token_file_name(email_hint));
        Self::write_token(&path, token)?;
        debug!("Persisted token file {}", path.display());
        Ok(path)
    }

    /// Negotiate a new access token at the stored token endpoint.
    async fn refresh(&self, token: &AccountToken) -> Result<AccountToken> {
        let params = [
            ("client_id", token.client_id.as_str()),
            ("client_secret", token.client_secret.as_str()),
            ("refresh_token", token.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let request_logic = || async {
            let response = self
                .http
                .post(&token.token_uri)
                .form(&params)
                .send()
                .await
                .map_err(|e| (500, format!("token endpoint network error: {}", e)))?;

            let status = response.status();
            if !status.is_success() {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown".to_string());
                return Err((status.as_u16(), error_text));
            }

            Ok(response)
        };

        let response = retry::with_retry("Token refresh", request_logic)
            .await
            .map_err(|(status, body)| {
                DashboardError::TokenRefresh(format!("HTTP {}: {}", status, sanitize(&body)))
            })?;

        let token_data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| DashboardError::TokenRefresh(format!("Malformed JSON response: {}", e)))?;

        let new_access_token = token_data
            .get("access_token")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                DashboardError::TokenRefresh("Missing access_token in response".to_string())
            })?
            .to_string();

        let expires_in = token_data
            .get("expires_in")
            .and_then(|v| v.as_i64())
            .unwrap_or(3600);

        debug!("Refreshed token expires in {} seconds", expires_in);

        Ok(AccountToken {
            token: new_access_token,
            refresh_token: token.refresh_token.clone(),
            token_uri: token.token_uri.clone(),
            client_id: token.client_id.clone(),
            client_secret: token.client_secret.clone(),
            scopes: token.scopes.clone(),
            expiry: (Utc::now() + Duration::seconds(expires_in)).to_rfc3339(),
        })
    }

    fn write_token(path: &Path, token: &AccountToken) -> Result<()> {
        let json = serde_json::to_string_pretty(token)?;
        fs::write(path, json)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }
}
