//! Email → credential associations.
//!
//! Built by asking each loaded credential for its own identity via the
//! Gmail profile endpoint and rebuilt wholesale on demand; there are no
//! partial updates. Credentials whose identity lookup fails are skipped.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::vault::TokenVault;
use super::AccountToken;
use crate::google::GoogleClient;

#[derive(Default)]
struct AccountMap {
    emails: Vec<String>,
    by_email: HashMap<String, AccountToken>,
}

pub struct AccountResolver {
    vault: Arc<TokenVault>,
    google: Arc<GoogleClient>,
    map: RwLock<AccountMap>,
}

impl AccountResolver {
    pub fn new(vault: Arc<TokenVault>, google: Arc<GoogleClient>) -> Self {
        Self {
            vault,
            google,
            map: RwLock::new(AccountMap::default()),
        }
    }

    /// Account emails in load order. Serves the cached list unless it is
    /// empty or `force_refresh` is set, in which case the whole map is
    /// rebuilt and swapped in atomically.
    pub async fn list(&self, force_refresh: bool) -> Vec<String> {
        if !force_refresh {
            let map = self.map.read();
            if !map.emails.is_empty() {
                return map.emails.clone();
            }
        }

        let tokens = self.vault.load_all().await;
        let mut emails = Vec::new();
        let mut by_email = HashMap::new();

        for token in tokens {
            match self.google.profile_email(&token).await {
                Ok(email) => {
                    if !by_email.contains_key(&email) {
                        emails.push(email.clone());
                    }
                    by_email.insert(email, token);
                }
                Err(e) => {
                    debug!("Skipping credential with failed identity lookup: {}", e);
                }
            }
        }

        *self.map.write() = AccountMap {
            emails: emails.clone(),
            by_email,
        };
        emails
    }

    /// Credential for one account email, forcing a rebuild when the email
    /// is unknown and revalidating the credential before handing it out.
    pub async fn credential_for(&self, email: &str) -> Option<AccountToken> {
        if email.is_empty() {
            return None;
        }
        let email = email.to_lowercase();

        let cached = { self.map.read().by_email.get(&email).cloned() };
        let token = match cached {
            Some(token) => token,
            None => {
                self.list(true).await;
                self.map.read().by_email.get(&email).cloned()?
            }
        };

        if token.is_valid() {
            return Some(token);
        }

        let refreshed = self.vault.revalidate(token, &email).await?;
        self.map
            .write()
            .by_email
            .insert(email, refreshed.clone());
        Some(refreshed)
    }

    /// All cached credentials, loading accounts first if needed.
    pub async fn all_credentials(&self) -> Vec<AccountToken> {
        self.list(false).await;
        let map = self.map.read();
        map.emails
            .iter()
            .filter_map(|email| map.by_email.get(email).cloned())
            .collect()
    }

    /// Drop the cached associations; the next call rebuilds them.
    pub fn invalidate(&self) {
        *self.map.write() = AccountMap::default();
    }
}
