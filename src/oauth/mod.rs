// OAuth credential management module

mod store;

pub mod accounts;
pub mod login;
pub mod vault;

pub use store::{ClientConfig, CredentialSource, CredentialStore};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// Scopes requested for every dashboard account.
pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/gmail.readonly",
    "https://www.googleapis.com/auth/calendar.readonly",
    "openid",
    "https://www.googleapis.com/auth/userinfo.email",
];

/// Google token endpoint used when a stored token does not carry its own.
pub const TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Per-account OAuth token in the provider's authorized-user JSON format.
///
/// This matches the document Google client libraries persist: the access
/// token, an optional refresh token, the token endpoint, the client the
/// token was minted for, granted scopes, and an RFC 3339 expiry.
#[derive(Clone, Deserialize, Serialize, Zeroize)]
#[zeroize(drop)]
pub struct AccountToken {
    pub token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    /// RFC 3339 expiry timestamp; empty means non-expiring.
    #[serde(default)]
    pub expiry: String,
}

fn default_token_uri() -> String {
    TOKEN_URI.to_string()
}

// Custom Debug impl that never logs token material
impl std::fmt::Debug for AccountToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountToken")
            .field("token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("token_uri", &self.token_uri)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("scopes", &self.scopes)
            .field("expiry", &self.expiry)
            .finish()
    }
}

impl AccountToken {
    /// Parsed expiry, if the token carries one.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        if self.expiry.is_empty() {
            return None;
        }
        DateTime::parse_from_rfc3339(&self.expiry)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Check if the token is expired or will expire within `buffer_seconds`.
    ///
    /// An empty expiry means non-expiring; an unparseable one is treated as
    /// expired so a refresh rewrites the file with a well-formed timestamp.
    pub fn is_expired(&self, buffer_seconds: i64) -> bool {
        if self.expiry.is_empty() {
            return false;
        }
        match self.expires_at() {
            Some(expires_at) => {
                (expires_at - Utc::now()).num_seconds() < buffer_seconds
            }
            None => true,
        }
    }

    /// A token is usable when it has an access token that has not expired.
    pub fn is_valid(&self) -> bool {
        !self.token.is_empty() && !self.is_expired(0)
    }

    /// Whether an expired token can be refreshed in place.
    pub fn can_refresh(&self) -> bool {
        !self.refresh_token.is_empty() && !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

/// Token filename stem for an account email, with unsafe characters
/// replaced (`me@example.com` → `token_me_example_com`).
pub fn token_file_name(email: &str) -> String {
    let email = if email.is_empty() { "account" } else { email };
    let safe = email.to_lowercase().replace(['@', '.'], "_");
    format!("token_{}.json", safe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn token_expiring_at(expiry: String) -> AccountToken {
        AccountToken {
            token: "ya29.test".to_string(),
            refresh_token: "1//01test".to_string(),
            token_uri: TOKEN_URI.to_string(),
            client_id: "id.apps.googleusercontent.com".to_string(),
            client_secret: "secret".to_string(),
            scopes: SCOPES.iter().map(|s| s.to_string()).collect(),
            expiry,
        }
    }

    #[test]
    fn test_debug_impl_masks_tokens() {
        let token = token_expiring_at("2026-01-01T00:00:00Z".to_string());
        let debug_str = format!("{:?}", token);
        assert!(debug_str.contains("[REDACTED]"));
        assert!(!debug_str.contains("ya29"));
        assert!(!debug_str.contains("1//01"));
        assert!(!debug_str.contains("secret"));
    }

    #[test]
    fn test_expiry_detection() {
        let future = (Utc::now() + Duration::hours(1)).to_rfc3339();
        let token = token_expiring_at(future);

        assert!(!token.is_expired(0));
        assert!(token.is_expired(3700));
        assert!(token.is_valid());

        let past = (Utc::now() - Duration::hours(1)).to_rfc3339();
        let expired = token_expiring_at(past);
        assert!(expired.is_expired(0));
        assert!(!expired.is_valid());
        assert!(expired.can_refresh());
    }

    #[test]
    fn test_empty_expiry_never_expires_and_garbage_does() {
        let mut token = token_expiring_at(String::new());
        assert!(!token.is_expired(0));

        token.expiry = "not-a-date".to_string();
        assert!(token.is_expired(0));
    }

    #[test]
    fn test_token_file_name() {
        assert_eq!(token_file_name("Me@Example.com"), "token_me_example_com.json");
        assert_eq!(token_file_name(""), "token_account.json");
    }
}
