//! Gmail read-only adapter: identity lookup, inbox listing, message detail.

use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use chrono::DateTime;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

use super::GoogleClient;
use crate::error::{DashboardError, Result};
use crate::oauth::AccountToken;

/// Inbox listing entry.
#[derive(Debug, Clone, Serialize)]
pub struct EmailSummary {
    #[serde(rename = "from")]
    pub sender: String,
    pub subject: String,
    pub received: Option<String>,
    pub id: String,
    pub account: Option<String>,
    pub account_type: String,
}

/// Full message payload for the detail view.
#[derive(Debug, Clone, Serialize)]
pub struct EmailDetail {
    pub id: String,
    pub subject: Option<String>,
    #[serde(rename = "from")]
    pub sender: Option<String>,
    pub to: Option<String>,
    pub date: Option<String>,
    pub snippet: String,
}

const DETAIL_SNIPPET_LIMIT: usize = 4000;

impl GoogleClient {
    /// The account's own email address, via the Gmail profile endpoint.
    /// This is the identity lookup the account resolver keys accounts by.
    pub async fn profile_email(&self, token: &AccountToken) -> Result<String> {
        let url = self.gmail_url("/users/me/profile");
        let profile = self.get_json(&url, token, &[]).await?;
        profile
            .get("emailAddress")
            .and_then(|v| v.as_str())
            .map(|email| email.to_lowercase())
            .ok_or_else(|| {
                DashboardError::Upstream("Gmail profile response missing emailAddress".to_string())
            })
    }

    /// Latest `n` inbox messages with From/Subject/Date metadata.
    ///
    /// `business_email` labels messages from that account as Business;
    /// everything else is Personal.
    pub async fn latest_messages(
        &self,
        token: &AccountToken,
        n: usize,
        business_email: &str,
    ) -> Result<Vec<EmailSummary>> {
        let account_email = self.profile_email(token).await.ok();

        let list_url = self.gmail_url("/users/me/messages");
        let max_results = n.to_string();
        let listing = self
            .get_json(
                &list_url,
                token,
                &[("labelIds", "INBOX"), ("maxResults", &max_results)],
            )
            .await?;

        let ids: Vec<String> = listing
            .get("messages")
            .and_then(|v| v.as_array())
            .map(|messages| {
                messages
                    .iter()
                    .filter_map(|m| m.get("id").and_then(|v| v.as_str()))
                    .map(|id| id.to_string())
                    .collect()
            })
            .unwrap_or_default();

        let account_type = match &account_email {
            Some(email) if !business_email.is_empty() && email == &business_email.to_lowercase() => {
                "Business"
            }
            _ => "Personal",
        };

        let mut items = Vec::with_capacity(ids.len());
        for id in ids {
            let url = self.gmail_url(&format!("/users/me/messages/{}", id));
            let message = match self
                .get_json(
                    &url,
                    token,
                    &[
                        ("format", "metadata"),
                        ("metadataHeaders", "From"),
                        ("metadataHeaders", "Subject"),
                        ("metadataHeaders", "Date"),
                    ],
                )
                .await
            {
                Ok(message) => message,
                Err(e) => {
                    debug!("Skipping message {}: {}", id, e);
                    continue;
                }
            };

            let headers = header_map(&message);
            let date_header = headers.get("date").cloned();
            let received = date_header.as_deref().map(|raw| {
                DateTime::parse_from_rfc2822(raw)
                    .map(|dt| dt.to_rfc3339())
                    .unwrap_or_else(|_| raw.to_string())
            });

            items.push(EmailSummary {
                sender: headers.get("from").cloned().unwrap_or_default(),
                subject: headers
                    .get("subject")
                    .cloned()
                    .unwrap_or_else(|| "(no subject)".to_string()),
                received,
                id,
                account: account_email.clone(),
                account_type: account_type.to_string(),
            });
        }

        Ok(items)
    }

    /// Full message: headers plus the first decodable text body part.
    pub async fn message_detail(&self, token: &AccountToken, id: &str) -> Result<EmailDetail> {
        let url = self.gmail_url(&format!("/users/me/messages/{}", id));
        let message = self.get_json(&url, token, &[("format", "full")]).await?;

        let headers = header_map(&message);
        let body_text = message
            .get("payload")
            .and_then(decode_text_part)
            .or_else(|| {
                message
                    .get("snippet")
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string())
            })
            .unwrap_or_default();

        let snippet: String = body_text.chars().take(DETAIL_SNIPPET_LIMIT).collect();

        Ok(EmailDetail {
            id: id.to_string(),
            subject: headers.get("subject").cloned(),
            sender: headers.get("from").cloned(),
            to: headers.get("to").cloned(),
            date: headers.get("date").cloned(),
            snippet,
        })
    }
}

/// Lowercased header name → value map from a message payload.
fn header_map(message: &Value) -> HashMap<String, String> {
    message
        .get("payload")
        .and_then(|p| p.get("headers"))
        .and_then(|h| h.as_array())
        .map(|headers| {
            headers
                .iter()
                .filter_map(|h| {
                    let name = h.get("name")?.as_str()?.to_lowercase();
                    let value = h.get("value")?.as_str()?.to_string();
                    Some((name, value))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Depth-first walk of MIME parts for the first text/plain or text/html
/// body, base64url-decoded.
fn decode_text_part(part: &Value) -> Option<String> {
    let mime = part.get("mimeType").and_then(|v| v.as_str()).unwrap_or("");
    if mime == "text/plain" || mime == "text/html" {
        if let Some(data) = part
            .get("body")
            .and_then(|b| b.get("data"))
            .and_then(|d| d.as_str())
        {
            if let Some(text) = decode_base64url(data) {
                return Some(text);
            }
        }
    }

    part.get("parts")
        .and_then(|parts| parts.as_array())
        .and_then(|parts| parts.iter().find_map(decode_text_part))
}

fn decode_base64url(data: &str) -> Option<String> {
    let bytes = URL_SAFE
        .decode(data)
        .or_else(|_| URL_SAFE_NO_PAD.decode(data))
        .ok()?;
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_nested_text_part() {
        let encoded = URL_SAFE_NO_PAD.encode("hello body");
        let payload = json!({
            "mimeType": "multipart/alternative",
            "parts": [
                {"mimeType": "image/png", "body": {"data": "ignored"}},
                {"mimeType": "text/plain", "body": {"data": encoded}}
            ]
        });

        assert_eq!(decode_text_part(&payload), Some("hello body".to_string()));
    }

    #[test]
    fn missing_text_part_yields_none() {
        let payload = json!({"mimeType": "image/png", "body": {}});
        assert_eq!(decode_text_part(&payload), None);
    }

    #[test]
    fn header_map_lowercases_names() {
        let message = json!({
            "payload": {"headers": [
                {"name": "Subject", "value": "Hi"},
                {"name": "From", "value": "a@b.com"}
            ]}
        });
        let headers = header_map(&message);
        assert_eq!(headers.get("subject"), Some(&"Hi".to_string()));
        assert_eq!(headers.get("from"), Some(&"a@b.com".to_string()));
    }
}
