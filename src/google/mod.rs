// Google REST adapters (Gmail, Calendar)

pub mod calendar;
pub mod gmail;

pub use calendar::SimpleEvent;
pub use gmail::{EmailDetail, EmailSummary};

use crate::config::UpstreamConfig;
use crate::error::{DashboardError, Result};
use crate::oauth::AccountToken;
use serde_json::Value;

/// Client for the Google REST APIs the dashboard reads from.
///
/// Holds the shared pooled HTTP client; every call authenticates with the
/// access token of the account it is reading, so one client serves all
/// loaded accounts.
pub struct GoogleClient {
    http: reqwest::Client,
    gmail_base: String,
    calendar_base: String,
}

impl GoogleClient {
    pub fn new(http: reqwest::Client, config: &UpstreamConfig) -> Self {
        Self {
            http,
            gmail_base: config.gmail_base_url.trim_end_matches('/').to_string(),
            calendar_base: config.calendar_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub(crate) fn gmail_url(&self, path: &str) -> String {
        format!("{}{}", self.gmail_base, path)
    }

    pub(crate) fn calendar_url(&self, path: &str) -> String {
        format!("{}{}", self.calendar_base, path)
    }

    /// Authenticated GET returning the response body as JSON.
    pub(crate) async fn get_json(
        &self,
        url: &str,
        token: &AccountToken,
        query: &[(&str, &str)],
    ) -> Result<Value> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&token.token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DashboardError::Upstream(format!(
                "{} returned HTTP {}",
                url, status
            )));
        }

        Ok(response.json().await?)
    }
}
