// Keyless/token upstream adapters (weather, news, air quality, Hebcal, alerts)

pub mod alerts;
pub mod aqi;
pub mod hebcal;
pub mod news;
pub mod weather;

use crate::config::UpstreamConfig;
use crate::error::{DashboardError, Result};
use serde_json::Value;

/// Jerusalem, the default dashboard location.
pub const DEFAULT_LAT: f64 = 31.7683;
pub const DEFAULT_LON: f64 = 35.2137;

/// Client for the non-Google upstream services.
///
/// Each adapter module implements its calls on this client. Adapters
/// return `Err` on any network, HTTP, or shape failure; handlers flatten
/// those to the empty payloads the dashboard serves.
pub struct UpstreamClient {
    http: reqwest::Client,
    config: UpstreamConfig,
}

impl UpstreamClient {
    pub fn new(http: reqwest::Client, config: UpstreamConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &UpstreamConfig {
        &self.config
    }

    /// Whether an alert-history feed is configured at all.
    pub fn has_alert_feed(&self) -> bool {
        !self.config.alert_history_url.is_empty()
    }

    pub(crate) async fn get_json(&self, url: &str) -> Result<Value> {
        let response = self
            .http
            .get(url)
            .header("User-Agent", &self.config.user_agent)
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

    pub(crate) async fn get_text(&self, url: &str) -> Result<String> {
        let response = self
            .http
            .get(url)
            .header("User-Agent", &self.config.user_agent)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DashboardError::Upstream(format!(
                "{} returned HTTP {}",
                url, status
            )));
        }

        Ok(response.text().await?)
    }
}
