//! WAQI air-quality adapter.

use serde_json::{json, Value};

use super::UpstreamClient;
use crate::error::Result;

impl UpstreamClient {
    /// Station AQI and PM2.5 for the nearest station to a coordinate pair.
    pub async fn air_quality(&self, token: &str, lat: f64, lon: f64) -> Result<Value> {
        let url = format!(
            "{}/feed/geo:{};{}/?token={}",
            self.config().waqi_base_url.trim_end_matches('/'),
            lat,
            lon,
            urlencoding::encode(token),
        );

        let data = self.get_json(&url).await?;
        let station = data.get("data").cloned().unwrap_or(Value::Null);

        Ok(json!({
            "pm25": station.pointer("/iaqi/pm25/v"),
            "aqi": station.get("aqi"),
        }))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    #[test]
    fn extracts_pm25_via_pointer() {
        let data = json!({"data": {"aqi": 58, "iaqi": {"pm25": {"v": 17}}}});
        let station = data.get("data").cloned().unwrap();
        assert_eq!(station.pointer("/iaqi/pm25/v"), Some(&json!(17)));
    }
}
