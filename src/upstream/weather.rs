//! Open-Meteo forecast adapter.
//!
//! One request covers current conditions, the 7-day daily outlook and the
//! hourly series; the response is reshaped into the four blocks the
//! dashboard renders (`current`, `today`, `forecast`, `hourly`).

use chrono::{Local, NaiveDateTime};
use serde_json::{json, Value};

use super::UpstreamClient;
use crate::error::Result;

const CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,apparent_temperature,weather_code,wind_speed_10m,wind_direction_10m,pressure_msl";
const DAILY_FIELDS: &str = "weather_code,temperature_2m_max,temperature_2m_min,sunrise,sunset,uv_index_max,precipitation_sum,wind_speed_10m_max";
const HOURLY_FIELDS: &str = "temperature_2m,relative_humidity_2m,apparent_temperature,weather_code,wind_speed_10m,wind_direction_10m,precipitation";

impl UpstreamClient {
    /// Seven-day forecast for a coordinate pair.
    pub async fn weather_forecast(&self, lat: f64, lon: f64) -> Result<Value> {
        let url = format!(
            "{}/v1/forecast?latitude={}&longitude={}&current={}&daily={}&hourly={}&timezone=auto&forecast_days=7",
            self.config().open_meteo_base_url.trim_end_matches('/'),
            lat,
            lon,
            CURRENT_FIELDS,
            DAILY_FIELDS,
            HOURLY_FIELDS,
        );

        let data = self.get_json(&url).await?;
        Ok(reshape_forecast(&data))
    }
}

/// Reduce the raw Open-Meteo document to the dashboard payload.
fn reshape_forecast(data: &Value) -> Value {
    let current = data.get("current").cloned().unwrap_or(Value::Null);
    let daily = data.get("daily").cloned().unwrap_or(Value::Null);
    let hourly = data.get("hourly").cloned().unwrap_or(Value::Null);

    let current_weather = json!({
        "temp": current.get("temperature_2m"),
        "feels_like": current.get("apparent_temperature"),
        "humidity": current.get("relative_humidity_2m"),
        "code": current.get("weather_code"),
        "wind_speed": current.get("wind_speed_10m"),
        "wind_direction": current.get("wind_direction_10m"),
        "pressure": current.get("pressure_msl"),
    });

    let day_count = series_len(&daily, "time");
    let today = if day_count >= 1 {
        json!({
            "max": series_at(&daily, "temperature_2m_max", 0),
            "min": series_at(&daily, "temperature_2m_min", 0),
            "sunrise": series_at(&daily, "sunrise", 0),
            "sunset": series_at(&daily, "sunset", 0),
            "uv_index": series_at(&daily, "uv_index_max", 0),
            "precipitation": series_at(&daily, "precipitation_sum", 0),
            "wind_speed_max": series_at(&daily, "wind_speed_10m_max", 0),
            "code": series_at(&daily, "weather_code", 0),
        })
    } else {
        Value::Null
    };

    let forecast: Vec<Value> = (0..day_count.min(7))
        .map(|i| {
            json!({
                "date": series_at(&daily, "time", i),
                "max": series_at(&daily, "temperature_2m_max", i),
                "min": series_at(&daily, "temperature_2m_min", i),
                "code": series_at(&daily, "weather_code", i),
                "precipitation": series_at(&daily, "precipitation_sum", i),
                "wind_speed_max": series_at(&daily, "wind_speed_10m_max", i),
            })
        })
        .collect();

    let hour_count = series_len(&hourly, "time");
    let start = current_hour_index(&hourly, hour_count);
    let hourly_forecast: Vec<Value> = (start..(start + 24).min(hour_count))
        .map(|i| {
            json!({
                "time": series_at(&hourly, "time", i),
                "temp": series_at(&hourly, "temperature_2m", i),
                "feels_like": series_at(&hourly, "apparent_temperature", i),
                "humidity": series_at(&hourly, "relative_humidity_2m", i),
                "code": series_at(&hourly, "weather_code", i),
                "wind_speed": series_at(&hourly, "wind_speed_10m", i),
                "precipitation": series_at(&hourly, "precipitation", i),
            })
        })
        .collect();

    json!({
        "current": current_weather,
        "today": today,
        "forecast": forecast,
        "hourly": hourly_forecast,
    })
}

/// Index of the first hourly slot at or after the current local hour.
/// Timestamps are location-local and naive (`timezone=auto`).
fn current_hour_index(hourly: &Value, hour_count: usize) -> usize {
    let now = Local::now().naive_local();
    for i in 0..hour_count.min(25) {
        let slot = match series_at(hourly, "time", i) {
            Value::String(s) => s,
            _ => continue,
        };
        if let Ok(t) = NaiveDateTime::parse_from_str(&slot, "%Y-%m-%dT%H:%M") {
            if t >= now {
                return i;
            }
        }
    }
    0
}

fn series_len(block: &Value, key: &str) -> usize {
    block
        .get(key)
        .and_then(|v| v.as_array())
        .map(|a| a.len())
        .unwrap_or(0)
}

fn series_at(block: &Value, key: &str, index: usize) -> Value {
    block
        .get(key)
        .and_then(|v| v.as_array())
        .and_then(|a| a.get(index))
        .cloned()
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reshapes_daily_series() {
        let raw = json!({
            "current": {"temperature_2m": 29.4, "weather_code": 0},
            "daily": {
                "time": ["2026-08-04", "2026-08-05"],
                "temperature_2m_max": [33.1, 34.0],
                "temperature_2m_min": [21.0, 22.2],
                "weather_code": [0, 1],
                "sunrise": ["2026-08-04T05:59", "2026-08-05T06:00"],
                "sunset": ["2026-08-04T19:31", "2026-08-05T19:30"],
                "uv_index_max": [9.1, 8.8],
                "precipitation_sum": [0.0, 0.0],
                "wind_speed_10m_max": [14.2, 12.0]
            },
            "hourly": {"time": [], "temperature_2m": []}
        });

        let payload = reshape_forecast(&raw);
        assert_eq!(payload["current"]["temp"], json!(29.4));
        assert_eq!(payload["today"]["max"], json!(33.1));
        assert_eq!(payload["forecast"].as_array().unwrap().len(), 2);
        assert_eq!(payload["forecast"][1]["date"], json!("2026-08-05"));
        assert_eq!(payload["hourly"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn empty_document_degrades_to_null_blocks() {
        let payload = reshape_forecast(&json!({}));
        assert!(payload["today"].is_null());
        assert_eq!(payload["forecast"].as_array().unwrap().len(), 0);
    }
}
