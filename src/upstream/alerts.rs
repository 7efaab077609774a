//! Red-Alert history feed adapter.
//!
//! The feed URL is operator-configured and its shape varies between
//! mirrors, so extraction is deliberately tolerant: either a bare array or
//! an object wrapping one under `data`/`alerts`/`items`.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde_json::{json, Value};

use super::UpstreamClient;
use crate::error::{DashboardError, Result};

/// An alert counts as active for this long after it fired.
const ACTIVE_WINDOW_SECONDS: i64 = 600;

impl UpstreamClient {
    /// The most recent entry of the history feed, loosely extracted.
    pub async fn latest_alert(&self) -> Result<Value> {
        let url = self.alert_url()?;
        let data = self.get_json(&url).await?;

        let entries = alert_entries(&data);
        let latest = match entries.last() {
            Some(entry) => entry,
            None => return Ok(json!({})),
        };

        let text = match latest.get("data").or_else(|| latest.get("title")).or_else(|| latest.get("description")) {
            Some(Value::Array(parts)) => Some(
                parts
                    .iter()
                    .map(|p| p.as_str().map(String::from).unwrap_or_else(|| p.to_string()))
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
            None => None,
        };

        let location = latest
            .get("data")
            .or_else(|| latest.get("location"))
            .or_else(|| latest.get("city"))
            .map(display_string);

        Ok(json!({
            "title": latest.get("title"),
            "location": location,
            "when": latest.get("alertDate"),
            "text": text,
        }))
    }

    /// Processed alert history: most recent alert, active/clear status and
    /// a humanized "time since" display.
    pub async fn alert_history(&self) -> Result<Value> {
        let url = self.alert_url()?;
        let data = self.get_json(&url).await?;
        let now = Local::now();

        let mut valid: Vec<(DateTime<Local>, Vec<Value>, Value)> = Vec::new();
        for entry in alert_entries(&data) {
            let when = match entry
                .get("alertDate")
                .and_then(|v| v.as_str())
                .and_then(parse_alert_time)
            {
                Some(when) => when,
                None => continue,
            };
            let locations = entry
                .get("data")
                .and_then(|v| v.as_array())
                .cloned()
                .unwrap_or_default();
            if locations.is_empty() {
                continue;
            }
            let category = entry.get("cat").cloned().unwrap_or(json!(1));
            valid.push((when, locations, category));
        }

        valid.sort_by_key(|(when, _, _)| std::cmp::Reverse(when.timestamp()));

        let payload = match valid.into_iter().next() {
            Some((when, locations, category)) => {
                let elapsed = (now - when).num_seconds().max(0);
                let active = elapsed < ACTIVE_WINDOW_SECONDS;
                let alerts: Vec<Value> = if active { locations.clone() } else { Vec::new() };

                json!({
                    "alerts": alerts,
                    "last_alert": {
                        "time": when.to_rfc3339(),
                        "locations": locations,
                        "category": category,
                    },
                    "last_alert_display": humanize_elapsed(elapsed),
                    "last_updated": now.to_rfc3339(),
                    "status": if active { "active" } else { "clear" },
                    "location_count": alerts.len(),
                })
            }
            None => json!({
                "alerts": [],
                "last_alert": null,
                "last_alert_display": "No recent alerts",
                "last_updated": now.to_rfc3339(),
                "status": "clear",
                "location_count": 0,
            }),
        };

        Ok(payload)
    }

    fn alert_url(&self) -> Result<String> {
        let url = &self.config().alert_history_url;
        if url.is_empty() {
            return Err(DashboardError::Config(
                "alert history feed not configured".to_string(),
            ));
        }
        Ok(url.clone())
    }
}

/// Accept both bare-array feeds and object-wrapped ones.
fn alert_entries(data: &Value) -> Vec<&Value> {
    let seq = match data {
        Value::Array(entries) => Some(entries),
        Value::Object(_) => data
            .get("data")
            .or_else(|| data.get("alerts"))
            .or_else(|| data.get("items"))
            .and_then(|v| v.as_array()),
        _ => None,
    };
    seq.map(|entries| entries.iter().collect()).unwrap_or_default()
}

/// Feed timestamps are RFC 3339 or naive `YYYY-MM-DD HH:MM:SS` local time.
fn parse_alert_time(raw: &str) -> Option<DateTime<Local>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").ok()?;
    Local.from_local_datetime(&naive).earliest()
}

fn display_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(parts) => parts
            .iter()
            .map(|p| p.as_str().map(String::from).unwrap_or_else(|| p.to_string()))
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

fn humanize_elapsed(seconds: i64) -> String {
    if seconds >= 86_400 {
        format!("{}d ago", seconds / 86_400)
    } else if seconds >= 3_600 {
        format!("{}h ago", seconds / 3_600)
    } else if seconds >= 60 {
        format!("{}m ago", seconds / 60)
    } else {
        "Just now".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_wrapped_and_bare_feeds() {
        let bare = json!([{"alertDate": "2026-08-04 06:00:00", "data": ["Haifa"]}]);
        assert_eq!(alert_entries(&bare).len(), 1);

        let wrapped = json!({"alerts": [{"alertDate": "2026-08-04 06:00:00"}]});
        assert_eq!(alert_entries(&wrapped).len(), 1);

        assert!(alert_entries(&json!("nope")).is_empty());
    }

    #[test]
    fn parses_both_time_shapes() {
        assert!(parse_alert_time("2026-08-04T06:00:00+03:00").is_some());
        assert!(parse_alert_time("2026-08-04 06:00:00").is_some());
        assert!(parse_alert_time("yesterday").is_none());
    }

    #[test]
    fn humanizes_elapsed_time() {
        assert_eq!(humanize_elapsed(30), "Just now");
        assert_eq!(humanize_elapsed(120), "2m ago");
        assert_eq!(humanize_elapsed(7_200), "2h ago");
        assert_eq!(humanize_elapsed(200_000), "2d ago");
    }
}
