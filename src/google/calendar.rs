//! Google Calendar read-only adapter and event shaping helpers.

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;

use super::GoogleClient;
use crate::error::Result;
use crate::oauth::AccountToken;

/// Simplified event payload served by the calendar endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct SimpleEvent {
    pub title: String,
    pub location: String,
    pub start: Option<String>,
    pub end: Option<String>,
}

impl GoogleClient {
    /// Events on the primary calendar between `start` and `end`, expanded
    /// to single instances and ordered by start time.
    pub async fn calendar_events(
        &self,
        token: &AccountToken,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        max_results: usize,
    ) -> Result<Vec<Value>> {
        let url = self.calendar_url("/calendars/primary/events");
        let time_min = start.to_rfc3339();
        let time_max = end.to_rfc3339();
        let max_results = max_results.to_string();

        let response = self
            .get_json(
                &url,
                token,
                &[
                    ("timeMin", &time_min),
                    ("timeMax", &time_max),
                    ("singleEvents", "true"),
                    ("orderBy", "startTime"),
                    ("maxResults", &max_results),
                ],
            )
            .await?;

        Ok(response
            .get("items")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default())
    }

    /// Merge the primary calendars of several accounts, sorted by start.
    /// Accounts are queried concurrently; one whose fetch fails
    /// contributes nothing.
    pub async fn combined_calendars(
        &self,
        tokens: &[AccountToken],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<Value> {
        let fetches = tokens
            .iter()
            .map(|token| self.calendar_events(token, start, end, 20));
        let mut events: Vec<Value> = join_all(fetches)
            .await
            .into_iter()
            .filter_map(|result| result.ok())
            .flatten()
            .collect();
        // Events with an unparseable start sort last.
        events.sort_by_key(|ev| event_start(ev).map(|dt| dt.timestamp()).unwrap_or(i64::MAX));
        events
    }
}

/// Reduce a raw event to the fields the dashboard renders.
pub fn simplify(event: &Value) -> SimpleEvent {
    let field = |key: &str, part: &str| -> Option<String> {
        event
            .get(key)
            .and_then(|v| v.get(part))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    };

    SimpleEvent {
        title: event
            .get("summary")
            .and_then(|v| v.as_str())
            .unwrap_or("(no title)")
            .to_string(),
        location: event
            .get("location")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string(),
        start: field("start", "dateTime").or_else(|| field("start", "date")),
        end: field("end", "dateTime").or_else(|| field("end", "date")),
    }
}

/// Parse an event's start into local time. All-day events (`date` only)
/// count as local midnight.
pub fn event_start(event: &Value) -> Option<DateTime<Local>> {
    let start = event.get("start")?;
    let when = start
        .get("dateTime")
        .or_else(|| start.get("date"))?
        .as_str()?;
    parse_event_time(when)
}

/// Parse either an RFC 3339 timestamp or a bare `YYYY-MM-DD` date.
pub fn parse_event_time(when: &str) -> Option<DateTime<Local>> {
    if when.contains('T') {
        DateTime::parse_from_rfc3339(when)
            .ok()
            .map(|dt| dt.with_timezone(&Local))
    } else {
        let date = NaiveDate::parse_from_str(when, "%Y-%m-%d").ok()?;
        Local
            .from_local_datetime(&date.and_hms_opt(0, 0, 0)?)
            .earliest()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn simplify_prefers_datetime_over_date() {
        let event = json!({
            "summary": "Standup",
            "location": "Room 1",
            "start": {"dateTime": "2026-08-04T09:00:00+03:00"},
            "end": {"date": "2026-08-04"}
        });
        let simple = simplify(&event);
        assert_eq!(simple.title, "Standup");
        assert_eq!(simple.start.as_deref(), Some("2026-08-04T09:00:00+03:00"));
        assert_eq!(simple.end.as_deref(), Some("2026-08-04"));
    }

    #[test]
    fn simplify_defaults_missing_fields() {
        let simple = simplify(&json!({}));
        assert_eq!(simple.title, "(no title)");
        assert_eq!(simple.location, "");
        assert_eq!(simple.start, None);
    }

    #[test]
    fn parses_all_day_and_timed_starts() {
        assert!(parse_event_time("2026-08-04").is_some());
        assert!(parse_event_time("2026-08-04T09:00:00Z").is_some());
        assert!(parse_event_time("never").is_none());
    }
}
