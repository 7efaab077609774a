//! Hebcal adapters: Gregorian→Hebrew date conversion, daily Zmanim,
//! Shabbat times, and upcoming Israeli holidays.
//!
//! All queries are pinned to Jerusalem (geonameid 281184); Hebcal localizes
//! timestamps server-side, so responses carry offset-qualified times.

use chrono::{DateTime, Datelike, Local, NaiveDate};
use serde_json::{json, Map, Value};

use super::UpstreamClient;
use crate::error::Result;

const JERUSALEM_GEONAME_ID: u32 = 281184;

impl UpstreamClient {
    /// Hebrew date string for a Gregorian date.
    ///
    /// `language == "hebrew"` returns the Hebrew-script rendering
    /// (e.g. `כ״ב אלול תשפ״ה`); anything else composes the transliterated
    /// `22 Elul 5785` form, falling back to Hebrew script when the parts
    /// are missing.
    pub async fn hebrew_date(&self, date: NaiveDate, language: &str) -> Result<Option<String>> {
        let url = format!(
            "{}/converter?cfg=json&date={}&g2h=1&strict=1",
            self.hebcal_base(),
            date.format("%Y-%m-%d"),
        );

        let data = self.get_json(&url).await?;

        let hebrew_script = data.get("hebrew").and_then(|v| v.as_str()).map(String::from);
        if language == "hebrew" {
            return Ok(hebrew_script);
        }

        let day = data.get("hd").and_then(|v| v.as_i64());
        let month = data.get("hm").and_then(|v| v.as_str());
        let year = data.get("hy").and_then(|v| v.as_i64());

        Ok(match (day, month, year) {
            (Some(d), Some(m), Some(y)) => Some(format!("{} {} {}", d, m, y)),
            _ => hebrew_script,
        })
    }

    /// Daily Zmanim for Jerusalem plus the next Shabbat's candle-lighting,
    /// havdalah and parsha.
    pub async fn zmanim(&self, date: NaiveDate) -> Result<Value> {
        let zmanim_url = format!(
            "{}/zmanim?cfg=json&geonameid={}&date={}",
            self.hebcal_base(),
            JERUSALEM_GEONAME_ID,
            date.format("%Y-%m-%d"),
        );
        let zmanim_data = self.get_json(&zmanim_url).await?;

        let shabbat_url = format!(
            "{}/shabbat?cfg=json&geonameid={}&M=on",
            self.hebcal_base(),
            JERUSALEM_GEONAME_ID,
        );
        let shabbat_data = self.get_json(&shabbat_url).await?;

        let times = zmanim_data.get("times").cloned().unwrap_or_else(|| json!({}));

        let mut shabbat = Map::new();
        for item in feed_items(&shabbat_data) {
            let category = item.get("category").and_then(|v| v.as_str()).unwrap_or("");
            match category {
                "candles" => {
                    shabbat.insert(
                        "candle_lighting".to_string(),
                        json!({"time": item.get("date"), "title": item.get("title")}),
                    );
                }
                "havdalah" => {
                    shabbat.insert(
                        "havdalah".to_string(),
                        json!({"time": item.get("date"), "title": item.get("title")}),
                    );
                }
                "parashat" => {
                    let parsha = item
                        .get("hebrew")
                        .or_else(|| item.get("title"))
                        .cloned()
                        .unwrap_or(Value::Null);
                    shabbat.insert("parsha".to_string(), parsha);
                }
                _ => {}
            }
        }

        Ok(json!({
            "date": date.format("%Y-%m-%d").to_string(),
            "zmanim": times,
            "shabbat": shabbat,
            "location": "Jerusalem",
            "cached_at": Local::now().to_rfc3339(),
        }))
    }

    /// Shabbat times and parsha plus the next upcoming major holiday.
    pub async fn shabbat_overview(&self) -> Result<Value> {
        let url = format!(
            "{}/shabbat?cfg=json&geonameid={}&b=18&m=50&mod=on&leyning=off",
            self.hebcal_base(),
            JERUSALEM_GEONAME_ID,
        );
        let data = self.get_json(&url).await?;

        let mut candle = None;
        let mut havdalah = None;
        let mut parsha = None;
        for item in feed_items(&data) {
            let category = item.get("category").and_then(|v| v.as_str()).unwrap_or("");
            let title = item.get("title").cloned().unwrap_or(Value::Null);
            let date = item.get("date").cloned().unwrap_or(Value::Null);
            match category {
                "candles" if candle.is_none() => {
                    candle = Some(json!({"title": title, "time": date}));
                }
                "havdalah" if havdalah.is_none() => {
                    havdalah = Some(json!({"title": title, "time": date}));
                }
                "parashat" if parsha.is_none() => {
                    parsha = Some(title);
                }
                _ => {}
            }
        }

        // Next Yom Tov / major holiday after now; a failure here leaves the
        // Shabbat block intact.
        let (next_holiday, next_holiday_date) = match self.next_major_holiday().await {
            Ok(found) => found,
            Err(_) => (None, None),
        };

        Ok(json!({
            "candle": candle,
            "havdalah": havdalah,
            "parsha": parsha,
            "next_holiday": next_holiday,
            "next_holiday_date": next_holiday_date,
        }))
    }

    async fn next_major_holiday(&self) -> Result<(Option<String>, Option<String>)> {
        let url = format!(
            "{}/hebcal?v=1&cfg=json&maj=on&i=on&nx=on&c=on&year=now&geo=geoname&geonameid={}&locale=en",
            self.hebcal_base(),
            JERUSALEM_GEONAME_ID,
        );
        let data = self.get_json(&url).await?;

        let now = Local::now();
        let mut upcoming: Vec<(DateTime<Local>, String)> = Vec::new();
        for item in feed_items(&data) {
            let when = match item
                .get("date")
                .and_then(|v| v.as_str())
                .and_then(parse_feed_date)
            {
                Some(when) => when,
                None => continue,
            };
            let is_major = item.get("yomtov").and_then(|v| v.as_bool()).unwrap_or(false)
                || item.get("category").and_then(|v| v.as_str()) == Some("holiday");
            if is_major && when > now {
                if let Some(title) = item.get("title").and_then(|v| v.as_str()) {
                    upcoming.push((when, title.to_string()));
                }
            }
        }

        upcoming.sort_by_key(|(when, _)| when.timestamp());
        Ok(match upcoming.into_iter().next() {
            Some((when, title)) => {
                let display = format!("{} {}", when.format("%b"), when.day());
                (Some(title), Some(display))
            }
            None => (None, None),
        })
    }

    /// The next 10 upcoming Israeli holidays across this year and the next,
    /// classified Religious/National/Memorial.
    pub async fn israel_holidays(&self) -> Result<Value> {
        let now = Local::now();
        let today = now.date_naive();

        let mut all_holidays: Vec<Value> = Vec::new();
        for year in [today.year(), today.year() + 1] {
            let url = format!(
                "{}/hebcal?v=1&cfg=json&maj=on&min=off&mod=on&nx=off&year={}&month=x&ss=off&mf=off&c=on&geo=geoname&geonameid={}&M=on&s=on",
                self.hebcal_base(),
                year,
                JERUSALEM_GEONAME_ID,
            );

            let data = match self.get_json(&url).await {
                Ok(data) => data,
                // One bad year leaves the other's holidays in place.
                Err(_) => continue,
            };

            for item in feed_items(&data) {
                let title = match item.get("title").and_then(|v| v.as_str()) {
                    Some(t) if !t.is_empty() => t,
                    _ => continue,
                };
                let date = match item
                    .get("date")
                    .and_then(|v| v.as_str())
                    .and_then(parse_feed_date)
                {
                    Some(when) => when.date_naive(),
                    None => continue,
                };
                if date < today {
                    continue;
                }

                let holiday_type = classify_holiday(title);
                let days_until = (date - today).num_days();
                all_holidays.push(json!({
                    "name": title,
                    "date": date.format("%Y-%m-%d").to_string(),
                    "type": holiday_type,
                    "days_until": days_until,
                    "formatted_date": format_long_date(date),
                }));
            }
        }

        all_holidays.sort_by(|a, b| {
            a.get("date")
                .and_then(|v| v.as_str())
                .cmp(&b.get("date").and_then(|v| v.as_str()))
        });
        all_holidays.truncate(10);

        Ok(json!({
            "holidays": all_holidays,
            "count": all_holidays.len(),
            "last_updated": now.to_rfc3339(),
            "source": "HebCal API",
        }))
    }

    fn hebcal_base(&self) -> &str {
        self.config().hebcal_base_url.trim_end_matches('/')
    }
}

fn feed_items(data: &Value) -> impl Iterator<Item = &Value> {
    data.get("items")
        .and_then(|v| v.as_array())
        .into_iter()
        .flatten()
}

/// Hebcal dates are either bare `YYYY-MM-DD` or RFC 3339 with an offset.
fn parse_feed_date(raw: &str) -> Option<DateTime<Local>> {
    crate::google::calendar::parse_event_time(raw)
}

fn classify_holiday(title: &str) -> &'static str {
    if title.contains("Independence") || title.contains("Memorial") || title.contains("Jerusalem") {
        "National"
    } else if title.contains("Holocaust") || title.contains("Remembrance") {
        "Memorial"
    } else {
        "Religious"
    }
}

/// `Tue, 4 Aug 2026`-style display without platform-specific padding flags.
fn format_long_date(date: NaiveDate) -> String {
    format!(
        "{}, {} {} {}",
        date.format("%a"),
        date.day(),
        date.format("%b"),
        date.year()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_holiday_types() {
        assert_eq!(classify_holiday("Yom HaAtzmaut (Independence Day)"), "National");
        assert_eq!(classify_holiday("Yom HaShoah (Holocaust Remembrance)"), "Memorial");
        assert_eq!(classify_holiday("Pesach I"), "Religious");
    }

    #[test]
    fn formats_long_date_without_zero_padding() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 4).unwrap();
        assert_eq!(format_long_date(date), "Tue, 4 Aug 2026");
    }

    #[test]
    fn parses_both_feed_date_shapes() {
        assert!(parse_feed_date("2026-09-12").is_some());
        assert!(parse_feed_date("2026-09-12T19:05:00+03:00").is_some());
        assert!(parse_feed_date("soon").is_none());
    }
}
