// HTTP request handlers
//
// Every aggregation handler follows the same shape: build a cache key,
// serve a fresh cached payload if present, otherwise call the adapter,
// cache the result for that endpoint's TTL, and degrade to an empty
// payload on any upstream failure.

use super::routes::AppState;
use crate::error::{DashboardError, Result};
use crate::google::calendar::{self, SimpleEvent};
use crate::oauth::AccountToken;
use crate::upstream::{DEFAULT_LAT, DEFAULT_LON};
use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;

const MINUTE: i64 = 60;
const EMAILS_TTL: i64 = 15 * MINUTE;
const CALENDAR_TTL: i64 = 15 * MINUTE;
const NEXT_MEETING_TTL: i64 = MINUTE;
const NEWS_TTL: i64 = 15 * MINUTE;
const WEATHER_TTL: i64 = 3600;
const AQI_TTL: i64 = 3600;
const ZMANIM_TTL: i64 = 3600;
const SHABBAT_TTL: i64 = 6 * 3600;
const HOLIDAYS_TTL: i64 = 24 * 3600;
const HEBREW_DATE_TTL: i64 = 24 * 3600;
const ALERTS_TTL: i64 = 30;
const RED_ALERT_TTL: i64 = 120;

#[derive(Debug, Deserialize)]
pub struct AccountQuery {
    pub account: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GeoQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct NewsQuery {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: Option<String>,
}

// ---------------------------------------------------------------------------
// Health

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub checks: HashMap<String, HealthCheck>,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheck {
    pub status: String,
    pub message: String,
}

pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let mut checks = HashMap::new();
    let mut overall_status = HealthStatus::Healthy;

    let accounts = state.accounts.list(false).await;
    let accounts_check = if accounts.is_empty() {
        overall_status = HealthStatus::Degraded;
        HealthCheck {
            status: "warning".to_string(),
            message: "No Google accounts connected".to_string(),
        }
    } else {
        HealthCheck {
            status: "ok".to_string(),
            message: format!("{} account(s) connected", accounts.len()),
        }
    };
    checks.insert("google_accounts".to_string(), accounts_check);

    let source = state.credentials.source();
    let credentials_check = match source {
        crate::oauth::CredentialSource::None => {
            overall_status = HealthStatus::Degraded;
            HealthCheck {
                status: "warning".to_string(),
                message: "No OAuth client configured".to_string(),
            }
        }
        _ => HealthCheck {
            status: "ok".to_string(),
            message: format!("OAuth client from {:?}", source).to_lowercase(),
        },
    };
    checks.insert("oauth_client".to_string(), credentials_check);

    let alerts_check = if state.upstream.has_alert_feed() {
        HealthCheck {
            status: "ok".to_string(),
            message: "Alert history feed configured".to_string(),
        }
    } else {
        HealthCheck {
            status: "warning".to_string(),
            message: "Alert history feed not configured".to_string(),
        }
    };
    checks.insert("alert_feed".to_string(), alerts_check);

    Json(HealthResponse {
        status: overall_status,
        checks,
        timestamp: Utc::now().to_rfc3339(),
    })
}

// ---------------------------------------------------------------------------
// Time and status

pub async fn time_handler(State(state): State<AppState>) -> Json<Value> {
    let now_local = Local::now();
    let now_utc = Utc::now();

    let language = state.settings.load().hebrew_date_language;
    let date = now_local.date_naive();
    let cache_key = format!("hebrew_date:{}:{}", date, language);
    let hebrew = match state.cache.get(&cache_key) {
        Some(value) => value,
        None => match state.upstream.hebrew_date(date, &language).await {
            Ok(hebrew) => {
                let value = serde_json::to_value(hebrew).unwrap_or(Value::Null);
                state.cache.set(&cache_key, value.clone(), HEBREW_DATE_TTL);
                value
            }
            Err(_) => Value::Null,
        },
    };

    Json(json!({
        "local": now_local.format("%H:%M").to_string(),
        "utc": now_utc.format("%H:%M").to_string(),
        "date": short_date(now_local.date_naive()),
        "hebrew": hebrew,
    }))
}

pub async fn status_handler(State(state): State<AppState>) -> Json<Value> {
    let settings = state.settings.load();
    let emails = state.accounts.list(true).await;
    let client = state.credentials.resolve();

    Json(json!({
        "google_accounts": emails.len(),
        "accounts": emails,
        "labels": {"personal": settings.personal, "business": settings.business},
        "hebrew_date_language": settings.hebrew_date_language,
        "credentials": {
            "source": state.credentials.source(),
            "client_id": client.as_ref().map(|c| c.client_id.clone()),
            "project_id": client.as_ref().map(|c| c.project_id.clone()),
        }
    }))
}

pub async fn accounts_handler(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.accounts.list(true).await)
}

// ---------------------------------------------------------------------------
// Email

pub async fn emails_handler(
    State(state): State<AppState>,
    Query(query): Query<AccountQuery>,
) -> Json<Value> {
    let cache_key = match &query.account {
        Some(account) => format!("emails:{}", account),
        None => "emails:combined".to_string(),
    };
    if let Some(cached) = state.cache.get(&cache_key) {
        return Json(cached);
    }

    let business = state.settings.load().business;
    let mut items = Vec::new();

    match &query.account {
        Some(account) => {
            if let Some(token) = state.accounts.credential_for(account).await {
                items.extend(
                    state
                        .google
                        .latest_messages(&token, 20, &business)
                        .await
                        .unwrap_or_default(),
                );
            }
        }
        None => {
            let tokens = state.accounts.all_credentials().await;
            let fetches = tokens
                .iter()
                .map(|token| state.google.latest_messages(token, 20, &business));
            for fetched in futures::future::join_all(fetches).await {
                items.extend(fetched.unwrap_or_default());
            }
        }
    }

    // Keep the 20 most recent overall.
    items.sort_by_key(|item| std::cmp::Reverse(received_sort_key(item.received.as_deref())));
    items.truncate(20);

    let payload = serde_json::to_value(&items).unwrap_or_else(|_| json!([]));
    state.cache.set(&cache_key, payload.clone(), EMAILS_TTL);
    Json(payload)
}

pub async fn email_detail_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<AccountQuery>,
) -> Result<Json<Value>> {
    let account = query.account.unwrap_or_default();
    let token = state
        .accounts
        .credential_for(&account)
        .await
        .ok_or(DashboardError::NotFound)?;

    let detail = state
        .google
        .message_detail(&token, &id)
        .await
        .map_err(|_| DashboardError::NotFound)?;

    Ok(Json(serde_json::to_value(detail)?))
}

fn received_sort_key(received: Option<&str>) -> i64 {
    let Some(raw) = received else {
        return i64::MIN;
    };
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.timestamp())
        .or_else(|_| DateTime::parse_from_rfc2822(raw).map(|dt| dt.timestamp()))
        .unwrap_or(i64::MIN)
}

// ---------------------------------------------------------------------------
// Calendar

pub async fn calendar_handler(
    State(state): State<AppState>,
    Query(query): Query<AccountQuery>,
) -> Json<Value> {
    let now = Local::now();
    let today_start = local_midnight(now);
    let today_end = today_start + Duration::days(1);
    let tomorrow_end = today_start + Duration::days(2);

    let scope = query.account.clone().unwrap_or_else(|| "combined".to_string());
    let cache_key = format!("cal:{}:{}", scope, today_start.date_naive());
    if let Some(cached) = state.cache.get(&cache_key) {
        return Json(cached);
    }

    let today_events = fetch_events(&state, &query.account, today_start, today_end).await;
    let tomorrow_events = fetch_events(&state, &query.account, today_end, tomorrow_end).await;

    let payload = json!({
        "today": simplify_all(&today_events),
        "tomorrow": simplify_all(&tomorrow_events),
    });
    state.cache.set(&cache_key, payload.clone(), CALENDAR_TTL);
    Json(payload)
}

/// Events for the current week (Sun-Sat) grouped by local day.
pub async fn calendar_week_handler(
    State(state): State<AppState>,
    Query(query): Query<AccountQuery>,
) -> Json<Value> {
    let now = Local::now();
    let days_from_sunday = (now.weekday().num_days_from_monday() as i64 + 1) % 7;
    let week_start = local_midnight(now) - Duration::days(days_from_sunday);
    let week_end = week_start + Duration::days(7);

    let scope = query.account.clone().unwrap_or_else(|| "combined".to_string());
    let cache_key = format!("calweek:{}:{}", scope, week_start.date_naive());
    if let Some(cached) = state.cache.get(&cache_key) {
        return Json(cached);
    }

    let events = fetch_events(&state, &query.account, week_start, week_end).await;

    let day_keys: Vec<NaiveDate> = (0..7)
        .map(|i| (week_start + Duration::days(i)).date_naive())
        .collect();
    let buckets = bucket_events(&events, &day_keys);

    let days: Vec<Value> = day_keys
        .iter()
        .map(|date| {
            json!({
                "date": date.format("%Y-%m-%d").to_string(),
                "label": format!("{} {:02}", date.format("%a"), date.day()),
                "events": buckets.get(date).cloned().unwrap_or_default(),
            })
        })
        .collect();

    let payload = json!({
        "range": {
            "start": week_start.date_naive().format("%Y-%m-%d").to_string(),
            "end": (week_end - Duration::days(1)).date_naive().format("%Y-%m-%d").to_string(),
        },
        "days": days,
        "today": now.date_naive().format("%Y-%m-%d").to_string(),
    });
    state.cache.set(&cache_key, payload.clone(), CALENDAR_TTL);
    Json(payload)
}

/// Events for today, tomorrow and the day after, grouped by day.
pub async fn calendar_three_day_handler(
    State(state): State<AppState>,
    Query(query): Query<AccountQuery>,
) -> Json<Value> {
    let now = Local::now();
    let today_start = local_midnight(now);
    let three_days_end = today_start + Duration::days(3);

    let scope = query.account.clone().unwrap_or_else(|| "combined".to_string());
    let cache_key = format!("cal3day:{}:{}", scope, today_start.date_naive());
    if let Some(cached) = state.cache.get(&cache_key) {
        return Json(cached);
    }

    let events = fetch_events(&state, &query.account, today_start, three_days_end).await;

    let day_keys: Vec<NaiveDate> = (0..3)
        .map(|i| (today_start + Duration::days(i)).date_naive())
        .collect();
    let buckets = bucket_events(&events, &day_keys);

    let day_labels = ["Today", "Tomorrow", "Day After"];
    let days: Vec<Value> = day_keys
        .iter()
        .zip(day_labels)
        .map(|(date, label)| {
            json!({
                "date": date.format("%Y-%m-%d").to_string(),
                "label": label,
                "full_date": short_date(*date),
                "events": buckets.get(date).cloned().unwrap_or_default(),
            })
        })
        .collect();

    let payload = json!({
        "days": days,
        "today": now.date_naive().format("%Y-%m-%d").to_string(),
    });
    state.cache.set(&cache_key, payload.clone(), CALENDAR_TTL);
    Json(payload)
}

pub async fn next_meeting_handler(
    State(state): State<AppState>,
    Query(query): Query<AccountQuery>,
) -> Json<Value> {
    let now = Local::now();
    let end = now + Duration::days(7);

    let scope = query.account.clone().unwrap_or_else(|| "combined".to_string());
    let cache_key = format!("next_meeting:{}", scope);
    if let Some(cached) = state.cache.get(&cache_key) {
        return Json(cached);
    }

    let events = fetch_events(&state, &query.account, now, end).await;

    let next = events.iter().find_map(|event| {
        let start = calendar::event_start(event)?;
        if start <= now {
            return None;
        }
        let title = event
            .get("summary")
            .and_then(|v| v.as_str())
            .unwrap_or("(no title)")
            .to_string();
        Some((title, start))
    });

    let payload = match next {
        Some((title, start)) => {
            let delta = start - now;
            let days = delta.num_days();
            let hours = (delta.num_hours() % 24).max(0);
            let mins = (delta.num_minutes() % 60).max(0);
            let countdown = if days > 0 {
                format!("{}d {}h {}m", days, hours, mins)
            } else {
                format!("{}h {}m", hours, mins)
            };
            json!({
                "title": title,
                "in": countdown,
                "start_time": format!(
                    "{} {} {:02}, {}",
                    start.format("%a"),
                    start.format("%b"),
                    start.day(),
                    start.format("%H:%M"),
                ),
            })
        }
        None => json!({"title": null, "countdown": null, "start_time": null}),
    };
    state.cache.set(&cache_key, payload.clone(), NEXT_MEETING_TTL);
    Json(payload)
}

/// Fetch events for one account or merged across all loaded accounts.
async fn fetch_events(
    state: &AppState,
    account: &Option<String>,
    start: DateTime<Local>,
    end: DateTime<Local>,
) -> Vec<Value> {
    let start_utc = start.with_timezone(&Utc);
    let end_utc = end.with_timezone(&Utc);

    match account {
        Some(account) => match state.accounts.credential_for(account).await {
            Some(token) => state
                .google
                .calendar_events(&token, start_utc, end_utc, 20)
                .await
                .unwrap_or_default(),
            None => Vec::new(),
        },
        None => {
            let tokens: Vec<AccountToken> = state.accounts.all_credentials().await;
            state
                .google
                .combined_calendars(&tokens, start_utc, end_utc)
                .await
        }
    }
}

fn simplify_all(events: &[Value]) -> Vec<SimpleEvent> {
    events.iter().map(calendar::simplify).collect()
}

/// Bucket simplified events per local start day, sorted within each day.
fn bucket_events(
    events: &[Value],
    day_keys: &[NaiveDate],
) -> HashMap<NaiveDate, Vec<SimpleEvent>> {
    let mut buckets: HashMap<NaiveDate, Vec<(i64, SimpleEvent)>> = HashMap::new();

    for event in events {
        let Some(start) = calendar::event_start(event) else {
            continue;
        };
        let day = start.date_naive();
        if !day_keys.contains(&day) {
            continue;
        }
        buckets
            .entry(day)
            .or_default()
            .push((start.timestamp(), calendar::simplify(event)));
    }

    buckets
        .into_iter()
        .map(|(day, mut entries)| {
            entries.sort_by_key(|(ts, _)| *ts);
            (day, entries.into_iter().map(|(_, ev)| ev).collect())
        })
        .collect()
}

fn local_midnight(now: DateTime<Local>) -> DateTime<Local> {
    now.with_hour(0)
        .and_then(|t| t.with_minute(0))
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now)
}

/// `Tue, 4 Aug`-style display without platform-specific padding flags.
fn short_date(date: NaiveDate) -> String {
    format!("{}, {} {}", date.format("%a"), date.day(), date.format("%b"))
}

// ---------------------------------------------------------------------------
// Weather, news, air quality

pub async fn weather_handler(
    State(state): State<AppState>,
    Query(query): Query<GeoQuery>,
) -> Json<Value> {
    let lat = query.lat.unwrap_or(DEFAULT_LAT);
    let lon = query.lon.unwrap_or(DEFAULT_LON);
    let cache_key = format!("weather:{:.3},{:.3}", lat, lon);
    if let Some(cached) = state.cache.get(&cache_key) {
        return Json(cached);
    }

    match state.upstream.weather_forecast(lat, lon).await {
        Ok(payload) => {
            state.cache.set(&cache_key, payload.clone(), WEATHER_TTL);
            Json(payload)
        }
        Err(e) => {
            tracing::warn!("Weather fetch failed: {}", e);
            Json(json!({}))
        }
    }
}

pub async fn news_handler(
    State(state): State<AppState>,
    Query(query): Query<NewsQuery>,
) -> Json<Value> {
    let cache_key = format!("news:{}", query.q.as_deref().unwrap_or("israel"));
    if let Some(cached) = state.cache.get(&cache_key) {
        return Json(cached);
    }

    match state.upstream.news_headlines(query.q.as_deref()).await {
        Ok(items) => {
            let payload = serde_json::to_value(&items).unwrap_or_else(|_| json!([]));
            state.cache.set(&cache_key, payload.clone(), NEWS_TTL);
            Json(payload)
        }
        Err(e) => {
            tracing::warn!("News fetch failed: {}", e);
            Json(json!([]))
        }
    }
}

pub async fn aqi_handler(
    State(state): State<AppState>,
    Query(query): Query<GeoQuery>,
) -> Json<Value> {
    let token = state.settings.load().waqi_token;
    if token.is_empty() {
        return Json(json!({}));
    }

    let lat = query.lat.unwrap_or(DEFAULT_LAT);
    let lon = query.lon.unwrap_or(DEFAULT_LON);
    let cache_key = format!("aqi:{:.3},{:.3}", lat, lon);
    if let Some(cached) = state.cache.get(&cache_key) {
        return Json(cached);
    }

    match state.upstream.air_quality(&token, lat, lon).await {
        Ok(payload) => {
            state.cache.set(&cache_key, payload.clone(), AQI_TTL);
            Json(payload)
        }
        Err(e) => {
            tracing::warn!("Air quality fetch failed: {}", e);
            Json(json!({}))
        }
    }
}

// ---------------------------------------------------------------------------
// Hebrew calendar

pub async fn zmanim_handler(
    State(state): State<AppState>,
    Query(query): Query<DateQuery>,
) -> Json<Value> {
    let target_date = query
        .date
        .as_deref()
        .and_then(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
        .unwrap_or_else(|| Local::now().date_naive());

    let cache_key = format!("zmanim:{}", target_date);
    if let Some(cached) = state.cache.get(&cache_key) {
        return Json(cached);
    }

    match state.upstream.zmanim(target_date).await {
        Ok(payload) => {
            state.cache.set(&cache_key, payload.clone(), ZMANIM_TTL);
            Json(payload)
        }
        Err(e) => {
            tracing::warn!("Zmanim fetch failed: {}", e);
            Json(json!({}))
        }
    }
}

pub async fn shabbat_handler(State(state): State<AppState>) -> Json<Value> {
    if let Some(cached) = state.cache.get("shabbat") {
        return Json(cached);
    }

    match state.upstream.shabbat_overview().await {
        Ok(payload) => {
            state.cache.set("shabbat", payload.clone(), SHABBAT_TTL);
            Json(payload)
        }
        Err(e) => {
            tracing::warn!("Shabbat fetch failed: {}", e);
            Json(json!({}))
        }
    }
}

pub async fn israel_holidays_handler(State(state): State<AppState>) -> Json<Value> {
    if let Some(cached) = state.cache.get("israel_holidays") {
        return Json(cached);
    }

    match state.upstream.israel_holidays().await {
        Ok(payload) => {
            state.cache.set("israel_holidays", payload.clone(), HOLIDAYS_TTL);
            Json(payload)
        }
        Err(e) => {
            tracing::warn!("Holiday fetch failed: {}", e);
            Json(json!({"holidays": [], "count": 0}))
        }
    }
}

// ---------------------------------------------------------------------------
// Alerts

pub async fn alerts_handler(State(state): State<AppState>) -> Json<Value> {
    if !state.upstream.has_alert_feed() {
        return Json(json!([]));
    }
    if let Some(cached) = state.cache.get("alerts_latest") {
        return Json(cached);
    }

    match state.upstream.latest_alert().await {
        Ok(payload) => {
            state.cache.set("alerts_latest", payload.clone(), ALERTS_TTL);
            Json(payload)
        }
        Err(e) => {
            tracing::warn!("Alert fetch failed: {}", e);
            Json(json!([]))
        }
    }
}

pub async fn red_alert_handler(State(state): State<AppState>) -> Json<Value> {
    if !state.upstream.has_alert_feed() {
        return Json(json!({
            "alerts": [],
            "last_alert": null,
            "last_alert_display": "Alert history feed not configured",
            "last_updated": Local::now().to_rfc3339(),
            "status": "error",
            "location_count": 0,
            "error": "RED_ALERT_HISTORY_URL environment variable not set",
        }));
    }
    if let Some(cached) = state.cache.get("red_alert_data") {
        return Json(cached);
    }

    match state.upstream.alert_history().await {
        Ok(payload) => {
            state.cache.set("red_alert_data", payload.clone(), RED_ALERT_TTL);
            Json(payload)
        }
        Err(e) => {
            tracing::warn!("Alert history fetch failed: {}", e);
            Json(json!({
                "alerts": [],
                "last_alert": null,
                "last_alert_display": "Connection error",
                "last_updated": Local::now().to_rfc3339(),
                "status": "error",
                "location_count": 0,
                "error": e.to_string(),
            }))
        }
    }
}

// ---------------------------------------------------------------------------
// Administrative: credentials and settings

#[derive(Debug, Deserialize)]
pub struct CredentialsUpdate {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub save_to_config: bool,
}

pub async fn credentials_get(State(state): State<AppState>) -> Json<Value> {
    let client = state.credentials.resolve();
    let has_credentials = client.as_ref().map(|c| c.is_usable()).unwrap_or(false);

    Json(json!({
        "client_id": client.as_ref().map(|c| c.client_id.clone()),
        "project_id": client.as_ref().map(|c| c.project_id.clone()),
        "source": state.credentials.source(),
        "has_credentials": has_credentials,
    }))
}

pub async fn credentials_post(
    State(state): State<AppState>,
    Json(update): Json<CredentialsUpdate>,
) -> Result<Json<Value>> {
    let client_id = update.client_id.trim();
    let client_secret = update.client_secret.trim();
    let project_id = update.project_id.trim();

    if client_id.is_empty() || client_secret.is_empty() {
        return Err(DashboardError::InvalidRequest(
            "Client ID and Client Secret are required".to_string(),
        ));
    }

    state
        .credentials
        .set_override(client_id, client_secret, Some(project_id));

    if update.save_to_config {
        let client_id = client_id.to_string();
        let client_secret = client_secret.to_string();
        let project_id = project_id.to_string();
        state.settings.update(move |s| {
            s.google_client_id = client_id;
            s.google_client_secret = client_secret;
            s.google_project_id = project_id;
        })?;
    }

    Ok(Json(json!({"status": "success", "message": "Credentials updated"})))
}

pub async fn credentials_delete(State(state): State<AppState>) -> Result<Json<Value>> {
    state.credentials.clear_override();
    state.settings.update(|s| {
        s.google_client_id = String::new();
        s.google_client_secret = String::new();
        s.google_project_id = String::new();
    })?;

    Ok(Json(json!({"status": "success", "message": "Credentials cleared"})))
}

#[derive(Debug, Deserialize)]
pub struct SettingsUpdate {
    pub waqi_token: Option<String>,
    pub hebrew_date_language: Option<String>,
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
    pub google_project_id: Option<String>,
}

pub async fn settings_get(State(state): State<AppState>) -> Json<Value> {
    let settings = state.settings.load();
    Json(serde_json::to_value(&settings).unwrap_or_else(|_| json!({})))
}

pub async fn settings_post(
    State(state): State<AppState>,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<Value>> {
    let updated = state.settings.update(move |s| {
        if let Some(token) = update.waqi_token.as_deref().map(str::trim) {
            if !token.is_empty() {
                s.waqi_token = token.to_string();
            }
        }

        if let Some(language) = update.hebrew_date_language.as_deref() {
            if language == "english" || language == "hebrew" {
                s.hebrew_date_language = language.to_string();
            }
        }

        let client_id = update
            .google_client_id
            .as_deref()
            .map(str::trim)
            .unwrap_or_default();
        let client_secret = update
            .google_client_secret
            .as_deref()
            .map(str::trim)
            .unwrap_or_default();
        let project_id = update
            .google_project_id
            .as_deref()
            .map(str::trim)
            .unwrap_or_default();

        if !client_id.is_empty() && !client_secret.is_empty() {
            s.google_client_id = client_id.to_string();
            s.google_client_secret = client_secret.to_string();
            s.google_project_id = project_id.to_string();
        } else if client_id.is_empty() && client_secret.is_empty() {
            // Both fields empty clears the persisted client.
            if update.google_client_id.is_some() || update.google_client_secret.is_some() {
                s.google_client_id = String::new();
                s.google_client_secret = String::new();
                s.google_project_id = String::new();
            }
        }
    })?;

    Ok(Json(serde_json::to_value(&updated)?))
}
