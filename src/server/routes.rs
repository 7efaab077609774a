// HTTP routes configuration

use super::handlers;
use super::middleware::request_id_layers;
use crate::cache::TtlCache;
use crate::config::AppConfig;
use crate::google::GoogleClient;
use crate::oauth::accounts::AccountResolver;
use crate::oauth::vault::TokenVault;
use crate::oauth::CredentialStore;
use crate::settings::SettingsStore;
use crate::upstream::UpstreamClient;
use axum::{
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub settings: Arc<SettingsStore>,
    pub cache: Arc<TtlCache>,
    pub credentials: Arc<CredentialStore>,
    pub vault: Arc<TokenVault>,
    pub accounts: Arc<AccountResolver>,
    pub google: Arc<GoogleClient>,
    pub upstream: Arc<UpstreamClient>,
}

pub fn create_router(state: AppState) -> Router {
    let (set_request_id, propagate_request_id) = request_id_layers();

    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/api/time", get(handlers::time_handler))
        .route("/api/status", get(handlers::status_handler))
        .route("/api/accounts", get(handlers::accounts_handler))
        .route("/api/emails", get(handlers::emails_handler))
        .route("/api/email/:id", get(handlers::email_detail_handler))
        .route("/api/calendar", get(handlers::calendar_handler))
        .route("/api/calendar/week", get(handlers::calendar_week_handler))
        .route(
            "/api/calendar/three-day",
            get(handlers::calendar_three_day_handler),
        )
        .route("/api/next-meeting", get(handlers::next_meeting_handler))
        .route("/api/weather", get(handlers::weather_handler))
        .route("/api/news", get(handlers::news_handler))
        .route("/api/aqi", get(handlers::aqi_handler))
        .route("/api/zmanim", get(handlers::zmanim_handler))
        .route("/api/shabbat", get(handlers::shabbat_handler))
        .route("/api/holidays/israel", get(handlers::israel_holidays_handler))
        .route("/api/alerts", get(handlers::alerts_handler))
        .route("/api/red-alert", get(handlers::red_alert_handler))
        .route(
            "/api/credentials",
            get(handlers::credentials_get)
                .post(handlers::credentials_post)
                .delete(handlers::credentials_delete),
        )
        .route(
            "/api/settings",
            get(handlers::settings_get).post(handlers::settings_post),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(propagate_request_id)
        .layer(set_request_id)
        .with_state(state)
}
