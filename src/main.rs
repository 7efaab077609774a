// luach - personal dashboard aggregation server

use anyhow::Result;
use clap::Parser;
use luach::cache::TtlCache;
use luach::cli::Args;
use luach::config::AppConfig;
use luach::google::GoogleClient;
use luach::oauth::accounts::AccountResolver;
use luach::oauth::vault::TokenVault;
use luach::oauth::{login, CredentialStore};
use luach::server::{create_router, AppState};
use luach::settings::SettingsStore;
use luach::upstream::UpstreamClient;
use luach::utils::logging;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Phase 1: Load configuration
    let config = AppConfig::load()?;

    // Phase 2: Initialize logging
    logging::init(&config.logging)?;
    info!("Starting luach v{}", env!("CARGO_PKG_VERSION"));

    // Phase 3: Build shared state (settings, cache, credential stores, clients)
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.upstream.timeout_seconds))
        .connect_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(90))
        .use_rustls_tls()
        .build()?;

    let settings = Arc::new(SettingsStore::new(config.storage.settings_path()));
    let cache = Arc::new(TtlCache::new());
    let credentials = Arc::new(CredentialStore::new(
        settings.clone(),
        config.storage.client_secret_dir.clone(),
    ));
    let vault = Arc::new(TokenVault::new(config.storage.tokens_dir(), http.clone()));
    let google = Arc::new(GoogleClient::new(http.clone(), &config.upstream));
    let accounts = Arc::new(AccountResolver::new(vault.clone(), google.clone()));
    let upstream = Arc::new(UpstreamClient::new(http, config.upstream.clone()));

    // Phase 4: Handle --login flag (OAuth consent flow)
    if args.login {
        login::run(
            &credentials,
            &vault,
            &google,
            &settings,
            &cache,
            args.label.as_deref(),
        )
        .await?;
    }

    // Phase 5: Build and start HTTP server
    let state = AppState {
        config: config.clone(),
        settings,
        cache,
        credentials,
        vault,
        accounts,
        google,
        upstream,
    };
    let app = create_router(state);
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Phase 6: Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
