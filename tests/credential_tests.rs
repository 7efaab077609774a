// Credential resolution and account lookup behavior

use luach::config::UpstreamConfig;
use luach::google::GoogleClient;
use luach::oauth::accounts::AccountResolver;
use luach::oauth::vault::TokenVault;
use luach::oauth::CredentialStore;
use luach::settings::SettingsStore;
use std::sync::Arc;
use tempfile::tempdir;

fn store_in(dir: &std::path::Path) -> CredentialStore {
    let settings = Arc::new(SettingsStore::new(dir.join("config.json")));
    CredentialStore::new(settings, dir.to_path_buf())
}

#[test]
fn in_memory_override_wins_over_environment() {
    let dir = tempdir().unwrap();
    let store = store_in(dir.path());

    std::env::set_var("GOOGLE_CLIENT_ID", "env-id");
    std::env::set_var("GOOGLE_CLIENT_SECRET", "env-secret");

    store.set_override("override-id", "override-secret", Some("override-project"));

    let config = store.resolve().expect("a configuration should resolve");
    assert_eq!(config.client_id, "override-id");
    assert_eq!(config.client_secret, "override-secret");
    assert_eq!(config.project_id, "override-project");

    // With the override cleared, the environment tier wins.
    store.clear_override();
    let config = store.resolve().expect("env configuration should resolve");
    assert_eq!(config.client_id, "env-id");

    std::env::remove_var("GOOGLE_CLIENT_ID");
    std::env::remove_var("GOOGLE_CLIENT_SECRET");
}

#[tokio::test]
async fn resolver_returns_none_for_unknown_email() {
    let dir = tempdir().unwrap();
    let vault = Arc::new(TokenVault::new(
        dir.path().join("tokens"),
        reqwest::Client::new(),
    ));
    let google = Arc::new(GoogleClient::new(
        reqwest::Client::new(),
        &UpstreamConfig::default(),
    ));
    let resolver = AccountResolver::new(vault, google);

    // No token files exist, so the forced rebuild finds nothing and the
    // lookup degrades to None instead of an error.
    assert!(resolver.credential_for("missing@x.com").await.is_none());
    assert!(resolver.list(true).await.is_empty());
}
