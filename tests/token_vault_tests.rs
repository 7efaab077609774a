// Token vault load/refresh/persist behavior against a mock token endpoint

use chrono::{Duration, Utc};
use luach::oauth::vault::TokenVault;
use luach::oauth::{token_file_name, AccountToken, SCOPES};
use serde_json::json;
use tempfile::tempdir;

fn expired_token(token_uri: &str, refresh_token: &str) -> AccountToken {
    AccountToken {
        token: "ya29.stale".to_string(),
        refresh_token: refresh_token.to_string(),
        token_uri: token_uri.to_string(),
        client_id: "id.apps.googleusercontent.com".to_string(),
        client_secret: "client-secret".to_string(),
        scopes: SCOPES.iter().map(|s| s.to_string()).collect(),
        expiry: (Utc::now() - Duration::hours(2)).to_rfc3339(),
    }
}

fn write_token_file(dir: &std::path::Path, email: &str, token: &AccountToken) -> std::path::PathBuf {
    let path = dir.join(token_file_name(email));
    std::fs::write(&path, serde_json::to_string_pretty(token).unwrap()).unwrap();
    path
}

#[tokio::test]
async fn expired_token_with_refresh_token_is_refreshed_and_persisted() {
    let mut server = mockito::Server::new_async().await;
    let token_uri = format!("{}/token", server.url());

    let mock = server
        .mock("POST", "/token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "access_token": "ya29.fresh",
                "expires_in": 3600,
                "token_type": "Bearer"
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let dir = tempdir().unwrap();
    let path = write_token_file(
        dir.path(),
        "me@example.com",
        &expired_token(&token_uri, "1//01refresh"),
    );

    let vault = TokenVault::new(dir.path().to_path_buf(), reqwest::Client::new());
    let tokens = vault.load_all().await;

    mock.assert_async().await;
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].token, "ya29.fresh");
    assert!(tokens[0].is_valid());
    // The refresh token survives the exchange.
    assert_eq!(tokens[0].refresh_token, "1//01refresh");

    // The on-disk file was updated in place.
    let on_disk: AccountToken =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk.token, "ya29.fresh");
    assert!(on_disk.is_valid());
}

#[tokio::test]
async fn expired_token_without_refresh_token_is_dropped() {
    let dir = tempdir().unwrap();
    write_token_file(
        dir.path(),
        "me@example.com",
        &expired_token("http://127.0.0.1:9/token", ""),
    );

    let vault = TokenVault::new(dir.path().to_path_buf(), reqwest::Client::new());
    let tokens = vault.load_all().await;

    assert!(tokens.is_empty());
}

#[tokio::test]
async fn refresh_failure_drops_only_that_credential() {
    let mut server = mockito::Server::new_async().await;
    let token_uri = format!("{}/token", server.url());

    server
        .mock("POST", "/token")
        .with_status(400)
        .with_body(json!({"error": "invalid_grant"}).to_string())
        .create_async()
        .await;

    let dir = tempdir().unwrap();
    write_token_file(
        dir.path(),
        "broken@example.com",
        &expired_token(&token_uri, "1//01revoked"),
    );

    let mut healthy = expired_token(&token_uri, "1//01unused");
    healthy.token = "ya29.current".to_string();
    healthy.expiry = (Utc::now() + Duration::hours(1)).to_rfc3339();
    write_token_file(dir.path(), "healthy@example.com", &healthy);

    let vault = TokenVault::new(dir.path().to_path_buf(), reqwest::Client::new());
    let tokens = vault.load_all().await;

    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].token, "ya29.current");
}

#[tokio::test]
async fn unreadable_token_file_is_skipped() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("token_junk.json"), "{not a token").unwrap();

    let vault = TokenVault::new(dir.path().to_path_buf(), reqwest::Client::new());
    assert!(vault.load_all().await.is_empty());
}

#[tokio::test]
async fn save_names_the_file_after_the_email() {
    let dir = tempdir().unwrap();
    let vault = TokenVault::new(dir.path().to_path_buf(), reqwest::Client::new());

    let mut token = expired_token("http://127.0.0.1:9/token", "1//01x");
    token.expiry = (Utc::now() + Duration::hours(1)).to_rfc3339();

    let path = vault.save(&token, "Person@Example.COM").await.unwrap();
    assert_eq!(
        path.file_name().and_then(|n| n.to_str()),
        Some("token_person_example_com.json")
    );
    assert!(path.exists());
}
