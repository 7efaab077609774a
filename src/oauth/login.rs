// OAuth consent flow (installed-app, loopback redirect)

use anyhow::{anyhow, Context, Result};
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use tracing::{debug, info};

use super::vault::TokenVault;
use super::{AccountToken, CredentialStore, SCOPES};
use crate::cache::TtlCache;
use crate::google::GoogleClient;
use crate::settings::SettingsStore;

/// Run the consent flow for one Google account.
///
/// Resolves the active client configuration, walks the user through the
/// browser consent screen, exchanges the returned code, names the token
/// file after the account's own email, and optionally records the account
/// under a `personal`/`business` label in the persisted settings.
pub async fn run(
    store: &CredentialStore,
    vault: &TokenVault,
    google: &GoogleClient,
    settings: &SettingsStore,
    cache: &TtlCache,
    label: Option<&str>,
) -> Result<()> {
    let client = store
        .resolve()
        .filter(|c| c.is_usable())
        .ok_or_else(|| anyhow!("OAuth client not configured; set credentials first"))?;

    info!("Starting OAuth consent flow...");

    // Find an available port for the callback server
    let listener =
        TcpListener::bind("127.0.0.1:0").context("Failed to bind local callback server")?;
    let port = listener.local_addr()?.port();
    let redirect_uri = format!("http://localhost:{}/oauth2callback", port);

    debug!("Callback server listening on port {}", port);

    // Generate PKCE code verifier and challenge
    let code_verifier = generate_code_verifier();
    let code_challenge = generate_code_challenge(&code_verifier);

    // Build authorization URL
    let state = generate_state();
    let auth_url = format!(
        "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent&state={}&code_challenge={}&code_challenge_method=S256",
        client.auth_uri,
        urlencoding::encode(&client.client_id),
        urlencoding::encode(&redirect_uri),
        urlencoding::encode(&SCOPES.join(" ")),
        urlencoding::encode(&state),
        urlencoding::encode(&code_challenge),
    );

    // Open browser
    println!("\nOpening browser for Google authentication...");
    println!("If browser doesn't open, visit:\n{}\n", auth_url);

    if let Err(e) = open::that(&auth_url) {
        eprintln!("Warning: Could not open browser automatically: {}", e);
        println!("Please copy the URL above and paste it in your browser.");
    }

    // Wait for OAuth callback
    println!("Waiting for authentication...");

    let (code, returned_state) = wait_for_callback(&listener)?;

    // Verify CSRF state
    if returned_state != state {
        return Err(anyhow!("CSRF state mismatch - possible security issue"));
    }

    debug!("Received authorization code, exchanging for tokens...");

    let token = exchange_code(&client, &code, &redirect_uri, &code_verifier).await?;

    // Name the token file after the account's own address.
    let email = google
        .profile_email(&token)
        .await
        .unwrap_or_else(|_| label.unwrap_or("account").to_string());

    let path = vault
        .save(&token, &email)
        .await
        .map_err(|e| anyhow!("Failed to persist token: {}", e))?;

    if let Some(label) = label.filter(|l| *l == "personal" || *l == "business") {
        let email = email.clone();
        let is_personal = label == "personal";
        settings
            .update(move |s| {
                if is_personal {
                    s.personal = email;
                } else {
                    s.business = email;
                }
            })
            .map_err(|e| anyhow!("Failed to record account label: {}", e))?;
    }

    // Fresh account means stale aggregations.
    cache.invalidate("emails:");
    cache.invalidate("cal:");

    println!("\n✓ Authentication successful!");
    println!("  Account: {}", email);
    println!("  Token saved to: {}", path.display());

    Ok(())
}

/// Generate a random code verifier for PKCE
fn generate_code_verifier() -> String {
    use ring::rand::{SecureRandom, SystemRandom};
    let rng = SystemRandom::new();
    let mut bytes = [0u8; 32];
    rng.fill(&mut bytes)
        .expect("Failed to generate random bytes");
    base64::Engine::encode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, bytes)
}

/// Generate code challenge from verifier (SHA256)
fn generate_code_challenge(verifier: &str) -> String {
    use sha2::{Digest, Sha256};
    let hash = Sha256::digest(verifier.as_bytes());
    base64::Engine::encode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, hash)
}

/// Generate random state for CSRF protection
fn generate_state() -> String {
    use ring::rand::{SecureRandom, SystemRandom};
    let rng = SystemRandom::new();
    let mut bytes = [0u8; 32];
    rng.fill(&mut bytes)
        .expect("Failed to generate random bytes");
    hex::encode(bytes)
}

/// Wait for OAuth callback on the local server
fn wait_for_callback(listener: &TcpListener) -> Result<(String, String)> {
    listener.set_nonblocking(false)?;

    for stream in listener.incoming() {
        let mut stream = stream.context("Failed to accept connection")?;

        let mut reader = BufReader::new(&stream);
        let mut request_line = String::new();
        reader.read_line(&mut request_line)?;

        if !request_line.starts_with("GET /oauth2callback") {
            let response = "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n";
            stream.write_all(response.as_bytes())?;
            continue;
        }

        // Extract query parameters
        let query_start = request_line.find('?').unwrap_or(request_line.len());
        let query_end = request_line.find(" HTTP").unwrap_or(request_line.len());
        let query = &request_line[query_start + 1..query_end];

        let mut code = None;
        let mut state = None;
        let mut error = None;

        for param in query.split('&') {
            if let Some((key, value)) = param.split_once('=') {
                match key {
                    "code" => code = Some(urlencoding::decode(value)?.into_owned()),
                    "state" => state = Some(urlencoding::decode(value)?.into_owned()),
                    "error" => error = Some(urlencoding::decode(value)?.into_owned()),
                    _ => {}
                }
            }
        }

        if let Some(err) = error {
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n\
                <html><body><h1>Authentication Failed</h1><p>Error: {}</p>\
                <p>You can close this tab.</p></body></html>",
                err
            );
            stream.write_all(response.as_bytes())?;
            return Err(anyhow!("OAuth error: {}", err));
        }

        let response = "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n\
            <html><body><h1>Authentication Successful!</h1>\
            <p>You can close this tab and return to the terminal.</p></body></html>";
        stream.write_all(response.as_bytes())?;

        if let (Some(c), Some(s)) = (code, state) {
            return Ok((c, s));
        }

        return Err(anyhow!("Missing code or state in callback"));
    }

    Err(anyhow!("Callback server stopped unexpectedly"))
}

/// Exchange the authorization code for a persisted-format account token.
async fn exchange_code(
    client_config: &super::ClientConfig,
    code: &str,
    redirect_uri: &str,
    code_verifier: &str,
) -> Result<AccountToken> {
    let client = reqwest::Client::new();

    let params = [
        ("client_id", client_config.client_id.as_str()),
        ("client_secret", client_config.client_secret.as_str()),
        ("code", code),
        ("redirect_uri", redirect_uri),
        ("grant_type", "authorization_code"),
        ("code_verifier", code_verifier),
    ];

    let response = client
        .post(&client_config.token_uri)
        .form(&params)
        .send()
        .await
        .context("Failed to send token request")?;

    if !response.status().is_success() {
        let error_text = response.text().await.unwrap_or_default();
        return Err(anyhow!("Token exchange failed: {}", error_text));
    }

    #[derive(serde::Deserialize)]
    struct TokenResponse {
        access_token: String,
        refresh_token: Option<String>,
        expires_in: Option<i64>,
        scope: Option<String>,
    }

    let token_response: TokenResponse = response
        .json()
        .await
        .context("Failed to parse token response")?;

    let expiry = (chrono::Utc::now()
        + chrono::Duration::seconds(token_response.expires_in.unwrap_or(3600)))
    .to_rfc3339();

    let scopes = token_response
        .scope
        .map(|s| s.split(' ').map(|p| p.to_string()).collect())
        .unwrap_or_else(|| SCOPES.iter().map(|s| s.to_string()).collect());

    Ok(AccountToken {
        token: token_response.access_token,
        refresh_token: token_response.refresh_token.unwrap_or_default(),
        token_uri: client_config.token_uri.clone(),
        client_id: client_config.client_id.clone(),
        client_secret: client_config.client_secret.clone(),
        scopes,
        expiry,
    })
}
