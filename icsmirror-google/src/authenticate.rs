//! One-time OAuth consent through a loopback redirect.

use std::path::Path;

use anyhow::{Context, Result};
use oauth2::basic::BasicTokenResponse;
use oauth2::{AuthorizationCode, CsrfToken, Scope, TokenResponse};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

use crate::credentials::{self, ClientSecret};
use crate::session::{self, Session};

pub const SCOPES: &[&str] = &["https://www.googleapis.com/auth/calendar"];

const REDIRECT_PORT: u16 = 8085;

pub fn redirect_uri() -> String {
    format!("http://localhost:{}/callback", REDIRECT_PORT)
}

pub fn redirect_address() -> String {
    format!("127.0.0.1:{}", REDIRECT_PORT)
}

/// Consent URL asking for offline access, so Google hands out a refresh token.
pub fn consent_url(secret: &ClientSecret, state: &str) -> Result<url::Url> {
    let client = secret.oauth_client(&redirect_uri())?;

    let (url, _) = client
        .authorize_url(|| CsrfToken::new(state.to_string()))
        .add_scopes(SCOPES.iter().map(|scope| Scope::new(scope.to_string())))
        .add_extra_param("access_type", "offline")
        .add_extra_param("prompt", "consent")
        .url();

    Ok(url)
}

/// Run the consent flow and cache the resulting token at `token_path`.
pub async fn handle(secret: &ClientSecret, token_path: &Path) -> Result<()> {
    let state = uuid::Uuid::new_v4().to_string();
    let auth_url = consent_url(secret, &state)?;

    // Listen before the browser can redirect
    let listener = TcpListener::bind(redirect_address())
        .await
        .context("Failed to bind OAuth callback listener")?;

    eprintln!("\nOpen this URL in your browser to authenticate:\n");
    eprintln!("{}\n", auth_url);

    if open::that(auth_url.as_str()).is_err() {
        eprintln!("(Could not open browser automatically, please copy the URL above)");
    }

    let (code, returned_state) = wait_for_callback(listener).await?;
    if returned_state != state {
        anyhow::bail!("OAuth state mismatch, please retry");
    }

    eprintln!("\nReceived authorization code, exchanging for tokens...");

    let tokens = exchange_code(secret, code).await?;
    session_from(&tokens, token_path)?.save()?;

    tracing::info!(path = %token_path.display(), "Saved Google token");
    eprintln!("Authentication successful!");

    Ok(())
}

/// Trade the authorization code for tokens at the token endpoint.
async fn exchange_code(secret: &ClientSecret, code: String) -> Result<BasicTokenResponse> {
    let client = secret.oauth_client(&redirect_uri())?;
    let http = credentials::token_http_client()?;

    client
        .exchange_code(AuthorizationCode::new(code))
        .request_async(&http)
        .await
        .context("Token exchange failed")
}

fn session_from(tokens: &BasicTokenResponse, token_path: &Path) -> Result<Session> {
    let refresh_token = tokens
        .refresh_token()
        .context("Google returned no refresh token; revoke the app's access and retry")?;

    Ok(Session::from_tokens(
        token_path,
        tokens.access_token().secret().clone(),
        refresh_token.secret().clone(),
        session::token_lifetime(tokens),
    ))
}

async fn wait_for_callback(listener: TcpListener) -> Result<(String, String)> {
    let (stream, _) = listener
        .accept()
        .await
        .context("Failed to accept OAuth callback")?;

    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    reader
        .read_line(&mut request_line)
        .await
        .context("Failed to read OAuth callback request line")?;

    let params = parse_callback(&request_line);

    let body = if params.is_ok() {
        "<h1>Authentication successful!</h1>\
        <p>You can close this window and return to the terminal.</p>"
    } else {
        "<h1>Authentication failed</h1>\
        <p>Check the terminal for details.</p>"
    };
    let response = format!(
        "HTTP/1.1 200 OK\r\n\
        Content-Type: text/html\r\n\
        Connection: close\r\n\
        \r\n\
        <html><body>{}</body></html>",
        body
    );

    let mut stream = reader.into_inner();
    stream
        .write_all(response.as_bytes())
        .await
        .context("Failed to write OAuth callback response")?;
    stream.flush().await?;

    params
}

/// Pull `code` and `state` out of the callback's request line.
fn parse_callback(request_line: &str) -> Result<(String, String)> {
    let url_part = request_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("Invalid HTTP request"))?;

    let url = url::Url::parse(&format!("http://localhost{}", url_part))?;
    let param = |name: &str| {
        url.query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.to_string())
    };

    if let Some(error) = param("error") {
        anyhow::bail!("Google denied access: {}", error);
    }

    let code = param("code").ok_or_else(|| anyhow::anyhow!("No code in callback"))?;
    let state = param("state").ok_or_else(|| anyhow::anyhow!("No state in callback"))?;

    Ok((code, state))
}
