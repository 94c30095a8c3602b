//! Cached OAuth tokens, refreshed before they expire.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use oauth2::basic::BasicTokenResponse;
use oauth2::{RefreshToken, TokenResponse};
use serde::{Deserialize, Serialize};

use crate::authenticate;
use crate::credentials::{self, ClientSecret};

/// Refresh when the token has less than this left.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Assumed lifetime when the token endpoint does not say.
const DEFAULT_LIFETIME_SECS: i64 = 3600;

pub struct Session {
    path: PathBuf,
    data: TokenData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenData {
    access_token: String,
    refresh_token: String,
    expires_at: DateTime<Utc>,
}

/// How long a freshly issued access token stays valid.
pub(crate) fn token_lifetime(tokens: &BasicTokenResponse) -> Duration {
    tokens
        .expires_in()
        .and_then(|lifetime| Duration::from_std(lifetime).ok())
        .unwrap_or_else(|| Duration::seconds(DEFAULT_LIFETIME_SECS))
}

impl Session {
    pub fn from_tokens(
        path: &Path,
        access_token: String,
        refresh_token: String,
        lifetime: Duration,
    ) -> Self {
        Session {
            path: path.to_path_buf(),
            data: TokenData {
                access_token,
                refresh_token,
                expires_at: Utc::now() + lifetime,
            },
        }
    }

    /// Load the cached token and refresh it when it is about to expire.
    pub async fn load_valid(path: &Path, secret: &ClientSecret) -> Result<Self> {
        let mut session = Self::load(path)?;

        if session.expires_soon() {
            tracing::debug!("Access token expired, refreshing");
            session.refresh(secret).await?;
        }

        Ok(session)
    }

    fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!(
                "No Google token found at {}. Run `icsmirror auth` first.",
                path.display()
            );
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read Google token from {}", path.display()))?;

        let data: TokenData = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse Google token from {}", path.display()))?;

        Ok(Session {
            path: path.to_path_buf(),
            data,
        })
    }

    pub fn access_token(&self) -> &str {
        &self.data.access_token
    }

    pub fn save(&self) -> Result<()> {
        let contents =
            serde_json::to_string_pretty(&self.data).context("Failed to serialize token")?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write token to {}", self.path.display()))?;

        // Owner-only, the file holds a refresh token
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("Failed to set permissions on {}", self.path.display()))?;
        }

        Ok(())
    }

    fn expires_soon(&self) -> bool {
        Utc::now() + Duration::seconds(EXPIRY_MARGIN_SECS) >= self.data.expires_at
    }

    async fn refresh(&mut self, secret: &ClientSecret) -> Result<()> {
        let client = secret.oauth_client(&authenticate::redirect_uri())?;
        let http = credentials::token_http_client()?;

        let tokens = client
            .exchange_refresh_token(&RefreshToken::new(self.data.refresh_token.clone()))
            .request_async(&http)
            .await
            .context("Failed to refresh Google token. Run `icsmirror auth` to sign in again.")?;

        // Google usually omits the refresh token on refresh
        let refresh_token = tokens
            .refresh_token()
            .map(|token| token.secret().clone())
            .unwrap_or_else(|| self.data.refresh_token.clone());

        self.data = TokenData {
            access_token: tokens.access_token().secret().clone(),
            refresh_token,
            expires_at: Utc::now() + token_lifetime(&tokens),
        };
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{Mock, MockServer, ResponseTemplate, matchers};

    fn secret(token_uri: String) -> ClientSecret {
        ClientSecret {
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            auth_uri: "https://accounts.example.com/auth".to_string(),
            token_uri,
        }
    }

    #[tokio::test]
    async fn test_missing_token_asks_for_auth() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");

        let err = Session::load_valid(&path, &secret("http://unused".to_string()))
            .await
            .err()
            .unwrap();
        assert!(err.to_string().contains("icsmirror auth"));
    }

    #[tokio::test]
    async fn test_fresh_token_is_used_as_is() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        Session::from_tokens(
            &path,
            "fresh".to_string(),
            "refresh".to_string(),
            Duration::seconds(3600),
        )
        .save()
        .unwrap();

        let session = Session::load_valid(&path, &secret("http://unused".to_string()))
            .await
            .unwrap();
        assert_eq!(session.access_token(), "fresh");
    }

    #[tokio::test]
    async fn test_expiring_token_is_refreshed_and_saved() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/token"))
            .and(matchers::body_string_contains("grant_type=refresh_token"))
            .and(matchers::body_string_contains("refresh_token=keep-me"))
            .and(matchers::body_string_contains("client_secret=secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "renewed",
                "expires_in": 3599,
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        Session::from_tokens(
            &path,
            "stale".to_string(),
            "keep-me".to_string(),
            Duration::seconds(30),
        )
        .save()
        .unwrap();

        let session = Session::load_valid(&path, &secret(format!("{}/token", server.uri())))
            .await
            .unwrap();
        assert_eq!(session.access_token(), "renewed");

        let saved: TokenData =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved.access_token, "renewed");
        assert_eq!(saved.refresh_token, "keep-me");
    }

    #[tokio::test]
    async fn test_rejected_refresh_asks_for_auth() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Token has been expired or revoked."
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        Session::from_tokens(
            &path,
            "stale".to_string(),
            "revoked".to_string(),
            Duration::zero(),
        )
        .save()
        .unwrap();

        let err = Session::load_valid(&path, &secret(format!("{}/token", server.uri())))
            .await
            .err()
            .unwrap();
        assert!(err.to_string().contains("icsmirror auth"));

        let saved: TokenData =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved.access_token, "stale");
    }

    #[cfg(unix)]
    #[test]
    fn test_token_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("token.json");
        Session::from_tokens(
            &path,
            "a".to_string(),
            "r".to_string(),
            Duration::seconds(3600),
        )
        .save()
        .unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
