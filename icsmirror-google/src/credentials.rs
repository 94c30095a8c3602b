//! OAuth client credentials, as downloaded from the Google Cloud console.

use std::path::Path;

use anyhow::{Context, Result};
use oauth2::basic::BasicClient;
use oauth2::{AuthType, AuthUrl, ClientId, EndpointNotSet, EndpointSet, RedirectUrl, TokenUrl};
use serde::Deserialize;

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// OAuth client with the consent and token endpoints configured.
pub type GoogleOAuthClient =
    BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// The console wraps the credentials in `installed` (desktop apps) or `web`.
#[derive(Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

impl ClientSecret {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!(
                "Google client credentials not found at {}.\n\n\
                Create an OAuth client of type \"Desktop app\" at\n\
                https://console.cloud.google.com/apis/credentials\n\
                and save the downloaded JSON there.",
                path.display()
            );
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read credentials from {}", path.display()))?;

        Self::from_json(&contents)
            .with_context(|| format!("Failed to parse credentials from {}", path.display()))
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let file: ClientSecretFile = serde_json::from_str(contents)?;

        file.installed
            .or(file.web)
            .context("Expected an \"installed\" or \"web\" section")
    }

    /// OAuth client for these credentials, redirecting to `redirect_uri`.
    ///
    /// The secret travels in the request body, the way Google documents its
    /// token endpoint.
    pub fn oauth_client(&self, redirect_uri: &str) -> Result<GoogleOAuthClient> {
        Ok(BasicClient::new(ClientId::new(self.client_id.clone()))
            .set_client_secret(oauth2::ClientSecret::new(self.client_secret.clone()))
            .set_auth_uri(
                AuthUrl::new(self.auth_uri.clone())
                    .context("Invalid auth_uri in client credentials")?,
            )
            .set_token_uri(
                TokenUrl::new(self.token_uri.clone())
                    .context("Invalid token_uri in client credentials")?,
            )
            .set_redirect_uri(
                RedirectUrl::new(redirect_uri.to_string()).context("Invalid redirect URI")?,
            )
            .set_auth_type(AuthType::RequestBody))
    }
}

/// HTTP client for the token endpoint. Redirects are not followed.
pub(crate) fn token_http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .context("Failed to build HTTP client for the token endpoint")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_installed_layout() {
        let secret = ClientSecret::from_json(
            r#"{"installed": {
                "client_id": "id.apps.googleusercontent.com",
                "client_secret": "shh",
                "token_uri": "https://oauth2.googleapis.com/token",
                "redirect_uris": ["http://localhost"]
            }}"#,
        )
        .unwrap();

        assert_eq!(secret.client_id, "id.apps.googleusercontent.com");
        assert_eq!(secret.auth_uri, DEFAULT_AUTH_URI);
    }

    #[test]
    fn test_web_layout() {
        let secret =
            ClientSecret::from_json(r#"{"web": {"client_id": "web-id", "client_secret": "s"}}"#)
                .unwrap();
        assert_eq!(secret.client_id, "web-id");
        assert_eq!(secret.token_uri, DEFAULT_TOKEN_URI);
    }

    #[test]
    fn test_malformed_token_uri_is_rejected() {
        let secret = ClientSecret {
            client_id: "id".to_string(),
            client_secret: "s".to_string(),
            auth_uri: DEFAULT_AUTH_URI.to_string(),
            token_uri: "not a url".to_string(),
        };

        let err = secret
            .oauth_client("http://localhost:8085/callback")
            .err()
            .unwrap();
        assert!(err.to_string().contains("token_uri"));
    }

    #[test]
    fn test_unknown_layout_is_rejected() {
        assert!(ClientSecret::from_json(r#"{"client_id": "bare"}"#).is_err());
    }
}
