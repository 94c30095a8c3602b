use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use icsmirror_core::SyncConfig;
use icsmirror_core::config::DEFAULT_SYNC_MARKER;
use serde::Deserialize;

const DEFAULT_CREDENTIALS_PATH: &str = "~/.config/icsmirror/credentials.json";
const DEFAULT_TOKEN_PATH: &str = "~/.config/icsmirror/token.json";
const DEFAULT_REQUEST_TIMEOUT: &str = "60s";

/// On-disk shape of ~/.config/icsmirror/config.toml
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    feed_url: Option<String>,
    calendar_id: Option<String>,
    #[serde(default = "default_sync_marker")]
    sync_marker: String,
    #[serde(default = "default_credentials_path")]
    credentials_path: String,
    #[serde(default = "default_token_path")]
    token_path: String,
    #[serde(default = "default_request_timeout")]
    request_timeout: String,
}

fn default_sync_marker() -> String {
    DEFAULT_SYNC_MARKER.to_string()
}

fn default_credentials_path() -> String {
    DEFAULT_CREDENTIALS_PATH.to_string()
}

fn default_token_path() -> String {
    DEFAULT_TOKEN_PATH.to_string()
}

fn default_request_timeout() -> String {
    DEFAULT_REQUEST_TIMEOUT.to_string()
}

/// Process configuration, with paths expanded and the timeout parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub feed_url: Option<String>,
    pub calendar_id: Option<String>,
    pub sync_marker: String,
    pub credentials_path: PathBuf,
    pub token_path: PathBuf,
    pub request_timeout: Duration,
}

impl AppConfig {
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("icsmirror");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from `path`, or from the default location.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if !path.exists() {
            anyhow::bail!(
                "Config not found at {}.\n\n\
                Create it with:\n\n\
                feed_url = \"https://example.com/calendar.ics\"\n\
                calendar_id = \"your-calendar@group.calendar.google.com\"",
                path.display()
            );
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(contents)?;

        let request_timeout = humantime::parse_duration(&file.request_timeout)
            .with_context(|| format!("Invalid request_timeout '{}'", file.request_timeout))?;

        Ok(AppConfig {
            feed_url: file.feed_url,
            calendar_id: file.calendar_id,
            sync_marker: file.sync_marker,
            credentials_path: expand(&file.credentials_path),
            token_path: expand(&file.token_path),
            request_timeout,
        })
    }

    /// Command-line values replace what the file says.
    pub fn with_overrides(mut self, feed_url: Option<String>, calendar_id: Option<String>) -> Self {
        if feed_url.is_some() {
            self.feed_url = feed_url;
        }
        if calendar_id.is_some() {
            self.calendar_id = calendar_id;
        }
        self
    }

    pub fn feed_url(&self) -> Result<&str> {
        self.feed_url
            .as_deref()
            .context("No feed_url configured (set it in config.toml or pass --feed-url)")
    }

    pub fn sync_config(&self) -> Result<SyncConfig> {
        let calendar_id = self
            .calendar_id
            .as_deref()
            .context("No calendar_id configured (set it in config.toml or pass --calendar)")?;

        Ok(SyncConfig::new(calendar_id, self.sync_marker.as_str()))
    }
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}
