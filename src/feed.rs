//! Downloading the source feed.

use std::time::Duration;

use anyhow::{Context, Result};

pub async fn fetch(url: &str, timeout: Duration) -> Result<String> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")?;

    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to fetch feed from {}", url))?;

    if !response.status().is_success() {
        anyhow::bail!("Feed request to {} failed: HTTP {}", url, response.status());
    }

    let body = response.bytes().await.context("Failed to read feed body")?;

    String::from_utf8(body.to_vec())
        .with_context(|| format!("Feed from {} is not valid UTF-8", url))
}
