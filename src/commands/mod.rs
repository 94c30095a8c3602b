pub mod auth;
pub mod check;
pub mod sync;

use anyhow::Result;
use icsmirror_core::CalendarEntry;

use crate::config::AppConfig;
use crate::feed;

/// Download and normalize the configured feed.
pub async fn load_feed(config: &AppConfig) -> Result<Vec<CalendarEntry>> {
    let content = feed::fetch(config.feed_url()?, config.request_timeout).await?;
    let entries = icsmirror_core::ics::parse_feed(&content)?;

    tracing::info!(count = entries.len(), "Fetched events from feed");
    Ok(entries)
}
