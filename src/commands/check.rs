use anyhow::Result;
use icsmirror_core::sync::FeedBatch;
use owo_colors::OwoColorize;

use crate::config::AppConfig;

/// Fetch and normalize the feed without touching the remote calendar.
pub async fn run(config: &AppConfig) -> Result<()> {
    let entries = super::load_feed(config).await?;
    let batch = FeedBatch::from_entries(entries);

    let recurring = batch.masters.values().filter(|e| e.is_recurring()).count();
    let orphans = batch
        .exceptions
        .iter()
        .filter(|e| !batch.masters.contains_key(&e.uid))
        .count();

    println!(
        "Masters/Singles: {}, Exceptions: {}",
        batch.masters.len(),
        batch.exceptions.len()
    );
    println!("  Recurring series: {}", recurring);

    if orphans > 0 {
        println!(
            "  {}",
            format!("{} exceptions have no series in the feed", orphans).yellow()
        );
    }

    Ok(())
}
