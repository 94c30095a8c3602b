use anyhow::Result;
use icsmirror_core::{Reconciler, SyncReport};
use icsmirror_google::{ClientSecret, GoogleCalendar, Session};
use owo_colors::OwoColorize;

use crate::config::AppConfig;

pub async fn run(config: &AppConfig) -> Result<()> {
    let sync_config = config.sync_config()?;

    let secret = ClientSecret::load(&config.credentials_path)?;
    let session = Session::load_valid(&config.token_path, &secret).await?;

    let entries = super::load_feed(config).await?;

    let calendar = GoogleCalendar::new(
        &sync_config.calendar_id,
        session.access_token(),
        config.request_timeout,
    )?;
    let report = Reconciler::new(&calendar, &sync_config).run(entries).await?;

    let (summary, exceptions) = summary_lines(&report);
    if report.total_errors() == 0 {
        println!("{}", summary.green());
    } else {
        println!("{}", summary.yellow());
    }
    println!("{}", exceptions);

    Ok(())
}

fn summary_lines(report: &SyncReport) -> (String, String) {
    (
        format!(
            "Sync complete: {} created, {} updated, {} deleted, {} errors",
            report.created,
            report.updated,
            report.deleted,
            report.total_errors()
        ),
        format!("  Exception instances updated: {}", report.exceptions_updated),
    )
}
