mod commands;
mod config;
mod feed;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "icsmirror")]
#[command(about = "Mirror an ICS feed into a Google calendar")]
struct Cli {
    /// Config file (default: ~/.config/icsmirror/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mirror the feed into the calendar once
    Sync {
        /// Feed URL, overriding the config file
        #[arg(long)]
        feed_url: Option<String>,

        /// Target calendar id, overriding the config file
        #[arg(short, long)]
        calendar: Option<String>,
    },
    /// Sign in to Google and cache a token
    Auth,
    /// Fetch and parse the feed without syncing
    Check {
        #[arg(long)]
        feed_url: Option<String>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "icsmirror=info,icsmirror_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Sync { feed_url, calendar } => {
            commands::sync::run(&config.with_overrides(feed_url, calendar)).await
        }
        Commands::Auth => commands::auth::run(&config).await,
        Commands::Check { feed_url } => {
            commands::check::run(&config.with_overrides(feed_url, None)).await
        }
    }
}
