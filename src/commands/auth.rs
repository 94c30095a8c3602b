use anyhow::Result;
use icsmirror_google::{ClientSecret, authenticate};

use crate::config::AppConfig;

pub async fn run(config: &AppConfig) -> Result<()> {
    let secret = ClientSecret::load(&config.credentials_path)?;
    authenticate::handle(&secret, &config.token_path).await
}
