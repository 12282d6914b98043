mod cache;
mod config;
mod constants;
mod facebook;
mod models;
mod token;

use std::error::Error;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::cache::FileCache;
use crate::facebook::FacebookAPI;
use crate::models::PageCredentials;
use crate::token::TokenService;

async fn run() -> Result<PageCredentials, Box<dyn Error>> {
    // Load configuration
    let config = config::Config::from_env()?;

    info!(
        app = %config.credentials.app_name,
        cache_dir = %config.cache_dir.display(),
        "acquiring page credentials"
    );

    let api = FacebookAPI::new(&config)?;
    let cache = FileCache::new(config.cache_dir.clone());
    let service = TokenService::new(config.credentials, config.page, cache, api);

    Ok(service.acquire().await?)
}

#[tokio::main]
async fn main() -> ExitCode {
    // LOG_LEVEL wins over RUST_LOG, default info
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    report(run().await)
}

/// Logs the outcome once and maps it to the process exit status.
fn report(outcome: Result<PageCredentials, Box<dyn Error>>) -> ExitCode {
    match outcome {
        Ok(page) => {
            info!(
                page_id = %page.page_id,
                token_len = page.page_access_token.len(),
                "page access token available"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "token acquisition failed");
            ExitCode::FAILURE
        }
    }
}
