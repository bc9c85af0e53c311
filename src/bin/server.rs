//! Factor Investing API server
//!
//! Run: cargo run --release --bin server
//! Test: curl http://localhost:3030/api/per-security/nse/infy/indicator/super-trend?period=1y

use std::sync::Arc;

use factor_investing::provider::{SharedProvider, YahooFinance};
use factor_investing::{server, Result, Settings};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    if let Err(e) = run().await {
        error!("server stopped: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let settings = Settings::from_env()?;
    info!("Starting Factor Investing API on http://{}", settings.bind_addr);

    let provider: SharedProvider = Arc::new(YahooFinance::new(
        &settings.provider_base_url,
        settings.provider_timeout,
    )?);
    server::serve(&settings, provider).await
}
