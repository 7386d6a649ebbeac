use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use skypulse::api::{self, AppState};
use skypulse::clock::SystemClock;
use skypulse::config::Config;
use skypulse::upstream::build_http_client;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("skypulse=info,tower_http=info")),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration");

    let http = build_http_client(Duration::from_secs(config.upstream.timeout_secs))?;

    info!(
        "Default upstream service: {} (page limit {})",
        config.upstream.service_url, config.upstream.page_limit
    );
    if config.cors.allowed_origins.is_empty() {
        info!("CORS: any origin allowed");
    } else {
        info!("CORS: allowed origins {:?}", config.cors.allowed_origins);
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(AppState {
        config: Arc::new(config),
        http,
        clock: Arc::new(SystemClock),
    });
    let router = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🚀 skypulse listening on http://{}", addr);
    info!("   - Activity summary at http://{}/activity", addr);

    axum::serve(listener, router).await?;

    Ok(())
}
