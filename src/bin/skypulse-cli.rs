use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use skypulse::activity::{self, models::parse_instant};
use skypulse::auth::did_from_access_token;
use skypulse::clock::{Clock, FixedClock, SystemClock};
use skypulse::config::UpstreamConfig;
use skypulse::upstream::{build_http_client, normalize_service_url, XrpcClient};

#[derive(Parser)]
#[command(name = "skypulse-cli")]
#[command(about = "Print a notification activity summary for one account", long_about = None)]
struct Cli {
    /// Access token for the account
    #[arg(long, env = "SKYPULSE_TOKEN", hide_env_values = true)]
    token: String,

    /// Service (PDS) base URL
    #[arg(long, env = "SKYPULSE_SERVICE_URL", default_value = UpstreamConfig::DEFAULT_SERVICE_URL)]
    service: String,

    /// Account DID for the profile lookup (defaults to the token subject)
    #[arg(long)]
    did: Option<String>,

    /// Notifications per page
    #[arg(long, default_value_t = UpstreamConfig::MAX_PAGE_LIMIT)]
    limit: u32,

    /// Anchor the summary at this RFC 3339 instant instead of the current time
    #[arg(long)]
    now: Option<String>,

    /// Upstream request timeout in seconds
    #[arg(long, default_value_t = 15)]
    timeout_secs: u64,

    /// Print compact JSON
    #[arg(long)]
    compact: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let clock: Box<dyn Clock> = match cli.now.as_deref() {
        Some(raw) => Box::new(FixedClock(
            parse_instant(raw).ok_or_else(|| anyhow!("--now must be an RFC 3339 timestamp"))?,
        )),
        None => Box::new(SystemClock),
    };

    let service = normalize_service_url(&cli.service)
        .ok_or_else(|| anyhow!("--service must not be empty"))?;
    let did = cli.did.clone().or_else(|| did_from_access_token(&cli.token));

    let http = build_http_client(Duration::from_secs(cli.timeout_secs))?;
    let client = XrpcClient::new(http, service, cli.token, cli.limit);

    let summary = activity::summarize(&client, did.as_deref(), clock.now())
        .await
        .context("failed to load activity from upstream service")?;

    let output = if cli.compact {
        serde_json::to_string(&summary)?
    } else {
        serde_json::to_string_pretty(&summary)?
    };
    println!("{output}");

    Ok(())
}
