use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub session: SessionConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Service used when a request carries no override
    pub service_url: String,
    /// Notifications requested per page (1..=100)
    pub page_limit: u32,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Name of the cookie holding session data
    pub cookie_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Allowed origins; empty allows any origin
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl UpstreamConfig {
    pub const DEFAULT_SERVICE_URL: &'static str = "https://bsky.social";
    pub const MAX_PAGE_LIMIT: u32 = 100;
    const DEFAULT_TIMEOUT_SECS: u64 = 15;
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            upstream: UpstreamConfig {
                service_url: UpstreamConfig::DEFAULT_SERVICE_URL.to_string(),
                page_limit: UpstreamConfig::MAX_PAGE_LIMIT,
                timeout_secs: UpstreamConfig::DEFAULT_TIMEOUT_SECS,
            },
            session: SessionConfig {
                cookie_name: "session".to_string(),
            },
            cors: CorsConfig::default(),
        }
    }
}

fn parse_env<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{name} must be a valid number, got '{raw}'")),
        _ => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Config::default();

        let host = std::env::var("SKYPULSE_HOST").unwrap_or(defaults.server.host);
        let port = parse_env("SKYPULSE_PORT", defaults.server.port)?;

        let service_url = std::env::var("SKYPULSE_SERVICE_URL")
            .ok()
            .and_then(|raw| crate::upstream::normalize_service_url(&raw))
            .unwrap_or(defaults.upstream.service_url);

        let page_limit = parse_env("SKYPULSE_PAGE_LIMIT", defaults.upstream.page_limit)?;
        if !(1..=UpstreamConfig::MAX_PAGE_LIMIT).contains(&page_limit) {
            tracing::warn!(
                "SKYPULSE_PAGE_LIMIT={page_limit} is outside 1..={}, clamping",
                UpstreamConfig::MAX_PAGE_LIMIT
            );
        }
        let page_limit = page_limit.clamp(1, UpstreamConfig::MAX_PAGE_LIMIT);

        let timeout_secs = parse_env(
            "SKYPULSE_UPSTREAM_TIMEOUT_SECS",
            defaults.upstream.timeout_secs,
        )?;

        let cookie_name = std::env::var("SKYPULSE_SESSION_COOKIE")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.session.cookie_name);

        let allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Config {
            server: ServerConfig { host, port },
            upstream: UpstreamConfig {
                service_url,
                page_limit,
                timeout_secs,
            },
            session: SessionConfig { cookie_name },
            cors: CorsConfig { allowed_origins },
        })
    }
}
