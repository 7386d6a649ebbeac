use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    response::IntoResponse,
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::activity;
use crate::auth::{resolve_credentials, Overrides};
use crate::clock::Clock;
use crate::config::Config;
use crate::error::ApiError;
use crate::upstream::{normalize_service_url, XrpcClient};

pub struct AppState {
    pub config: Arc<Config>,
    /// Shared upstream HTTP client
    pub http: reqwest::Client,
    pub clock: Arc<dyn Clock>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ActivityQuery {
    /// Account DID used for the profile lookup
    pub did: Option<String>,
    /// Service URL override
    pub pds: Option<String>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Summarize the caller's notification activity
pub async fn get_activity(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ActivityQuery>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let credentials = resolve_credentials(
        &headers,
        &jar,
        &state.config.session.cookie_name,
        Overrides {
            did: query.did.as_deref(),
            service_url: query.pds.as_deref(),
        },
    )?;

    let service_url = credentials
        .service_url
        .as_deref()
        .and_then(normalize_service_url)
        .unwrap_or_else(|| state.config.upstream.service_url.clone());

    let client = XrpcClient::new(
        state.http.clone(),
        service_url,
        credentials.access_token,
        state.config.upstream.page_limit,
    );

    let now = state.clock.now();
    let summary = activity::summarize(&client, credentials.did.as_deref(), now).await?;

    info!(
        service = client.service_url(),
        events = summary.total_event_count,
        "served activity summary"
    );

    Ok(([(header::CACHE_CONTROL, "no-store")], Json(summary)))
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
