use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::trait_def::{NotificationSource, Page, Profile, UpstreamError, UpstreamResult};

const LIST_NOTIFICATIONS: &str = "app.bsky.notification.listNotifications";
const GET_PROFILE: &str = "app.bsky.actor.getProfile";

/// Longest upstream error body kept for logging
const MAX_ERROR_BODY: usize = 512;

/// Build the shared HTTP client used for every upstream request
pub fn build_http_client(timeout: Duration) -> anyhow::Result<Client> {
    Client::builder()
        .user_agent(concat!("skypulse/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
        .context("failed to build HTTP client for upstream requests")
}

/// Normalize a user-supplied service URL.
///
/// Returns `None` when nothing usable remains after trimming.
pub fn normalize_service_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return None;
    }

    if trimmed.contains("://") {
        Some(trimmed.to_string())
    } else {
        Some(format!("https://{trimmed}"))
    }
}

/// XRPC client bound to one credential and service for the lifetime of a request
#[derive(Clone)]
pub struct XrpcClient {
    client: Client,
    service_url: String,
    credential: String,
    page_limit: u32,
}

impl XrpcClient {
    pub fn new(
        client: Client,
        service_url: impl Into<String>,
        credential: impl Into<String>,
        page_limit: u32,
    ) -> Self {
        Self {
            client,
            service_url: service_url.into(),
            credential: credential.into(),
            page_limit: page_limit.clamp(1, 100),
        }
    }

    pub fn service_url(&self) -> &str {
        &self.service_url
    }

    fn endpoint(&self, method: &str, params: &[(&str, &str)]) -> UpstreamResult<Url> {
        let base = format!("{}/xrpc/{}", self.service_url, method);
        Url::parse_with_params(&base, params).map_err(|e| UpstreamError::Url(format!("{base}: {e}")))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> UpstreamResult<T> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.credential)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let mut text = String::from_utf8_lossy(&body).into_owned();
            if text.len() > MAX_ERROR_BODY {
                let mut end = MAX_ERROR_BODY;
                while !text.is_char_boundary(end) {
                    end -= 1;
                }
                text.truncate(end);
            }
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl NotificationSource for XrpcClient {
    async fn fetch_page(&self, cursor: Option<&str>) -> UpstreamResult<Page> {
        let limit = self.page_limit.to_string();
        let mut params = vec![("limit", limit.as_str())];
        if let Some(cursor) = cursor {
            params.push(("cursor", cursor));
        }

        let url = self.endpoint(LIST_NOTIFICATIONS, &params)?;
        let page: Page = self.get_json(url).await?;
        debug!(
            events = page.events.len(),
            has_cursor = page.cursor().is_some(),
            "fetched notification page"
        );
        Ok(page)
    }

    async fn get_profile(&self, actor: &str) -> UpstreamResult<Profile> {
        let url = self.endpoint(GET_PROFILE, &[("actor", actor)])?;
        self.get_json(url).await
    }
}
