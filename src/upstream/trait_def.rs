use crate::activity::Event;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode upstream response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid upstream url: {0}")]
    Url(String),
}

pub type UpstreamResult<T> = Result<T, UpstreamError>;

/// One page of notifications
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    #[serde(default, alias = "notifications")]
    pub events: Vec<Event>,

    /// Continuation token; absent (or empty) on the last page
    #[serde(default, alias = "cursor")]
    pub next_cursor: Option<String>,
}

impl Page {
    /// Next cursor, treating an empty string as absent.
    pub fn cursor(&self) -> Option<&str> {
        self.next_cursor.as_deref().filter(|c| !c.is_empty())
    }
}

/// Subset of an account profile used by the engine
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub did: Option<String>,

    #[serde(default)]
    pub handle: Option<String>,

    /// Account creation time, when the upstream exposes a parsable one
    #[serde(default, deserialize_with = "crate::activity::models::deserialize_instant")]
    pub created_at: Option<DateTime<Utc>>,
}

/// The two upstream operations the activity engine consumes
#[async_trait]
pub trait NotificationSource: Send + Sync {
    /// Fetch one page of notifications, starting at `cursor` when given
    async fn fetch_page(&self, cursor: Option<&str>) -> UpstreamResult<Page>;

    /// Look up a single profile by DID or handle
    async fn get_profile(&self, actor: &str) -> UpstreamResult<Profile>;
}
