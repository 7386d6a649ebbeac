//! Data models for activity summaries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Classification of a notification event
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Reason {
    Like,
    Repost,
    Quote,
    Reply,
    /// Any reason outside the four counted categories (follow, mention, ...)
    Other(String),
}

impl From<String> for Reason {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "like" => Reason::Like,
            "repost" => Reason::Repost,
            "quote" => Reason::Quote,
            "reply" => Reason::Reply,
            _ => Reason::Other(raw),
        }
    }
}

impl From<&str> for Reason {
    fn from(raw: &str) -> Self {
        Reason::from(raw.to_string())
    }
}

impl From<Reason> for String {
    fn from(reason: Reason) -> Self {
        match reason {
            Reason::Like => "like".to_string(),
            Reason::Repost => "repost".to_string(),
            Reason::Quote => "quote".to_string(),
            Reason::Reply => "reply".to_string(),
            Reason::Other(raw) => raw,
        }
    }
}

/// A single notification event as received from upstream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Notification URI
    #[serde(alias = "uri")]
    pub id: String,

    pub reason: Reason,

    /// When the event was indexed upstream. `None` when the upstream value
    /// was missing or not a valid RFC 3339 timestamp.
    #[serde(alias = "indexedAt", default, deserialize_with = "deserialize_instant")]
    pub occurred_at: Option<DateTime<Utc>>,
}

impl Event {
    pub fn new(
        id: impl Into<String>,
        reason: impl Into<Reason>,
        occurred_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: id.into(),
            reason: reason.into(),
            occurred_at,
        }
    }
}

/// Parse an RFC 3339 timestamp, mapping anything unparsable to `None`.
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

pub(crate) fn deserialize_instant<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(s)) => parse_instant(&s),
        _ => None,
    })
}

/// Per-category counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    pub likes: u64,
    pub reposts: u64,
    pub quotes: u64,
    pub replies: u64,
    /// Every counted event, including reasons outside the named categories
    pub total: u64,
}

impl Counts {
    /// Count one event of the given reason.
    pub fn record(&mut self, reason: &Reason) {
        match reason {
            Reason::Like => self.likes += 1,
            Reason::Repost => self.reposts += 1,
            Reason::Quote => self.quotes += 1,
            Reason::Reply => self.replies += 1,
            Reason::Other(_) => {}
        }
        self.total += 1;
    }
}

/// Counters for one time slot of a period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    /// Grouping identity and chronological sort key
    pub key: String,

    #[serde(flatten)]
    pub counts: Counts,
}

impl Bucket {
    pub fn empty(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            counts: Counts::default(),
        }
    }
}

/// Truncation unit for bucket keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Hour,
    Day,
    Month,
    Year,
}

/// Reporting period
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    Week,
    Month,
    Year,
    All,
}

impl Period {
    pub const ALL: [Period; 5] = [
        Period::Day,
        Period::Week,
        Period::Month,
        Period::Year,
        Period::All,
    ];
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
            Period::Year => "year",
            Period::All => "all",
        };
        f.write_str(name)
    }
}

/// Buckets per period, each list ascending by key
pub type Timeline = BTreeMap<Period, Vec<Bucket>>;

/// Activity summary returned to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub generated_at: DateTime<Utc>,

    /// Left edge of the `all` period
    pub since: DateTime<Utc>,

    pub periods: Timeline,

    /// Granularity used by each period's keys
    pub granularity: BTreeMap<Period, Granularity>,

    /// Counters over the entire event sequence, not windowed
    pub totals: Counts,

    pub total_event_count: u64,
}
