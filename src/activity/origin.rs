//! Left edge of the unbounded `all` period

use chrono::{DateTime, Utc};

use super::models::Event;

/// Earliest known event instant, ignoring events without a valid timestamp.
pub fn earliest_instant(events: &[Event]) -> Option<DateTime<Utc>> {
    events.iter().filter_map(|event| event.occurred_at).min()
}

/// Resolve where all-time reporting starts.
///
/// Prefers the account's creation time, then the earliest event, then `now`.
pub fn resolve_origin(
    account_created_at: Option<DateTime<Utc>>,
    events: &[Event],
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    account_created_at
        .or_else(|| earliest_instant(events))
        .unwrap_or(now)
}

/// Start of the `all` grid: the earlier of `origin` and the first event, never after `now`.
pub fn all_time_start(origin: DateTime<Utc>, events: &[Event], now: DateTime<Utc>) -> DateTime<Utc> {
    earliest_instant(events)
        .map_or(origin, |earliest| earliest.min(origin))
        .min(now)
}
