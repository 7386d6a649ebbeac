//! Notification activity aggregation
//!
//! Turns an account's paginated notification history into a fixed-shape,
//! multi-resolution summary: hourly buckets for the last day, daily buckets
//! for the last week and month, monthly buckets for the last year, and an
//! all-time series whose resolution depends on account age.
//!
//! Everything is request-scoped. [`summarize`] fetches, [`build_summary`] is
//! a pure function of the events, the origin and `now`.

pub mod aggregator;
pub mod collector;
pub mod models;
pub mod origin;
pub mod planner;
pub mod timeline;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::upstream::{NotificationSource, UpstreamResult};

pub use collector::collect_events;
pub use models::{Bucket, Counts, Event, Granularity, Period, Reason, Summary, Timeline};
pub use origin::resolve_origin;
pub use planner::{AllTimePlan, FixedWindow, FIXED_WINDOWS};
pub use timeline::build_summary;

/// Look up the account's creation time, treating any failure as unknown.
pub async fn account_created_at<S>(source: &S, actor: Option<&str>) -> Option<DateTime<Utc>>
where
    S: NotificationSource + ?Sized,
{
    let actor = actor?;
    match source.get_profile(actor).await {
        Ok(profile) => {
            if profile.created_at.is_none() {
                debug!(actor, "profile has no creation time");
            }
            profile.created_at
        }
        Err(e) => {
            warn!(actor, error = %e, "profile lookup failed, deriving origin from events");
            None
        }
    }
}

/// Fetch all notifications for the bound account and summarize them as of `now`.
///
/// Only pagination failures are returned; a failed profile lookup falls back
/// to the event-derived origin.
pub async fn summarize<S>(
    source: &S,
    actor: Option<&str>,
    now: DateTime<Utc>,
) -> UpstreamResult<Summary>
where
    S: NotificationSource + ?Sized,
{
    let events = collect_events(source).await?;
    let created_at = account_created_at(source, actor).await;
    let origin = resolve_origin(created_at, &events, now);

    Ok(build_summary(&events, origin, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::{Page, Profile, UpstreamError};
    use async_trait::async_trait;
    use chrono::Duration;

    struct StubSource {
        events: Vec<Event>,
        profile: Result<Profile, u16>,
    }

    #[async_trait]
    impl NotificationSource for StubSource {
        async fn fetch_page(&self, _cursor: Option<&str>) -> UpstreamResult<Page> {
            Ok(Page {
                events: self.events.clone(),
                next_cursor: None,
            })
        }

        async fn get_profile(&self, _actor: &str) -> UpstreamResult<Profile> {
            self.profile.clone().map_err(|status| UpstreamError::Status {
                status,
                body: "profile unavailable".to_string(),
            })
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-10T14:20:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[tokio::test]
    async fn failed_profile_lookup_falls_back_to_earliest_event() {
        let earliest = now() - Duration::days(50);
        let source = StubSource {
            events: vec![
                Event::new("a", "like", Some(now() - Duration::days(1))),
                Event::new("b", "like", Some(earliest)),
            ],
            profile: Err(500),
        };

        let created = account_created_at(&source, Some("did:plc:abc")).await;
        assert_eq!(created, None);
        assert_eq!(resolve_origin(created, &source.events, now()), earliest);

        let summary = summarize(&source, Some("did:plc:abc"), now()).await.unwrap();
        assert_eq!(summary.since, earliest);
    }

    #[tokio::test]
    async fn profile_creation_time_extends_all_time_grid() {
        let created = now() - Duration::days(4 * 365 + 1);
        let source = StubSource {
            events: vec![Event::new("a", "reply", Some(now() - Duration::days(3)))],
            profile: Ok(Profile {
                did: Some("did:plc:abc".to_string()),
                handle: None,
                created_at: Some(created),
            }),
        };

        let summary = summarize(&source, Some("did:plc:abc"), now()).await.unwrap();

        assert_eq!(summary.since, created);
        assert_eq!(summary.granularity_of(Period::All), Some(Granularity::Year));
        assert_eq!(summary.buckets(Period::All).first().map(|b| b.key.as_str()), Some("2020"));
        assert_eq!(summary.buckets(Period::All).last().map(|b| b.key.as_str()), Some("2024"));
    }

    #[tokio::test]
    async fn no_actor_and_no_events_anchor_at_now() {
        let source = StubSource {
            events: Vec::new(),
            profile: Err(404),
        };

        let summary = summarize(&source, None, now()).await.unwrap();

        assert_eq!(summary.since, now());
        assert_eq!(summary.total_event_count, 0);
        assert_eq!(summary.buckets(Period::All).len(), 1);
        assert_eq!(summary.buckets(Period::Day).len(), 24);
        assert_eq!(summary.buckets(Period::Year).len(), 12);
    }
}
