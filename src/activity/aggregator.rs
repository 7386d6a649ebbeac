//! Folding events into per-period bucket grids
//!
//! Every grid is pre-seeded with zero buckets. Fixed periods count any event
//! whose instant is known and not older than the window start; a key missing
//! from the grid (old edge truncation, or clock skew past `now`) gets its own
//! bucket. The `all` period only counts events whose key is already in its
//! grid and never grows.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::models::{Counts, Event, Reason};
use super::planner::{AllTimePlan, FixedWindow};

/// Bucket counters keyed by bucket key, iterated in key order
pub type BucketMap = BTreeMap<String, Counts>;

fn seed<I>(keys: I) -> BucketMap
where
    I: IntoIterator<Item = String>,
{
    keys.into_iter().map(|key| (key, Counts::default())).collect()
}

fn timed<'a>(events: &'a [Event]) -> impl Iterator<Item = (DateTime<Utc>, &'a Reason)> + 'a {
    events
        .iter()
        .filter_map(|event| event.occurred_at.map(|at| (at, &event.reason)))
}

/// Aggregate a fixed period ending at `now`.
pub fn aggregate_window(window: &FixedWindow, events: &[Event], now: DateTime<Utc>) -> BucketMap {
    let start = window.window_start(now);
    let granularity = window.granularity;

    timed(events)
        .filter(|(at, _)| *at >= start)
        .fold(seed(window.grid(now)), |mut buckets, (at, reason)| {
            buckets
                .entry(granularity.key_of(at))
                .or_default()
                .record(reason);
            buckets
        })
}

/// Aggregate the unbounded period described by `plan`.
pub fn aggregate_all_time(plan: &AllTimePlan, events: &[Event]) -> BucketMap {
    timed(events).fold(seed(plan.keys.iter().cloned()), |mut buckets, (at, reason)| {
        if let Some(counts) = buckets.get_mut(&plan.granularity.key_of(at)) {
            counts.record(reason);
        }
        buckets
    })
}

/// Counters over every event, regardless of timestamp validity
pub fn totals(events: &[Event]) -> Counts {
    events.iter().fold(Counts::default(), |mut counts, event| {
        counts.record(&event.reason);
        counts
    })
}
