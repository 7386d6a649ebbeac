//! Final assembly of per-period bucket lists into a summary

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::aggregator::{aggregate_all_time, aggregate_window, totals, BucketMap};
use super::models::{Bucket, Event, Granularity, Period, Summary, Timeline};
use super::origin::all_time_start;
use super::planner::{AllTimePlan, FIXED_WINDOWS};

/// Bucket list in ascending key order, one bucket per key.
pub fn into_buckets(map: BucketMap) -> Vec<Bucket> {
    // BTreeMap iterates in lexicographic key order, which is chronological
    // for the fixed-width key formats.
    map.into_iter()
        .map(|(key, counts)| Bucket { key, counts })
        .collect()
}

/// Build the summary for `events` as of `now`, with all-time reporting
/// starting no later than `origin`.
pub fn build_summary(events: &[Event], origin: DateTime<Utc>, now: DateTime<Utc>) -> Summary {
    let mut periods = Timeline::new();
    let mut granularity = BTreeMap::new();

    for window in FIXED_WINDOWS {
        periods.insert(window.period, into_buckets(aggregate_window(&window, events, now)));
        granularity.insert(window.period, window.granularity);
    }

    let plan = AllTimePlan::new(all_time_start(origin, events, now), now);
    periods.insert(Period::All, into_buckets(aggregate_all_time(&plan, events)));
    granularity.insert(Period::All, plan.granularity);

    Summary {
        generated_at: now,
        since: plan.start,
        periods,
        granularity,
        totals: totals(events),
        total_event_count: events.len() as u64,
    }
}

impl Summary {
    pub fn buckets(&self, period: Period) -> &[Bucket] {
        self.periods.get(&period).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn granularity_of(&self, period: Period) -> Option<Granularity> {
        self.granularity.get(&period).copied()
    }
}
