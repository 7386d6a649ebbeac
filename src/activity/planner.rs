//! Dense bucket grids for the fixed reporting periods
//!
//! A grid is produced by walking backward from `now` one granularity unit at
//! a time, so the newest bucket is always the unit `now` falls in rather than
//! an aligned slice of the window.

use chrono::{DateTime, Datelike, Duration, Months, TimeZone, Timelike, Utc};

use super::models::{Granularity, Period};

impl Granularity {
    /// Truncate an instant to the start of its unit (UTC).
    pub fn truncate(self, instant: DateTime<Utc>) -> DateTime<Utc> {
        let (year, month, day, hour) = match self {
            Granularity::Hour => (instant.year(), instant.month(), instant.day(), instant.hour()),
            Granularity::Day => (instant.year(), instant.month(), instant.day(), 0),
            Granularity::Month => (instant.year(), instant.month(), 1, 0),
            Granularity::Year => (instant.year(), 1, 1, 0),
        };

        // Every component comes from a valid UTC instant and UTC has no gaps or
        // folds, so `single()` always succeeds and the fallback is unreachable.
        Utc.with_ymd_and_hms(year, month, day, hour, 0, 0)
            .single()
            .unwrap_or(instant)
    }

    /// Fixed-width key; lexicographic order matches chronological order.
    pub fn key_of(self, instant: DateTime<Utc>) -> String {
        let format = match self {
            Granularity::Hour => "%Y-%m-%dT%H",
            Granularity::Day => "%Y-%m-%d",
            Granularity::Month => "%Y-%m",
            Granularity::Year => "%Y",
        };
        instant.format(format).to_string()
    }

    /// Move `units` whole units away from the unit containing `instant`,
    /// returning the truncated start of the target unit.
    ///
    /// Calendar units are truncated before stepping so month lengths never
    /// push the result into a neighboring unit.
    pub fn shift(self, instant: DateTime<Utc>, units: i64) -> Option<DateTime<Utc>> {
        let start = self.truncate(instant);
        match self {
            Granularity::Hour => start.checked_add_signed(Duration::try_hours(units)?),
            Granularity::Day => start.checked_add_signed(Duration::try_days(units)?),
            Granularity::Month => shift_months(start, units),
            Granularity::Year => shift_months(start, units.checked_mul(12)?),
        }
    }
}

fn shift_months(instant: DateTime<Utc>, months: i64) -> Option<DateTime<Utc>> {
    let magnitude = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        instant.checked_add_months(magnitude)
    } else {
        instant.checked_sub_months(magnitude)
    }
}

/// Window configuration of one fixed period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedWindow {
    pub period: Period,
    /// Window length in days, ending at `now`
    pub span_days: i64,
    pub point_count: u32,
    pub granularity: Granularity,
}

/// The four fixed periods in reporting order
pub const FIXED_WINDOWS: [FixedWindow; 4] = [
    FixedWindow {
        period: Period::Day,
        span_days: 1,
        point_count: 24,
        granularity: Granularity::Hour,
    },
    FixedWindow {
        period: Period::Week,
        span_days: 7,
        point_count: 7,
        granularity: Granularity::Day,
    },
    FixedWindow {
        period: Period::Month,
        span_days: 30,
        point_count: 30,
        granularity: Granularity::Day,
    },
    FixedWindow {
        period: Period::Year,
        span_days: 365,
        point_count: 12,
        granularity: Granularity::Month,
    },
];

impl FixedWindow {
    /// Window for a fixed period; `None` for [`Period::All`].
    pub fn for_period(period: Period) -> Option<Self> {
        FIXED_WINDOWS.iter().copied().find(|w| w.period == period)
    }

    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        Duration::try_days(self.span_days)
            .and_then(|span| now.checked_sub_signed(span))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    pub fn key_of(&self, instant: DateTime<Utc>) -> String {
        self.granularity.key_of(instant)
    }

    /// Keys of the dense grid ending at the unit containing `now`, oldest first.
    pub fn grid(&self, now: DateTime<Utc>) -> Vec<String> {
        (0..i64::from(self.point_count))
            .rev()
            .filter_map(|offset| self.granularity.shift(now, -offset))
            .map(|instant| self.key_of(instant))
            .collect()
    }
}

/// Bucketing plan for the unbounded `all` period
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllTimePlan {
    pub start: DateTime<Utc>,
    pub granularity: Granularity,
    pub keys: Vec<String>,
}

/// Accounts younger than this many years are reported by month.
pub const MONTHLY_AGE_LIMIT_YEARS: f64 = 3.0;

const YEAR_SECONDS: f64 = 365.25 * 24.0 * 60.0 * 60.0;

impl AllTimePlan {
    /// Plan the `all` grid from `start` (clamped to `now`) forward to `now`.
    pub fn new(start: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let start = start.min(now);
        let age_years = (now - start).num_seconds() as f64 / YEAR_SECONDS;
        let granularity = if age_years < MONTHLY_AGE_LIMIT_YEARS {
            Granularity::Month
        } else {
            Granularity::Year
        };

        let mut keys = Vec::new();
        let mut cursor = Some(granularity.truncate(start));
        while let Some(instant) = cursor.filter(|instant| *instant <= now) {
            keys.push(granularity.key_of(instant));
            cursor = granularity.shift(instant, 1);
        }

        if keys.is_empty() {
            keys.push(granularity.key_of(now));
        }

        Self {
            start,
            granularity,
            keys,
        }
    }
}
