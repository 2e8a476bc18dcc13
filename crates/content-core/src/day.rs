//! Day-counting rules for a couple's content stream.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::model::CoupleSettings;

/// Resolve an IANA timezone name, falling back to UTC when it does not
/// parse. Bad settings must never make day counting fail.
pub fn resolve_zone(name: &str) -> Tz {
    name.parse().unwrap_or(Tz::UTC)
}

/// The "YYYY-MM-DD" calendar-day string for `now` in the given zone.
///
/// All "today" comparisons in the engine go through this so that two reads
/// within the same local calendar day always agree.
pub fn date_key(now: DateTime<Utc>, timezone: &str) -> String {
    let zone = resolve_zone(timezone);
    now.with_timezone(&zone).format("%Y-%m-%d").to_string()
}

/// The content day a couple is expected to be on at `now`.
///
/// Counts whole calendar days elapsed between the start date (truncated to
/// midnight in the couple's timezone) and `now`, plus 1: day 1 is the start
/// date itself. Negative deltas (clock skew, bad settings) clamp to 1, so
/// the result is always at least 1 and non-decreasing as `now` advances.
pub fn expected_day(settings: &CoupleSettings, now: DateTime<Utc>) -> u32 {
    let zone = resolve_zone(&settings.timezone);
    let start = settings.start_date.with_timezone(&zone).date_naive();
    let today = now.with_timezone(&zone).date_naive();

    let elapsed = today.signed_duration_since(start).num_days();
    if elapsed < 0 {
        1
    } else {
        elapsed as u32 + 1
    }
}
