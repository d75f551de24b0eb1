//! Pure break policy rules.
//!
//! Nothing here touches the database: the tracker looks up the limit and
//! windows, then asks these functions what the outcome is.

use crate::libs::error::{TrackerError, TrackerResult};
use crate::libs::formatter::format_datetime;
use chrono::{NaiveDateTime, NaiveTime};

/// Whole minutes between two timestamps, rounded half-up.
///
/// A span of 14 min 30 s counts as 15 minutes, 14 min 29 s as 14.
///
/// ```rust
/// use breakwatch::libs::rules::duration_minutes;
/// use chrono::NaiveDate;
///
/// let day = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
/// let start = day.and_hms_opt(10, 0, 0).unwrap();
/// let end = day.and_hms_opt(10, 14, 30).unwrap();
/// assert_eq!(duration_minutes(start, end).unwrap(), 15);
/// ```
pub fn duration_minutes(start: NaiveDateTime, end: NaiveDateTime) -> TrackerResult<i64> {
    let seconds = end.signed_duration_since(start).num_seconds();
    if seconds < 0 {
        return Err(TrackerError::NegativeSpan {
            start: format_datetime(&start),
            end: format_datetime(&end),
        });
    }
    Ok((seconds + 30) / 60)
}

/// Minutes over the limit, when the break counts as over limit.
///
/// A break is over limit when `duration > limit + grace`; the excess is
/// always measured against the limit itself.
pub fn over_limit_excess(duration: i64, limit: i64, grace: i64) -> Option<i64> {
    if duration > limit + grace.max(0) {
        Some(duration - limit)
    } else {
        None
    }
}

/// Inclusive time-of-day range.
pub fn time_in_range(start: NaiveTime, end: NaiveTime, at: NaiveTime) -> bool {
    start <= at && at <= end
}

/// True when today's count has already used up the daily allowance.
pub fn quota_exhausted(used_today: i64, daily_count: i64) -> bool {
    used_today >= daily_count
}
