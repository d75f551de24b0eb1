//! Time formatting and parsing shared by the repositories and the views.
//!
//! Timestamps are stored as local naive `YYYY-MM-DD HH:MM:SS` text; schedule
//! times (shift bounds, windows) as `HH:MM`.
//!
//! ```rust
//! use breakwatch::libs::formatter::{format_minutes, parse_hhmm};
//!
//! assert_eq!(format_minutes(90), "01:30");
//! assert_eq!(parse_hhmm("09:05").unwrap().to_string(), "09:05:00");
//! ```

use crate::libs::error::{TrackerError, TrackerResult};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

/// Formats a minute count as `HH:MM`; negative values render as `00:00`.
///
/// ```rust
/// use breakwatch::libs::formatter::format_minutes;
///
/// assert_eq!(format_minutes(0), "00:00");
/// assert_eq!(format_minutes(61), "01:01");
/// assert_eq!(format_minutes(-5), "00:00");
/// ```
pub fn format_minutes(minutes: i64) -> String {
    let minutes = minutes.max(0);
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

pub fn format_datetime(value: &NaiveDateTime) -> String {
    value.format(DATETIME_FORMAT).to_string()
}

pub fn format_date(value: &NaiveDate) -> String {
    value.format(DATE_FORMAT).to_string()
}

pub fn format_time(value: &NaiveTime) -> String {
    value.format(TIME_FORMAT).to_string()
}

/// Parses a stored `YYYY-MM-DD HH:MM:SS` timestamp.
///
/// ISO strings with a `T` separator are accepted too, since that is what
/// rows imported from the Postgres backend carry.
pub fn parse_datetime(value: &str) -> TrackerResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, DATETIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f"))
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|_| TrackerError::InvalidTime(value.to_string()))
}

pub fn parse_date(value: &str) -> TrackerResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| TrackerError::InvalidTime(value.to_string()))
}

/// Parses `HH:MM` (seconds are tolerated and dropped).
pub fn parse_hhmm(value: &str) -> TrackerResult<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| TrackerError::InvalidTime(value.to_string()))
}
