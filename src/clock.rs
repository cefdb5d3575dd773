//! Wall-clock strings for attendance records.
//!
//! Times are display strings (`9:05 AM`), not machine timestamps.

use chrono::{DateTime, Local, TimeZone};

/// Today's date as `YYYY-MM-DD`.
pub fn today() -> String {
    format_date(&Local::now())
}

/// Current time on a 12-hour clock with minute precision.
pub fn current_time() -> String {
    format_time(&Local::now())
}

pub fn format_date<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%Y-%m-%d").to_string()
}

pub fn format_time<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%-I:%M %p").to_string()
}
