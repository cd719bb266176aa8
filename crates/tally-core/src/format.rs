//! Human-readable renderings of durations and timestamps.

use std::fmt::Display;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

/// Formats seconds as "Xh Ym", or "Ym" under an hour. Seconds are truncated.
pub fn format_duration(seconds: u64) -> String {
    let total_minutes = seconds / 60;
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    if hours >= 1 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Formats seconds as "Xh Ym", keeping the hours even when zero.
///
/// Entry listings use this so every row has the same shape.
pub fn format_entry_duration(seconds: u64) -> String {
    let total_minutes = seconds / 60;
    format!("{}h {}m", total_minutes / 60, total_minutes % 60)
}

/// Formats seconds as a zero-padded "HH:MM:SS" clock face.
pub fn format_clock(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Wall-clock "HH:MM" of `timestamp` in `tz`.
pub fn format_entry_time<Tz>(timestamp: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    timestamp.with_timezone(tz).format("%H:%M").to_string()
}

/// Short day label such as "Wed, Mar 12".
pub fn format_day_heading(date: NaiveDate) -> String {
    date.format("%a, %b %-d").to_string()
}
