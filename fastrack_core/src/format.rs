//! Text formatting for durations and completion messages.

use crate::types::SECONDS_PER_HOUR;
use crate::CompletedFast;

/// `HH:MM:SS`; hours are not wrapped at 24
pub fn format_clock(total_seconds: u64) -> String {
    let hours = total_seconds / SECONDS_PER_HOUR;
    let minutes = (total_seconds % SECONDS_PER_HOUR) / 60;
    let seconds = total_seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// `Xh Ym`, always showing both parts
pub fn format_hours_minutes(total_seconds: u64) -> String {
    let hours = total_seconds / SECONDS_PER_HOUR;
    let minutes = (total_seconds % SECONDS_PER_HOUR) / 60;
    format!("{}h {}m", hours, minutes)
}

/// `Xh Ym`, dropping a zero part (`16h`, `45m`)
pub fn format_compact(total_seconds: u64) -> String {
    let hours = total_seconds / SECONDS_PER_HOUR;
    let minutes = (total_seconds % SECONDS_PER_HOUR) / 60;
    match (hours, minutes) {
        (0, m) => format!("{}m", m),
        (h, 0) => format!("{}h", h),
        (h, m) => format!("{}h {}m", h, m),
    }
}

/// Text to share after completing a fast
pub fn share_message(fast: &CompletedFast, quote: &str) -> String {
    format!(
        "I just completed a {} fast with Fastrack! \"{}\"",
        format_compact(fast.duration_seconds),
        quote
    )
}
