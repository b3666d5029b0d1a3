//! Display projection of numeric route values.
//!
//! Distances and durations are stored as meters/seconds and times as
//! timestamps; the strings produced here are one-way renderings for the
//! dashboard. The parse helpers exist only to read records exported by the
//! old browser dashboard, which stored the rendered strings.

use chrono::NaiveTime;

/// Placeholder for a time that does not apply (arrival at the first stop,
/// start at the last one).
pub const NO_TIME: &str = "-";

/// Render a time of day on a 12-hour clock, e.g. "9:30 AM".
///
/// There is no date component: a stop reached after midnight renders as
/// "12:15 AM" with nothing marking the day change.
pub fn format_clock(time: NaiveTime) -> String {
    time.format("%-I:%M %p").to_string()
}

/// Parse "8:00 AM" / "11:45 pm", or a 24-hour "14:30".
pub fn parse_clock(value: &str) -> Option<NaiveTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed == NO_TIME {
        return None;
    }
    NaiveTime::parse_from_str(trimmed, "%I:%M %p")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
        .ok()
}

/// "2h 30m", or "45m" under an hour. Rounded to whole minutes.
pub fn format_duration(seconds: u64) -> String {
    let total_minutes = (seconds as f64 / 60.0).round() as u64;
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

/// "35 km", rounded to whole kilometers.
pub fn format_distance(meters: u64) -> String {
    format!("{} km", distance_km(meters))
}

/// Whole kilometers, rounded.
pub fn distance_km(meters: u64) -> u64 {
    (meters as f64 / 1000.0).round() as u64
}

/// Read "45 km" back as 45. Anything unparseable counts as 0.
pub fn parse_distance_km(value: &str) -> u64 {
    value
        .split_whitespace()
        .next()
        .map(|token| {
            token
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect::<String>()
        })
        .and_then(|digits| digits.parse().ok())
        .unwrap_or(0)
}

/// Read "2h 30m" / "45m" / "3h" back as minutes.
pub fn parse_duration_minutes(value: &str) -> u64 {
    let hours = number_before(value, 'h').unwrap_or(0);
    let minutes = number_before(value, 'm').unwrap_or(0);
    hours * 60 + minutes
}

/// First run of digits immediately followed by `unit`.
fn number_before(value: &str, unit: char) -> Option<u64> {
    let mut digits = String::new();
    for c in value.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        if c == unit && !digits.is_empty() {
            return digits.parse().ok();
        }
        digits.clear();
    }
    None
}
