//! Best-effort field extraction from release titles and raw upstream values.
//!
//! Everything here is a pure function: no I/O, no clock except the
//! current-year ceiling of [`extract_year`].

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use regex_lite::Regex;
use serde_json::Value;

use crate::record::Resolution;

/// Earliest year accepted as a release year.
pub const MIN_YEAR: u16 = 1900;

const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Title markers per resolution, checked in priority order.
/// Matching is case-insensitive, so markers are lowercase.
const RESOLUTION_MARKERS: &[(Resolution, &[&str])] = &[
    (Resolution::Uhd2160, &["2160p", "4k", "uhd"]),
    (Resolution::FullHd1080, &["1080p"]),
    (Resolution::Hd720, &["720p"]),
    (
        Resolution::Sd,
        &["480p", "576p", "360p", "sdtv", "dvdrip", "xvid"],
    ),
];

/// Extract a release year, accepting years up to next year.
pub fn extract_year(title: &str) -> Option<u16> {
    let ceiling = u16::try_from(Utc::now().year() + 1).unwrap_or(u16::MAX);
    extract_year_until(title, ceiling)
}

/// Extract the first standalone 4-digit number in `MIN_YEAR..=max_year`.
///
/// Digit runs longer than four (hashes, ids) never match, and `1080p` is
/// below the range, so resolution tokens are not mistaken for years.
pub fn extract_year_until(title: &str, max_year: u16) -> Option<u16> {
    let digits = Regex::new(r"[0-9]+").ok()?;

    let year = digits
        .find_iter(title)
        .filter(|m| m.as_str().len() == 4)
        .filter_map(|m| m.as_str().parse::<u16>().ok())
        .find(|year| (MIN_YEAR..=max_year).contains(year));
    year
}

/// Infer the resolution from title markers; the highest-priority marker wins.
pub fn extract_resolution(title: &str) -> Resolution {
    let lower = title.to_lowercase();

    RESOLUTION_MARKERS
        .iter()
        .find(|(_, markers)| markers.iter().any(|marker| lower.contains(marker)))
        .map(|(resolution, _)| *resolution)
        .unwrap_or(Resolution::Unknown)
}

/// Format a byte count with 1024-based units and two decimals.
pub fn format_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;

    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    format!("{:.2} {}", value, SIZE_UNITS[unit])
}

/// Format a Unix timestamp (seconds, UTC) as `YYYY-MM-DD`.
pub fn format_timestamp(secs: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp(secs, 0).map(|dt| dt.format("%Y-%m-%d").to_string())
}

/// Normalize an upstream date value to `YYYY-MM-DD`.
///
/// Accepts a Unix timestamp as a JSON number or numeric string, or an
/// already formatted `YYYY-MM-DD` string. Anything else is absent.
pub fn normalize_date(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => n.as_i64().and_then(format_timestamp),
        Value::String(s) => normalize_date_str(s),
        _ => None,
    }
}

fn normalize_date_str(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return trimmed.parse::<i64>().ok().and_then(format_timestamp);
    }

    // Exact shape only: chrono alone would also accept "2024-1-5".
    let shaped = trimmed.len() == 10
        && trimmed
            .bytes()
            .enumerate()
            .all(|(i, b)| if i == 4 || i == 7 { b == b'-' } else { b.is_ascii_digit() });
    if !shaped {
        return None;
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .map(|_| trimmed.to_string())
}
