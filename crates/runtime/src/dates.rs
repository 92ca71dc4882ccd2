//! Date normalization for log queries

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

use crate::error::{GliaError, Result};
use crate::types::LogRange;

/// Output format of every normalized bound
pub const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Which end of a range a bound belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// Date-only values become the start of the day
    Start,
    /// Date-only values become the end of the day
    End,
}

/// Format a timestamp the way the logs endpoint expects
pub fn format_utc(time: DateTime<Utc>) -> String {
    time.format(ISO_FORMAT).to_string()
}

fn looks_like_iso(input: &str) -> bool {
    input.contains('T') && (input.contains('Z') || input.contains('+') || input.ends_with("00"))
}

/// Normalize one user supplied bound.
///
/// Inputs that already look like ISO-8601 pass through untouched. Naive
/// values are interpreted as UTC.
pub fn normalize_bound(input: &str, bound: Bound) -> Result<String> {
    let trimmed = input.trim();
    if looks_like_iso(trimmed) {
        return Ok(trimmed.to_string());
    }

    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(format_utc(naive.and_utc()));
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            let (h, m, s) = match bound {
                Bound::Start => (0, 0, 0),
                Bound::End => (23, 59, 59),
            };
            if let Some(naive) = date.and_hms_opt(h, m, s) {
                return Ok(format_utc(naive.and_utc()));
            }
        }
    }

    Err(GliaError::DateParse {
        input: input.to_string(),
    })
}

impl LogRange {
    /// Range from optional user supplied bounds
    pub fn between(start: Option<&str>, end: Option<&str>) -> Result<Self> {
        Ok(Self {
            start: start.map(|s| normalize_bound(s, Bound::Start)).transpose()?,
            end: end.map(|e| normalize_bound(e, Bound::End)).transpose()?,
        })
    }

    /// Window ending now; fails when the start falls outside the representable range
    pub fn trailing(now: DateTime<Utc>, window: Duration) -> Result<Self> {
        let start = now
            .checked_sub_signed(window)
            .ok_or_else(|| GliaError::validation("Time window is too large"))?;
        Ok(Self {
            start: Some(format_utc(start)),
            end: Some(format_utc(now)),
        })
    }
}

/// Length of the recent-logs window plus a description for output.
///
/// Hours win over minutes; zero counts as unset; the default is one hour.
pub fn recent_window(hours: Option<u32>, minutes: Option<u32>) -> (Duration, String) {
    match (hours.filter(|h| *h > 0), minutes.filter(|m| *m > 0)) {
        (Some(h), _) => (Duration::hours(i64::from(h)), format!("last {h} hour(s)")),
        (None, Some(m)) => (Duration::minutes(i64::from(m)), format!("last {m} minute(s)")),
        (None, None) => (Duration::hours(1), "last 1 hour".to_string()),
    }
}
