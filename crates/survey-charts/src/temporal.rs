//! Date normalization and calendar-period bucketing.
//!
//! Heterogeneous date cells are parsed into a canonical [`NaiveDateTime`],
//! rejected when their calendar year falls outside the plausible study window,
//! and bucketed into day/week/month/quarter/year keys that sort correctly.

use crate::config::PipelineConfig;
use crate::types::{CellValue, Period};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;

const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d.%m.%Y %H:%M",
];

const DATE_FORMATS: [&str; 7] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
];

static YEAR_ONLY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}$").expect("Invalid regex: year only"));

static YEAR_MONTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{1,2})$").expect("Invalid regex: year-month"));

static QUARTER_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Q(\d+)\s+(-?\d+)$").expect("Invalid regex: quarter key"));

/// Parses date cells and enforces the plausible-year window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateNormalizer {
    min_year: i32,
    max_year: i32,
}

impl Default for DateNormalizer {
    fn default() -> Self {
        Self {
            min_year: 2015,
            max_year: 2100,
        }
    }
}

impl DateNormalizer {
    pub fn new(min_year: i32, max_year: i32) -> Self {
        Self { min_year, max_year }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.min_year, config.max_year)
    }

    /// Parse a cell into an instant, or `None` when it is missing, unparseable,
    /// or outside the year window. Never substitutes "now" or the epoch.
    pub fn parse_valid_date(&self, value: &CellValue) -> Option<NaiveDateTime> {
        let instant = match value {
            CellValue::Null | CellValue::Bool(_) => None,
            CellValue::Number(ms) => parse_epoch_millis(*ms),
            CellValue::Text(s) => parse_date_str(s),
        }?;

        (self.min_year..=self.max_year)
            .contains(&instant.year())
            .then_some(instant)
    }

    pub fn is_valid_date(&self, value: &CellValue) -> bool {
        self.parse_valid_date(value).is_some()
    }
}

/// Parse with the default 2015..=2100 window.
pub fn parse_valid_date(value: &CellValue) -> Option<NaiveDateTime> {
    DateNormalizer::default().parse_valid_date(value)
}

fn parse_epoch_millis(ms: f64) -> Option<NaiveDateTime> {
    if !ms.is_finite() || ms.fract() != 0.0 {
        return None;
    }
    DateTime::from_timestamp_millis(ms as i64).map(|dt| dt.naive_utc())
}

fn parse_date_str(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Some(date.and_time(NaiveTime::MIN));
        }
    }

    if let Some(caps) = YEAR_MONTH.captures(s) {
        let year = caps[1].parse::<i32>().ok()?;
        let month = caps[2].parse::<u32>().ok()?;
        return NaiveDate::from_ymd_opt(year, month, 1).map(|d| d.and_time(NaiveTime::MIN));
    }

    if YEAR_ONLY.is_match(s) {
        let year = s.parse::<i32>().ok()?;
        return NaiveDate::from_ymd_opt(year, 1, 1).map(|d| d.and_time(NaiveTime::MIN));
    }

    None
}

/// Canonical key of the calendar period containing `instant`.
///
/// - day: `YYYY-MM-DD`
/// - week: `YYYY-MM-DD` of the ISO week's Monday
/// - month: `YYYY-MM`
/// - quarter: `Qn YYYY`
/// - year: `YYYY`
pub fn period_key_of(instant: &NaiveDateTime, period: Period) -> String {
    let date = instant.date();
    match period {
        Period::Day => date.format("%Y-%m-%d").to_string(),
        Period::Week => {
            let offset = date.weekday().num_days_from_monday() as i64;
            let monday = date - Duration::days(offset);
            monday.format("%Y-%m-%d").to_string()
        }
        Period::Month => date.format("%Y-%m").to_string(),
        Period::Quarter => format!("Q{} {}", date.month0() / 3 + 1, date.year()),
        Period::Year => date.format("%Y").to_string(),
    }
}

/// `(year, quarter)` of a `Qn YYYY` label.
pub fn quarter_sort_key(label: &str) -> Option<(i32, u32)> {
    let caps = QUARTER_KEY.captures(label.trim())?;
    let quarter = caps[1].parse::<u32>().ok()?;
    let year = caps[2].parse::<i32>().ok()?;
    Some((year, quarter))
}

/// Chronological order of two period keys.
///
/// Day/week/month/year keys are zero-padded and year-first, so string order is
/// chronological. Quarter keys compare by (year, quarter number); labels that
/// do not parse sort after all parsed ones.
pub fn compare_period_keys(a: &str, b: &str, period: Period) -> Ordering {
    if period != Period::Quarter {
        return a.cmp(b);
    }
    match (quarter_sort_key(a), quarter_sort_key(b)) {
        (Some(ka), Some(kb)) => ka.cmp(&kb).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

pub fn sort_period_keys(keys: &mut [String], period: Period) {
    keys.sort_by(|a, b| compare_period_keys(a, b, period));
}
