//! Cyclic encoding of calendar fields.
//!
//! A periodic integer `v` with period `p` becomes the pair
//! `(sin(2πv/p), cos(2πv/p))` so that December sits next to January.

use std::f64::consts::PI;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

use crate::core::table::is_missing;

/// Months per year.
pub const MONTH_PERIOD: f64 = 12.0;

/// Upper bound of the day-of-month field.
pub const DAY_PERIOD: f64 = 31.0;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Parse a date cell, accepting plain dates, naive datetimes and RFC 3339.
///
/// Returns `None` for missing or unrecognised input.
pub fn parse_date(cell: &str) -> Option<NaiveDate> {
    if is_missing(cell) {
        return None;
    }
    let cell = cell.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(cell) {
        return Some(dt.date_naive());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(cell, format) {
            return Some(dt.date());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(cell, format) {
            return Some(date);
        }
    }
    None
}

/// Canonical `YYYY-MM-DD` text of a parsed date, empty when absent.
pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()
}

/// Sine and cosine of `value` on a circle of circumference `period`.
pub fn encode_cyclic(value: f64, period: f64) -> (f64, f64) {
    let angle = 2.0 * PI * value / period;
    (angle.sin(), angle.cos())
}

/// Cyclic month and day encodings of a date column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CyclicDateFeatures {
    /// Parsed date of every cell
    pub dates: Vec<Option<NaiveDate>>,
    pub month_sin: Vec<Option<f64>>,
    pub month_cos: Vec<Option<f64>>,
    pub day_sin: Vec<Option<f64>>,
    pub day_cos: Vec<Option<f64>>,
    /// Cells that held a value but could not be parsed
    pub unparsed: usize,
}

/// Encode month (period 12) and day (period 31) of every date cell.
///
/// Unparseable dates produce missing values in all four outputs.
pub fn encode_dates(cells: &[String]) -> CyclicDateFeatures {
    let mut features = CyclicDateFeatures {
        dates: Vec::with_capacity(cells.len()),
        month_sin: Vec::with_capacity(cells.len()),
        month_cos: Vec::with_capacity(cells.len()),
        day_sin: Vec::with_capacity(cells.len()),
        day_cos: Vec::with_capacity(cells.len()),
        unparsed: 0,
    };

    for cell in cells {
        let date = parse_date(cell);
        if date.is_none() && !is_missing(cell) {
            features.unparsed += 1;
        }

        let month = date.map(|d| encode_cyclic(f64::from(d.month()), MONTH_PERIOD));
        let day = date.map(|d| encode_cyclic(f64::from(d.day()), DAY_PERIOD));

        features.month_sin.push(month.map(|(s, _)| s));
        features.month_cos.push(month.map(|(_, c)| c));
        features.day_sin.push(day.map(|(s, _)| s));
        features.day_cos.push(day.map(|(_, c)| c));
        features.dates.push(date);
    }

    features
}
