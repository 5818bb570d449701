//! Date parsing for task start and end cells.
//!
//! Cells are tried against a fixed sequence of strategies: native date
//! values, strict ISO `YYYY-MM-DD`, ISO datetimes (time discarded), Unix
//! epoch seconds, and finally a set of common human formats. Failures carry
//! a [`DateErrorCode`] so callers can tell a missing value from a malformed
//! one.

use crate::record::CellValue;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

/// Output format for normalized dates.
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Earliest year accepted for epoch-second values.
pub const MIN_EPOCH_YEAR: i32 = 1970;

/// Latest year accepted for epoch-second values.
pub const MAX_EPOCH_YEAR: i32 = 2100;

static ISO_DATE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").ok());

static ISO_DATETIME: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}T").ok());

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

/// Why a cell could not be read as a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DateErrorCode {
    /// The cell is null, NaN or blank
    NullValue,
    /// The cell has a date shape but names a day that does not exist
    InvalidDate,
    /// No strategy recognised the cell
    InvalidFormat,
}

impl DateErrorCode {
    /// Wire form of the code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NullValue => "null_value",
            Self::InvalidDate => "invalid_date",
            Self::InvalidFormat => "invalid_format",
        }
    }
}

impl fmt::Display for DateErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed date parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {detail}")]
pub struct DateParseError {
    /// Classification of the failure
    pub code: DateErrorCode,
    /// Human readable description
    pub detail: String,
}

impl DateParseError {
    fn new(code: DateErrorCode, detail: impl Into<String>) -> Self {
        Self {
            code,
            detail: detail.into(),
        }
    }

    fn null() -> Self {
        Self::new(DateErrorCode::NullValue, "value is empty")
    }
}

/// Read a cell as a calendar date.
///
/// # Errors
///
/// Returns a [`DateParseError`] whose code is `null_value` for null or blank
/// cells, `invalid_date` for ISO-shaped text naming a non-existent day, and
/// `invalid_format` when nothing matched.
pub fn parse_date(value: &CellValue) -> Result<NaiveDate, DateParseError> {
    match value {
        CellValue::Null => Err(DateParseError::null()),
        CellValue::Float(f) if f.is_nan() => Err(DateParseError::null()),
        CellValue::Date(date) => Ok(*date),
        CellValue::DateTime(dt) => Ok(dt.date_naive()),
        CellValue::Timestamp(ts) => Ok(ts.date()),
        #[allow(clippy::cast_precision_loss)]
        CellValue::Int(seconds) => from_epoch_seconds(*seconds as f64),
        CellValue::Float(seconds) => from_epoch_seconds(*seconds),
        CellValue::Str(text) => parse_text(text),
        CellValue::Bool(b) => Err(DateParseError::new(
            DateErrorCode::InvalidFormat,
            format!("boolean {b} is not a date"),
        )),
    }
}

/// Read a cell as a date and render it as `YYYY-MM-DD`.
///
/// # Errors
///
/// Fails exactly when [`parse_date`] fails.
pub fn parse_date_to_iso(value: &CellValue) -> Result<String, DateParseError> {
    parse_date(value).map(|date| date.format(ISO_DATE_FORMAT).to_string())
}

/// True iff both cells parse and `start` is not after `end`.
#[must_use]
pub fn validate_date_range(start: &CellValue, end: &CellValue) -> bool {
    matches!((parse_date(start), parse_date(end)), (Ok(s), Ok(e)) if s <= e)
}

/// Whole days from `start` to `end`.
#[must_use]
pub fn duration_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

fn parse_text(text: &str) -> Result<NaiveDate, DateParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(DateParseError::null());
    }

    if matches_shape(&ISO_DATE, text) {
        return NaiveDate::parse_from_str(text, ISO_DATE_FORMAT).map_err(|_| {
            DateParseError::new(DateErrorCode::InvalidDate, format!("'{text}' is not a real date"))
        });
    }

    if matches_shape(&ISO_DATETIME, text) {
        let day = &text[..10];
        return NaiveDate::parse_from_str(day, ISO_DATE_FORMAT).map_err(|_| {
            DateParseError::new(DateErrorCode::InvalidDate, format!("'{text}' is not a real date"))
        });
    }

    parse_human(text).ok_or_else(|| {
        DateParseError::new(
            DateErrorCode::InvalidFormat,
            format!("unrecognised date format '{text}'"),
        )
    })
}

fn matches_shape(pattern: &LazyLock<Option<Regex>>, text: &str) -> bool {
    pattern.as_ref().is_some_and(|re| re.is_match(text))
}

fn parse_human(text: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.date_naive());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn from_epoch_seconds(seconds: f64) -> Result<NaiveDate, DateParseError> {
    let out_of_range = || {
        DateParseError::new(
            DateErrorCode::InvalidFormat,
            format!(
                "epoch value {seconds} is outside {MIN_EPOCH_YEAR}-{MAX_EPOCH_YEAR}"
            ),
        )
    };

    if !seconds.is_finite() || seconds < 0.0 {
        return Err(out_of_range());
    }

    let whole = seconds.trunc();
    // 2100-12-31 is about 4.1e9 seconds; anything far past it is rejected here
    if whole > 1e11 {
        return Err(out_of_range());
    }
    let nanos = ((seconds - whole) * 1e9) as u32;

    DateTime::from_timestamp(whole as i64, nanos)
        .map(|dt| dt.date_naive())
        .filter(|date| (MIN_EPOCH_YEAR..=MAX_EPOCH_YEAR).contains(&date.year()))
        .ok_or_else(out_of_range)
}
