//! Tabular input records.
//!
//! A [`RecordSet`] is a list of rows sharing a known column schema. Cells are
//! loosely typed scalars: a column may mix strings, numbers and dates, and any
//! cell may be null or absent.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};

/// A single loosely typed cell.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "serde_json::Value")]
pub enum CellValue {
    /// Missing or explicit null
    Null,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Floating point number; NaN is treated as null
    Float(f64),
    /// Free text
    Str(String),
    /// Calendar date
    Date(NaiveDate),
    /// Timestamp with a UTC offset
    DateTime(DateTime<FixedOffset>),
    /// Timestamp without a zone
    Timestamp(NaiveDateTime),
}

static NULL_CELL: CellValue = CellValue::Null;

impl CellValue {
    /// True for [`CellValue::Null`] and NaN floats.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    /// String form of the cell, or `None` for null cells.
    ///
    /// Whole floats render without a fractional part, so `61.0` becomes
    /// `"61"`. Text is returned as-is, without trimming.
    #[must_use]
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Float(f) if f.is_nan() => None,
            Self::Bool(b) => Some(b.to_string()),
            Self::Int(i) => Some(i.to_string()),
            Self::Float(f) => Some(float_text(*f)),
            Self::Str(s) => Some(s.clone()),
            Self::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            Self::DateTime(dt) => Some(dt.to_rfc3339()),
            Self::Timestamp(ts) => Some(ts.format("%Y-%m-%dT%H:%M:%S").to_string()),
        }
    }

    /// Trimmed string form, or `None` when the cell is null or blank.
    #[must_use]
    pub fn non_blank_text(&self) -> Option<String> {
        self.to_text().and_then(|text| {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
    }
}

#[allow(clippy::cast_possible_truncation)]
fn float_text(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        (value as i64).to_string()
    } else {
        value.to_string()
    }
}

impl From<serde_json::Value> for CellValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float))
                .unwrap_or(Self::Null),
            serde_json::Value::String(s) => Self::Str(s),
            nested @ (serde_json::Value::Array(_) | serde_json::Value::Object(_)) => {
                Self::Str(nested.to_string())
            }
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(f) if f.is_finite() => serializer.serialize_f64(*f),
            Self::Float(_) => serializer.serialize_none(),
            Self::Str(s) => serializer.serialize_str(s),
            Self::Date(_) | Self::DateTime(_) | Self::Timestamp(_) => {
                serializer.serialize_str(&self.to_text().unwrap_or_default())
            }
        }
    }
}

/// One input row, keyed by column label.
pub type RawRecord = IndexMap<String, CellValue>;

/// Rows sharing a column schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    columns: Vec<String>,
    rows: Vec<RawRecord>,
}

impl RecordSet {
    /// Create a record set with an explicit schema.
    ///
    /// Rows may omit columns; omitted cells read as null.
    #[must_use]
    pub const fn new(columns: Vec<String>, rows: Vec<RawRecord>) -> Self {
        Self { columns, rows }
    }

    /// Create a record set whose schema is the union of the row keys, in the
    /// order they are first seen.
    #[must_use]
    pub fn from_rows(rows: Vec<RawRecord>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for key in row.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }
        Self { columns, rows }
    }

    /// Column labels, in schema order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// All rows, in input order.
    #[must_use]
    pub fn rows(&self) -> &[RawRecord] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether `column` is part of the schema.
    #[must_use]
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Iterate over the values of one column, null where a row omits it.
    pub fn column_values<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a CellValue> {
        self.rows.iter().map(move |row| cell(row, column))
    }
}

/// The cell of `row` under `column`, or null when absent.
#[must_use]
pub fn cell<'a>(row: &'a RawRecord, column: &str) -> &'a CellValue {
    row.get(column).unwrap_or(&NULL_CELL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_float_text_drops_fraction() {
        assert_eq!(CellValue::Float(61.0).to_text().as_deref(), Some("61"));
        assert_eq!(CellValue::Float(1.5).to_text().as_deref(), Some("1.5"));
        assert_eq!(CellValue::Float(f64::NAN).to_text(), None);
    }

    #[test]
    fn test_non_blank_text_trims() {
        assert_eq!(CellValue::from("  x ").non_blank_text().as_deref(), Some("x"));
        assert_eq!(CellValue::from("   ").non_blank_text(), None);
        assert_eq!(CellValue::Null.non_blank_text(), None);
    }

    #[test]
    fn test_from_json_value() {
        let row: RawRecord =
            serde_json::from_str(r#"{"a": 1, "b": 2.5, "c": null, "d": "x", "e": [1]}"#).unwrap();
        assert_eq!(row["a"], CellValue::Int(1));
        assert_eq!(row["b"], CellValue::Float(2.5));
        assert_eq!(row["c"], CellValue::Null);
        assert_eq!(row["d"], CellValue::from("x"));
        assert_eq!(row["e"], CellValue::from("[1]"));
    }

    #[test]
    fn test_schema_is_union_in_first_seen_order() {
        let first: RawRecord = serde_json::from_str(r#"{"id": 1, "start": "2024-01-01"}"#).unwrap();
        let second: RawRecord = serde_json::from_str(r#"{"owner": "x", "id": 2}"#).unwrap();
        let set = RecordSet::from_rows(vec![first, second]);

        assert_eq!(set.columns(), ["id", "start", "owner"]);
        assert!(set.has_column("owner"));
        assert_eq!(cell(&set.rows()[1], "start"), &CellValue::Null);
    }

    #[test]
    fn test_serialize_dates_as_text() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let json = serde_json::to_string(&CellValue::Date(date)).unwrap();
        assert_eq!(json, "\"2024-03-09\"");
        assert_eq!(serde_json::to_string(&CellValue::Float(f64::NAN)).unwrap(), "null");
    }
}
