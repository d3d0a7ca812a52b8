//! Value enum for dynamic field values

use chrono::DateTime;
use chrono::FixedOffset;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use chrono::Utc;

use super::Record;

/// A dynamic value that can hold any FileMaker field content.
///
/// This enum represents everything a decoded field can turn into, plus the
/// few outgoing-only shapes (integers, raw bytes) accepted by queries.
///
/// # Type Mapping
///
/// | FileMaker result type | Rust Variant |
/// |-----------------------|--------------|
/// | empty date/time | `Null` |
/// | number | `Number` |
/// | text, container | `Text` |
/// | date | `Date` |
/// | time | `Time` |
/// | timestamp | `Timestamp` / `TimestampTz` |
/// | repeating field | `List` |
/// | `table::field` | `Record` |
/// | relatedset | `Records` |
///
/// # Example
///
/// ```
/// use filemaker_lib::model::Value;
///
/// let name = Value::from("Contoso");
/// let size = Value::from(12.5);
/// let empty = Value::Null;
/// assert_eq!(name.as_text(), Some("Contoso"));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Null/empty value.
    #[default]
    Null,
    /// Floating point number (NaN for malformed numbers).
    Number(f64),
    /// Integer, only produced by callers.
    Integer(i64),
    /// Text value.
    Text(String),
    /// Raw bytes, sent as UTF-8.
    Bytes(Vec<u8>),
    /// Calendar date.
    Date(NaiveDate),
    /// Time of day.
    Time(NaiveTime),
    /// Timestamp without timezone information.
    Timestamp(NaiveDateTime),
    /// Timestamp localized to a timezone.
    TimestampTz(DateTime<FixedOffset>),
    /// Values of a repeating field, in repetition order.
    List(Vec<Value>),
    /// Nested record built from a `table::field` path.
    Record(Box<Record>),
    /// Rows of a related set.
    Records(Vec<Record>),
}

impl Value {
    /// Returns `true` if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the type name of this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Number(_) => "number",
            Value::Integer(_) => "integer",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::Timestamp(_) => "timestamp",
            Value::TimestampTz(_) => "timestamp_tz",
            Value::List(_) => "list",
            Value::Record(_) => "record",
            Value::Records(_) => "records",
        }
    }

    /// Returns the text content, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the number, if this is a number or an integer.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Returns the nested record, if any.
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Returns the related rows, if any.
    pub fn as_records(&self) -> Option<&[Record]> {
        match self {
            Value::Records(r) => Some(r),
            _ => None,
        }
    }
}

// =============================================================================
// From implementations
// =============================================================================

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<NaiveTime> for Value {
    fn from(v: NaiveTime) -> Self {
        Value::Time(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(v: DateTime<FixedOffset>) -> Self {
        Value::TimestampTz(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::TimestampTz(v.fixed_offset())
    }
}

impl From<Record> for Value {
    fn from(v: Record) -> Self {
        Value::Record(Box::new(v))
    }
}

impl From<Vec<Record>> for Value {
    fn from(v: Vec<Record>) -> Self {
        Value::Records(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Value::Null,
        }
    }
}
