//! Field type casting.
//!
//! Every data field declared in the response metadata gets a [`TypeCaster`]
//! chosen from its `result` attribute through a [`CastMap`]. Casters never
//! fail: malformed numbers become NaN and malformed dates become
//! [`Value::Null`], so bad server data can't abort a decode.
//!
//! Outgoing values go the other way through [`BackCaster`].

mod back;
mod formats;

pub use back::*;
pub use formats::*;

use std::fmt;

use chrono::FixedOffset;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use chrono::TimeZone;

use crate::model::Value;

/// A result type declared by the server on a `field-definition`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastType {
    Number,
    Text,
    Date,
    Time,
    Timestamp,
}

impl CastType {
    /// Parses the `result` attribute. Returns `None` for anything else
    /// (containers, unknown types).
    pub fn from_result(result: &str) -> Option<Self> {
        match result {
            "number" => Some(Self::Number),
            "text" => Some(Self::Text),
            "date" => Some(Self::Date),
            "time" => Some(Self::Time),
            "timestamp" => Some(Self::Timestamp),
            _ => None,
        }
    }
}

/// The conversion a caster applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CasterKind {
    /// Floating point, NaN on failure.
    Number,
    /// Floating point with `,` as decimal separator, NaN on failure.
    CommaDecimal,
    /// Text, missing input becomes an empty string.
    Text,
    /// Date parsed with the learned date pattern.
    Date,
    /// Time parsed with the learned time pattern.
    Time,
    /// Timestamp parsed with the learned timestamp pattern.
    Timestamp,
    /// Raw text, missing input becomes null.
    Default,
}

/// Maps server result types to casters.
///
/// The map is a plain value: each registry gets its own copy, so overriding
/// a cast for one client never leaks into another.
///
/// # Example
///
/// ```
/// use filemaker_lib::cast::{CastMap, CastType, CasterKind};
///
/// let map = CastMap::default().with(CastType::Number, CasterKind::CommaDecimal);
/// assert_eq!(map.get(CastType::Number), CasterKind::CommaDecimal);
/// assert_eq!(map.get(CastType::Date), CasterKind::Date);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CastMap {
    number: CasterKind,
    text: CasterKind,
    date: CasterKind,
    time: CasterKind,
    timestamp: CasterKind,
}

impl Default for CastMap {
    fn default() -> Self {
        Self {
            number: CasterKind::Number,
            text: CasterKind::Text,
            date: CasterKind::Date,
            time: CasterKind::Time,
            timestamp: CasterKind::Timestamp,
        }
    }
}

impl CastMap {
    /// Creates the default map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the caster for one result type.
    pub fn with(mut self, cast_type: CastType, kind: CasterKind) -> Self {
        *self.slot(cast_type) = kind;
        self
    }

    /// Returns the caster for a result type.
    pub fn get(&self, cast_type: CastType) -> CasterKind {
        match cast_type {
            CastType::Number => self.number,
            CastType::Text => self.text,
            CastType::Date => self.date,
            CastType::Time => self.time,
            CastType::Timestamp => self.timestamp,
        }
    }

    /// Returns the caster for a raw `result` attribute, falling back to text.
    pub fn for_result(&self, result: Option<&str>) -> CasterKind {
        result
            .and_then(CastType::from_result)
            .map(|ty| self.get(ty))
            .unwrap_or(CasterKind::Text)
    }

    fn slot(&mut self, cast_type: CastType) -> &mut CasterKind {
        match cast_type {
            CastType::Number => &mut self.number,
            CastType::Text => &mut self.text,
            CastType::Date => &mut self.date,
            CastType::Time => &mut self.time,
            CastType::Timestamp => &mut self.timestamp,
        }
    }
}

/// A caster bound to the patterns and timezone known when its field was
/// registered.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeCaster {
    Number,
    CommaDecimal,
    Text,
    Default,
    Date { pattern: String },
    Time { pattern: String },
    Timestamp {
        pattern: String,
        timezone: Option<FixedOffset>,
    },
}

impl TypeCaster {
    /// Builds a caster of the given kind.
    pub fn new(kind: CasterKind, formats: &DateFormats, timezone: Option<FixedOffset>) -> Self {
        match kind {
            CasterKind::Number => Self::Number,
            CasterKind::CommaDecimal => Self::CommaDecimal,
            CasterKind::Text => Self::Text,
            CasterKind::Default => Self::Default,
            CasterKind::Date => Self::Date {
                pattern: formats.date.clone(),
            },
            CasterKind::Time => Self::Time {
                pattern: formats.time.clone(),
            },
            CasterKind::Timestamp => Self::Timestamp {
                pattern: formats.timestamp.clone(),
                timezone,
            },
        }
    }

    /// Returns the kind of this caster.
    pub fn kind(&self) -> CasterKind {
        match self {
            Self::Number => CasterKind::Number,
            Self::CommaDecimal => CasterKind::CommaDecimal,
            Self::Text => CasterKind::Text,
            Self::Default => CasterKind::Default,
            Self::Date { .. } => CasterKind::Date,
            Self::Time { .. } => CasterKind::Time,
            Self::Timestamp { .. } => CasterKind::Timestamp,
        }
    }

    /// Converts wire text to a value. `None` means the `<data>` element had
    /// no text at all.
    pub fn cast(&self, raw: Option<&str>) -> Value {
        match self {
            Self::Number => Value::Number(parse_number(raw.unwrap_or_default())),
            Self::CommaDecimal => {
                let text = raw.unwrap_or_default().replace(',', ".");
                Value::Number(parse_number(&text))
            }
            Self::Text => Value::Text(raw.unwrap_or_default().to_string()),
            Self::Default => raw.map(|s| Value::Text(s.to_string())).unwrap_or(Value::Null),
            Self::Date { pattern } => raw
                .and_then(|s| NaiveDate::parse_from_str(s, pattern).ok())
                .map(Value::Date)
                .unwrap_or(Value::Null),
            Self::Time { pattern } => raw
                .and_then(|s| NaiveTime::parse_from_str(s, pattern).ok())
                .map(Value::Time)
                .unwrap_or(Value::Null),
            Self::Timestamp { pattern, timezone } => {
                let Some(naive) = raw.and_then(|s| NaiveDateTime::parse_from_str(s, pattern).ok())
                else {
                    return Value::Null;
                };
                match timezone {
                    Some(tz) => tz
                        .from_local_datetime(&naive)
                        .single()
                        .map(Value::TimestampTz)
                        .unwrap_or(Value::Null),
                    None => Value::Timestamp(naive),
                }
            }
        }
    }
}

impl fmt::Display for TypeCaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date { pattern } | Self::Time { pattern } => {
                write!(f, "{:?}({})", self.kind(), pattern)
            }
            Self::Timestamp { pattern, .. } => write!(f, "Timestamp({})", pattern),
            other => write!(f, "{:?}", other.kind()),
        }
    }
}

fn parse_number(text: &str) -> f64 {
    text.trim().parse::<f64>().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formats() -> DateFormats {
        DateFormats::learn("MM/dd/yyyy", "HH:mm:ss", "MM/dd/yyyy HH:mm:ss")
    }

    fn caster(kind: CasterKind) -> TypeCaster {
        TypeCaster::new(kind, &formats(), None)
    }

    #[test]
    fn test_number_cast() {
        assert_eq!(caster(CasterKind::Number).cast(Some("0.123")), Value::Number(0.123));
        assert_eq!(caster(CasterKind::Number).cast(Some(" 42 ")), Value::Number(42.0));
    }

    #[test]
    fn test_malformed_number_is_nan() {
        for raw in [Some("4ac"), Some(""), None] {
            match caster(CasterKind::Number).cast(raw) {
                Value::Number(n) => assert!(n.is_nan(), "{raw:?} should be NaN"),
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn test_comma_decimal_cast() {
        assert_eq!(
            caster(CasterKind::CommaDecimal).cast(Some("3,25")),
            Value::Number(3.25)
        );
    }

    #[test]
    fn test_text_cast() {
        assert_eq!(caster(CasterKind::Text).cast(Some("abc")), Value::Text("abc".into()));
        assert_eq!(caster(CasterKind::Text).cast(None), Value::Text(String::new()));
        assert_eq!(caster(CasterKind::Default).cast(None), Value::Null);
    }

    #[test]
    fn test_date_cast() {
        let date = NaiveDate::from_ymd_opt(2018, 9, 1).unwrap();
        assert_eq!(caster(CasterKind::Date).cast(Some("09/01/2018")), Value::Date(date));
        assert_eq!(caster(CasterKind::Date).cast(Some("2018-09-01")), Value::Null);
        assert_eq!(caster(CasterKind::Date).cast(None), Value::Null);
    }

    #[test]
    fn test_date_cast_without_learned_pattern() {
        let caster = TypeCaster::new(CasterKind::Date, &DateFormats::default(), None);
        assert_eq!(caster.cast(Some("09/01/2018")), Value::Null);
    }

    #[test]
    fn test_time_cast() {
        let time = NaiveTime::from_hms_opt(11, 53, 56).unwrap();
        assert_eq!(caster(CasterKind::Time).cast(Some("11:53:56")), Value::Time(time));
        assert_eq!(caster(CasterKind::Time).cast(Some("noon")), Value::Null);
    }

    #[test]
    fn test_timestamp_cast_naive_and_zoned() {
        let naive = NaiveDate::from_ymd_opt(2018, 9, 1)
            .unwrap()
            .and_hms_opt(11, 54, 7)
            .unwrap();
        assert_eq!(
            caster(CasterKind::Timestamp).cast(Some("09/01/2018 11:54:07")),
            Value::Timestamp(naive)
        );

        let zurich = FixedOffset::east_opt(2 * 3600).unwrap();
        let zoned = TypeCaster::new(CasterKind::Timestamp, &formats(), Some(zurich))
            .cast(Some("09/01/2018 11:54:07"));
        let expected = zurich.from_local_datetime(&naive).single().unwrap();
        assert_eq!(zoned, Value::TimestampTz(expected));
    }

    #[test]
    fn test_cast_map_falls_back_to_text() {
        let map = CastMap::default();
        assert_eq!(map.for_result(Some("number")), CasterKind::Number);
        assert_eq!(map.for_result(Some("container")), CasterKind::Text);
        assert_eq!(map.for_result(None), CasterKind::Text);
    }

    #[test]
    fn test_cast_map_override_is_local() {
        let custom = CastMap::default().with(CastType::Date, CasterKind::Default);
        assert_eq!(custom.get(CastType::Date), CasterKind::Default);
        assert_eq!(CastMap::default().get(CastType::Date), CasterKind::Date);
    }
}
