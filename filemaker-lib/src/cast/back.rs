//! Outgoing value conversion

use chrono::FixedOffset;

use crate::error::ValidationError;
use crate::model::Value;

/// Wire pattern for dates.
pub const DATE_FORMAT: &str = "%m/%d/%Y";
/// Wire pattern for times.
pub const TIME_FORMAT: &str = "%H:%M:%S";
/// Wire pattern for timestamps.
pub const TIMESTAMP_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

/// Converts typed values into the text the server expects in query
/// parameters.
///
/// Temporal values always use the fixed US patterns above, whatever the
/// server announces for its responses. Zoned timestamps are shifted into
/// the server timezone when one is configured; naive timestamps are sent
/// untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackCaster {
    timezone: Option<FixedOffset>,
}

impl BackCaster {
    /// Creates a back-caster converting zoned timestamps to `timezone`.
    pub fn new(timezone: Option<FixedOffset>) -> Self {
        Self { timezone }
    }

    /// Returns the server timezone, if any.
    pub fn timezone(&self) -> Option<FixedOffset> {
        self.timezone
    }

    /// Converts `value` for `field`.
    pub fn cast(&self, field: &str, value: &Value) -> Result<String, ValidationError> {
        let text = match value {
            Value::Null => String::new(),
            Value::Number(n) => n.to_string(),
            Value::Integer(n) => n.to_string(),
            Value::Text(s) => s.clone(),
            Value::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
            Value::Date(d) => d.format(DATE_FORMAT).to_string(),
            Value::Time(t) => t.format(TIME_FORMAT).to_string(),
            Value::Timestamp(ts) => ts.format(TIMESTAMP_FORMAT).to_string(),
            Value::TimestampTz(ts) => match self.timezone {
                Some(tz) => ts.with_timezone(&tz).format(TIMESTAMP_FORMAT).to_string(),
                None => ts.format(TIMESTAMP_FORMAT).to_string(),
            },
            Value::List(_) | Value::Record(_) | Value::Records(_) => {
                return Err(ValidationError::UnsupportedValue {
                    field: field.to_string(),
                    type_name: value.type_name(),
                });
            }
        };
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use chrono::NaiveTime;
    use chrono::TimeZone;
    use chrono::Utc;

    use super::*;
    use crate::cast::CasterKind;
    use crate::cast::DateFormats;
    use crate::cast::TypeCaster;
    use crate::model::Record;

    fn zurich() -> FixedOffset {
        FixedOffset::east_opt(2 * 3600).unwrap()
    }

    #[test]
    fn test_scalars() {
        let back = BackCaster::default();
        assert_eq!(back.cast("f", &Value::Null).unwrap(), "");
        assert_eq!(back.cast("f", &Value::Integer(12)).unwrap(), "12");
        assert_eq!(back.cast("f", &Value::Number(1.5)).unwrap(), "1.5");
        assert_eq!(back.cast("f", &Value::from("abc")).unwrap(), "abc");
        assert_eq!(back.cast("f", &Value::from(&b"raw"[..])).unwrap(), "raw");
    }

    #[test]
    fn test_date_and_time() {
        let back = BackCaster::default();
        let date = NaiveDate::from_ymd_opt(2018, 9, 1).unwrap();
        let time = NaiveTime::from_hms_opt(7, 5, 3).unwrap();
        assert_eq!(back.cast("d", &Value::Date(date)).unwrap(), "09/01/2018");
        assert_eq!(back.cast("t", &Value::Time(time)).unwrap(), "07:05:03");
    }

    #[test]
    fn test_zoned_timestamp_converted_to_server_zone() {
        let utc = Utc.with_ymd_and_hms(2018, 9, 1, 9, 54, 7).unwrap();
        let value = Value::from(utc);

        let plain = BackCaster::default();
        assert_eq!(plain.cast("ts", &value).unwrap(), "09/01/2018 09:54:07");

        let zoned = BackCaster::new(Some(zurich()));
        assert_eq!(zoned.cast("ts", &value).unwrap(), "09/01/2018 11:54:07");

        let la = FixedOffset::west_opt(7 * 3600).unwrap();
        let local = la.with_ymd_and_hms(2018, 9, 1, 4, 54, 7).unwrap();
        assert_eq!(zoned.cast("ts", &Value::from(local)).unwrap(), "09/01/2018 13:54:07");
    }

    #[test]
    fn test_naive_timestamp_not_adjusted() {
        let naive = NaiveDate::from_ymd_opt(2018, 9, 1)
            .unwrap()
            .and_hms_opt(11, 54, 7)
            .unwrap();
        let zoned = BackCaster::new(Some(zurich()));
        assert_eq!(zoned.cast("ts", &Value::Timestamp(naive)).unwrap(), "09/01/2018 11:54:07");
    }

    #[test]
    fn test_nested_values_rejected() {
        let back = BackCaster::default();
        let err = back
            .cast("rep", &Value::List(vec![Value::from(1)]))
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnsupportedValue {
                field: "rep".into(),
                type_name: "list",
            }
        );
        assert!(back.cast("rel", &Value::from(Record::new())).is_err());
    }

    #[test]
    fn test_round_trip_through_casters() {
        let formats = DateFormats::learn("MM/dd/yyyy", "HH:mm:ss", "MM/dd/yyyy HH:mm:ss");
        let back = BackCaster::new(Some(zurich()));
        let date = Value::Date(NaiveDate::from_ymd_opt(2020, 2, 29).unwrap());
        let time = Value::Time(NaiveTime::from_hms_opt(23, 59, 1).unwrap());
        let stamp = Value::TimestampTz(zurich().with_ymd_and_hms(2020, 2, 29, 23, 59, 1).unwrap());

        for (kind, value) in [
            (CasterKind::Date, date),
            (CasterKind::Time, time),
            (CasterKind::Timestamp, stamp),
        ] {
            let wire = back.cast("f", &value).unwrap();
            let caster = TypeCaster::new(kind, &formats, Some(zurich()));
            assert_eq!(caster.cast(Some(&wire)), value);
        }
    }
}
