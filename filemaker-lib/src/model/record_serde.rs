//! Serialization of decoded records for export.
//!
//! - Fields serialize in insertion order.
//! - Dates, times and timestamps serialize as ISO-8601 strings.
//! - NaN numbers serialize as `null` (JSON has no NaN).
//! - Repeating fields serialize as arrays, related sets as arrays of objects.
//! - `record_id`/`mod_id` are not part of the map; use the accessors.

use serde::Serialize;
use serde::Serializer;
use serde::ser::SerializeMap;
use serde::ser::SerializeSeq;

use super::Record;
use super::Value;

impl Serialize for Record {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Number(n) if n.is_nan() => serializer.serialize_none(),
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::Integer(n) => serializer.serialize_i64(*n),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Bytes(b) => serializer.serialize_str(&String::from_utf8_lossy(b)),
            Value::Date(d) => d.serialize(serializer),
            Value::Time(t) => t.serialize(serializer),
            Value::Timestamp(ts) => ts.serialize(serializer),
            Value::TimestampTz(ts) => ts.serialize(serializer),
            Value::List(values) => {
                let mut seq = serializer.serialize_seq(Some(values.len()))?;
                for value in values {
                    seq.serialize_element(value)?;
                }
                seq.end()
            }
            Value::Record(record) => record.serialize(serializer),
            Value::Records(records) => {
                let mut seq = serializer.serialize_seq(Some(records.len()))?;
                for record in records {
                    seq.serialize_element(record)?;
                }
                seq.end()
            }
        }
    }
}

impl Record {
    /// Converts the record into a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn test_serialize_simple_fields() {
        let record = Record::new().set("name", "Contoso").set("size", 12.5);

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"name":"Contoso","size":12.5}"#);
    }

    #[test]
    fn test_serialize_nan_as_null() {
        let record = Record::new().set("size", f64::NAN);
        assert_eq!(record.to_json(), serde_json::json!({ "size": null }));
    }

    #[test]
    fn test_serialize_dates_and_related_rows() {
        let date = NaiveDate::from_ymd_opt(2018, 9, 1).unwrap();
        let row = Record::new().set("amount", 3.0);
        let record = Record::new()
            .set("day", date)
            .set("orders", vec![row])
            .set("tags", Value::List(vec!["a".into(), "b".into()]));

        assert_eq!(
            record.to_json(),
            serde_json::json!({
                "day": "2018-09-01",
                "orders": [{ "amount": 3.0 }],
                "tags": ["a", "b"],
            })
        );
    }
}
