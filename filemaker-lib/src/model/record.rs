//! Dynamic FileMaker record with change tracking

use chrono::DateTime;
use chrono::FixedOffset;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use indexmap::IndexMap;

use super::Value;
use crate::error::FieldError;

/// A dynamic record decoded from an `fmresultset` response.
///
/// Records hold field values in insertion order and count how many times
/// each key is written. A key written more than once since the last
/// [`reset_changes`](Record::reset_changes) is reported by
/// [`changed_keys`](Record::changed_keys), which is what
/// [`edit`](crate::FileMakerClient::edit) sends back to the server.
///
/// # Example
///
/// ```
/// use filemaker_lib::model::Record;
///
/// let mut record = Record::new()
///     .set("name", "Contoso")
///     .set("size", 12.0);
///
/// assert!(record.changed_keys().is_empty());
///
/// record.insert("name", "Fabrikam");
/// assert_eq!(record.changed_keys(), vec!["name"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Record {
    /// The server-assigned row identity.
    pub(crate) record_id: Option<String>,

    /// The optimistic-concurrency version stamp.
    pub(crate) mod_id: Option<String>,

    /// The field values.
    pub(crate) fields: IndexMap<String, Value>,

    /// How many times each key was written.
    touches: IndexMap<String, u32>,
}

impl Record {
    /// Creates a new empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new empty record carrying server identifiers.
    pub fn with_ids(record_id: impl Into<String>, mod_id: Option<String>) -> Self {
        Self {
            record_id: Some(record_id.into()),
            mod_id,
            ..Self::default()
        }
    }

    // =========================================================================
    // Identity
    // =========================================================================

    /// Returns the record id, if known.
    pub fn record_id(&self) -> Option<&str> {
        self.record_id.as_deref()
    }

    /// Returns the modification id, if known.
    pub fn mod_id(&self) -> Option<&str> {
        self.mod_id.as_deref()
    }

    pub(crate) fn set_ids(&mut self, record_id: Option<String>, mod_id: Option<String>) {
        self.record_id = record_id;
        self.mod_id = mod_id;
    }

    // =========================================================================
    // Raw field access
    // =========================================================================

    /// Returns a reference to the field value, if it exists.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns a mutable reference to the field value.
    ///
    /// Mutating through this reference doesn't count as a write.
    pub fn get_mut(&mut self, field: &str) -> Option<&mut Value> {
        self.fields.get_mut(field)
    }

    /// Returns `true` if the record contains the given field.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Returns a reference to all fields, in insertion order.
    pub fn fields(&self) -> &IndexMap<String, Value> {
        &self.fields
    }

    /// Iterates over the field names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|k| k.as_str())
    }

    /// Iterates over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    // =========================================================================
    // Writes (tracked)
    // =========================================================================

    /// Sets a field value (builder pattern).
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    /// Inserts a field value, returning the previous one.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let field = field.into();
        self.touch(&field);
        self.fields.insert(field, value.into())
    }

    /// Removes a field and returns its value.
    ///
    /// Removing a missing field is not a change.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        let removed = self.fields.shift_remove(field);
        if removed.is_some() {
            self.touch(field);
        }
        removed
    }

    /// Removes every field.
    pub fn clear(&mut self) {
        let keys: Vec<String> = self.fields.keys().cloned().collect();
        for key in &keys {
            self.touch(key);
        }
        self.fields.clear();
    }

    /// Inserts every pair from `other`.
    pub fn extend<K, V>(&mut self, other: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<Value>,
    {
        for (key, value) in other {
            self.insert(key, value);
        }
    }

    /// Returns the keys written more than once since the last reset.
    pub fn changed_keys(&self) -> Vec<&str> {
        self.touches
            .iter()
            .filter(|(_, count)| **count > 1)
            .map(|(key, _)| key.as_str())
            .collect()
    }

    /// Makes the current content the new baseline for change tracking.
    pub fn reset_changes(&mut self) {
        self.touches = self.fields.keys().map(|k| (k.clone(), 1)).collect();
    }

    /// Returns the nested record stored under `key`, creating it when absent
    /// or when the slot holds a non-record value.
    pub(crate) fn nested_mut(&mut self, key: &str) -> &mut Record {
        if !matches!(self.fields.get(key), Some(Value::Record(_))) {
            self.insert(key, Value::Record(Box::default()));
        }
        match self.fields.get_mut(key) {
            Some(Value::Record(child)) => child,
            _ => unreachable!("nested record was inserted above"),
        }
    }

    fn touch(&mut self, field: &str) {
        *self.touches.entry(field.to_string()).or_insert(0) += 1;
    }

    // =========================================================================
    // Typed getters
    //
    // Return Err if field is missing or wrong type.
    // Return Ok(None) only if the field exists and is Value::Null.
    // =========================================================================

    /// Gets a text field value.
    pub fn get_text(&self, field: &str) -> Result<Option<&str>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::Text(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(FieldError::type_mismatch(field, "text", other.type_name())),
        }
    }

    /// Gets a number field value.
    pub fn get_number(&self, field: &str) -> Result<Option<f64>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => Ok(Some(*n)),
            Some(Value::Integer(n)) => Ok(Some(*n as f64)),
            Some(other) => Err(FieldError::type_mismatch(field, "number", other.type_name())),
        }
    }

    /// Gets a date field value.
    pub fn get_date(&self, field: &str) -> Result<Option<NaiveDate>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::Date(d)) => Ok(Some(*d)),
            Some(other) => Err(FieldError::type_mismatch(field, "date", other.type_name())),
        }
    }

    /// Gets a time field value.
    pub fn get_time(&self, field: &str) -> Result<Option<NaiveTime>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::Time(t)) => Ok(Some(*t)),
            Some(other) => Err(FieldError::type_mismatch(field, "time", other.type_name())),
        }
    }

    /// Gets a timestamp field value without timezone.
    pub fn get_timestamp(&self, field: &str) -> Result<Option<NaiveDateTime>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::Timestamp(ts)) => Ok(Some(*ts)),
            Some(other) => Err(FieldError::type_mismatch(
                field,
                "timestamp",
                other.type_name(),
            )),
        }
    }

    /// Gets a timestamp field value localized to the server timezone.
    pub fn get_timestamp_tz(&self, field: &str) -> Result<Option<DateTime<FixedOffset>>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::TimestampTz(ts)) => Ok(Some(*ts)),
            Some(other) => Err(FieldError::type_mismatch(
                field,
                "timestamp_tz",
                other.type_name(),
            )),
        }
    }

    /// Gets the values of a repeating field.
    pub fn get_list(&self, field: &str) -> Result<Option<&[Value]>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::List(values)) => Ok(Some(values)),
            Some(other) => Err(FieldError::type_mismatch(field, "list", other.type_name())),
        }
    }

    /// Gets a nested record (fields of another table shown on the layout).
    pub fn get_record(&self, field: &str) -> Result<Option<&Record>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::Record(r)) => Ok(Some(r.as_ref())),
            Some(other) => Err(FieldError::type_mismatch(field, "record", other.type_name())),
        }
    }

    /// Gets the rows of a related set.
    pub fn get_records(&self, field: &str) -> Result<Option<&[Record]>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::Records(r)) => Ok(Some(r)),
            Some(other) => Err(FieldError::type_mismatch(field, "records", other.type_name())),
        }
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.record_id == other.record_id
            && self.mod_id == other.mod_id
            && self.fields == other.fields
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        record.extend(iter);
        record
    }
}
