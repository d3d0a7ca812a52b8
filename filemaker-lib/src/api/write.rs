//! Record creation, edition and deletion

use crate::FileMakerClient;
use crate::api::query::Action;
use crate::api::query::Arg;
use crate::error::Error;
use crate::error::ValidationError;
use crate::model::Record;
use crate::model::Value;

impl FileMakerClient {
    /// Creates a record and returns it as stored by the server.
    ///
    /// Names follow [`Query::add_param`](crate::api::query::Query::add_param):
    /// `orders__id` is sent as `orders::id`.
    pub async fn create<I, K, V>(&self, fields: I) -> Result<Option<Record>, Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut query = self.query(Action::New);
        for (name, value) in fields {
            query.add_param(name.as_ref(), value)?;
        }
        self.fetch(&query).await?.next().transpose()
    }

    /// Sends the changed fields of a decoded record.
    ///
    /// Only keys reported by [`Record::changed_keys`] are sent, together
    /// with the record and modification ids. Related fields and repeating
    /// fields can't be edited this way.
    pub async fn edit(&self, record: &Record) -> Result<Option<Record>, Error> {
        let record_id = record.record_id().ok_or(ValidationError::MissingArgument {
            action: Action::Edit.wire_name(),
            argument: Arg::RecordId.as_str(),
        })?;

        let mut query = self.query(Action::Edit).record_id(record_id);
        if let Some(mod_id) = record.mod_id() {
            query = query.mod_id(mod_id);
        }
        for key in record.changed_keys() {
            let value = record.get(key).cloned().unwrap_or(Value::Null);
            query.add_raw_param(key, value)?;
        }
        self.fetch(&query).await?.next().transpose()
    }

    /// Sets fields of the record identified by `record_id`.
    ///
    /// Names are parsed like in [`create`](FileMakerClient::create).
    pub async fn edit_fields<I, K, V>(&self, record_id: &str, fields: I) -> Result<Option<Record>, Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut query = self.query(Action::Edit).record_id(record_id);
        for (name, value) in fields {
            query.add_param(name.as_ref(), value)?;
        }
        self.fetch(&query).await?.next().transpose()
    }

    /// Deletes a record.
    ///
    /// With `error_if_missing` unset, a record that no longer exists
    /// (error 101) is not an error.
    pub async fn delete(&self, record_id: &str, error_if_missing: bool) -> Result<(), Error> {
        let query = self.query(Action::Delete).record_id(record_id);
        for record in self.fetch(&query).await? {
            match record {
                Ok(_) => {}
                Err(e) if !error_if_missing && e.server_code() == Some(101) => return Ok(()),
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Duplicates a record and returns the copy.
    pub async fn duplicate(&self, record_id: &str) -> Result<Option<Record>, Error> {
        let query = self.query(Action::Duplicate).record_id(record_id);
        self.fetch(&query).await?.next().transpose()
    }
}
