//! Header and metadata elements

use log::debug;

use super::Decoder;
use super::Step;
use super::attrs::Attributes;
use crate::error::DecodeError;
use crate::meta::ContainerField;
use crate::meta::FieldDescriptor;

impl<R> Decoder<R> {
    /// `<error code="..."/>`: 0 continues, 401 ends the stream, anything else fails.
    pub(super) fn on_error(&mut self, attrs: &Attributes) -> Result<Step, DecodeError> {
        let raw = attrs.get("code");
        let code: u32 = raw
            .and_then(|c| c.trim().parse().ok())
            .ok_or_else(|| DecodeError::BadErrorCode(raw.map(str::to_string)))?;
        match code {
            0 => Ok(Step::Continue),
            401 => {
                debug!("No records match the request");
                Ok(Step::Finish)
            }
            code => Err(DecodeError::server(code)),
        }
    }

    pub(super) fn on_product(&mut self, attrs: &Attributes) {
        self.registry.set_server_version(attrs.get_owned("version"));
    }

    pub(super) fn on_datasource(&mut self, attrs: &Attributes) {
        self.registry.set_datasource(
            attrs.get_owned("database"),
            attrs.get_owned("layout"),
            attrs.get_owned("table"),
        );
        self.registry.learn_date_formats(
            attrs.get("date-format").unwrap_or_default(),
            attrs.get("time-format").unwrap_or_default(),
            attrs.get("timestamp-format").unwrap_or_default(),
        );
    }

    /// Both counters fall back to 0 unless both parse.
    pub(super) fn on_resultset(&mut self, attrs: &Attributes) {
        let count = attrs.get("count").and_then(|c| c.parse::<u64>().ok());
        let fetched = attrs.get("fetch-size").and_then(|c| c.parse::<u64>().ok());
        match (count, fetched) {
            (Some(count), Some(fetched)) => self.registry.set_counts(count, fetched),
            _ => self.registry.set_counts(0, 0),
        }
    }

    pub(super) fn on_field_definition(&mut self, attrs: &Attributes) -> Result<(), DecodeError> {
        let name = attrs
            .get("name")
            .ok_or_else(|| DecodeError::missing_attribute("field-definition", "name"))?;
        let table = self.definitions.last().map(String::as_str);
        self.registry
            .register_definition(name, attrs.get("result"), attrs.get("max-repeat"), table);
        Ok(())
    }

    pub(super) fn on_relatedset_definition(&mut self, attrs: &Attributes) -> Result<(), DecodeError> {
        let table = attrs
            .get_owned("table")
            .ok_or_else(|| DecodeError::missing_attribute("relatedset-definition", "table"))?;
        self.registry
            .register_field(FieldDescriptor::Container(ContainerField::new(table.clone())));
        self.definitions.push(table);
        Ok(())
    }
}
