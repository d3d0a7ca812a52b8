//! Response schema registry.
//!
//! A [`MetadataRegistry`] is filled while a response is decoded: the
//! `<datasource>` element provides identifiers and date formats, the
//! `<metadata>` element declares every field with its result type. The
//! decoder then resolves each `<field>` of each record against it.
//!
//! Registries are built fresh for every response since two layouts (or two
//! requests on the same layout) may expose different fields.

mod field;

pub use field::*;

use std::fmt;

use chrono::FixedOffset;
use indexmap::IndexMap;
use log::warn;

use crate::cast::CastMap;
use crate::cast::DateFormats;
use crate::cast::TypeCaster;
use crate::error::FieldError;

/// Everything learned about a response besides its records.
#[derive(Debug, Clone, Default)]
pub struct MetadataRegistry {
    cast_map: CastMap,
    server_timezone: Option<FixedOffset>,

    namespace: Option<String>,
    namespace_len: usize,

    server_version: Option<String>,
    database: Option<String>,
    layout: Option<String>,
    table: Option<String>,
    formats: DateFormats,

    total_count: u64,
    fetch_count: u64,

    fields: IndexMap<String, FieldDescriptor>,
}

impl MetadataRegistry {
    /// Creates an empty registry with the default cast map and no timezone.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry casting with `cast_map`.
    pub fn with_cast_map(cast_map: CastMap, server_timezone: Option<FixedOffset>) -> Self {
        Self {
            cast_map,
            server_timezone,
            ..Self::default()
        }
    }

    // =========================================================================
    // Fields
    // =========================================================================

    /// Registers a descriptor.
    ///
    /// Data fields owned by a related table go into that table's container,
    /// which is created when missing. A duplicate key is logged and replaced;
    /// the replaced descriptor is returned.
    pub fn register_field(&mut self, descriptor: FieldDescriptor) -> Option<FieldDescriptor> {
        let key = descriptor.qualified_key();
        let replaced = match descriptor {
            FieldDescriptor::Data(field) if field.table().is_some() => {
                let table = field.table().unwrap_or_default().to_string();
                let raw_name = field.raw_name().to_string();
                self.container_mut(&table)
                    .insert(raw_name, FieldDescriptor::Data(field))
            }
            FieldDescriptor::Container(container) => {
                let merges = container.fields().is_empty()
                    && matches!(self.fields.get(&key), Some(FieldDescriptor::Container(_)));
                if merges {
                    // Fields registered before their container stay in place.
                    return None;
                }
                self.fields.insert(key.clone(), FieldDescriptor::Container(container))
            }
            data => self.fields.insert(key.clone(), data),
        };
        if replaced.is_some() {
            warn!("Field {} is declared twice in the metadata", key);
        }
        replaced
    }

    /// Registers a data field declared by a `field-definition` element.
    pub fn register_definition(
        &mut self,
        raw_name: &str,
        result: Option<&str>,
        max_repeat: Option<&str>,
        table: Option<&str>,
    ) -> Option<FieldDescriptor> {
        let repeat = max_repeat.and_then(|r| r.trim().parse().ok()).unwrap_or(1);
        let field = DataField::new(
            raw_name,
            table.map(str::to_string),
            repeat,
            self.caster_for(result),
        );
        self.register_field(FieldDescriptor::Data(field))
    }

    /// Resolves a field by raw name within an optional related table.
    pub fn resolve_field(&self, name: &str, table: Option<&str>) -> Result<&FieldDescriptor, FieldError> {
        let found = match table {
            None => self.fields.get(name),
            Some(table) => self
                .fields
                .get(table)
                .and_then(FieldDescriptor::as_container)
                .and_then(|container| container.get(name)),
        };
        found.ok_or_else(|| FieldError::not_found(qualified_key(name, table)))
    }

    /// Returns the qualified keys of every data field, in declaration order.
    pub fn field_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.fields.len());
        for descriptor in self.fields.values() {
            match descriptor {
                FieldDescriptor::Data(field) => names.push(field.qualified_key()),
                FieldDescriptor::Container(container) => {
                    names.extend(container.fields().values().map(FieldDescriptor::qualified_key));
                }
            }
        }
        names
    }

    /// Returns the top-level descriptors.
    pub fn fields(&self) -> &IndexMap<String, FieldDescriptor> {
        &self.fields
    }

    /// Builds the caster for a server result type with the formats known so far.
    pub fn caster_for(&self, result: Option<&str>) -> TypeCaster {
        TypeCaster::new(
            self.cast_map.for_result(result),
            &self.formats,
            self.server_timezone,
        )
    }

    fn container_mut(&mut self, table: &str) -> &mut ContainerField {
        if !matches!(self.fields.get(table), Some(FieldDescriptor::Container(_))) {
            self.fields.insert(
                table.to_string(),
                FieldDescriptor::Container(ContainerField::new(table)),
            );
        }
        match self.fields.get_mut(table) {
            Some(FieldDescriptor::Container(container)) => container,
            _ => unreachable!("container was inserted above"),
        }
    }

    // =========================================================================
    // Formats and namespace
    // =========================================================================

    /// Learns the parse patterns from the literal datasource formats.
    pub fn learn_date_formats(&mut self, date: &str, time: &str, timestamp: &str) -> &DateFormats {
        self.formats = DateFormats::learn(date, time, timestamp);
        &self.formats
    }

    /// The learned parse patterns.
    pub fn date_formats(&self) -> &DateFormats {
        &self.formats
    }

    /// Captures the namespace declared on the first element.
    ///
    /// `prefix` is `None` for a default namespace (`xmlns="..."`).
    pub fn set_namespace(&mut self, uri: impl Into<String>, prefix: Option<&str>) {
        self.namespace = Some(uri.into());
        self.namespace_len = prefix.map(|p| p.len() + 1).unwrap_or(0);
    }

    /// The namespace URI, once seen.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Strips the captured namespace prefix from a tag name.
    pub fn strip_namespace<'a>(&self, tag: &'a str) -> &'a str {
        tag.get(self.namespace_len..).unwrap_or(tag)
    }

    // =========================================================================
    // Identifiers and counters
    // =========================================================================

    pub(crate) fn set_server_version(&mut self, version: Option<String>) {
        self.server_version = version;
    }

    pub(crate) fn set_datasource(
        &mut self,
        database: Option<String>,
        layout: Option<String>,
        table: Option<String>,
    ) {
        self.database = database;
        self.layout = layout;
        self.table = table;
    }

    pub(crate) fn set_counts(&mut self, total: u64, fetched: u64) {
        self.total_count = total;
        self.fetch_count = fetched;
    }

    /// The server product version.
    pub fn server_version(&self) -> Option<&str> {
        self.server_version.as_deref()
    }

    /// The database name reported by the datasource.
    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    /// The layout name reported by the datasource.
    pub fn layout(&self) -> Option<&str> {
        self.layout.as_deref()
    }

    /// The base table of the layout.
    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// Number of records matching the request.
    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    /// Number of records in this response.
    pub fn fetch_count(&self) -> u64 {
        self.fetch_count
    }

    /// The cast map used for new fields.
    pub fn cast_map(&self) -> &CastMap {
        &self.cast_map
    }

    /// The server timezone used by timestamp casters.
    pub fn server_timezone(&self) -> Option<FixedOffset> {
        self.server_timezone
    }
}

impl fmt::Display for MetadataRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MetadataRegistry(({},layout:{})):",
            self.database.as_deref().unwrap_or_default(),
            self.layout.as_deref().unwrap_or_default(),
        )?;
        for descriptor in self.fields.values() {
            write!(f, "\n  {}", descriptor)?;
        }
        Ok(())
    }
}
