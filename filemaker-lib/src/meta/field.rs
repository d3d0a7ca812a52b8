//! Field descriptors and value placement

use std::fmt;

use indexmap::IndexMap;

use crate::cast::TypeCaster;
use crate::model::Record;
use crate::model::Value;

/// Separator between a table and a field in qualified FileMaker names.
pub const PATH_SEPARATOR: &str = "::";

/// Schema entry for one field of a response.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldDescriptor {
    /// A scalar or repeating data field.
    Data(DataField),
    /// A related table and the fields declared for it.
    Container(ContainerField),
}

impl FieldDescriptor {
    /// Returns the key the registry indexes this descriptor by.
    pub fn qualified_key(&self) -> String {
        match self {
            Self::Data(field) => field.qualified_key(),
            Self::Container(container) => container.table.clone(),
        }
    }

    /// Writes buffered values into `record`.
    pub fn set_value(&self, record: &mut Record, values: Vec<Value>) {
        match self {
            Self::Data(field) => field.set_value(record, values),
            Self::Container(_) => {}
        }
    }

    /// Returns the data field, if this is one.
    pub fn as_data(&self) -> Option<&DataField> {
        match self {
            Self::Data(field) => Some(field),
            Self::Container(_) => None,
        }
    }

    /// Returns the container, if this is one.
    pub fn as_container(&self) -> Option<&ContainerField> {
        match self {
            Self::Container(container) => Some(container),
            Self::Data(_) => None,
        }
    }
}

impl fmt::Display for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Data(field) => write!(f, "{}: type:{}", field.raw_name, field.caster),
            Self::Container(container) => {
                write!(f, "Container({})", container.table)?;
                for child in container.fields.values() {
                    write!(f, "\n     {}", child)?;
                }
                Ok(())
            }
        }
    }
}

/// A field declared by a `field-definition` element.
#[derive(Debug, Clone, PartialEq)]
pub struct DataField {
    raw_name: String,
    table: Option<String>,
    repeat: usize,
    path: Vec<String>,
    caster: TypeCaster,
}

impl DataField {
    /// Creates a descriptor for `raw_name`, optionally owned by a related table.
    ///
    /// `repeat` is the `max-repeat` arity; anything below 1 counts as 1.
    pub fn new(
        raw_name: impl Into<String>,
        table: Option<String>,
        repeat: usize,
        caster: TypeCaster,
    ) -> Self {
        let raw_name = raw_name.into();
        let mut path: Vec<String> = raw_name
            .splitn(2, PATH_SEPARATOR)
            .map(str::to_string)
            .collect();
        if let Some(table) = &table {
            if path.first() != Some(table) {
                path.insert(0, table.clone());
            }
        }
        Self {
            raw_name,
            table,
            repeat: repeat.max(1),
            path,
            caster,
        }
    }

    /// The name as declared by the server (`table::field` or `field`).
    pub fn raw_name(&self) -> &str {
        &self.raw_name
    }

    /// The related table owning this field, if any.
    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// The repetition arity (1 for scalar fields).
    pub fn repeat(&self) -> usize {
        self.repeat
    }

    /// The qualified path segments.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// The caster assigned at registration.
    pub fn caster(&self) -> &TypeCaster {
        &self.caster
    }

    /// `table__name` for related fields, `name` otherwise.
    pub fn qualified_key(&self) -> String {
        qualified_key(&self.raw_name, self.table.as_deref())
    }

    /// Places `values` into `record`, creating nested records along the path.
    pub fn set_value(&self, record: &mut Record, values: Vec<Value>) {
        let value = if self.repeat == 1 {
            values.into_iter().next().unwrap_or(Value::Null)
        } else {
            Value::List(values)
        };

        let Some((name, parents)) = self.path.split_last() else {
            return;
        };
        let parents = match (parents.first(), &self.table) {
            (Some(first), Some(table)) if first == table => &parents[1..],
            _ => parents,
        };

        let mut target = record;
        for key in parents {
            target = target.nested_mut(key);
        }
        target.insert(name.clone(), value);
    }
}

/// A related table declared by a `relatedset-definition` element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainerField {
    table: String,
    fields: IndexMap<String, FieldDescriptor>,
}

impl ContainerField {
    /// Creates an empty container for `table`.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            fields: IndexMap::new(),
        }
    }

    /// The related table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The fields declared for this table, by raw name.
    pub fn fields(&self) -> &IndexMap<String, FieldDescriptor> {
        &self.fields
    }

    pub(crate) fn insert(&mut self, raw_name: String, field: FieldDescriptor) -> Option<FieldDescriptor> {
        self.fields.insert(raw_name, field)
    }

    pub(crate) fn get(&self, raw_name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(raw_name)
    }
}

/// Builds the registry key of a field.
pub fn qualified_key(raw_name: &str, table: Option<&str>) -> String {
    match table {
        Some(table) => format!("{}__{}", table, raw_name),
        None => raw_name.to_string(),
    }
}
