//! Streaming `fmresultset` decoder.
//!
//! [`Decoder`] pulls XML events from any [`BufRead`] source and yields one
//! [`Record`] per top-level `<record>` element, as soon as that element is
//! closed. Nothing but the current record (and the parents of the relatedset
//! being read) is kept in memory.
//!
//! # Example
//!
//! ```
//! use filemaker_lib::decode::Decoder;
//! use filemaker_lib::meta::MetadataRegistry;
//!
//! let xml = r#"<fmresultset xmlns="http://www.filemaker.com/xml/fmresultset">
//!   <error code="0"/>
//!   <metadata><field-definition name="name" result="text"/></metadata>
//!   <resultset count="1" fetch-size="1">
//!     <record record-id="1" mod-id="0"><field name="name"><data>Ada</data></field></record>
//!   </resultset>
//! </fmresultset>"#;
//!
//! let records: Vec<_> = Decoder::new(xml.as_bytes(), MetadataRegistry::new())
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(records[0].get_text("name").unwrap(), Some("Ada"));
//! ```

mod attrs;
mod schema;

use std::io::BufRead;
use std::mem;

use indexmap::IndexMap;
use log::debug;
use quick_xml::Reader;
use quick_xml::events::BytesStart;
use quick_xml::events::Event;

use crate::cast::TypeCaster;
use crate::error::DecodeError;
use crate::error::Error;
use crate::meta::FieldDescriptor;
use crate::meta::MetadataRegistry;
use crate::meta::qualified_key;
use crate::model::Record;
use crate::model::Value;

use attrs::Attributes;

/// What the decoder should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeMode {
    /// Yield every record.
    #[default]
    Records,
    /// Stop right after the `</metadata>` tag.
    MetadataOnly,
}

/// Elements of the `fmresultset` grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Error,
    Product,
    Datasource,
    Metadata,
    FieldDefinition,
    RelatedsetDefinition,
    Resultset,
    Record,
    Relatedset,
    Field,
    Data,
    Other,
}

impl Tag {
    fn from_name(name: &str) -> Self {
        match name {
            "error" => Self::Error,
            "product" => Self::Product,
            "datasource" => Self::Datasource,
            "metadata" => Self::Metadata,
            "field-definition" => Self::FieldDefinition,
            "relatedset-definition" => Self::RelatedsetDefinition,
            "resultset" => Self::Resultset,
            "record" => Self::Record,
            "relatedset" => Self::Relatedset,
            "field" => Self::Field,
            "data" => Self::Data,
            _ => Self::Other,
        }
    }
}

/// Outcome of one decoding step.
enum Step {
    Continue,
    Record(Record),
    Finish,
}

/// A parent accumulator suspended while one of its relatedsets is read.
#[derive(Debug)]
struct Relation {
    table: String,
    parent: Record,
}

/// The `<field>` currently open.
#[derive(Debug)]
struct PendingField {
    name: String,
    caster: Option<TypeCaster>,
}

/// Pull-based decoder turning an `fmresultset` document into records.
///
/// The decoder is an [`Iterator`] of `Result<Record, Error>`. It stops on the
/// first error and never resumes.
#[derive(Debug)]
pub struct Decoder<R> {
    reader: Reader<R>,
    buf: Vec<u8>,
    registry: MetadataRegistry,
    mode: DecodeMode,
    seen_root: bool,

    record: Record,
    relations: Vec<Relation>,
    pending: Option<PendingField>,
    data: Vec<Value>,
    text: Option<String>,
    in_data: bool,

    definitions: Vec<String>,
    skipped: IndexMap<String, usize>,
    finished: bool,
}

impl<R: BufRead> Decoder<R> {
    /// Creates a decoder filling `registry` as the response is read.
    pub fn new(source: R, registry: MetadataRegistry) -> Self {
        Self {
            reader: Reader::from_reader(source),
            buf: Vec::new(),
            registry,
            mode: DecodeMode::Records,
            seen_root: false,
            record: Record::new(),
            relations: Vec::new(),
            pending: None,
            data: Vec::new(),
            text: None,
            in_data: false,
            definitions: Vec::new(),
            skipped: IndexMap::new(),
            finished: false,
        }
    }

    /// Stops decoding once the metadata section is read.
    pub fn metadata_only(mut self) -> Self {
        self.mode = DecodeMode::MetadataOnly;
        self
    }

    /// Reads the rest of the input (if needed) and returns the registry.
    ///
    /// In metadata-only mode this stops at `</metadata>`; otherwise remaining
    /// records are decoded and dropped.
    pub fn finish(mut self) -> Result<MetadataRegistry, Error> {
        for record in self.by_ref() {
            record?;
        }
        Ok(self.registry)
    }

    /// The registry as learned so far.
    pub fn registry(&self) -> &MetadataRegistry {
        &self.registry
    }

    /// Consumes the decoder, returning the registry as learned so far.
    pub fn into_registry(self) -> MetadataRegistry {
        self.registry
    }

    /// Count of `<field>` elements skipped because they were not declared,
    /// by qualified key.
    pub fn skipped_fields(&self) -> &IndexMap<String, usize> {
        &self.skipped
    }

    fn step(&mut self) -> Result<Step, DecodeError> {
        let mut buf = mem::take(&mut self.buf);
        buf.clear();
        let step = match self.reader.read_event_into(&mut buf)? {
            Event::Start(e) => self.open(&e),
            Event::Empty(e) => match self.open(&e)? {
                Step::Continue => {
                    let name = self.local_name(e.name().as_ref());
                    self.close(Tag::from_name(&name))
                }
                other => Ok(other),
            },
            Event::End(e) => {
                let name = self.local_name(e.name().as_ref());
                self.close(Tag::from_name(&name))
            }
            Event::Text(t) if self.in_data => {
                let text = t.unescape()?;
                self.text.get_or_insert_with(String::new).push_str(&text);
                Ok(Step::Continue)
            }
            Event::CData(c) if self.in_data => {
                let raw = c.into_inner();
                self.text
                    .get_or_insert_with(String::new)
                    .push_str(&String::from_utf8_lossy(&raw));
                Ok(Step::Continue)
            }
            Event::Eof => Ok(Step::Finish),
            _ => Ok(Step::Continue),
        };
        self.buf = buf;
        step
    }

    fn local_name(&self, raw: &[u8]) -> String {
        let name = String::from_utf8_lossy(raw);
        self.registry.strip_namespace(&name).to_string()
    }

    fn open(&mut self, e: &BytesStart<'_>) -> Result<Step, DecodeError> {
        let attrs = Attributes::read(e)?;
        if !self.seen_root {
            self.seen_root = true;
            if let Some((uri, prefix)) = attrs.namespace() {
                self.registry.set_namespace(uri, prefix);
            }
        }

        let name = self.local_name(e.name().as_ref());
        match Tag::from_name(&name) {
            Tag::Error => return self.on_error(&attrs),
            Tag::Product => self.on_product(&attrs),
            Tag::Datasource => self.on_datasource(&attrs),
            Tag::Resultset => self.on_resultset(&attrs),
            Tag::FieldDefinition => self.on_field_definition(&attrs)?,
            Tag::RelatedsetDefinition => self.on_relatedset_definition(&attrs)?,
            Tag::Record => {
                self.record
                    .set_ids(attrs.get_owned("record-id"), attrs.get_owned("mod-id"));
            }
            Tag::Relatedset => {
                let table = attrs
                    .get_owned("table")
                    .ok_or_else(|| DecodeError::missing_attribute("relatedset", "table"))?;
                self.record.insert(table.clone(), Value::Records(Vec::new()));
                let parent = mem::take(&mut self.record);
                self.relations.push(Relation { table, parent });
            }
            Tag::Field => {
                let name = attrs.get_owned("name").unwrap_or_default();
                let caster = match self.registry.resolve_field(&name, self.context()) {
                    Ok(FieldDescriptor::Data(field)) => Some(field.caster().clone()),
                    _ => None,
                };
                self.pending = Some(PendingField { name, caster });
                self.data.clear();
            }
            Tag::Data => {
                self.in_data = true;
                self.text = None;
            }
            Tag::Metadata | Tag::Other => {}
        }
        Ok(Step::Continue)
    }

    fn close(&mut self, tag: Tag) -> Result<Step, DecodeError> {
        match tag {
            Tag::Data => {
                self.in_data = false;
                let text = self.text.take();
                if let Some(caster) = self.pending.as_ref().and_then(|p| p.caster.as_ref()) {
                    self.data.push(caster.cast(text.as_deref()));
                }
            }
            Tag::Field => {
                let values = mem::take(&mut self.data);
                if let Some(pending) = self.pending.take() {
                    self.place(&pending.name, values);
                }
            }
            Tag::Record => {
                let record = mem::take(&mut self.record);
                match self.relations.last_mut() {
                    None => return Ok(Step::Record(record)),
                    Some(relation) => {
                        if let Some(Value::Records(rows)) = relation.parent.get_mut(&relation.table) {
                            rows.push(record);
                        }
                    }
                }
            }
            Tag::Relatedset => {
                if let Some(relation) = self.relations.pop() {
                    self.record = relation.parent;
                }
            }
            Tag::RelatedsetDefinition => {
                self.definitions.pop();
            }
            Tag::Metadata if self.mode == DecodeMode::MetadataOnly => return Ok(Step::Finish),
            _ => {}
        }
        Ok(Step::Continue)
    }

    fn place(&mut self, name: &str, values: Vec<Value>) {
        let table = self.relations.last().map(|r| r.table.as_str());
        match self.registry.resolve_field(name, table) {
            Ok(descriptor) => descriptor.set_value(&mut self.record, values),
            Err(_) => {
                let key = qualified_key(name, table);
                let count = self.skipped.entry(key).or_insert(0);
                *count += 1;
                if *count == 1 {
                    debug!("Skipping undeclared field {}", qualified_key(name, table));
                }
            }
        }
    }

    /// The innermost related table, `None` at top level.
    fn context(&self) -> Option<&str> {
        self.relations.last().map(|r| r.table.as_str())
    }
}

impl<R: BufRead> Iterator for Decoder<R> {
    type Item = Result<Record, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        loop {
            match self.step() {
                Ok(Step::Continue) => {}
                Ok(Step::Record(record)) => return Some(Ok(record)),
                Ok(Step::Finish) => {
                    self.finished = true;
                    return None;
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e.into()));
                }
            }
        }
    }
}

impl<R: BufRead> std::iter::FusedIterator for Decoder<R> {}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: &str = "http://www.filemaker.com/xml/fmresultset";

    fn document(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<fmresultset xmlns="{NS}" version="1.0">
  <error code="0"/>
  <product build="11/11/2014" name="FileMaker Web Publishing Engine" version="13.0.5.518"/>
  <datasource database="shop" date-format="MM/dd/yyyy" layout="web" table="customers"
      time-format="HH:mm:ss" timestamp-format="MM/dd/yyyy HH:mm:ss" total-count="2"/>
  <metadata>
    <field-definition name="id" result="number" max-repeat="1"/>
    <field-definition name="name" result="text" max-repeat="1"/>
    <relatedset-definition table="orders">
      <field-definition name="orders::total" result="number" max-repeat="1"/>
    </relatedset-definition>
  </metadata>
  {body}
</fmresultset>"#
        )
    }

    fn decode(xml: &str) -> Decoder<&[u8]> {
        Decoder::new(xml.as_bytes(), MetadataRegistry::new())
    }

    #[test]
    fn test_records_in_document_order() {
        let xml = document(
            r#"<resultset count="2" fetch-size="2">
    <record record-id="1" mod-id="3"><field name="id"><data>1</data></field></record>
    <record record-id="2" mod-id="4"><field name="id"><data>2</data></field></record>
  </resultset>"#,
        );
        let mut decoder = decode(&xml);
        let first = decoder.next().unwrap().unwrap();
        assert_eq!(first.record_id(), Some("1"));
        assert_eq!(first.mod_id(), Some("3"));
        assert_eq!(decoder.registry().total_count(), 2);
        assert_eq!(decoder.registry().server_version(), Some("13.0.5.518"));

        let second = decoder.next().unwrap().unwrap();
        assert_eq!(second.get_number("id").unwrap(), Some(2.0));
        assert!(decoder.next().is_none());
        assert!(decoder.next().is_none());
    }

    #[test]
    fn test_prefixed_namespace() {
        let xml = format!(
            r#"<fm:fmresultset xmlns:fm="{NS}"><fm:error code="0"/>
<fm:metadata><fm:field-definition name="name" result="text"/></fm:metadata>
<fm:resultset count="1" fetch-size="1"><fm:record record-id="9">
<fm:field name="name"><fm:data>Ada &amp; Bob</fm:data></fm:field></fm:record></fm:resultset>
</fm:fmresultset>"#
        );
        let records: Vec<Record> = decode(&xml).collect::<Result<_, _>>().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get_text("name").unwrap(), Some("Ada & Bob"));
    }

    #[test]
    fn test_relatedset_attaches_to_its_parent_only() {
        let xml = document(
            r#"<resultset count="2" fetch-size="2">
    <record record-id="1">
      <field name="id"><data>1</data></field>
      <relatedset count="2" table="orders">
        <record record-id="10"><field name="orders::total"><data>5</data></field></record>
        <record record-id="11"><field name="orders::total"><data>7</data></field></record>
      </relatedset>
      <field name="name"><data>Ada</data></field>
    </record>
    <record record-id="2"><field name="id"><data>2</data></field></record>
  </resultset>"#,
        );
        let records: Vec<Record> = decode(&xml).collect::<Result<_, _>>().unwrap();
        let orders = records[0].get_records("orders").unwrap().unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].record_id(), Some("10"));
        assert_eq!(orders[1].get_number("total").unwrap(), Some(7.0));
        assert_eq!(records[0].get_text("name").unwrap(), Some("Ada"));
        assert!(!records[1].contains("orders"));
        assert!(records[0].changed_keys().is_empty());
    }

    #[test]
    fn test_error_401_is_empty() {
        let xml = format!(r#"<fmresultset xmlns="{NS}"><error code="401"/></fmresultset>"#);
        let mut decoder = decode(&xml);
        assert!(decoder.next().is_none());
    }

    #[test]
    fn test_error_code_fails_and_fuses() {
        let xml = format!(r#"<fmresultset xmlns="{NS}"><error code="105"/></fmresultset>"#);
        let mut decoder = decode(&xml);
        let err = decoder.next().unwrap().unwrap_err();
        assert_eq!(err.server_code(), Some(105));
        assert!(decoder.next().is_none());
    }

    #[test]
    fn test_bad_error_code() {
        let xml = format!(r#"<fmresultset xmlns="{NS}"><error code="x1"/></fmresultset>"#);
        let err = decode(&xml).next().unwrap().unwrap_err();
        assert!(matches!(err, Error::Decode(DecodeError::BadErrorCode(Some(code))) if code == "x1"));
    }

    #[test]
    fn test_undeclared_fields_are_tallied() {
        let xml = document(
            r#"<resultset count="2" fetch-size="2">
    <record><field name="ghost"><data>x</data></field><field name="id"><data>1</data></field></record>
    <record><field name="ghost"><data>y</data></field></record>
  </resultset>"#,
        );
        let mut decoder = decode(&xml);
        let first = decoder.next().unwrap().unwrap();
        assert!(!first.contains("ghost"));
        assert_eq!(first.get_number("id").unwrap(), Some(1.0));
        decoder.next().unwrap().unwrap();
        assert_eq!(decoder.skipped_fields().get("ghost"), Some(&2));
    }

    #[test]
    fn test_metadata_only_stops_early() {
        let xml = document(r#"<resultset count="1" fetch-size="1"><record><broken></resultset>"#);
        let registry = decode(&xml).metadata_only().finish().unwrap();
        assert_eq!(registry.database(), Some("shop"));
        assert_eq!(registry.layout(), Some("web"));
        assert_eq!(registry.field_names(), vec!["id", "name", "orders__orders::total"]);
    }

    #[test]
    fn test_missing_relatedset_table() {
        let xml = document(r#"<resultset><record><relatedset count="0"/></record></resultset>"#);
        let err = decode(&xml).next().unwrap().unwrap_err();
        assert!(matches!(
            err,
            Error::Decode(DecodeError::MissingAttribute {
                element: "relatedset",
                attribute: "table"
            })
        ));
    }
}
