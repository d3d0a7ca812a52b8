//! Attribute access for start tags

use quick_xml::events::BytesStart;

use crate::error::DecodeError;

/// The unescaped attributes of one start tag, in document order.
#[derive(Debug, Default)]
pub(super) struct Attributes {
    pairs: Vec<(String, String)>,
}

impl Attributes {
    pub(super) fn read(e: &BytesStart<'_>) -> Result<Self, DecodeError> {
        let mut pairs = Vec::new();
        for attr in e.attributes() {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            pairs.push((key, value));
        }
        Ok(Self { pairs })
    }

    pub(super) fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub(super) fn get_owned(&self, key: &str) -> Option<String> {
        self.get(key).map(str::to_string)
    }

    /// The namespace declaration, as `(uri, prefix)`.
    pub(super) fn namespace(&self) -> Option<(&str, Option<&str>)> {
        self.pairs.iter().find_map(|(k, v)| {
            if k == "xmlns" {
                Some((v.as_str(), None))
            } else {
                k.strip_prefix("xmlns:").map(|prefix| (v.as_str(), Some(prefix)))
            }
        })
    }
}
