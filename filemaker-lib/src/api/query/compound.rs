//! Compound find expressions (`-findquery`).

use indexmap::IndexMap;

use crate::cast::BackCaster;
use crate::error::ValidationError;
use crate::model::Value;

/// The right-hand side of one compound query entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    /// A single request: `(qN)`.
    Value(Value),
    /// One request per value, ORed: `(qN);(qN+1)`.
    AnyOf(Vec<Value>),
    /// All pairs in one request, ANDed: `(qN,qN+1)`. The entry key is not sent.
    AllOf(IndexMap<String, Value>),
}

impl Criterion {
    /// A single value.
    pub fn value(value: impl Into<Value>) -> Self {
        Self::Value(value.into())
    }

    /// Any of the given values.
    pub fn any_of<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::AnyOf(values.into_iter().map(Into::into).collect())
    }

    /// All of the given field/value pairs.
    pub fn all_of<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self::AllOf(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// An ordered set of find requests combined in the server's expression
/// language.
///
/// Each entry becomes one or more requests; a key starting with `!` turns
/// its requests into omit requests. Order matters to the server, so entries
/// keep insertion order.
///
/// # Example
///
/// ```
/// use filemaker_lib::api::query::{CompoundQuery, Criterion};
/// use filemaker_lib::cast::BackCaster;
///
/// // (color = blue AND size = big) OR NOT stairs = 1
/// let query = CompoundQuery::new()
///     .with("1", Criterion::all_of([("color", "blue"), ("size", "big")]))
///     .with("!stairs", Criterion::value(1));
///
/// let (expression, _) = query.compile(&BackCaster::default()).unwrap();
/// assert_eq!(expression, "(q1,q2);!(q3)");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompoundQuery {
    entries: IndexMap<String, Criterion>,
}

impl CompoundQuery {
    /// Creates an empty compound query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry (builder pattern).
    pub fn with(mut self, key: impl Into<String>, criterion: Criterion) -> Self {
        self.insert(key, criterion);
        self
    }

    /// Adds an entry, replacing any entry with the same key.
    pub fn insert(&mut self, key: impl Into<String>, criterion: Criterion) -> Option<Criterion> {
        self.entries.insert(key.into(), criterion)
    }

    /// Returns `true` if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Builds the `-query` expression and the `-qN`/`-qN.value` parameters.
    pub fn compile(&self, back: &BackCaster) -> Result<(String, Vec<(String, String)>), ValidationError> {
        let mut clauses = Vec::new();
        let mut params = Vec::new();
        let mut slot = 0usize;

        let mut push = |field: &str, value: &Value| -> Result<String, ValidationError> {
            slot += 1;
            params.push((format!("-q{}", slot), field.to_string()));
            params.push((format!("-q{}.value", slot), back.cast(field, value)?));
            Ok(format!("q{}", slot))
        };

        for (key, criterion) in &self.entries {
            let (negation, key) = match key.strip_prefix('!') {
                Some(rest) => ("!", rest),
                None => ("", key.as_str()),
            };
            match criterion {
                Criterion::Value(value) => {
                    let id = push(key, value)?;
                    clauses.push(format!("{}({})", negation, id));
                }
                Criterion::AnyOf(values) => {
                    for value in values {
                        let id = push(key, value)?;
                        clauses.push(format!("{}({})", negation, id));
                    }
                }
                Criterion::AllOf(pairs) => {
                    let ids = pairs
                        .iter()
                        .map(|(field, value)| push(field, value))
                        .collect::<Result<Vec<_>, _>>()?;
                    clauses.push(format!("{}({})", negation, ids.join(",")));
                }
            }
        }

        Ok((clauses.join(";"), params))
    }
}

impl<K: Into<String>> FromIterator<(K, Criterion)> for CompoundQuery {
    fn from_iter<T: IntoIterator<Item = (K, Criterion)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, c)| (k.into(), c)).collect(),
        }
    }
}
