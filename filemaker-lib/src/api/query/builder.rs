//! Query builder and encoder.

use std::fmt;

use indexmap::IndexMap;

use super::Action;
use super::Arg;
use super::CompoundQuery;
use super::SortOrder;
use super::parse_predicate;
use crate::cast::BackCaster;
use crate::error::ValidationError;
use crate::model::Value;

/// An outgoing request: an action, its arguments and field predicates.
///
/// Values are converted to wire text when they are added, so an unsupported
/// value is reported by the call that adds it. Grammar checks happen in
/// [`encode`](Query::encode).
///
/// # Example
///
/// ```
/// use filemaker_lib::api::query::{Action, Query, SortOrder};
///
/// let query = Query::new(Action::Find)
///     .database("shop")
///     .layout("web")
///     .param("size__gt", 22).unwrap()
///     .sort(&SortOrder::desc("date"))
///     .max(10).unwrap();
///
/// assert_eq!(
///     query.encode().unwrap().to_string(),
///     "-db=shop&-lay=web&size=22&size.op=gt&-sortfield.1=date&-sortorder.1=descend&-max=10&-find="
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    action: Action,
    args: IndexMap<Arg, String>,
    params: Vec<(String, String)>,
    sort: SortOrder,
    back: BackCaster,
}

impl Query {
    /// Creates an empty query for `action`.
    pub fn new(action: Action) -> Self {
        Self {
            action,
            args: IndexMap::new(),
            params: Vec::new(),
            sort: SortOrder::default(),
            back: BackCaster::default(),
        }
    }

    /// Creates an empty query from an action name, failing on unknown names.
    pub fn parse(action: &str) -> Result<Self, ValidationError> {
        Ok(Self::new(action.parse()?))
    }

    /// Sets the caster used for predicate values.
    pub fn with_back_caster(mut self, back: BackCaster) -> Self {
        self.back = back;
        self
    }

    /// The action of this query.
    pub fn action(&self) -> Action {
        self.action
    }

    /// Returns an argument value.
    pub fn get_arg(&self, arg: Arg) -> Option<&str> {
        self.args.get(&arg).map(String::as_str)
    }

    /// Returns `true` if the argument is set.
    pub fn has_arg(&self, arg: Arg) -> bool {
        self.args.contains_key(&arg)
    }

    /// The field predicates, already converted to wire text.
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// The sort order accumulated by [`sort`](Query::sort).
    pub fn sort_order(&self) -> &SortOrder {
        &self.sort
    }

    // =========================================================================
    // Arguments
    // =========================================================================

    /// Sets an argument (builder pattern).
    pub fn arg(mut self, arg: Arg, value: impl Into<String>) -> Self {
        self.set_arg(arg, value);
        self
    }

    /// Sets an argument.
    pub fn set_arg(&mut self, arg: Arg, value: impl Into<String>) {
        self.args.insert(arg, value.into());
    }

    /// Sets `-db`.
    pub fn database(self, database: impl Into<String>) -> Self {
        self.arg(Arg::Database, database)
    }

    /// Sets `-lay`.
    pub fn layout(self, layout: impl Into<String>) -> Self {
        self.arg(Arg::Layout, layout)
    }

    /// Sets `-recid`.
    pub fn record_id(self, record_id: impl Into<String>) -> Self {
        self.arg(Arg::RecordId, record_id)
    }

    /// Sets `-modid`.
    pub fn mod_id(self, mod_id: impl Into<String>) -> Self {
        self.arg(Arg::ModId, mod_id)
    }

    /// Sets `-script` and, when given, `-script.param`.
    pub fn script(mut self, name: impl Into<String>, param: Option<&str>) -> Self {
        self.set_arg(Arg::Script, name);
        if let Some(param) = param {
            self.set_arg(Arg::ScriptParam, param);
        }
        self
    }

    /// Sets `-skip`.
    pub fn skip(mut self, skip: impl fmt::Display) -> Result<Self, ValidationError> {
        self.set_skip(skip)?;
        Ok(self)
    }

    /// Sets `-max`.
    pub fn max(mut self, max: impl fmt::Display) -> Result<Self, ValidationError> {
        self.set_max(max)?;
        Ok(self)
    }

    /// Sets `-skip`, which must be a non-negative integer.
    pub fn set_skip(&mut self, skip: impl fmt::Display) -> Result<(), ValidationError> {
        let skip = parse_limit(Arg::Skip, skip)?;
        self.set_arg(Arg::Skip, skip.to_string());
        Ok(())
    }

    /// Sets `-max`, which must be a non-negative integer.
    pub fn set_max(&mut self, max: impl fmt::Display) -> Result<(), ValidationError> {
        let max = parse_limit(Arg::Max, max)?;
        self.set_arg(Arg::Max, max.to_string());
        Ok(())
    }

    /// Sets `-lop` to `and` or `or` (case-insensitive).
    pub fn lop(mut self, operator: &str) -> Result<Self, ValidationError> {
        let operator = operator.to_lowercase();
        if operator != "and" && operator != "or" {
            return Err(ValidationError::InvalidLogicalOperator(operator));
        }
        self.set_arg(Arg::LogicalOperator, operator);
        Ok(self)
    }

    /// Appends `order` to the sort order; fields from later calls sort after
    /// earlier ones.
    pub fn sort(mut self, order: &SortOrder) -> Self {
        self.sort.fields.extend(order.fields.iter().cloned());
        self
    }

    // =========================================================================
    // Predicates
    // =========================================================================

    /// Adds a field predicate; see [`add_param`](Query::add_param).
    pub fn param(mut self, name: &str, value: impl Into<Value>) -> Result<Self, ValidationError> {
        self.add_param(name, value)?;
        Ok(self)
    }

    /// Adds a field predicate.
    ///
    /// `__` separates path segments, and a trailing operator segment
    /// (`size__gt`) is sent as `size.op=gt`.
    pub fn add_param(&mut self, name: &str, value: impl Into<Value>) -> Result<(), ValidationError> {
        let (field, op) = parse_predicate(name);
        let text = self.back.cast(&field, &value.into())?;
        self.params.push((field.clone(), text));
        if let Some(op) = op {
            self.params.push((format!("{}.op", field), op.code().to_string()));
        }
        Ok(())
    }

    /// Adds a field value without operator parsing.
    pub fn raw_param(mut self, name: &str, value: impl Into<Value>) -> Result<Self, ValidationError> {
        self.add_raw_param(name, value)?;
        Ok(self)
    }

    /// Adds a field value without operator parsing.
    pub fn add_raw_param(&mut self, name: &str, value: impl Into<Value>) -> Result<(), ValidationError> {
        let text = self.back.cast(name, &value.into())?;
        self.params.push((name.to_string(), text));
        Ok(())
    }

    /// Sets `-query` and the `-qN` parameters of a compound find.
    pub fn compound(mut self, query: &CompoundQuery) -> Result<Self, ValidationError> {
        let (expression, params) = query.compile(&self.back)?;
        self.set_arg(Arg::Query, expression);
        self.params.extend(params);
        Ok(self)
    }

    // =========================================================================
    // Encoding
    // =========================================================================

    /// Validates the query against its action grammar and lays out the
    /// parameters in wire order.
    pub fn encode(&self) -> Result<EncodedQuery, ValidationError> {
        let grammar = self.action.grammar();
        let mut pairs = Vec::new();

        for arg in grammar.required {
            let value = self.args.get(arg).ok_or(ValidationError::MissingArgument {
                action: self.action.wire_name(),
                argument: arg.as_str(),
            })?;
            if value.is_empty() {
                return Err(ValidationError::EmptyArgument {
                    action: self.action.wire_name(),
                    argument: arg.as_str(),
                });
            }
            pairs.push((arg.as_str().to_string(), value.clone()));
        }

        if grammar.params {
            pairs.extend(self.params.iter().cloned());
            pairs.extend(self.sort.params());
        }

        for arg in &grammar.optional {
            if let Some(value) = self.args.get(arg) {
                pairs.push((arg.as_str().to_string(), value.clone()));
            }
        }

        pairs.push((self.action.wire_name().to_string(), String::new()));
        Ok(EncodedQuery { pairs })
    }
}

fn parse_limit(arg: Arg, value: impl fmt::Display) -> Result<u64, ValidationError> {
    let text = value.to_string();
    text.trim().parse::<u64>().map_err(|_| ValidationError::InvalidLimit {
        argument: arg.as_str(),
        value: text,
    })
}

/// An encoded query: ordered wire parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedQuery {
    pairs: Vec<(String, String)>,
}

impl EncodedQuery {
    /// The parameters in wire order.
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Returns the first value sent for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for EncodedQuery {
    /// Form-urlencoded, as appended after `?`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&self.pairs)
            .finish();
        f.write_str(&encoded)
    }
}
