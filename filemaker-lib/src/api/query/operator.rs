//! Comparison operators in predicate names

/// Separator between path segments in predicate names (`orders__total__gt`).
pub const PREDICATE_SEPARATOR: &str = "__";

/// A comparison operator sent as `<field>.op`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equals,
    Contains,
    DoesNotContain,
    BeginsWith,
    EndsWith,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Operator {
    /// Parses a predicate name suffix.
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        let op = match suffix {
            "equals" => Self::Equals,
            "contains" => Self::Contains,
            "does_not_contains" => Self::DoesNotContain,
            "beginswith" => Self::BeginsWith,
            "endswith" => Self::EndsWith,
            "gt" => Self::Gt,
            "gte" => Self::Gte,
            "lt" => Self::Lt,
            "lte" => Self::Lte,
            _ => return None,
        };
        Some(op)
    }

    /// The operator code on the wire.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Equals => "eq",
            Self::Contains => "cn",
            Self::DoesNotContain => "neq",
            Self::BeginsWith => "bw",
            Self::EndsWith => "ew",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
        }
    }
}

/// Splits a predicate name into a `::` field path and an optional operator.
///
/// ```
/// use filemaker_lib::api::query::{parse_predicate, Operator};
///
/// assert_eq!(parse_predicate("orders__total__gt"), ("orders::total".to_string(), Some(Operator::Gt)));
/// assert_eq!(parse_predicate("name"), ("name".to_string(), None));
/// ```
pub fn parse_predicate(name: &str) -> (String, Option<Operator>) {
    let mut parts: Vec<&str> = name.split(PREDICATE_SEPARATOR).collect();
    let mut op = None;
    if parts.len() > 1 {
        op = parts.last().and_then(|suffix| Operator::from_suffix(suffix));
        if op.is_some() {
            parts.pop();
        }
    }
    (parts.join(crate::meta::PATH_SEPARATOR), op)
}
