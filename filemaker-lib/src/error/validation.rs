//! Validation error types

/// Errors raised while building or encoding a query, before any request is sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The action name is not one the server understands.
    #[error("Invalid action name ({0})")]
    UnknownAction(String),

    /// A required argument was never set.
    #[error("A required argument ({argument}) is not present for action {action}")]
    MissingArgument {
        action: &'static str,
        argument: &'static str,
    },

    /// A required argument was set to an empty value.
    #[error("A required argument ({argument}) is empty for action {action}")]
    EmptyArgument {
        action: &'static str,
        argument: &'static str,
    },

    /// `-skip` or `-max` is not a non-negative integer.
    #[error("{argument} value must be a positive number (got {value})")]
    InvalidLimit {
        argument: &'static str,
        value: String,
    },

    /// A logical operator other than `and`/`or`.
    #[error("Unsupported logical operator '{0}' (not one of \"and\" or \"or\")")]
    InvalidLogicalOperator(String),

    /// A value that has no wire representation (lists, nested records).
    #[error("Can't send a {type_name} value for field '{field}'")]
    UnsupportedValue {
        field: String,
        type_name: &'static str,
    },

    /// Pagination was requested on a query that already sets `-skip`/`-max`.
    #[error("Can't specify a skip or a max value in pagination mode")]
    PaginationConflict,

    /// Pagination was requested for an action that doesn't accept `-skip`/`-max`.
    #[error("Action {0} doesn't support pagination")]
    NotPageable(&'static str),

    /// A page size of zero.
    #[error("Page size must be at least 1")]
    InvalidPageSize,

    /// A container URL that doesn't follow the `/fmi/xml/cnt/<name>.<ext>?-...` layout.
    #[error("Container URL doesn't match the canonical layout: {0}")]
    ContainerUrl(String),
}
