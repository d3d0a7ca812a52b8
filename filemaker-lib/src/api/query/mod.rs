//! Query building for the XML publishing grammar.
//!
//! Every request is a list of URL parameters: a set of reserved arguments
//! (`-db`, `-lay`, `-max`, ...), free-form field predicates, and the action
//! flag itself (`-find`, `-edit`, ...). Which arguments an action needs is
//! described by its [`Grammar`].
//!
//! - [`Query`] - builder for one request, encoded with [`Query::encode`]
//! - [`CompoundQuery`] - AND/OR/NOT expressions for `-findquery`
//! - [`SortOrder`] - `-sortfield.N`/`-sortorder.N` pairs

mod action;
mod builder;
mod compound;
mod operator;
mod order;

pub use action::Action;
pub use action::Arg;
pub use action::Grammar;
pub use builder::EncodedQuery;
pub use builder::Query;
pub use compound::CompoundQuery;
pub use compound::Criterion;
pub use operator::Operator;
pub use operator::PREDICATE_SEPARATOR;
pub use operator::parse_predicate;
pub use order::Direction;
pub use order::SortOrder;
