//! Server actions and their argument grammar

use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// A top-level query argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arg {
    Database,
    Layout,
    RecordId,
    ModId,
    Query,
    Max,
    Skip,
    LogicalOperator,
    LayoutResponse,
    RelatedSetsMax,
    DeleteRelated,
    Script,
    ScriptParam,
    ScriptPrefind,
    ScriptPrefindParam,
    ScriptPresort,
    ScriptPresortParam,
}

impl Arg {
    /// The parameter name on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Database => "-db",
            Self::Layout => "-lay",
            Self::RecordId => "-recid",
            Self::ModId => "-modid",
            Self::Query => "-query",
            Self::Max => "-max",
            Self::Skip => "-skip",
            Self::LogicalOperator => "-lop",
            Self::LayoutResponse => "-lay.response",
            Self::RelatedSetsMax => "-relatedsets.max",
            Self::DeleteRelated => "-delete.related",
            Self::Script => "-script",
            Self::ScriptParam => "-script.param",
            Self::ScriptPrefind => "-script.prefind",
            Self::ScriptPrefindParam => "-script.prefind.param",
            Self::ScriptPresort => "-script.presort",
            Self::ScriptPresortParam => "-script.presort.param",
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const SCRIPTS: &[Arg] = &[
    Arg::Script,
    Arg::ScriptParam,
    Arg::ScriptPrefind,
    Arg::ScriptPrefindParam,
    Arg::ScriptPresort,
    Arg::ScriptPresortParam,
];

/// What an action accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    /// Arguments that must be present and non-empty, in wire order.
    pub required: &'static [Arg],
    /// Arguments sent when set, in wire order.
    pub optional: Vec<Arg>,
    /// Whether field predicates are sent.
    pub params: bool,
}

/// A server action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Find,
    FindAll,
    FindAny,
    CompoundFind,
    New,
    Edit,
    Delete,
    Duplicate,
    View,
    ListDatabases,
    ListLayouts,
    ListScripts,
}

impl Action {
    /// The action flag on the wire.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::Find => "-find",
            Self::FindAll => "-findall",
            Self::FindAny => "-findany",
            Self::CompoundFind => "-findquery",
            Self::New => "-new",
            Self::Edit => "-edit",
            Self::Delete => "-delete",
            Self::Duplicate => "-dup",
            Self::View => "-view",
            Self::ListDatabases => "-dbnames",
            Self::ListLayouts => "-layoutnames",
            Self::ListScripts => "-scriptnames",
        }
    }

    /// Returns the argument grammar of this action.
    pub fn grammar(&self) -> Grammar {
        use Arg::*;

        let (required, optional, params): (&'static [Arg], Vec<Arg>, bool) = match self {
            Self::ListDatabases => (&[], vec![], false),
            Self::ListLayouts | Self::ListScripts => (&[Database], vec![], false),
            Self::Delete => (
                &[Database, Layout, RecordId],
                [&[LayoutResponse][..], SCRIPTS].concat(),
                false,
            ),
            Self::Duplicate => (
                &[Database, Layout, RecordId],
                [&[RelatedSetsMax][..], SCRIPTS].concat(),
                false,
            ),
            Self::Edit => (
                &[Database, Layout, RecordId],
                [
                    &[ModId, LayoutResponse, DeleteRelated, RelatedSetsMax][..],
                    SCRIPTS,
                ]
                .concat(),
                true,
            ),
            Self::Find => (
                &[Database, Layout],
                [
                    &[RelatedSetsMax, LayoutResponse, RecordId, LogicalOperator, Max, Skip][..],
                    SCRIPTS,
                ]
                .concat(),
                true,
            ),
            Self::FindAll | Self::FindAny => (
                &[Database, Layout],
                [
                    &[LayoutResponse, RecordId, LogicalOperator, Max, Skip][..],
                    SCRIPTS,
                ]
                .concat(),
                true,
            ),
            Self::CompoundFind => (
                &[Database, Layout, Query],
                [&[Max, Skip, LayoutResponse][..], SCRIPTS].concat(),
                true,
            ),
            Self::New => (
                &[Database, Layout],
                [&[RelatedSetsMax, LayoutResponse][..], SCRIPTS].concat(),
                true,
            ),
            Self::View => (&[Database, Layout], SCRIPTS.to_vec(), false),
        };
        Grammar {
            required,
            optional,
            params,
        }
    }

    /// Whether the action accepts `-skip`/`-max`.
    pub fn pages(&self) -> bool {
        self.grammar().optional.contains(&Arg::Skip)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for Action {
    type Err = ValidationError;

    /// Accepts the wire flag with or without its dash (`-findall`, `findall`)
    /// as well as the long names (`find-all`, `list-databases`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let action = match s.trim_start_matches('-') {
            "find" => Self::Find,
            "findall" | "find-all" => Self::FindAll,
            "findany" | "find-any" => Self::FindAny,
            "findquery" | "compound-find" => Self::CompoundFind,
            "new" => Self::New,
            "edit" => Self::Edit,
            "delete" => Self::Delete,
            "dup" | "duplicate" => Self::Duplicate,
            "view" => Self::View,
            "dbnames" | "list-databases" => Self::ListDatabases,
            "layoutnames" | "list-layouts" => Self::ListLayouts,
            "scriptnames" | "list-scripts" => Self::ListScripts,
            _ => return Err(ValidationError::UnknownAction(s.to_string())),
        };
        Ok(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!("-findall".parse::<Action>().unwrap(), Action::FindAll);
        assert_eq!("find-all".parse::<Action>().unwrap(), Action::FindAll);
        assert_eq!("compound-find".parse::<Action>().unwrap(), Action::CompoundFind);
        assert_eq!("-dbnames".parse::<Action>().unwrap(), Action::ListDatabases);
    }

    #[test]
    fn test_unknown_action() {
        assert_eq!(
            "-findsome".parse::<Action>(),
            Err(ValidationError::UnknownAction("-findsome".into()))
        );
    }

    #[test]
    fn test_grammar_table() {
        let edit = Action::Edit.grammar();
        assert_eq!(edit.required, &[Arg::Database, Arg::Layout, Arg::RecordId]);
        assert_eq!(edit.optional[0], Arg::ModId);
        assert!(edit.params);

        assert!(!Action::Delete.grammar().params);
        assert!(Action::ListDatabases.grammar().required.is_empty());
        assert_eq!(Action::ListScripts.grammar().required, &[Arg::Database]);
        assert_eq!(
            Action::CompoundFind.grammar().required,
            &[Arg::Database, Arg::Layout, Arg::Query]
        );
    }

    #[test]
    fn test_paging_actions() {
        assert!(Action::Find.pages());
        assert!(Action::CompoundFind.pages());
        assert!(!Action::View.pages());
        assert!(!Action::New.pages());
    }
}
