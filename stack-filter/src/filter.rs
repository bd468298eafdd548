use crate::{report::FilterReport, security::SecurityPolicy, translate::Translator};
use stack_parser::ast::Ast;
use std::fmt::Debug;

/// What a filter can consult while it runs. Nothing in the context is mutated by filtering.
#[derive(Clone, Copy)]
pub struct FilterContext<'a> {
    /// The identifiers the input may use.
    pub security: &'a SecurityPolicy,

    /// Produces the text of error messages.
    pub translator: &'a dyn Translator,
}

impl<'a> FilterContext<'a> {
    /// Creates a new context.
    pub fn new(security: &'a SecurityPolicy, translator: &'a dyn Translator) -> Self {
        Self { security, translator }
    }

    /// Translates a message key with the given parameters.
    pub fn translate(&self, key: &str, params: &[(&str, &str)]) -> String {
        self.translator.translate(key, params)
    }
}

impl Debug for FilterContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterContext")
            .field("security", self.security)
            .finish_non_exhaustive()
    }
}

/// A single pass over a parsed expression.
///
/// A filter may mark nodes invalid, replace the contents of nodes, and add errors and answer
/// notes to the report. It must never remove anything an earlier filter added, and running it
/// again on its own output must not add anything new to the same report.
pub trait AstFilter: Debug + Send + Sync {
    /// Runs the filter over the tree.
    fn filter(&self, ast: &mut Ast, report: &mut FilterReport, ctx: &FilterContext);

    /// Returns true if this filter cannot be part of the same pipeline as the named filter.
    ///
    /// Conflicts only need to be declared on one side; pipelines check both directions.
    fn conflicts_with(&self, _other: &str) -> bool {
        false
    }
}
