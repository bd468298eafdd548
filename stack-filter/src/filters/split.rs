//! Filters that read function calls as implied multiplication, as in `x(y+1)` meaning
//! `x*(y+1)`.

use crate::{filter::{AstFilter, FilterContext}, report::FilterReport};
use stack_parser::ast::{Ast, NodeId};
use super::{function_headers, split_call};

/// Splits every call to a named function accepted by the predicate. Function definition heads
/// are left alone.
fn split_matching(
    ast: &mut Ast,
    report: &mut FilterReport,
    split: impl Fn(&Ast, NodeId, &str) -> bool,
) {
    let headers = function_headers(ast);
    let calls = ast.walk()
        .filter(|id| !headers.contains(id))
        .filter(|&id| ast.call_name(id).map_or(false, |name| split(ast, id, name)))
        .collect::<Vec<_>>();

    for id in calls {
        split_call(ast, id);
        report.add_note("missing_stars");
    }
}

/// `441_split_unknown_functions`: calls to functions the CAS does not know are multiplications.
#[derive(Debug, Clone, Copy, Default)]
pub struct SplitUnknownFunctions;

impl AstFilter for SplitUnknownFunctions {
    fn filter(&self, ast: &mut Ast, report: &mut FilterReport, ctx: &FilterContext) {
        split_matching(ast, report, |_, _, name| !ctx.security.is_known_function(name));
    }
}

/// `442_split_all_functions`: every call to a named function is a multiplication.
#[derive(Debug, Clone, Copy, Default)]
pub struct SplitAllFunctions;

impl AstFilter for SplitAllFunctions {
    fn filter(&self, ast: &mut Ast, report: &mut FilterReport, _: &FilterContext) {
        split_matching(ast, report, |_, _, _| true);
    }
}
