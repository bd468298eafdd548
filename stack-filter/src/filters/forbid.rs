//! Filters that reject whole classes of syntax.

use crate::{filter::{AstFilter, FilterContext}, report::FilterReport};
use stack_parser::ast::{Ast, NodeId, NodeKind};

/// Marks every node matching the predicate invalid. The note, and one error pointing at every
/// matching node, are added the first time the note appears.
fn forbid(
    ast: &mut Ast,
    report: &mut FilterReport,
    ctx: &FilterContext,
    note: &str,
    matches: impl Fn(&Ast, NodeId) -> bool,
) {
    let hits = ast.walk().filter(|&id| matches(ast, id)).collect::<Vec<_>>();
    if hits.is_empty() {
        return;
    }

    let spans = hits.iter().map(|&id| ast.span(id)).collect();
    for id in hits {
        ast.mark_invalid(id);
    }

    if report.add_note(note) {
        report.add_violation(spans, note, ctx.translate(note, &[]));
    }
}

/// `101_no_floats`: numbers written with a decimal point or exponent are not allowed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFloats;

impl AstFilter for NoFloats {
    fn filter(&self, ast: &mut Ast, report: &mut FilterReport, ctx: &FilterContext) {
        forbid(ast, report, ctx, "Illegal_floats", |ast, id| ast.is_float(id));
    }
}

/// `102_no_strings`: string literals are not allowed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoStrings;

impl AstFilter for NoStrings {
    fn filter(&self, ast: &mut Ast, report: &mut FilterReport, ctx: &FilterContext) {
        forbid(ast, report, ctx, "Illegal_strings", |ast, id| {
            matches!(ast.kind(id), NodeKind::Str { .. })
        });
    }
}

/// `103_no_lists`: lists are not allowed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLists;

impl AstFilter for NoLists {
    fn filter(&self, ast: &mut Ast, report: &mut FilterReport, ctx: &FilterContext) {
        forbid(ast, report, ctx, "Illegal_lists", |ast, id| {
            matches!(ast.kind(id), NodeKind::List { .. })
        });
    }
}

/// `104_no_sets`: sets are not allowed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSets;

impl AstFilter for NoSets {
    fn filter(&self, ast: &mut Ast, report: &mut FilterReport, ctx: &FilterContext) {
        forbid(ast, report, ctx, "Illegal_sets", |ast, id| {
            matches!(ast.kind(id), NodeKind::Set { .. })
        });
    }
}

/// `105_no_grouppings`: parentheses used to group a single expression are not allowed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGrouppings;

impl AstFilter for NoGrouppings {
    fn filter(&self, ast: &mut Ast, report: &mut FilterReport, ctx: &FilterContext) {
        forbid(ast, report, ctx, "Illegal_groupping", |ast, id| {
            matches!(ast.kind(id), NodeKind::Group { items } if items.len() == 1)
        });
    }
}

/// `505_no_evaluation_groups`: groups of several comma-separated expressions, `(a, b)`, are not
/// allowed. `(a+b)` is fine.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEvaluationGroups;

impl AstFilter for NoEvaluationGroups {
    fn filter(&self, ast: &mut Ast, report: &mut FilterReport, ctx: &FilterContext) {
        forbid(ast, report, ctx, "Illegal_groups", |ast, id| {
            matches!(ast.kind(id), NodeKind::Group { items } if items.len() > 1)
        });
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use crate::filters::test_util::run;
    use super::*;

    #[test]
    fn floats() {
        let (ast, report) = run(&NoFloats, "2.5*x + 3 + 1e3");
        assert!(!ast.is_valid());
        assert_eq!(report.notes(), &["Illegal_floats".to_string()]);
        assert_eq!(report.errors().len(), 1);
        assert_eq!(report.errors()[0].spans, vec![0..3, 12..15]);
        assert_eq!(ast.invalid_nodes().len(), 2);
    }

    #[test]
    fn strings_noted_once() {
        let (ast, report) = run(&NoStrings, r#"["a", "b", "c"]"#);
        assert_eq!(ast.invalid_nodes().len(), 3);
        assert_eq!(report.notes(), &["Illegal_strings".to_string()]);
        assert_eq!(report.messages(), vec!["Illegal_strings"]);
    }

    #[test]
    fn lists_and_sets() {
        let (_, report) = run(&NoLists, "{[1]}");
        assert_eq!(report.notes(), &["Illegal_lists".to_string()]);

        let (_, report) = run(&NoSets, "{[1]}");
        assert_eq!(report.notes(), &["Illegal_sets".to_string()]);

        let (ast, report) = run(&NoSets, "[1]");
        assert!(ast.is_valid());
        assert!(report.is_clean());
    }

    #[test]
    fn single_groups_only() {
        let (_, report) = run(&NoGrouppings, "2*(1+x)");
        assert_eq!(report.notes(), &["Illegal_groupping".to_string()]);

        let (ast, report) = run(&NoGrouppings, "(x, y)");
        assert!(ast.is_valid());
        assert!(report.notes().is_empty());
    }

    #[test]
    fn evaluation_groups_only() {
        let (_, report) = run(&NoEvaluationGroups, "(x, y)");
        assert_eq!(report.notes(), &["Illegal_groups".to_string()]);

        let (ast, report) = run(&NoEvaluationGroups, "2*(1+x)");
        assert!(ast.is_valid());
        assert!(report.notes().is_empty());
    }
}
