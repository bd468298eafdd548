//! Filters that refuse to accept implied multiplication, leaving the student to write the `*`.

use crate::{filter::{AstFilter, FilterContext}, report::FilterReport};
use stack_parser::ast::{Ast, Implicit, NodeId, NodeKind};

/// Returns the binary nodes whose multiplication was implied in the given way.
fn implied(ast: &Ast, how: Implicit) -> Vec<NodeId> {
    ast.walk()
        .filter(|&id| matches!(ast.kind(id), NodeKind::Binary { implicit: Some(i), .. } if *i == how))
        .collect()
}

fn reject_spaces(ast: &mut Ast, report: &mut FilterReport, ctx: &FilterContext, id: NodeId) {
    ast.mark_invalid(id);
    let message = ctx.translate("stackCas_spaces", &[("expr", ast.source_of(id))]);
    report.add_violation(vec![ast.span(id)], "spaces", message);
    report.add_note("spaces");
}

fn reject_stars(ast: &mut Ast, report: &mut FilterReport, ctx: &FilterContext, id: NodeId) {
    ast.mark_invalid(id);
    let cmd = ast.display(id).to_string();
    let message = ctx.translate("stackCas_MissingStars", &[("cmd", &cmd)]);
    report.add_violation(vec![ast.span(id)], "missing_stars", message);
    report.add_note("missing_stars");
}

/// `990_no_fixing_spaces`: `a b` is not read as `a*b`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFixingSpaces;

impl AstFilter for NoFixingSpaces {
    fn filter(&self, ast: &mut Ast, report: &mut FilterReport, ctx: &FilterContext) {
        for id in implied(ast, Implicit::Space) {
            reject_spaces(ast, report, ctx, id);
        }
    }
}

/// `991_no_fixing_stars`: `2x` is not read as `2*x`. This includes multiplications inserted by
/// earlier filters, such as the splitting of `x(y)` into `x*(y)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFixingStars;

impl AstFilter for NoFixingStars {
    fn filter(&self, ast: &mut Ast, report: &mut FilterReport, ctx: &FilterContext) {
        for id in implied(ast, Implicit::Juxtaposed) {
            reject_stars(ast, report, ctx, id);
        }
    }
}

/// `999_strict`: no implied multiplication of any kind survives. Nodes rejected by an earlier
/// filter are not reported again.
#[derive(Debug, Clone, Copy, Default)]
pub struct Strict;

impl AstFilter for Strict {
    fn filter(&self, ast: &mut Ast, report: &mut FilterReport, ctx: &FilterContext) {
        let nodes = ast.walk()
            .filter(|&id| !ast.is_invalid(id))
            .filter_map(|id| match ast.kind(id) {
                NodeKind::Binary { implicit: Some(how), .. } => Some((id, *how)),
                _ => None,
            })
            .collect::<Vec<_>>();

        for (id, how) in nodes {
            match how {
                Implicit::Space => reject_spaces(ast, report, ctx, id),
                Implicit::Juxtaposed => reject_stars(ast, report, ctx, id),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use crate::filters::test_util::run;
    use super::*;

    #[test]
    fn spaces() {
        let (ast, report) = run(&NoFixingSpaces, "2x + a b");
        assert_eq!(ast.invalid_nodes().len(), 1);
        assert_eq!(report.notes(), &["spaces".to_string()]);
        assert_eq!(report.messages(), vec!["stackCas_spaces(expr=a b)"]);
    }

    #[test]
    fn stars() {
        let (ast, report) = run(&NoFixingStars, "2x + a b");
        assert_eq!(ast.invalid_nodes().len(), 1);
        assert_eq!(report.notes(), &["missing_stars".to_string()]);
        assert_eq!(report.messages(), vec!["stackCas_MissingStars(cmd=2*x)"]);
    }

    #[test]
    fn strict_catches_both() {
        let (ast, report) = run(&Strict, "2x + a b");
        assert_eq!(ast.invalid_nodes().len(), 2);
        assert_eq!(report.notes(), &["missing_stars".to_string(), "spaces".to_string()]);
    }

    #[test]
    fn explicit_multiplication_passes() {
        let (ast, report) = run(&Strict, "2*x + a*b");
        assert!(ast.is_valid());
        assert!(report.is_clean());
    }
}
