//! Filters that rewrite syntax into the form the CAS expects, without judging it.

use crate::{filter::{AstFilter, FilterContext}, report::FilterReport};
use stack_parser::{ast::{Ast, NodeKind}, parser::op::{BinOpKind, PrefixOpKind}};

/// `502_replace_pm`: the `+-` operator becomes the CAS operator `#pm#`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplacePm;

impl AstFilter for ReplacePm {
    fn filter(&self, ast: &mut Ast, _: &mut FilterReport, _: &FilterContext) {
        let nodes = ast.walk()
            .filter(|&id| matches!(
                ast.kind(id),
                NodeKind::Binary { op: BinOpKind::PlusMinus, .. }
                    | NodeKind::Prefix { op: PrefixOpKind::PlusMinus, .. }
            ))
            .collect::<Vec<_>>();

        for id in nodes {
            let kind = match ast.kind(id).clone() {
                NodeKind::Binary { lhs, rhs, implicit, .. } => NodeKind::Binary {
                    op: BinOpKind::Pm,
                    lhs,
                    rhs,
                    implicit,
                },
                NodeKind::Prefix { operand, .. } => NodeKind::Prefix { op: PrefixOpKind::Pm, operand },
                other => other,
            };
            ast.replace(id, kind);
        }
    }
}

/// `504_insert_tuples_for_groups`: a group of several expressions, `(a, b)`, becomes the tuple
/// `ntuple(a, b)` instead of being evaluated in turn.
#[derive(Debug, Clone, Copy, Default)]
pub struct InsertTuplesForGroups;

impl AstFilter for InsertTuplesForGroups {
    fn filter(&self, ast: &mut Ast, _: &mut FilterReport, _: &FilterContext) {
        let groups = ast.walk()
            .filter(|&id| matches!(ast.kind(id), NodeKind::Group { items } if items.len() > 1))
            .collect::<Vec<_>>();

        for id in groups {
            let NodeKind::Group { items } = ast.kind(id).clone() else {
                continue;
            };
            let start = ast.span(id).start;
            let callee = ast.push(NodeKind::Identifier { name: "ntuple".to_string() }, start..start);
            ast.replace(id, NodeKind::Call { callee, args: items });
        }
    }
}
