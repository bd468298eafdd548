//! The built-in filters, grouped by concern. Each filter is registered under its numbered name in
//! [`FilterRegistry::new`](crate::registry::FilterRegistry::new).

pub mod corrections;
pub mod forbid;
pub mod functions;
pub mod implicit;
pub mod numeric;
pub mod rewrite;
pub mod security;
pub mod split;

use stack_parser::ast::{Ast, Implicit, NodeId, NodeKind};
use stack_parser::parser::op::BinOpKind;
use std::collections::HashSet;

/// Returns the call nodes that are the heads of function definitions, such as `f(x)` in
/// `f(x) := x^2`. These are not calls and are skipped by function filters.
pub(crate) fn function_headers(ast: &Ast) -> HashSet<NodeId> {
    ast.walk()
        .filter_map(|id| match ast.kind(id) {
            NodeKind::Binary { op: BinOpKind::Define, lhs, .. } => Some(*lhs),
            _ => None,
        })
        .filter(|&lhs| matches!(ast.kind(lhs), NodeKind::Call { .. }))
        .collect()
}

/// Rewrites a call `f(a, b)` into the implied multiplication `f*(a, b)`. The arguments become a
/// group that spans from the end of the callee to the end of the call.
pub(crate) fn split_call(ast: &mut Ast, id: NodeId) {
    let NodeKind::Call { callee, args } = ast.kind(id).clone() else {
        return;
    };

    let group_span = ast.span(callee).end..ast.span(id).end;
    let group = ast.push(NodeKind::Group { items: args }, group_span);
    ast.replace(id, NodeKind::Binary {
        op: BinOpKind::Mul,
        lhs: callee,
        rhs: group,
        implicit: Some(Implicit::Juxtaposed),
    });
}

#[cfg(test)]
pub(crate) mod test_util {
    use crate::{
        filter::{AstFilter, FilterContext},
        report::FilterReport,
        security::SecurityPolicy,
        translate::KeyTranslator,
    };
    use stack_parser::{ast::Ast, parse};

    /// Parses the source and runs a single filter over it with an empty policy.
    pub fn run(filter: &dyn AstFilter, source: &str) -> (Ast, FilterReport) {
        run_with_policy(filter, source, &SecurityPolicy::new())
    }

    /// Parses the source and runs a single filter over it with the given policy.
    pub fn run_with_policy(
        filter: &dyn AstFilter,
        source: &str,
        policy: &SecurityPolicy,
    ) -> (Ast, FilterReport) {
        let mut ast = parse(source);
        let mut report = FilterReport::new();
        filter.filter(&mut ast, &mut report, &FilterContext::new(policy, &KeyTranslator));
        (ast, report)
    }
}
