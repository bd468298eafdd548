//! Core filters that repair common input forms. They are part of every pipeline built with core
//! filters included.

use crate::{filter::{AstFilter, FilterContext}, report::FilterReport};
use stack_parser::ast::{Ast, NodeId, NodeKind};
use super::split_call;
use tracing::trace;

/// `001_fix_call_of_a_group_or_function`: `(a)(b)` and `f(x)(y)` are multiplications, not calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixCallOfAGroupOrFunction;

impl AstFilter for FixCallOfAGroupOrFunction {
    fn filter(&self, ast: &mut Ast, report: &mut FilterReport, _: &FilterContext) {
        let calls = ast.walk()
            .filter(|&id| match ast.kind(id) {
                NodeKind::Call { callee, .. } => matches!(
                    ast.kind(*callee),
                    NodeKind::Group { .. } | NodeKind::Call { .. }
                ),
                _ => false,
            })
            .collect::<Vec<_>>();

        for id in calls {
            trace!(node = id.index(), "splitting call of a group or function");
            split_call(ast, id);
            report.add_note("missing_stars");
        }
    }
}

/// `002_log_candy`: `log_10(x)` is the base-10 logarithm `lg(x, 10)`, and `log_b(x)` is
/// `lg(x, b)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogCandy;

impl LogCandy {
    /// Returns the base written after `log_`, if the call has that form.
    fn base(ast: &Ast, id: NodeId) -> Option<String> {
        let NodeKind::Call { args, .. } = ast.kind(id) else {
            return None;
        };
        if args.len() != 1 {
            return None;
        }

        let base = ast.call_name(id)?.strip_prefix("log_")?;
        (!base.is_empty()).then(|| base.to_string())
    }
}

impl AstFilter for LogCandy {
    fn filter(&self, ast: &mut Ast, _: &mut FilterReport, _: &FilterContext) {
        let calls = ast.walk()
            .filter_map(|id| Self::base(ast, id).map(|base| (id, base)))
            .collect::<Vec<_>>();

        for (id, base) in calls {
            let NodeKind::Call { callee, mut args } = ast.kind(id).clone() else {
                continue;
            };

            let span = ast.span(callee);
            let base_kind = if base.chars().all(|c| c.is_ascii_digit()) {
                NodeKind::Number { raw: base }
            } else {
                NodeKind::Identifier { name: base }
            };
            args.push(ast.push(base_kind, span.clone()));
            let callee = ast.push(NodeKind::Identifier { name: "lg".to_string() }, span);
            ast.replace(id, NodeKind::Call { callee, args });
        }
    }
}

/// `005_i_is_never_a_function`: `i(x)` is the imaginary unit times `x`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImaginaryUnitIsNeverAFunction;

impl AstFilter for ImaginaryUnitIsNeverAFunction {
    fn filter(&self, ast: &mut Ast, report: &mut FilterReport, _: &FilterContext) {
        let calls = ast.walk()
            .filter(|&id| ast.call_name(id) == Some("i"))
            .collect::<Vec<_>>();

        for id in calls {
            split_call(ast, id);
            report.add_note("missing_stars");
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use crate::filters::test_util::run;
    use stack_parser::ast::Implicit;
    use super::*;

    #[test]
    fn call_of_a_group() {
        let (ast, report) = run(&FixCallOfAGroupOrFunction, "(a+b)(c)");
        assert_eq!(ast.to_string(), "(a+b)*(c)");
        assert_eq!(report.notes(), &["missing_stars".to_string()]);

        let expr = ast.first_expr().unwrap();
        assert!(matches!(
            ast.kind(expr),
            NodeKind::Binary { implicit: Some(Implicit::Juxtaposed), .. },
        ));
    }

    #[test]
    fn call_of_a_call() {
        let (ast, _) = run(&FixCallOfAGroupOrFunction, "f(x)(y)(z)");
        assert_eq!(ast.to_string(), "f(x)*(y)*(z)");
    }

    #[test]
    fn plain_calls_untouched() {
        let (ast, report) = run(&FixCallOfAGroupOrFunction, "sin(x)");
        assert_eq!(ast.to_string(), "sin(x)");
        assert!(report.notes().is_empty());
    }

    #[test]
    fn log_candy() {
        let (ast, _) = run(&LogCandy, "log_10(x) + log_b(y+1)");
        assert_eq!(ast.to_string(), "lg(x,10)+lg(y+1,b)");

        let (ast, _) = run(&LogCandy, "log(x) + log_(x)");
        assert_eq!(ast.to_string(), "log(x)+log_(x)");
    }

    #[test]
    fn imaginary_unit() {
        let (ast, report) = run(&ImaginaryUnitIsNeverAFunction, "3i(x+1) + f(i)");
        assert_eq!(ast.to_string(), "3*(i*(x+1))+f(i)");
        assert_eq!(report.notes(), &["missing_stars".to_string()]);
    }
}
