//! Filters that reject function calls.

use crate::{filter::{AstFilter, FilterContext}, report::FilterReport};
use stack_parser::ast::{Ast, NodeKind};
use super::function_headers;

/// `541_no_unknown_functions`: calls to functions the CAS does not know are not allowed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoUnknownFunctions;

impl AstFilter for NoUnknownFunctions {
    fn filter(&self, ast: &mut Ast, report: &mut FilterReport, ctx: &FilterContext) {
        let headers = function_headers(ast);
        let calls = ast.walk()
            .filter(|id| !headers.contains(id))
            .filter_map(|id| {
                let name = ast.call_name(id)?;
                (!ctx.security.is_known_function(name)).then(|| (id, name.to_string()))
            })
            .collect::<Vec<_>>();

        for (id, name) in calls {
            ast.mark_invalid(id);
            let term = ast.display(id).to_string();
            let message = ctx.translate("stackCas_unknownFunction", &[
                ("forbid", &name),
                ("term", &term),
            ]);
            report.add_violation(vec![ast.span(id)], "unknownFunction", message);
            report.add_note("unknownFunction");
        }
    }
}

/// `542_no_functions_at_all`: no function may be called, whatever its name. Function
/// definitions are still allowed.
///
/// This filter cannot share a pipeline with the filters that split calls into multiplications,
/// since which of them runs first would decide whether there are calls left to reject.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFunctionsAtAll;

impl AstFilter for NoFunctionsAtAll {
    fn filter(&self, ast: &mut Ast, report: &mut FilterReport, ctx: &FilterContext) {
        let headers = function_headers(ast);
        let calls = ast.walk()
            .filter(|id| !headers.contains(id) && !ast.is_invalid(*id))
            .filter_map(|id| match ast.kind(id) {
                NodeKind::Call { callee, .. } => Some((id, *callee)),
                _ => None,
            })
            .collect::<Vec<_>>();

        for (id, callee) in calls {
            ast.mark_invalid(id);
            let forbid = ast.display(callee).to_string();
            let term = ast.display(id).to_string();
            let message = ctx.translate("stackCas_noFunction", &[
                ("forbid", &forbid),
                ("term", &term),
            ]);
            report.add_violation(vec![ast.span(id)], "noFunction", message);
            report.add_note("noFunction");
        }
    }

    fn conflicts_with(&self, other: &str) -> bool {
        matches!(other, "441_split_unknown_functions" | "442_split_all_functions")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use crate::{filters::test_util::run, security::SecurityPolicy, translate::KeyTranslator};
    use super::*;

    #[test]
    fn unknown_functions() {
        let (ast, report) = run(&NoUnknownFunctions, "sin(x) + foo(x, 2)");
        assert!(!ast.is_valid());
        assert_eq!(report.notes(), &["unknownFunction".to_string()]);
        assert_eq!(report.messages(), vec!["stackCas_unknownFunction(forbid=foo, term=foo(x,2))"]);
        assert_eq!(report.errors()[0].spans, vec![9..18]);
    }

    #[test]
    fn known_functions_pass() {
        let (ast, report) = run(&NoUnknownFunctions, "f(x) := sin(x)^2");
        assert!(ast.is_valid());
        assert!(report.is_clean());
    }

    #[test]
    fn no_functions_at_all() {
        let (ast, report) = run(&NoFunctionsAtAll, "sin(x) + cos(y)");
        assert_eq!(ast.invalid_nodes().len(), 2);
        assert_eq!(report.notes(), &["noFunction".to_string()]);
        assert_eq!(report.messages(), vec![
            "stackCas_noFunction(forbid=sin, term=sin(x))",
            "stackCas_noFunction(forbid=cos, term=cos(y))",
        ]);
    }

    #[test]
    fn already_invalid_calls_skipped() {
        let (mut ast, mut report) = run(&NoUnknownFunctions, "foo(x)");
        let policy = SecurityPolicy::new();
        NoFunctionsAtAll.filter(&mut ast, &mut report, &FilterContext::new(&policy, &KeyTranslator));
        assert_eq!(report.notes(), &["unknownFunction".to_string()]);
        assert_eq!(report.errors().len(), 1);
    }

    #[test]
    fn conflicts() {
        assert!(NoFunctionsAtAll.conflicts_with("441_split_unknown_functions"));
        assert!(NoFunctionsAtAll.conflicts_with("442_split_all_functions"));
        assert!(!NoFunctionsAtAll.conflicts_with("541_no_unknown_functions"));
    }
}
