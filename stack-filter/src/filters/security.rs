//! Filters that keep student input from reaching outside the CAS session.

use crate::{
    filter::{AstFilter, FilterContext},
    report::FilterReport,
    security::WordStatus,
};
use stack_parser::ast::{Ast, NodeId, NodeKind};
use tracing::debug;

/// `997_string_security`: the contents of every string literal are sanitised by the
/// [`Translator`](crate::translate::Translator), so that they can be shown back safely.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringSecurity;

impl AstFilter for StringSecurity {
    fn filter(&self, ast: &mut Ast, _: &mut FilterReport, ctx: &FilterContext) {
        let strings = ast.walk()
            .filter_map(|id| match ast.kind(id) {
                NodeKind::Str { value } => Some((id, ctx.translator.sanitize(value))),
                _ => None,
            })
            .collect::<Vec<_>>();

        for (id, value) in strings {
            ast.replace(id, NodeKind::Str { value });
        }
    }
}

/// `998_security`: every identifier is checked against the
/// [`SecurityPolicy`](crate::security::SecurityPolicy).
///
/// Functions that may never be called are rejected first, wherever they appear. The offending
/// identifier is marked invalid, along with the call it heads.
#[derive(Debug, Clone, Copy, Default)]
pub struct Security;

impl Security {
    /// Returns the call headed by the identifier, if any.
    fn call_of(ast: &Ast, ident: NodeId) -> Option<NodeId> {
        ast.walk().find(|&id| matches!(ast.kind(id), NodeKind::Call { callee, .. } if *callee == ident))
    }
}

impl AstFilter for Security {
    fn filter(&self, ast: &mut Ast, report: &mut FilterReport, ctx: &FilterContext) {
        let identifiers = ast.walk()
            .filter_map(|id| ast.identifier(id).map(|name| (id, name.to_string())))
            .collect::<Vec<_>>();

        for (id, name) in identifiers {
            let (note, key) = if ctx.security.is_always_forbidden(&name) {
                if let Some(call) = Self::call_of(ast, id) {
                    ast.mark_invalid(call);
                }
                ("forbiddenFunction", "stackCas_forbiddenFunction")
            } else {
                match ctx.security.check(&name) {
                    WordStatus::Allowed => continue,
                    WordStatus::Forbidden => ("forbiddenWord", "stackCas_forbiddenWord"),
                    WordStatus::NotAllowed => ("notAllowedWord", "stackCas_notAllowedWord"),
                }
            };

            debug!(name = name.as_str(), note, "identifier rejected by security policy");
            ast.mark_invalid(id);
            let message = ctx.translate(key, &[("forbid", &name)]);
            report.add_violation(vec![ast.span(id)], note, message);
            report.add_note(note);
        }
    }
}
