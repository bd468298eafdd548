//! Numerical evaluation of expressions, used by the answer tests that compare values.
//!
//! Every value is a real number. Expressions that have no numeric meaning, such as strings,
//! lists, or relations, fail to evaluate with an error pointing at the offending node.

pub mod ctxt;
pub mod error;
pub mod funcs;

use ctxt::Ctxt;
use error::{
    InvalidExpression,
    NonNumeric,
    UndefinedFunction,
    UndefinedVariable,
    UnsupportedOperator,
    WrongArgumentCount,
};
use levenshtein::levenshtein;
use stack_error::{Error, ErrorKind};
use stack_parser::{
    ast::{Ast, NodeId, NodeKind},
    parser::op::{BinOpKind, PostfixOpKind, PrefixOpKind},
};
use std::collections::{BTreeSet, HashSet};

fn error_at(ast: &Ast, id: NodeId, kind: impl ErrorKind + 'static) -> Error {
    Error::new(vec![ast.span(id)], kind)
}

/// Evaluates the node to a number, using the variables of the given context.
pub fn eval(ast: &Ast, id: NodeId, ctxt: &Ctxt) -> Result<f64, Error> {
    if ast.is_invalid(id) {
        return Err(error_at(ast, id, InvalidExpression));
    }

    let non_numeric = |found| Err(error_at(ast, id, NonNumeric { found }));
    match ast.kind(id) {
        NodeKind::Root { statements } => match statements.last() {
            Some(&last) => eval(ast, last, ctxt),
            None => Err(error_at(ast, id, InvalidExpression)),
        },
        NodeKind::Statement { expr } => eval(ast, *expr, ctxt),
        NodeKind::Number { raw } => match raw.parse::<f64>() {
            Ok(value) => Ok(value),
            Err(_) => non_numeric("a malformed number"),
        },
        NodeKind::Str { .. } => non_numeric("a string"),
        NodeKind::List { .. } => non_numeric("a list"),
        NodeKind::Set { .. } => non_numeric("a set"),
        NodeKind::Missing => Err(error_at(ast, id, InvalidExpression)),
        NodeKind::Identifier { name } => ctxt
            .get_var(name)
            .ok_or_else(|| error_at(ast, id, UndefinedVariable { name: name.clone() })),
        NodeKind::Group { items } => {
            // an evaluation group evaluates each item in turn, and takes the value of the last
            let mut value = Err(error_at(ast, id, InvalidExpression));
            for &item in items {
                value = Ok(eval(ast, item, ctxt)?);
            }
            value
        },
        NodeKind::Prefix { op, operand } => match op {
            PrefixOpKind::Neg => Ok(-eval(ast, *operand, ctxt)?),
            PrefixOpKind::Pos => eval(ast, *operand, ctxt),
            op => Err(error_at(ast, id, UnsupportedOperator { op: op.to_string().trim().to_string() })),
        },
        NodeKind::Postfix { op: PostfixOpKind::Factorial, operand } => {
            Ok(funcs::factorial(eval(ast, *operand, ctxt)?))
        },
        NodeKind::Binary { op, lhs, rhs, .. } => {
            let apply: fn(f64, f64) -> f64 = match op {
                BinOpKind::Add => |a, b| a + b,
                BinOpKind::Sub => |a, b| a - b,
                BinOpKind::Mul | BinOpKind::Dot => |a, b| a * b,
                BinOpKind::Div => |a, b| a / b,
                BinOpKind::Exp => f64::powf,
                op => return Err(error_at(ast, id, UnsupportedOperator { op: op.to_string().trim().to_string() })),
            };
            Ok(apply(eval(ast, *lhs, ctxt)?, eval(ast, *rhs, ctxt)?))
        },
        NodeKind::Call { callee, args } => {
            let name = ast.identifier(*callee).map(str::to_string)
                .unwrap_or_else(|| ast.display(*callee).to_string());
            let Some(builtin) = funcs::builtin(&name) else {
                let known = funcs::BUILTINS
                    .iter()
                    .filter(|(n, _)| levenshtein(n, &name) < 3)
                    .map(|(n, _)| n.to_string())
                    .collect();
                return Err(error_at(ast, id, UndefinedFunction { name, known }));
            };

            let values = args
                .iter()
                .map(|&arg| eval(ast, arg, ctxt))
                .collect::<Result<Vec<_>, _>>()?;
            builtin.call(&values).ok_or_else(|| error_at(ast, id, WrongArgumentCount {
                name,
                expected: builtin.arity(),
                given: values.len(),
            }))
        },
    }
}

/// Returns the names of the variables the node depends on. Constants and the names of called
/// functions are not variables.
pub fn free_variables(ast: &Ast, id: NodeId) -> BTreeSet<String> {
    let callees = ast.descendants(id)
        .filter_map(|node| match ast.kind(node) {
            NodeKind::Call { callee, .. } => Some(*callee),
            _ => None,
        })
        .collect::<HashSet<_>>();

    ast.descendants(id)
        .filter(|node| !callees.contains(node))
        .filter_map(|node| ast.identifier(node))
        .filter(|name| !Ctxt::is_constant(name))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use assert_float_eq::{afe_abs, afe_is_relative_eq, afe_relative_error_msg, assert_float_relative_eq};
    use pretty_assertions::assert_eq;
    use stack_parser::parse;
    use super::*;

    fn eval_with(source: &str, vars: &[(&str, f64)]) -> Result<f64, Error> {
        let ast = parse(source);
        let mut ctxt = Ctxt::new();
        for (name, value) in vars {
            ctxt.add_var(name, *value);
        }
        eval(&ast, ast.root(), &ctxt)
    }

    #[test]
    fn arithmetic() {
        assert_float_relative_eq!(eval_with("3 * -5 / 5! + 6", &[]).unwrap(), 5.875);
        assert_float_relative_eq!(eval_with("2^3^2", &[]).unwrap(), 512.0);
        assert_float_relative_eq!(eval_with("((1 + 9) / 5) * 3", &[]).unwrap(), 6.0);
    }

    #[test]
    fn variables_and_constants() {
        assert_float_relative_eq!(eval_with("2x + 1", &[("x", 3.0)]).unwrap(), 7.0);
        assert_float_relative_eq!(eval_with("sin(%pi / 2)", &[]).unwrap(), 1.0);
        assert_float_relative_eq!(eval_with("lg(100) + lg(8, 2)", &[]).unwrap(), 5.0);
    }

    #[test]
    fn errors() {
        let err = eval_with("x + 1", &[]).unwrap_err();
        assert_eq!(err.message(), "`x` is not defined");
        assert_eq!(err.spans, vec![0..1]);

        let err = eval_with("sinn(1)", &[]).unwrap_err();
        assert_eq!(err.message(), "cannot evaluate the function `sinn`");

        let err = eval_with("atan2(1)", &[]).unwrap_err();
        assert_eq!(err.message(), "`atan2` takes 2 argument(s), but 1 were given");

        let err = eval_with("[1, 2]", &[]).unwrap_err();
        assert_eq!(err.message(), "expected a number, but found a list");

        let err = eval_with("1 + ", &[]).unwrap_err();
        assert_eq!(err.message(), "this expression is invalid and cannot be evaluated");

        let err = eval_with("a = b", &[("a", 1.0), ("b", 1.0)]).unwrap_err();
        assert_eq!(err.message(), "cannot evaluate the `=` operator numerically");
    }

    #[test]
    fn free_variables_skip_functions_and_constants() {
        let ast = parse("a*x^2 + sin(b) + %pi");
        let vars = free_variables(&ast, ast.root());
        assert_eq!(vars.into_iter().collect::<Vec<_>>(), vec!["a", "b", "x"]);
    }

    #[test]
    fn only_percent_names_are_constants() {
        let ast = parse("e*x + pi + %e");
        let vars = free_variables(&ast, ast.root());
        assert_eq!(vars.into_iter().collect::<Vec<_>>(), vec!["e", "pi", "x"]);

        let err = eval_with("e", &[]).unwrap_err();
        assert_eq!(err.message(), "`e` is not defined");
        assert_float_relative_eq!(eval_with("log(%e)", &[]).unwrap(), 1.0);
    }
}
