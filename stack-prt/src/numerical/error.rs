//! Errors that can occur while evaluating an expression numerically.

use ariadne::Fmt;
use stack_attrs::ErrorKind;
use stack_error::EXPR;

/// The variable has no value.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("`{}` is not defined", self.name),
    labels = ["this variable"],
)]
pub struct UndefinedVariable {
    /// The name of the variable.
    pub name: String,
}

/// The function cannot be evaluated numerically.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("cannot evaluate the function `{}`", self.name),
    labels = ["this function"],
    help = format!("the functions that can be evaluated are: {}", self.known.join(", ").fg(EXPR)),
)]
pub struct UndefinedFunction {
    /// The name of the function.
    pub name: String,

    /// Functions with a similar name that can be evaluated.
    pub known: Vec<String>,
}

/// A function was called with the wrong number of arguments.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("`{}` takes {} argument(s), but {} were given", self.name, self.expected, self.given),
    labels = ["this call"],
)]
pub struct WrongArgumentCount {
    /// The name of the function.
    pub name: String,

    /// A description of how many arguments the function takes.
    pub expected: &'static str,

    /// The number of arguments given.
    pub given: usize,
}

/// An expression that is not a number was used where a number is needed.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("expected a number, but found {}", self.found),
    labels = ["this expression"],
)]
pub struct NonNumeric {
    /// What was found instead.
    pub found: &'static str,
}

/// The operator has no numeric meaning.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("cannot evaluate the `{}` operator numerically", self.op),
    labels = ["this operator"],
)]
pub struct UnsupportedOperator {
    /// The operator.
    pub op: String,
}

/// The expression was marked invalid by the parser or a filter.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = "this expression is invalid and cannot be evaluated",
    labels = ["this expression"],
)]
pub struct InvalidExpression;
