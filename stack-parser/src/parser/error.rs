use ariadne::Fmt;
use stack_attrs::ErrorKind;
use stack_error::EXPR;

/// Expected to see an expression here.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = "expected an expression",
    labels = [format!("I expected to see an {} here", "expression".fg(EXPR))],
)]
pub struct ExpectedExpr;

/// Nothing but whitespace and statement delimiters was given.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = "no expression was given",
    labels = ["this input is empty"],
)]
pub struct EmptyInput;

/// A token was found where it cannot be understood.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("unexpected `{}`", self.found),
    labels = ["I could not understand this"],
)]
pub struct UnexpectedToken {
    /// The text of the token that was found.
    pub found: String,
}

/// A string literal is missing its closing quote.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = "unterminated string",
    labels = ["this string is never closed"],
    help = format!("add a {} at the end of the string", "`\"`".fg(EXPR)),
)]
pub struct UnterminatedString;

/// An opening bracket has no matching closing bracket.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("unclosed `{}`", self.open),
    labels = [format!("this `{}` is never closed", self.open)],
    help = format!("add a `{}` to close it", self.close.fg(EXPR)),
)]
pub struct UnclosedBracket {
    /// The opening bracket.
    pub open: char,

    /// The closing bracket that was expected.
    pub close: char,
}

/// A closing bracket has no matching opening bracket.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("unmatched `{}`", self.close),
    labels = [format!("this `{}` has no matching opening bracket", self.close)],
)]
pub struct UnmatchedClosing {
    /// The closing bracket.
    pub close: char,
}

/// Parentheses with nothing inside them.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = "empty parentheses",
    labels = ["there is nothing inside these parentheses"],
)]
pub struct EmptyParenthesis;

/// The whole input has more brackets of one side than the other.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = if self.missing_right {
        format!("missing right bracket `{}`", self.close)
    } else {
        format!("missing left bracket `{}`", self.open)
    },
    labels = [format!("the `{}` and `{}` brackets here do not balance", self.open, self.close)],
)]
pub struct UnbalancedBrackets {
    /// The opening bracket of the pair.
    pub open: char,

    /// The closing bracket of the pair.
    pub close: char,

    /// There are more opening brackets than closing ones. (Otherwise, there are more closing
    /// brackets than opening ones.)
    pub missing_right: bool,
}
