pub mod error;
pub mod op;

use crate::{
    ast::{Ast, Implicit, Node, NodeId, NodeKind},
    bookends::{check_bookends, Bookends, Bracket},
    tokenizer::{tokenize_complete, Token, TokenKind},
    util::unescape,
};
use op::{BinOpKind, PostfixOpKind, PrefixOpKind};
use stack_error::{Error, ErrorKind};
use std::ops::Range;
use tracing::debug;

/// A recovering parser for CAS source code.
///
/// The parser never fails. Syntax errors are collected alongside the tree, and the nodes they
/// affect are marked invalid, so that as much of the input as possible can still be inspected by
/// the filter pipeline.
#[derive(Debug)]
pub struct Parser<'source> {
    /// The source code being parsed.
    source: &'source str,

    /// The tokens that this parser is currently parsing.
    tokens: Box<[Token<'source>]>,

    /// The index of the **next** token to be parsed.
    cursor: usize,

    /// The node arena being built.
    nodes: Vec<Node>,

    /// Invalid marks, indexed like `nodes`.
    invalid: Vec<bool>,

    /// Errors found so far.
    errors: Vec<Error>,
}

impl<'source> Parser<'source> {
    /// Create a new parser for the given source.
    pub fn new(source: &'source str) -> Self {
        Self {
            source,
            tokens: tokenize_complete(source),
            cursor: 0,
            nodes: Vec::new(),
            invalid: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Creates an error that points at the next token, or the end of the source code if there
    /// are no more tokens.
    pub fn error(&self, kind: impl ErrorKind + 'static) -> Error {
        Error::new(vec![self.span()], kind)
    }

    /// Returns a span pointing at the end of the source code.
    pub fn eof_span(&self) -> Range<usize> {
        self.source.len()..self.source.len()
    }

    /// Returns the span of the next non-whitespace token, or the end of the source code if there
    /// are no more tokens.
    pub fn span(&self) -> Range<usize> {
        self.peek().map_or(self.eof_span(), |token| token.span.clone())
    }

    /// Returns the next non-whitespace token without moving the cursor.
    fn peek(&self) -> Option<&Token<'source>> {
        self.tokens[self.cursor..].iter().find(|token| !token.is_whitespace())
    }

    /// Returns the kind of the next non-whitespace token.
    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|token| token.kind)
    }

    /// Returns true if whitespace separates the cursor from the next non-whitespace token.
    fn whitespace_ahead(&self) -> bool {
        self.tokens.get(self.cursor).map_or(false, |token| token.is_whitespace())
    }

    /// Returns the next token to be parsed, then advances the cursor. Whitespace tokens are
    /// skipped.
    pub fn next_token(&mut self) -> Option<Token<'source>> {
        while self.cursor < self.tokens.len() {
            let token = &self.tokens[self.cursor];
            self.cursor += 1;
            if !token.is_whitespace() {
                // cloning is cheap: only Range<_> is cloned
                return Some(token.clone());
            }
        }
        None
    }

    fn push(&mut self, kind: NodeKind, span: Range<usize>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node { kind, span });
        self.invalid.push(false);
        id
    }

    fn push_invalid(&mut self, kind: NodeKind, span: Range<usize>) -> NodeId {
        let id = self.push(kind, span);
        self.invalid[id.0] = true;
        id
    }

    fn node_span(&self, id: NodeId) -> Range<usize> {
        self.nodes[id.0].span.clone()
    }

    /// Reports a missing expression at the next token and returns an invalid placeholder for it.
    /// The token is not consumed.
    fn missing(&mut self) -> NodeId {
        let span = self.span();
        self.errors.push(Error::new(vec![span.clone()], error::ExpectedExpr));
        self.push_invalid(NodeKind::Missing, span.start..span.start)
    }

    /// Parses the whole source into an [`Ast`].
    pub fn parse(mut self) -> Ast {
        for bracket in Bracket::ALL {
            let balance = check_bookends(self.source, bracket);
            if balance != Bookends::Balanced {
                self.errors.push(Error::new(vec![0..self.source.len()], error::UnbalancedBrackets {
                    open: bracket.open(),
                    close: bracket.close(),
                    missing_right: balance == Bookends::MissingRight,
                }));
            }
        }

        let mut statements = Vec::new();
        loop {
            while self.peek_kind() == Some(TokenKind::Semicolon) {
                self.next_token();
            }
            if self.peek().is_none() {
                break;
            }
            statements.push(self.parse_statement());
        }

        if statements.is_empty() {
            let span = 0..self.source.len();
            self.errors.push(Error::new(vec![span.clone()], error::EmptyInput));
            let expr = self.push_invalid(NodeKind::Missing, span.clone());
            statements.push(self.push(NodeKind::Statement { expr }, span));
        }

        let root = self.push(NodeKind::Root { statements }, 0..self.source.len());
        debug!(source = self.source, errors = self.errors.len(), "parsed expression");
        Ast::from_parts(self.source.to_string(), self.nodes, root, self.invalid, self.errors)
    }

    /// Parses a statement. Any tokens left between the expression and the next delimiter are
    /// reported and skipped, and the statement is marked invalid.
    fn parse_statement(&mut self) -> NodeId {
        let expr = self.parse_expr(Precedence::Any);
        let mut span = self.node_span(expr);
        let mut garbage = false;

        while let Some(token) = self.peek().cloned() {
            if token.kind == TokenKind::Semicolon {
                break;
            }
            if !garbage {
                let err = match Bracket::closed_by(token.kind) {
                    Some(bracket) => Error::new(
                        vec![token.span.clone()],
                        error::UnmatchedClosing { close: bracket.close() },
                    ),
                    None => Error::new(
                        vec![token.span.clone()],
                        error::UnexpectedToken { found: token.lexeme.to_string() },
                    ),
                };
                self.errors.push(err);
                garbage = true;
            }
            span.end = token.span.end;
            self.next_token();
        }

        if garbage {
            self.push_invalid(NodeKind::Statement { expr }, span)
        } else {
            self.push(NodeKind::Statement { expr }, span)
        }
    }

    /// Parses an expression whose operators all bind at least as tightly as the given precedence.
    pub fn parse_expr(&mut self, precedence: Precedence) -> NodeId {
        self.parse_expr_bp(precedence.binding_power())
    }

    /// Precedence climbing over binding powers. See [`Precedence::binding_powers`].
    fn parse_expr_bp(&mut self, min_bp: u8) -> NodeId {
        let mut lhs = self.parse_prefix();

        while let Some(kind) = self.peek_kind() {
            if let Some(op) = PostfixOpKind::from_token(kind) {
                let (left_bp, _) = op.precedence().binding_powers(Associativity::Left);
                if left_bp < min_bp {
                    break;
                }

                let end = self.next_token().map_or(self.source.len(), |token| token.span.end);
                let span = self.node_span(lhs).start..end;
                lhs = self.push(NodeKind::Postfix { op, operand: lhs }, span);
                continue;
            }

            let (op, implicit) = if let Some(op) = BinOpKind::from_token(kind) {
                (op, None)
            } else if kind.starts_primary() {
                let implicit = if self.whitespace_ahead() {
                    Implicit::Space
                } else {
                    Implicit::Juxtaposed
                };
                (BinOpKind::Mul, Some(implicit))
            } else {
                break;
            };

            let (left_bp, right_bp) = op.precedence().binding_powers(op.associativity());
            if left_bp < min_bp {
                break;
            }

            if implicit.is_none() {
                self.next_token();
            }

            let rhs = self.parse_expr_bp(right_bp);
            let span = self.node_span(lhs).start..self.node_span(rhs).end.max(self.node_span(lhs).end);
            lhs = self.push(NodeKind::Binary { op, lhs, rhs, implicit }, span);
        }

        lhs
    }

    /// Parses a prefix operation, or a primary expression if there is no prefix operator.
    fn parse_prefix(&mut self) -> NodeId {
        let Some(token) = self.peek().cloned() else {
            return self.missing();
        };

        match PrefixOpKind::from_token(token.kind) {
            Some(op) => {
                self.next_token();
                let operand = self.parse_expr(op.precedence());
                let span = token.span.start..self.node_span(operand).end.max(token.span.end);
                self.push(NodeKind::Prefix { op, operand }, span)
            },
            None => self.parse_primary(),
        }
    }

    /// Parses a literal, name, call, or bracketed expression.
    fn parse_primary(&mut self) -> NodeId {
        let Some(token) = self.peek().cloned() else {
            return self.missing();
        };

        match token.kind {
            TokenKind::Int | TokenKind::Float => {
                self.next_token();
                self.push(NodeKind::Number { raw: token.lexeme.to_string() }, token.span)
            },
            TokenKind::Str => {
                self.next_token();
                let value = unescape(&token.lexeme[1..token.lexeme.len() - 1]);
                self.push(NodeKind::Str { value }, token.span)
            },
            TokenKind::UnterminatedStr => {
                self.next_token();
                self.errors.push(Error::new(vec![token.span.clone()], error::UnterminatedString));
                let value = unescape(&token.lexeme[1..]);
                self.push_invalid(NodeKind::Str { value }, token.span)
            },
            TokenKind::Name => {
                self.next_token();
                let name = self.push(NodeKind::Identifier { name: token.lexeme.to_string() }, token.span);
                self.parse_calls(name)
            },
            TokenKind::OpenParen => {
                let group = self.parse_bracketed(Bracket::Paren);
                self.parse_calls(group)
            },
            TokenKind::OpenSquare => self.parse_bracketed(Bracket::Square),
            TokenKind::OpenCurly => self.parse_bracketed(Bracket::Curly),
            _ => self.missing(),
        }
    }

    /// Parses any argument lists following the callee, as in `f(x)` or `f(x)(y)`.
    fn parse_calls(&mut self, mut callee: NodeId) -> NodeId {
        while self.peek_kind() == Some(TokenKind::OpenParen) {
            let Some(open) = self.next_token() else { break };
            let (args, end, closed) = self.parse_items(Bracket::Paren, open.span.clone());
            let span = self.node_span(callee).start..end;
            callee = if closed {
                self.push(NodeKind::Call { callee, args }, span)
            } else {
                self.push_invalid(NodeKind::Call { callee, args }, span)
            };
        }
        callee
    }

    /// Parses a group, list, or set. The cursor must be at the opening bracket.
    fn parse_bracketed(&mut self, bracket: Bracket) -> NodeId {
        let open = self.next_token().map_or(self.eof_span(), |token| token.span);
        let (items, end, closed) = self.parse_items(bracket, open.clone());
        let span = open.start..end;
        let empty_group = bracket == Bracket::Paren && closed && items.is_empty();

        let kind = match bracket {
            Bracket::Paren => NodeKind::Group { items },
            Bracket::Square => NodeKind::List { items },
            Bracket::Curly => NodeKind::Set { items },
        };

        if empty_group {
            self.errors.push(Error::new(vec![span.clone()], error::EmptyParenthesis));
        }

        if closed && !empty_group {
            self.push(kind, span)
        } else {
            self.push_invalid(kind, span)
        }
    }

    /// Parses comma-separated items up to the closing bracket. The opening bracket must already
    /// be consumed.
    ///
    /// Returns the items, the end of the construct, and whether it was closed cleanly. Tokens
    /// that cannot continue an item are reported and skipped.
    fn parse_items(&mut self, bracket: Bracket, open: Range<usize>) -> (Vec<NodeId>, usize, bool) {
        let close = bracket.closing_token();
        let mut items = Vec::new();
        let mut clean = true;

        if self.peek_kind() == Some(close) {
            let end = self.next_token().map_or(open.end, |token| token.span.end);
            return (items, end, true);
        }

        loop {
            items.push(self.parse_expr(Precedence::Any));

            // skip anything that cannot follow an item
            let mut reported = false;
            while let Some(token) = self.peek().cloned() {
                if token.kind == TokenKind::Comma
                    || token.kind == TokenKind::Semicolon
                    || token.kind.is_closing()
                {
                    break;
                }
                if !reported {
                    self.errors.push(Error::new(
                        vec![token.span.clone()],
                        error::UnexpectedToken { found: token.lexeme.to_string() },
                    ));
                    reported = true;
                    clean = false;
                }
                self.next_token();
            }

            match self.peek_kind() {
                Some(TokenKind::Comma) => {
                    self.next_token();
                },
                Some(kind) if kind == close => {
                    let end = self.next_token().map_or(open.end, |token| token.span.end);
                    return (items, end, clean);
                },
                _ => break,
            }
        }

        self.errors.push(Error::new(vec![open.clone()], error::UnclosedBracket {
            open: bracket.open(),
            close: bracket.close(),
        }));
        let end = items.last().map_or(open.end, |&item| self.node_span(item).end.max(open.end));
        (items, end, false)
    }
}

/// Parses the given source code into an [`Ast`].
///
/// ```
/// use stack_parser::parse;
///
/// let ast = parse("2x + sin(x)");
/// assert!(ast.is_valid());
/// assert_eq!(ast.to_string(), "2*x+sin(x)");
/// ```
pub fn parse(source: &str) -> Ast {
    Parser::new(source).parse()
}

/// The associativity of a binary or unary operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Associativity {
    /// The binary / unary operation is left-associative.
    ///
    /// For binary operations, this means `a op b op c` is evaluated as `(a op b) op c`. For unary
    /// operations, this means `a op op` is evaluated as `(a op) op` (the operators appear to the
    /// right of the operand).
    Left,

    /// The binary / unary operation is right-associative.
    ///
    /// For binary operations, this means `a op b op c` is evaluated as `a op (b op c)`. For unary
    /// operations, this means `op op a` is evaluated as `op (op a)` (the operators appear to the
    /// left of the operand).
    Right,
}

/// The precedence of an operation, in order from lowest precedence (evaluated last) to highest
/// precedence (evaluated first).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precedence {
    /// Any precedence.
    Any,

    /// Precedence of assignment (`:`) and definition (`:=`).
    Assign,

    /// Precedence of logical or (`or`).
    Or,

    /// Precedence of logical and (`and`).
    And,

    /// Precedence of logical not (`not`).
    Not,

    /// Precedence of equations and comparisons (`=`, `#`, `<`, `<=`, `>`, and `>=`).
    Compare,

    /// Precedence of addition (`+`), subtraction (`-`), and plus-minus (`+-` and `#pm#`), which
    /// separate terms.
    Term,

    /// Precedence of multiplication (`*`), implied multiplication, and division (`/`), which
    /// separate factors.
    Factor,

    /// Precedence of unary negation (`-`) and its relatives.
    Neg,

    /// Precedence of non-commutative multiplication (`.`).
    Dot,

    /// Precedence of exponentiation (`^` and `**`).
    Exp,

    /// Precedence of factorial (`!`).
    Factorial,
}

impl Precedence {
    /// Returns the minimum binding power an operator needs to be parsed as part of an expression
    /// of this precedence.
    pub fn binding_power(self) -> u8 {
        self as u8 * 2
    }

    /// Returns the left and right binding powers of an operator with this precedence and the
    /// given associativity.
    pub fn binding_powers(self, associativity: Associativity) -> (u8, u8) {
        let power = self.binding_power();
        match associativity {
            Associativity::Left => (power, power + 1),
            Associativity::Right => (power + 1, power),
        }
    }
}

impl PartialOrd for Precedence {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        let left = *self as u8;
        let right = *other as u8;
        left.partial_cmp(&right)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use super::*;

    /// Returns the canonical form of the parsed source, asserting that it parsed cleanly.
    fn canonical(source: &str) -> String {
        let ast = parse(source);
        assert!(ast.errors().is_empty(), "unexpected errors for {:?}: {:?}", source, ast.errors());
        assert!(ast.is_valid());
        ast.to_string()
    }

    /// Returns the messages of the syntax errors of the parsed source.
    fn messages(source: &str) -> Vec<String> {
        parse(source).errors().iter().map(|err| err.message()).collect()
    }

    #[test]
    fn literals() {
        assert_eq!(canonical("16"), "16");
        assert_eq!(canonical("3.14"), "3.14");
        assert_eq!(canonical("1.5e-3"), "1.5e-3");
        assert_eq!(canonical("\"text\""), "\"text\"");
        assert_eq!(canonical("%pi"), "%pi");
    }

    #[test]
    fn precedence() {
        let ast = parse("1 + 2 * 3 ^ 4 ^ 5");
        let expr = ast.first_expr().unwrap();
        let NodeKind::Binary { op: BinOpKind::Add, rhs, .. } = ast.kind(expr) else {
            panic!("expected addition at the top");
        };
        let NodeKind::Binary { op: BinOpKind::Mul, rhs: power, .. } = ast.kind(*rhs) else {
            panic!("expected multiplication");
        };
        let NodeKind::Binary { op: BinOpKind::Exp, rhs: inner, .. } = ast.kind(*power) else {
            panic!("expected exponentiation");
        };
        assert_eq!(ast.source_of(*inner), "4 ^ 5");
    }

    #[test]
    fn left_associative_subtraction() {
        let ast = parse("a - b - c");
        let expr = ast.first_expr().unwrap();
        let NodeKind::Binary { lhs, .. } = ast.kind(expr) else {
            panic!("expected a binary node");
        };
        assert_eq!(ast.source_of(*lhs), "a - b");
    }

    #[test]
    fn unary_binds_looser_than_power() {
        let ast = parse("-x^2");
        let expr = ast.first_expr().unwrap();
        assert!(matches!(ast.kind(expr), NodeKind::Prefix { op: PrefixOpKind::Neg, .. }));
        assert_eq!(ast.to_string(), "-x^2");
    }

    #[test]
    fn assignment_and_relations() {
        assert_eq!(canonical("ta : x = 2 and y # 3"), "ta:x=2 and y#3");
        assert_eq!(canonical("f(x) := x^2"), "f(x):=x^2");
        assert_eq!(canonical("a <= b or not c > d"), "a<=b or not c>d");
    }

    #[test]
    fn plus_minus() {
        assert_eq!(canonical("a +- b"), "a+-b");
        assert_eq!(canonical("a #pm# b"), "a#pm#b");
        assert_eq!(canonical("+-b"), "+-b");
    }

    #[test]
    fn implicit_multiplication() {
        let ast = parse("2x y");
        let expr = ast.first_expr().unwrap();
        let NodeKind::Binary { lhs, implicit: outer, .. } = ast.kind(expr) else {
            panic!("expected a binary node");
        };
        let NodeKind::Binary { implicit: inner, .. } = ast.kind(*lhs) else {
            panic!("expected a binary node");
        };
        assert_eq!(*inner, Some(Implicit::Juxtaposed));
        assert_eq!(*outer, Some(Implicit::Space));
        assert_eq!(ast.to_string(), "2*x*y");
    }

    #[test]
    fn implicit_multiplication_binds_like_star() {
        assert_eq!(canonical("2x^2 + 3x"), "2*x^2+3*x");
        assert_eq!(canonical("2(x+1)"), "2*(x+1)");
    }

    #[test]
    fn calls() {
        assert_eq!(canonical("sin (x)"), "sin(x)");
        assert_eq!(canonical("f()"), "f()");
        assert_eq!(canonical("f(x)(y)"), "f(x)(y)");
        assert_eq!(canonical("(a)(b)"), "(a)(b)");

        let ast = parse("(a)(b)");
        let expr = ast.first_expr().unwrap();
        let NodeKind::Call { callee, .. } = ast.kind(expr) else {
            panic!("expected a call");
        };
        assert!(matches!(ast.kind(*callee), NodeKind::Group { .. }));
    }

    #[test]
    fn factorial() {
        assert_eq!(canonical("n!/2"), "n!/2");
        assert_eq!(canonical("-n!"), "-n!");
    }

    #[test]
    fn statements() {
        let ast = parse("a:1; b:2$ c:3;");
        assert!(ast.is_valid());
        assert_eq!(ast.statements().len(), 3);
        assert_eq!(ast.to_string(), "a:1;b:2;c:3");
    }

    #[test]
    fn collections() {
        assert_eq!(canonical("[1, {2, 3}, (4, 5)]"), "[1,{2,3},(4,5)]");
        assert_eq!(canonical("[]"), "[]");
        assert_eq!(canonical("{}"), "{}");
    }

    #[test]
    fn empty_input() {
        let ast = parse("   ");
        assert!(!ast.is_valid());
        assert_eq!(ast.statements().len(), 1);
        assert_eq!(messages(" ; "), vec!["no expression was given"]);
    }

    #[test]
    fn missing_operand() {
        let ast = parse("1 +");
        assert!(!ast.is_valid());
        assert_eq!(messages("1 +"), vec!["expected an expression"]);
        assert_eq!(ast.invalid_nodes().len(), 1);
    }

    #[test]
    fn unclosed_bracket() {
        let ast = parse("sin(x + 1");
        assert!(!ast.is_valid());
        assert_eq!(messages("sin(x + 1"), vec!["missing right bracket `)`", "unclosed `(`"]);
        assert_eq!(ast.errors()[1].spans, vec![3..4]);

        // the call is still recognised, only marked
        let expr = ast.first_expr().unwrap();
        assert_eq!(ast.call_name(expr), Some("sin"));
        assert!(ast.is_invalid(expr));
    }

    #[test]
    fn stray_closing_bracket() {
        let ast = parse("x + 1)");
        assert!(!ast.is_valid());
        assert_eq!(messages("x + 1)"), vec!["missing left bracket `(`", "unmatched `)`"]);
        assert_eq!(ast.errors()[1].spans, vec![5..6]);
    }

    #[test]
    fn mismatched_brackets() {
        let ast = parse("[(a]");
        assert!(!ast.is_valid());
        let expr = ast.first_expr().unwrap();
        assert!(matches!(ast.kind(expr), NodeKind::List { .. }));
        assert!(!ast.is_invalid(expr));
        assert!(!ast.is_subtree_valid(expr));
    }

    #[test]
    fn unknown_symbol() {
        let ast = parse("x ? y");
        assert!(!ast.is_valid());
        assert_eq!(messages("x ? y"), vec!["unexpected `?`"]);
        assert!(ast.is_invalid(ast.statements()[0]));
    }

    #[test]
    fn unexpected_token_in_list() {
        let ast = parse("[a ? b, c]");
        assert!(!ast.is_valid());
        let expr = ast.first_expr().unwrap();
        let NodeKind::List { items } = ast.kind(expr) else {
            panic!("expected a list");
        };
        assert_eq!(items.len(), 2);
        assert!(ast.is_invalid(expr));
    }

    #[test]
    fn unterminated_string() {
        let ast = parse(r#"x + "abc"#);
        assert!(!ast.is_valid());
        assert_eq!(messages(r#"x + "abc"#), vec!["unterminated string"]);
    }

    #[test]
    fn empty_parentheses() {
        assert_eq!(messages("()"), vec!["empty parentheses"]);
    }

    #[test]
    fn deep_nesting() {
        let source = format!("{}x{}", "(".repeat(200), ")".repeat(200));
        let ast = parse(&source);
        assert!(ast.is_valid());
        assert_eq!(ast.to_string(), source);
    }
}
