use logos::Logos;
use std::ops::Range;

/// The different kinds of tokens that can be produced by the tokenizer.
#[derive(Logos, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    #[regex(r"[\n\r]+")]
    NewLine,

    #[regex(r"[ \t\f]+")]
    Whitespace,

    #[token("+")]
    Add,

    #[token("-")]
    Sub,

    /// The `+-` operator written by students, replaced by `#pm#` in the filter pipeline.
    #[token("+-")]
    PlusMinus,

    /// The inert plus-minus operator `#pm#`.
    #[token("#pm#")]
    Pm,

    #[token("*")]
    Mul,

    #[token("/")]
    Div,

    #[token("^")]
    #[token("**")]
    Exp,

    #[token("=")]
    Eq,

    #[token("#")]
    NotEq,

    #[token(">")]
    Greater,

    #[token(">=")]
    GreaterEq,

    #[token("<")]
    Less,

    #[token("<=")]
    LessEq,

    #[token(":")]
    Assign,

    #[token(":=")]
    Define,

    #[token("!")]
    Factorial,

    #[token(".")]
    Dot,

    #[token("and")]
    And,

    #[token("or")]
    Or,

    #[token("not")]
    Not,

    #[regex(r"[a-zA-Z_%][a-zA-Z0-9_%]*")]
    Name,

    #[regex(r"[0-9]+")]
    Int,

    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?")]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?")]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+")]
    Float,

    #[regex(r#""([^"\\]|\\.)*""#)]
    Str,

    /// A string literal that is missing its closing quote.
    #[regex(r#""([^"\\]|\\.)*"#)]
    UnterminatedStr,

    #[token(",")]
    Comma,

    #[token(";")]
    #[token("$")]
    Semicolon,

    #[token("(")]
    OpenParen,

    #[token(")")]
    CloseParen,

    #[token("[")]
    OpenSquare,

    #[token("]")]
    CloseSquare,

    #[token("{")]
    OpenCurly,

    #[token("}")]
    CloseCurly,

    #[regex(r".", priority = 0)]
    Symbol,
}

impl TokenKind {
    /// Returns true if the token represents whitespace.
    pub fn is_whitespace(self) -> bool {
        matches!(self, TokenKind::Whitespace | TokenKind::NewLine)
    }

    /// Returns true if the token can begin a primary expression. Such a token found directly
    /// after a complete operand implies a multiplication.
    pub fn starts_primary(self) -> bool {
        matches!(
            self,
            TokenKind::Name
                | TokenKind::Int
                | TokenKind::Float
                | TokenKind::Str
                | TokenKind::UnterminatedStr
                | TokenKind::OpenParen
                | TokenKind::OpenSquare
                | TokenKind::OpenCurly
        )
    }

    /// Returns true if the token closes a bracketed construct.
    pub fn is_closing(self) -> bool {
        matches!(self, TokenKind::CloseParen | TokenKind::CloseSquare | TokenKind::CloseCurly)
    }
}

/// A token produced by the tokenizer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'source> {
    /// The region of the source code that this token originated from.
    pub span: Range<usize>,

    /// The kind of token.
    pub kind: TokenKind,

    /// The raw lexeme that was parsed into this token.
    pub lexeme: &'source str,
}

impl Token<'_> {
    /// Returns true if the token represents whitespace.
    pub fn is_whitespace(&self) -> bool {
        self.kind.is_whitespace()
    }
}
