//! A quick bracket-balance check, run before parsing.

use crate::tokenizer::{tokenize_complete, TokenKind};

/// A kind of bracket pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bracket {
    /// `(` and `)`.
    Paren,

    /// `[` and `]`.
    Square,

    /// `{` and `}`.
    Curly,
}

impl Bracket {
    /// All bracket kinds, in the order they are checked.
    pub const ALL: [Bracket; 3] = [Bracket::Paren, Bracket::Square, Bracket::Curly];

    /// Returns the opening character of the pair.
    pub fn open(self) -> char {
        match self {
            Bracket::Paren => '(',
            Bracket::Square => '[',
            Bracket::Curly => '{',
        }
    }

    /// Returns the closing character of the pair.
    pub fn close(self) -> char {
        match self {
            Bracket::Paren => ')',
            Bracket::Square => ']',
            Bracket::Curly => '}',
        }
    }

    /// Returns the bracket kind the token opens, if any.
    pub fn opened_by(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::OpenParen => Some(Bracket::Paren),
            TokenKind::OpenSquare => Some(Bracket::Square),
            TokenKind::OpenCurly => Some(Bracket::Curly),
            _ => None,
        }
    }

    /// Returns the bracket kind the token closes, if any.
    pub fn closed_by(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::CloseParen => Some(Bracket::Paren),
            TokenKind::CloseSquare => Some(Bracket::Square),
            TokenKind::CloseCurly => Some(Bracket::Curly),
            _ => None,
        }
    }

    /// Returns the token that closes this bracket kind.
    pub fn closing_token(self) -> TokenKind {
        match self {
            Bracket::Paren => TokenKind::CloseParen,
            Bracket::Square => TokenKind::CloseSquare,
            Bracket::Curly => TokenKind::CloseCurly,
        }
    }
}

/// The outcome of [`check_bookends`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bookends {
    /// Every opening bracket has a closing bracket.
    Balanced,

    /// There are more closing brackets than opening ones.
    MissingLeft,

    /// There are more opening brackets than closing ones.
    MissingRight,
}

/// Counts the opening and closing brackets of the given kind and reports which side, if any, is
/// short. Brackets inside string literals are not counted.
///
/// Only the counts are compared: `)(` is considered balanced. The parser reports misplaced
/// brackets separately.
pub fn check_bookends(source: &str, bracket: Bracket) -> Bookends {
    let (mut open, mut close) = (0usize, 0usize);
    for token in tokenize_complete(source).iter() {
        if Bracket::opened_by(token.kind) == Some(bracket) {
            open += 1;
        } else if Bracket::closed_by(token.kind) == Some(bracket) {
            close += 1;
        }
    }

    match open.cmp(&close) {
        std::cmp::Ordering::Equal => Bookends::Balanced,
        std::cmp::Ordering::Greater => Bookends::MissingRight,
        std::cmp::Ordering::Less => Bookends::MissingLeft,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced() {
        assert_eq!(check_bookends("f(x)*(y+1)", Bracket::Paren), Bookends::Balanced);
        assert_eq!(check_bookends("[1,[2]]", Bracket::Square), Bookends::Balanced);
    }

    #[test]
    fn unbalanced() {
        assert_eq!(check_bookends("(x+1", Bracket::Paren), Bookends::MissingRight);
        assert_eq!(check_bookends("x+1}", Bracket::Curly), Bookends::MissingLeft);
    }

    #[test]
    fn strings_ignored() {
        assert_eq!(check_bookends(r#"f("(((")"#, Bracket::Paren), Bookends::Balanced);
    }
}
