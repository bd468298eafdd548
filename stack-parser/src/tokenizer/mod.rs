pub mod token;

use logos::{Lexer, Logos};
pub use token::{Token, TokenKind};

/// Returns an iterator over the token kinds produced by the tokenizer.
pub fn tokenize(input: &str) -> Lexer<'_, TokenKind> {
    TokenKind::lexer(input)
}

/// Returns an owned array containing all of the tokens produced by the tokenizer. This allows us
/// to backtrack in case of an error.
///
/// Input that the lexer cannot classify is kept as [`TokenKind::Symbol`] so the parser can point
/// at it.
pub fn tokenize_complete(input: &str) -> Box<[Token<'_>]> {
    let mut lexer = tokenize(input);
    let mut tokens = Vec::new();

    while let Some(kind) = lexer.next() {
        tokens.push(Token {
            span: lexer.span(),
            kind: kind.unwrap_or(TokenKind::Symbol),
            lexeme: lexer.slice(),
        });
    }

    tokens.into_boxed_slice()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use super::*;

    /// Compares the tokens produced by the tokenizer to the raw expected tokens.
    fn compare_tokens<'source, const N: usize>(input: &'source str, expected: [(TokenKind, &'source str); N]) {
        let mut lexer = tokenize(input);

        for (expected_kind, expected_lexeme) in expected.into_iter() {
            assert_eq!(lexer.next(), Some(Ok(expected_kind)));
            assert_eq!(lexer.slice(), expected_lexeme);
        }

        assert_eq!(lexer.next(), None);
    }

    #[test]
    fn basic_expr() {
        compare_tokens(
            "1 + 2.5",
            [
                (TokenKind::Int, "1"),
                (TokenKind::Whitespace, " "),
                (TokenKind::Add, "+"),
                (TokenKind::Whitespace, " "),
                (TokenKind::Float, "2.5"),
            ],
        );
    }

    #[test]
    fn scientific_and_implicit() {
        compare_tokens(
            "3.1e-2x**2",
            [
                (TokenKind::Float, "3.1e-2"),
                (TokenKind::Name, "x"),
                (TokenKind::Exp, "**"),
                (TokenKind::Int, "2"),
            ],
        );
    }

    #[test]
    fn strings_and_keywords() {
        compare_tokens(
            r#"not "a\"b" and %pi#3"#,
            [
                (TokenKind::Not, "not"),
                (TokenKind::Whitespace, " "),
                (TokenKind::Str, r#""a\"b""#),
                (TokenKind::Whitespace, " "),
                (TokenKind::And, "and"),
                (TokenKind::Whitespace, " "),
                (TokenKind::Name, "%pi"),
                (TokenKind::NotEq, "#"),
                (TokenKind::Int, "3"),
            ],
        );
    }

    #[test]
    fn plus_minus_forms() {
        compare_tokens(
            "a+-b#pm#c",
            [
                (TokenKind::Name, "a"),
                (TokenKind::PlusMinus, "+-"),
                (TokenKind::Name, "b"),
                (TokenKind::Pm, "#pm#"),
                (TokenKind::Name, "c"),
            ],
        );
    }

    #[test]
    fn unterminated_string() {
        compare_tokens(
            r#"x:"abc"#,
            [
                (TokenKind::Name, "x"),
                (TokenKind::Assign, ":"),
                (TokenKind::UnterminatedStr, r#""abc"#),
            ],
        );
    }

    #[test]
    fn keyword_prefix_is_a_name() {
        compare_tokens(
            "android",
            [(TokenKind::Name, "android")],
        );
    }
}
