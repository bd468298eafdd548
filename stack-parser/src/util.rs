//! Helpers for working with CAS source text without building a full tree.

use crate::tokenizer::{tokenize_complete, TokenKind};

/// Quotes a string for use in CAS source code, escaping backslashes and double quotes.
///
/// ```
/// use stack_parser::util::to_cas_string;
///
/// assert_eq!(to_cas_string(r#"say "hi""#), r#""say \"hi\"""#);
/// ```
pub fn to_cas_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '\\' || c == '"' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Resolves backslash escapes in the body of a string literal.
pub fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
                continue;
            }
        }
        out.push(c);
    }
    out
}

/// Converts a quoted CAS string back into plain text. Surrounding whitespace is ignored, and
/// input that is not quoted is only unescaped.
///
/// ```
/// use stack_parser::util::from_cas_string;
///
/// assert_eq!(from_cas_string(r#" "a \"b\" \\ c" "#), r#"a "b" \ c"#);
/// ```
pub fn from_cas_string(value: &str) -> String {
    let trimmed = value.trim();
    let body = trimmed
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(trimmed);
    unescape(body).trim().to_string()
}

/// Splits a comma-separated list of expressions at the top level. Commas inside brackets or
/// strings do not split. Items are trimmed, and empty items are dropped.
///
/// ```
/// use stack_parser::util::csv_to_vec;
///
/// assert_eq!(csv_to_vec(r#"a, f(b, c), "d,e""#), vec!["a", "f(b, c)", r#""d,e""#]);
/// ```
pub fn csv_to_vec(source: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for token in tokenize_complete(source).iter() {
        match token.kind {
            TokenKind::OpenParen | TokenKind::OpenSquare | TokenKind::OpenCurly => depth += 1,
            TokenKind::CloseParen | TokenKind::CloseSquare | TokenKind::CloseCurly => {
                depth = depth.saturating_sub(1);
            },
            TokenKind::Comma if depth == 0 => {
                items.push(source[start..token.span.start].trim().to_string());
                start = token.span.end;
            },
            _ => (),
        }
    }
    items.push(source[start..].trim().to_string());
    items.retain(|item| !item.is_empty());
    items
}

/// Replaces the contents of every string literal with nothing, leaving the quotes in place. This
/// lets callers search source code without matching text inside strings.
pub fn eliminate_strings(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    for token in tokenize_complete(source).iter() {
        match token.kind {
            TokenKind::Str => out.push_str("\"\""),
            TokenKind::UnterminatedStr => out.push('"'),
            _ => out.push_str(token.lexeme),
        }
    }
    out
}

/// Returns the unescaped contents of every string literal in the source, in order.
pub fn all_substring_strings(source: &str) -> Vec<String> {
    tokenize_complete(source)
        .iter()
        .filter(|token| token.kind == TokenKind::Str)
        .map(|token| unescape(&token.lexeme[1..token.lexeme.len() - 1]))
        .collect()
}

/// Splits an option of the form `name:argument` into its parts. The argument is [`None`] if there
/// is no colon.
///
/// ```
/// use stack_parser::util::parse_option;
///
/// assert_eq!(parse_option(" sigfigs : 3 "), ("sigfigs".to_string(), Some("3".to_string())));
/// assert_eq!(parse_option("strict"), ("strict".to_string(), None));
/// ```
pub fn parse_option(option: &str) -> (String, Option<String>) {
    match option.split_once(':') {
        Some((name, arg)) => (name.trim().to_string(), Some(arg.trim().to_string())),
        None => (option.trim().to_string(), None),
    }
}
