//! Contains the common [`ErrorKind`] trait used by all errors to display author-facing error
//! messages, and the [`Error`] type that ties an error kind to the regions of source code it
//! originated from.

// lets `#[derive(ErrorKind)]` refer to `stack_error::...` inside this crate's own tests
extern crate self as stack_error;

use ariadne::{Color, Report, Source};
use std::{fmt::Debug, ops::Range};

/// The color to use to highlight expressions.
pub const EXPR: Color = Color::RGB(52, 235, 152);

/// Represents any kind of error that can occur while parsing, filtering, or evaluating an
/// expression.
pub trait ErrorKind: Debug + Send + Sync {
    /// The plain, single-line message of this error, without any source highlighting.
    fn message(&self) -> String;

    /// Builds the report for this error.
    fn build_report<'a>(
        &self,
        src_id: &'a str,
        spans: &[Range<usize>],
    ) -> Report<'_, (&'a str, Range<usize>)>;
}

/// An error associated with regions of source code that can be highlighted.
#[derive(Debug)]
pub struct Error {
    /// The regions of the source code that this error originated from.
    pub spans: Vec<Range<usize>>,

    /// The kind of error that occurred.
    pub kind: Box<dyn ErrorKind>,
}

impl Error {
    /// Creates a new error with the given spans and kind.
    pub fn new(spans: Vec<Range<usize>>, kind: impl ErrorKind + 'static) -> Self {
        Self { spans, kind: Box::new(kind) }
    }

    /// Returns the plain message of the error.
    pub fn message(&self) -> String {
        self.kind.message()
    }

    /// Build a report from this error kind.
    pub fn build_report<'a>(&self, src_id: &'a str) -> Report<'_, (&'a str, Range<usize>)> {
        self.kind.build_report(src_id, &self.spans)
    }

    /// Renders the report for this error against the given source code into a string.
    pub fn render(&self, src_id: &str, src: &str) -> String {
        let mut buf = Vec::new();
        // writing into a `Vec` cannot fail
        let _ = self.build_report(src_id).write((src_id, Source::from(src)), &mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Prints the report for this error to stderr.
    pub fn report_to_stderr(&self, src_id: &str, src: &str) {
        let _ = self.build_report(src_id).eprint((src_id, Source::from(src)));
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind.message())
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use stack_attrs::ErrorKind;
    use super::*;

    /// A forbidden word was used.
    #[derive(Debug, ErrorKind)]
    #[error(
        message = format!("the word `{}` is forbidden", self.word),
        labels = ["this word"],
        help = "rename the variable",
    )]
    struct ForbiddenWord {
        word: String,
    }

    #[test]
    fn plain_message() {
        let err = Error::new(vec![0..6], ForbiddenWord { word: "system".to_string() });
        assert_eq!(err.message(), "the word `system` is forbidden");
        assert_eq!(err.to_string(), "the word `system` is forbidden");
    }

    #[test]
    fn rendered_report() {
        let src = "system(1)";
        let err = Error::new(vec![0..6], ForbiddenWord { word: "system".to_string() });
        let rendered = strip_ansi_escapes::strip_str(err.render("input", src));
        assert!(rendered.contains("the word `system` is forbidden"));
        assert!(rendered.contains("this word"));
        assert!(rendered.contains("rename the variable"));
    }
}
