use ariadne::{Label, Report, ReportKind};
use stack_error::{ErrorKind, EXPR};
use std::ops::Range;
use thiserror::Error;

/// A filter pipeline could not be built.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The requested filter does not exist.
    #[error("unknown filter `{name}`{}", did_you_mean(.suggestion))]
    UnknownFilter {
        name: String,
        suggestion: Option<String>,
    },

    /// A parametric filter was requested without settings.
    #[error("filter `{name}` needs settings, but none were given")]
    MissingSettings { name: String },

    /// The settings of a parametric filter could not be understood.
    #[error("invalid settings for filter `{name}`: {source}")]
    InvalidSettings {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// Two filters that cannot be combined were requested together.
    #[error("conflicting filters present in pipeline: `{first}` and `{second}`")]
    Conflict { first: String, second: String },
}

fn did_you_mean(suggestion: &Option<String>) -> String {
    suggestion
        .as_ref()
        .map(|s| format!(", did you mean `{}`?", s))
        .unwrap_or_default()
}

/// A construct that a filter does not allow.
///
/// The message is produced by the [`Translator`](crate::translate::Translator) in use. Every span
/// of the error is labelled, so one error can point at all of the offending nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// The answer note associated with the violation, such as `Illegal_strings`.
    pub note: String,

    /// The translated message.
    pub message: String,
}

// manual ErrorKind implementation to label every span, not only the first
impl ErrorKind for Violation {
    fn message(&self) -> String {
        self.message.clone()
    }

    fn build_report<'a>(
        &self,
        src_id: &'a str,
        spans: &[Range<usize>],
    ) -> Report<'_, (&'a str, Range<usize>)> {
        let start = spans.first().map_or(0, |span| span.start);
        Report::build(ReportKind::Error, src_id, start)
            .with_message(&self.message)
            .with_labels(spans.iter().map(|span| {
                Label::new((src_id, span.clone()))
                    .with_color(EXPR)
                    .with_message("not allowed here")
            }))
            .with_note(format!("answer note: {}", self.note))
            .finish()
    }
}
