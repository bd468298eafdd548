use crate::error::Violation;
use stack_error::Error;
use std::{collections::HashSet, ops::Range};

/// The errors and answer notes collected while running a filter pipeline.
///
/// Both lists only ever grow, and neither holds duplicates: adding an error with the same message
/// and spans as an earlier one, or a note that is already present, does nothing. This is what
/// makes running a pipeline twice into the same report idempotent.
#[derive(Debug, Default)]
pub struct FilterReport {
    errors: Vec<Error>,
    notes: Vec<String>,
    seen: HashSet<(String, Vec<Range<usize>>)>,
}

impl FilterReport {
    /// Creates an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an answer note. Returns true if the note was not already present.
    pub fn add_note(&mut self, note: &str) -> bool {
        if self.has_note(note) {
            return false;
        }
        self.notes.push(note.to_string());
        true
    }

    /// Returns true if the note is present.
    pub fn has_note(&self, note: &str) -> bool {
        self.notes.iter().any(|n| n == note)
    }

    /// Adds an error. Returns true if no error with the same message and spans was present.
    pub fn add_error(&mut self, error: Error) -> bool {
        if !self.seen.insert((error.message(), error.spans.clone())) {
            return false;
        }
        self.errors.push(error);
        true
    }

    /// Adds a [`Violation`] error with the given note and translated message.
    pub fn add_violation(&mut self, spans: Vec<Range<usize>>, note: &str, message: String) -> bool {
        self.add_error(Error::new(spans, Violation { note: note.to_string(), message }))
    }

    /// Returns the errors, in the order they were added.
    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    /// Returns the plain messages of the errors, in the order they were added.
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(Error::message).collect()
    }

    /// Returns the answer notes, in the order they were added.
    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    /// Returns true if there are no errors.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Consumes the report, returning its errors and notes.
    pub fn into_parts(self) -> (Vec<Error>, Vec<String>) {
        (self.errors, self.notes)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use super::*;

    #[test]
    fn deduplicates() {
        let mut report = FilterReport::new();
        assert!(report.add_note("Illegal_strings"));
        assert!(!report.add_note("Illegal_strings"));

        assert!(report.add_violation(vec![0..1], "x", "bad".to_string()));
        assert!(!report.add_violation(vec![0..1], "x", "bad".to_string()));
        assert!(report.add_violation(vec![2..3], "x", "bad".to_string()));

        assert_eq!(report.notes(), &["Illegal_strings".to_string()]);
        assert_eq!(report.messages(), vec!["bad", "bad"]);
    }
}
