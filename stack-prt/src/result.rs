//! The outcome of evaluating a potential response tree.

use serde::{Deserialize, Serialize};
use stack_parser::util::from_cas_string;

/// The part of an error context that marks errors in feedback variables.
pub const FEEDBACK_VARIABLES_CONTEXT: &str = "/fv";

/// One step of the walk through a tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathEntry {
    /// The name of the node visited.
    pub node: String,

    /// The branch taken: `true` if the answer test passed.
    pub branch: bool,

    /// The answer note of the branch taken.
    pub note: String,
}

/// An error raised during an evaluation, with where it happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationError {
    /// Where the error happened: `<prt>/fv` for the feedback variables, or `<prt>/n<node>` for a
    /// node.
    pub context: String,
    pub message: String,
}

impl EvaluationError {
    /// Returns true if the error happened while evaluating the feedback variables.
    pub fn is_feedback_variables(&self) -> bool {
        self.context.contains(FEEDBACK_VARIABLES_CONTEXT)
    }
}

/// A piece of feedback shown to the student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackItem {
    pub text: String,
    pub format: u8,
}

/// The outcome of evaluating a potential response tree against a set of responses.
///
/// Results with errors are invalid. The score and penalty of an invalid result are [`None`], no
/// matter what was computed before the error; the path up to the error is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub(crate) signature: String,
    pub(crate) weight: f64,
    pub(crate) score: Option<f64>,
    pub(crate) penalty: Option<f64>,
    pub(crate) path: Vec<PathEntry>,

    /// The notes recorded by the answer tests, one per entry of `path`. Empty if a test recorded
    /// none.
    pub(crate) notes: Vec<String>,
    pub(crate) errors: Vec<EvaluationError>,
    pub(crate) feedback: Vec<FeedbackItem>,
    pub(crate) trace: Vec<String>,
}

impl EvaluationResult {
    /// Creates an empty result for the evaluation with the given signature.
    pub fn new(signature: impl Into<String>, weight: f64) -> Self {
        Self {
            signature: signature.into(),
            weight,
            score: None,
            penalty: None,
            path: Vec::new(),
            notes: Vec::new(),
            errors: Vec::new(),
            feedback: Vec::new(),
            trace: Vec::new(),
        }
    }

    /// Identifies the tree and the responses that were evaluated, in the form
    /// `prt_<name>(<input>=<response>,...)`. Suitable as a cache key.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Returns the name of the tree that was evaluated, recovered from the signature.
    ///
    /// ```
    /// use stack_prt::EvaluationResult;
    ///
    /// let result = EvaluationResult::new("prt_prt1(ans1=x^2)", 1.0);
    /// assert_eq!(result.source_context(), "prt1");
    /// ```
    pub fn source_context(&self) -> &str {
        let name = self.signature.get(4..).unwrap_or_default();
        name.split('(').next().unwrap_or_default()
    }

    /// The share of the marks of the question given by the tree.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// The score, or [`None`] if the result is invalid.
    pub fn score(&self) -> Option<f64> {
        self.score.filter(|_| self.is_valid())
    }

    /// The penalty, or [`None`] if the result is invalid. Full marks are never penalised: the
    /// penalty is zero whenever the score is exactly one.
    pub fn penalty(&self) -> Option<f64> {
        if !self.is_valid() {
            return None;
        }
        if self.score == Some(1.0) {
            return Some(0.0);
        }
        self.penalty
    }

    /// The score, scaled by the weight. Invalid results count as zero.
    pub fn fraction(&self) -> f64 {
        self.weight * self.score().unwrap_or(0.0)
    }

    /// The penalty, scaled by the weight. Invalid results count as zero.
    pub fn fractional_penalty(&self) -> f64 {
        self.weight * self.penalty().unwrap_or(0.0)
    }

    /// The nodes visited, in order, with the branch taken at each.
    pub fn path(&self) -> &[PathEntry] {
        &self.path
    }

    /// The answer notes of the walk: for every step, the note of the branch taken followed by the
    /// note of the answer test. Quoted notes are unquoted, and empty notes are left out.
    pub fn answer_notes(&self) -> Vec<String> {
        let mut notes = Vec::new();
        for (i, entry) in self.path.iter().enumerate() {
            notes.push(from_cas_string(&entry.note));
            if let Some(note) = self.notes.get(i) {
                notes.push(from_cas_string(note));
            }
        }
        notes.retain(|note| !note.is_empty());
        notes
    }

    /// The errors raised by the nodes.
    pub fn errors(&self) -> Vec<&EvaluationError> {
        self.errors.iter().filter(|err| !err.is_feedback_variables()).collect()
    }

    /// The errors raised while evaluating the feedback variables.
    pub fn fv_errors(&self) -> Vec<&EvaluationError> {
        self.errors.iter().filter(|err| err.is_feedback_variables()).collect()
    }

    /// Returns true if no errors were raised, by the nodes or by the feedback variables.
    ///
    /// Feedback-variable errors count too: a tree whose variables failed never walked its nodes,
    /// so its score and penalty mean nothing. Older hosts only looked at node errors here.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// The feedback to show to the student, in the order it was given.
    pub fn feedback(&self) -> &[FeedbackItem] {
        &self.feedback
    }

    /// The feedback to show to the student, as a single text.
    pub fn rendered_feedback(&self) -> String {
        self.feedback
            .iter()
            .map(|item| item.text.trim())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// A description of each step of the evaluation, for authors.
    pub fn trace(&self) -> &[String] {
        &self.trace
    }
}
