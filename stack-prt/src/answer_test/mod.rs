//! Answer tests: the comparisons run at the nodes of a potential response tree.
//!
//! An answer test compares the student's side of a node against the teacher's side and decides
//! which branch the walk takes. Tests may record a note explaining their decision, which becomes
//! part of the answer notes of the evaluation.

pub mod equiv;
pub mod numeric;
pub mod string;

use crate::numerical::{self, ctxt::Ctxt};
use crate::options::{EvaluationOptions, StackOptions};
use levenshtein::levenshtein;
use stack_parser::ast::{Ast, NodeId, NodeKind};
use std::{collections::HashMap, fmt::Debug, sync::Arc, time::{Duration, Instant}};
use thiserror::Error;

/// An answer test could not reach a decision.
#[derive(Debug, Error)]
pub enum TestError {
    /// No answer test has the given name.
    #[error("unknown answer test `{name}`{}", .suggestion.as_ref().map(|s| format!(", did you mean `{}`?", s)).unwrap_or_default())]
    UnknownTest { name: String, suggestion: Option<String> },

    /// The test needs options, but the node gives none.
    #[error("the answer test `{0}` requires options")]
    MissingOptions(&'static str),

    /// The options given to the test are not ones it understands.
    #[error("invalid options for the answer test `{test}`: {reason}")]
    InvalidOptions { test: &'static str, reason: String },

    /// One side of the comparison could not be evaluated.
    #[error("could not evaluate `{expr}`: {source}")]
    Evaluation { expr: String, source: stack_error::Error },

    /// The time allowed for the evaluation ran out.
    #[error("the answer test timed out after {0:?}")]
    Timeout(Duration),

    /// The two sides could not be compared at any point.
    #[error("`{0}` and `{1}` cannot be compared")]
    Incomparable(String, String),
}

/// One side of a comparison: an expression inside a parsed tree.
#[derive(Debug, Clone, Copy)]
pub struct Operand<'a> {
    pub ast: &'a Ast,
    pub node: NodeId,
}

impl<'a> Operand<'a> {
    /// The whole of a parsed tree. Trees with several statements are represented by their last.
    pub fn root(ast: &'a Ast) -> Self {
        let node = match ast.statements().last() {
            Some(&statement) => match ast.kind(statement) {
                NodeKind::Statement { expr } => *expr,
                _ => statement,
            },
            None => ast.root(),
        };
        Self { ast, node }
    }

    /// Another expression of the same tree.
    pub fn at(self, node: NodeId) -> Self {
        Self { ast: self.ast, node }
    }

    pub fn kind(&self) -> &'a NodeKind {
        self.ast.kind(self.node)
    }

    /// The canonical text of the expression.
    pub fn text(&self) -> String {
        self.ast.display(self.node).to_string()
    }

    /// Evaluates the expression numerically.
    pub fn eval(&self, ctxt: &Ctxt) -> Result<f64, TestError> {
        numerical::eval(self.ast, self.node, ctxt).map_err(|source| TestError::Evaluation {
            expr: self.text(),
            source,
        })
    }
}

/// Everything an answer test may need besides its operands.
#[derive(Debug, Clone, Copy)]
pub struct TestCtxt<'a> {
    pub options: &'a StackOptions,
    pub evaluation: &'a EvaluationOptions,
    pub deadline: Instant,
}

impl TestCtxt<'_> {
    /// Fails with [`TestError::Timeout`] if the deadline has passed.
    pub fn check_deadline(&self) -> Result<(), TestError> {
        if Instant::now() >= self.deadline {
            Err(TestError::Timeout(self.evaluation.timeout))
        } else {
            Ok(())
        }
    }
}

/// The decision of an answer test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestOutcome {
    pub passed: bool,

    /// Why the test decided the way it did, if it says.
    pub note: Option<String>,
}

impl TestOutcome {
    pub fn pass() -> Self {
        Self { passed: true, note: None }
    }

    pub fn fail() -> Self {
        Self { passed: false, note: None }
    }

    pub fn from_bool(passed: bool) -> Self {
        Self { passed, note: None }
    }

    /// Attaches a note. Returns the updated outcome for chaining.
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// A comparison between the student's and the teacher's expressions.
pub trait AnswerTest: Debug + Send + Sync {
    /// The name of the test, as authors write it.
    fn name(&self) -> &'static str;

    /// Returns true if the test cannot run without options.
    fn requires_options(&self) -> bool {
        false
    }

    /// Compares the two expressions.
    fn run(
        &self,
        sans: Operand,
        tans: Operand,
        options: Option<Operand>,
        ctxt: &TestCtxt,
    ) -> Result<TestOutcome, TestError>;
}

/// The answer tests available to potential response trees, by name.
#[derive(Debug, Clone)]
pub struct AnswerTestRegistry {
    tests: HashMap<&'static str, Arc<dyn AnswerTest>>,
}

impl Default for AnswerTestRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AnswerTestRegistry {
    /// Creates a registry with every built-in answer test.
    pub fn new() -> Self {
        use equiv::*;
        use numeric::*;
        use string::*;

        macro_rules! build {
            ($($upname:ident),* $(,)?) => {
                [
                    $(
                        Arc::new($upname) as Arc<dyn AnswerTest>,
                    )*
                ]
                    .into_iter()
                    .map(|test| (test.name(), test))
                    .collect()
            };
        }

        Self {
            tests: build! {
                AlgEquiv,
                CasEqual,
                StringExact,
                StringSloppy,
                NumRelative,
                NumAbsolute,
                NumDecPlaces,
                Gt,
                Gte,
            },
        }
    }

    /// Adds an answer test, replacing any test with the same name.
    pub fn register(&mut self, test: Arc<dyn AnswerTest>) {
        self.tests.insert(test.name(), test);
    }

    /// Returns the names of every answer test, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names = self.tests.keys().copied().collect::<Vec<_>>();
        names.sort_unstable();
        names
    }

    /// Returns the answer test with the given name.
    pub fn get(&self, name: &str) -> Result<&dyn AnswerTest, TestError> {
        match self.tests.get(name) {
            Some(test) => Ok(test.as_ref()),
            None => Err(TestError::UnknownTest {
                name: name.to_string(),
                suggestion: self.tests
                    .keys()
                    .map(|known| (levenshtein(known, name), known))
                    .filter(|(distance, _)| *distance <= 3)
                    .min()
                    .map(|(_, known)| known.to_string()),
            }),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use super::*;
    use stack_parser::parse;

    /// Runs an answer test on sources, with default options and a generous deadline.
    pub fn run(test: &dyn AnswerTest, sans: &str, tans: &str, options: Option<&str>) -> Result<TestOutcome, TestError> {
        run_with(test, sans, tans, options, &StackOptions::default())
    }

    pub fn run_with(
        test: &dyn AnswerTest,
        sans: &str,
        tans: &str,
        options: Option<&str>,
        stack_options: &StackOptions,
    ) -> Result<TestOutcome, TestError> {
        let evaluation = EvaluationOptions::default();
        let ctxt = TestCtxt {
            options: stack_options,
            evaluation: &evaluation,
            deadline: Instant::now() + evaluation.timeout,
        };
        let (sans, tans) = (parse(sans), parse(tans));
        let options = options.map(parse);
        test.run(
            Operand::root(&sans),
            Operand::root(&tans),
            options.as_ref().map(Operand::root),
            &ctxt,
        )
    }
}
