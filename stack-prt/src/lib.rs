//! Potential response trees, and their evaluation against students' responses.
//!
//! A potential response tree ([`Prt`]) is a graph of answer tests. Evaluating it walks the graph
//! from its first node: each node compares an expression built from the student's responses
//! against one built from the teacher's, and the result of the comparison picks the branch that
//! adjusts the score and penalty, records an answer note, and names the next node. The walk
//! produces an [`EvaluationResult`].
//!
//! ```
//! use stack_filter::FilterRegistry;
//! use stack_prt::{evaluator::parse_responses, Branch, Prt, PrtEvaluator, PrtNode, Responses, StackOptions};
//!
//! let prt = Prt::new("prt1", vec![
//!     PrtNode::new("1", "AlgEquiv", "ans1", "(x+1)^2")
//!         .on_true(Branch::set("1", "prt1-1-T"))
//!         .on_false(Branch::set("0", "prt1-1-F")),
//! ], Some("1")).unwrap();
//!
//! let evaluator = PrtEvaluator::new(&FilterRegistry::new()).unwrap();
//! let result = evaluator.evaluate(
//!     &prt,
//!     &parse_responses([("ans1", "x^2 + 2x + 1")]),
//!     &Responses::new(),
//!     &StackOptions::default(),
//! );
//!
//! assert_eq!(result.score(), Some(1.0));
//! assert_eq!(result.answer_notes(), vec!["prt1-1-T"]);
//! ```

pub mod answer_test;
pub mod evaluator;
pub mod numerical;
pub mod options;
pub mod prt;
pub mod result;

pub use answer_test::{AnswerTest, AnswerTestRegistry, TestError, TestOutcome};
pub use evaluator::{PrtEvaluator, Responses};
pub use options::{EvaluationOptions, OptionsError, StackOptions};
pub use prt::{Branch, Prt, PrtError, PrtNode, ScoreMode};
pub use result::{EvaluationError, EvaluationResult, FeedbackItem, PathEntry};
