//! Walks potential response trees over a set of responses.

use crate::answer_test::{AnswerTestRegistry, Operand, TestCtxt, TestError};
use crate::numerical::{self, ctxt::Ctxt};
use crate::options::{EvaluationOptions, StackOptions};
use crate::prt::{Branch, Prt, PrtNode};
use crate::result::{EvaluationError, EvaluationResult, FeedbackItem, PathEntry};
use rayon::prelude::*;
use stack_filter::{
    ConfigError,
    FilterContext,
    FilterRegistry,
    KeyTranslator,
    Pipeline,
    SecurityPolicy,
    Translator,
};
use stack_parser::{
    ast::{Ast, NodeId, NodeKind},
    parse,
    parser::op::BinOpKind,
};
use std::{
    collections::{BTreeMap, HashMap, HashSet},
    fmt::{self, Debug, Formatter},
    sync::Arc,
    time::Instant,
};
use tracing::{debug, warn};

/// Parsed responses, keyed by the name of the input they answer.
pub type Responses = BTreeMap<String, Ast>;

/// Parses each response. The responses are not filtered.
///
/// ```
/// use stack_prt::evaluator::parse_responses;
///
/// let responses = parse_responses([("ans1", "x^2"), ("ans2", "[1, 2]")]);
/// assert_eq!(responses["ans1"].source(), "x^2");
/// ```
pub fn parse_responses<'a>(responses: impl IntoIterator<Item = (&'a str, &'a str)>) -> Responses {
    responses
        .into_iter()
        .map(|(name, source)| (name.to_string(), parse(source)))
        .collect()
}

/// Expressions bound to names. Identifiers with a bound name are replaced by the bound
/// expression.
#[derive(Debug, Clone, Default)]
struct Scope<'a> {
    bindings: HashMap<&'a str, &'a Ast>,
}

impl<'a> Scope<'a> {
    fn bind_all(&mut self, responses: &'a Responses) {
        for (name, ast) in responses {
            self.bindings.insert(name, ast);
        }
    }

    fn bind(&mut self, name: &'a str, ast: &'a Ast) {
        self.bindings.insert(name, ast);
    }

    /// Replaces every bound identifier in the tree with a copy of its expression. Names of
    /// called functions are left alone. Expressions that are not valid stay invalid where they
    /// are substituted, so nothing built on them can be evaluated.
    fn substitute(&self, ast: &mut Ast) {
        let callees = ast.walk()
            .filter_map(|id| match ast.kind(id) {
                NodeKind::Call { callee, .. } => Some(*callee),
                _ => None,
            })
            .collect::<HashSet<_>>();

        let targets = ast.walk()
            .filter(|id| !callees.contains(id))
            .filter_map(|id| {
                let name = ast.identifier(id)?;
                self.bindings.get(name).map(|&bound| (id, bound))
            })
            .collect::<Vec<(NodeId, &Ast)>>();

        for (at, bound) in targets {
            ast.graft(at, bound, Operand::root(bound).node);
            if !bound.is_valid() {
                ast.mark_invalid(at);
            }
        }
    }
}

/// A node could not be evaluated. Carries the messages to record on the node.
struct NodeFailure(Vec<String>);

impl From<TestError> for NodeFailure {
    fn from(err: TestError) -> Self {
        Self(vec![err.to_string()])
    }
}

/// Evaluates potential response trees.
///
/// The evaluator holds no state that changes between evaluations. Any number of evaluations may
/// run at once, from any number of threads.
#[derive(Clone)]
pub struct PrtEvaluator {
    pipeline: Pipeline,
    tests: AnswerTestRegistry,
    security: SecurityPolicy,
    translator: Arc<dyn Translator>,
    options: EvaluationOptions,
}

impl Debug for PrtEvaluator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrtEvaluator")
            .field("pipeline", &self.pipeline)
            .field("tests", &self.tests)
            .field("security", &self.security)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl PrtEvaluator {
    /// Creates an evaluator that checks the expressions of trees with the core filters of the
    /// registry and the security filter, and uses the built-in answer tests.
    pub fn new(registry: &FilterRegistry) -> Result<Self, ConfigError> {
        Ok(Self {
            pipeline: registry.author_pipeline()?,
            tests: AnswerTestRegistry::new(),
            security: SecurityPolicy::new(),
            translator: Arc::new(KeyTranslator),
            options: EvaluationOptions::default(),
        })
    }

    /// Sets the answer tests. Returns the updated evaluator for chaining.
    pub fn with_tests(mut self, tests: AnswerTestRegistry) -> Self {
        self.tests = tests;
        self
    }

    /// Sets the security policy applied to the expressions of trees. Returns the updated
    /// evaluator for chaining.
    pub fn with_security(mut self, security: SecurityPolicy) -> Self {
        self.security = security;
        self
    }

    /// Sets the translator used for error messages. Returns the updated evaluator for chaining.
    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = translator;
        self
    }

    /// Sets the evaluation options. Returns the updated evaluator for chaining.
    pub fn with_options(mut self, options: EvaluationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &EvaluationOptions {
        &self.options
    }

    /// Builds the signature of an evaluation, `prt_<name>(<input>=<response>,...)`.
    pub fn signature(prt: &Prt, student: &Responses) -> String {
        let inputs = student
            .iter()
            .map(|(name, ast)| format!("{}={}", name, ast.display(ast.root())))
            .collect::<Vec<_>>();
        format!("prt_{}({})", prt.name(), inputs.join(","))
    }

    /// Parses an expression of the tree and checks it with the pipeline. Returns the messages of
    /// every problem found.
    fn prepare(&self, source: &str) -> Result<Ast, Vec<String>> {
        let mut ast = parse(source);
        let ctx = FilterContext::new(&self.security, self.translator.as_ref());
        let report = self.pipeline.run(&mut ast, &ctx);

        let mut messages = ast.errors().iter().map(|err| err.message()).collect::<Vec<_>>();
        messages.extend(report.messages());
        if messages.is_empty() && !ast.is_valid() {
            messages.push(format!("`{}` is not a valid expression", source.trim()));
        }

        if messages.is_empty() {
            Ok(ast)
        } else {
            Err(messages)
        }
    }

    /// Binds the feedback variables of the tree, in order. Each may refer to the responses and
    /// to the variables bound before it.
    fn feedback_variables<'a>(
        &self,
        prt: &Prt,
        scope: &Scope<'a>,
    ) -> Result<Vec<(String, Ast)>, Vec<String>> {
        let mut bound = Vec::new();
        if prt.feedback_variables().trim().is_empty() {
            return Ok(bound);
        }

        let ast = self.prepare(prt.feedback_variables())?;
        for &statement in ast.statements() {
            let NodeKind::Statement { expr } = ast.kind(statement) else {
                continue;
            };
            let NodeKind::Binary { op: BinOpKind::Assign, lhs, rhs, .. } = ast.kind(*expr) else {
                debug!(prt = prt.name(), statement = %ast.display(statement), "ignoring feedback statement");
                continue;
            };
            let Some(name) = ast.identifier(*lhs) else {
                return Err(vec![format!("cannot assign to `{}`", ast.display(*lhs))]);
            };

            let mut value = parse(&ast.display(*rhs).to_string());
            {
                let mut local = scope.clone();
                for (earlier, earlier_value) in &bound {
                    local.bind(earlier, earlier_value);
                }
                local.substitute(&mut value);
            }
            bound.push((name.to_string(), value));
        }
        Ok(bound)
    }

    /// Parses, checks, and substitutes an expression of a node.
    fn expression(&self, source: &str, scope: &Scope) -> Result<Ast, NodeFailure> {
        let mut ast = self.prepare(source).map_err(NodeFailure)?;
        scope.substitute(&mut ast);
        Ok(ast)
    }

    /// Evaluates a score or penalty of a branch. Plain numbers are read directly. The value must
    /// be finite.
    fn number(&self, source: &str, scope: &Scope) -> Result<f64, NodeFailure> {
        let value = match source.trim().parse::<f64>() {
            Ok(value) => value,
            Err(_) => {
                let ast = self.expression(source, scope)?;
                numerical::eval(&ast, ast.root(), &Ctxt::new()).map_err(|err| {
                    NodeFailure(vec![format!("could not evaluate `{}`: {}", source.trim(), err)])
                })?
            },
        };
        if !value.is_finite() {
            return Err(NodeFailure(vec![format!("`{}` is not a finite number", source.trim())]));
        }
        Ok(value)
    }

    /// Runs the answer test of a node, returning whether it passed, and its note.
    fn run_test(
        &self,
        node: &PrtNode,
        student: &Scope,
        teacher: &Scope,
        ctxt: &TestCtxt,
    ) -> Result<(bool, String), NodeFailure> {
        ctxt.check_deadline()?;
        let test = self.tests.get(&node.answer_test)?;
        let sans = self.expression(&node.sans, student)?;
        let tans = self.expression(&node.tans, teacher)?;
        let options = match node.test_options.trim() {
            "" if test.requires_options() => return Err(TestError::MissingOptions(test.name()).into()),
            "" => None,
            source => Some(self.expression(source, teacher)?),
        };

        let outcome = test.run(
            Operand::root(&sans),
            Operand::root(&tans),
            options.as_ref().map(Operand::root),
            ctxt,
        )?;
        Ok((outcome.passed, outcome.note.unwrap_or_default()))
    }

    /// Applies the score and penalty of a branch to the running values.
    fn apply(
        &self,
        branch: &Branch,
        scope: &Scope,
        score: &mut f64,
        penalty: &mut f64,
    ) -> Result<(), NodeFailure> {
        let value = self.number(&branch.score, scope)?;
        let branch_penalty = match &branch.penalty {
            Some(source) => self.number(source, scope)?,
            None => self.options.default_penalty,
        };
        *score = branch.mode.apply(*score, value);
        *penalty = branch.mode.apply(*penalty, branch_penalty);
        Ok(())
    }

    /// Evaluates a tree against the student's and the teacher's responses.
    ///
    /// The `sans` of each node is read with the student's responses bound, and the `tans` and
    /// test options with the teacher's. Feedback variables are bound for both, and may refer to
    /// the responses of either; student responses take precedence when both have the same name.
    ///
    /// Problems never abort the evaluation: they are recorded as errors in the result, which
    /// makes it invalid, and the walk stops at the node where they happened.
    pub fn evaluate(
        &self,
        prt: &Prt,
        student: &Responses,
        teacher: &Responses,
        options: &StackOptions,
    ) -> EvaluationResult {
        let ctxt = TestCtxt {
            options,
            evaluation: &self.options,
            deadline: Instant::now() + self.options.timeout,
        };
        let mut result = EvaluationResult::new(Self::signature(prt, student), prt.value());

        let mut shared = Scope::default();
        shared.bind_all(teacher);
        shared.bind_all(student);
        let fv_context = format!("{}/fv", prt.name());
        let bound = match self.feedback_variables(prt, &shared) {
            Ok(bound) => bound,
            Err(messages) => {
                warn!(prt = prt.name(), "feedback variables failed");
                result.errors.extend(messages.into_iter().map(|message| EvaluationError {
                    context: fv_context.clone(),
                    message,
                }));
                return result;
            },
        };

        let (mut student_scope, mut teacher_scope) = (Scope::default(), Scope::default());
        student_scope.bind_all(student);
        teacher_scope.bind_all(teacher);
        for (name, value) in &bound {
            student_scope.bind(name, value);
            teacher_scope.bind(name, value);
            result.trace.push(format!("{}: {}", name, value.display(value.root())));
        }

        let (mut score, mut penalty) = (0.0, 0.0);
        let mut visited = HashSet::new();
        let mut current = Some(prt.first_node());
        while let Some(node) = current {
            let context = format!("{}/n{}", prt.name(), node.name);
            if !visited.insert(node.name.as_str()) {
                result.errors.push(EvaluationError {
                    context,
                    message: format!("node `{}` was reached twice", node.name),
                });
                break;
            }

            let step = self.run_test(node, &student_scope, &teacher_scope, &ctxt)
                .and_then(|(passed, note)| {
                    let branch = node.branch(passed);
                    self.apply(branch, &student_scope, &mut score, &mut penalty)?;
                    Ok((passed, note, branch))
                });
            let (passed, note, branch) = match step {
                Ok(step) => step,
                Err(NodeFailure(messages)) => {
                    debug!(prt = prt.name(), node = node.name.as_str(), "node failed");
                    result.errors.extend(messages.into_iter().map(|message| EvaluationError {
                        context: context.clone(),
                        message,
                    }));
                    break;
                },
            };

            debug!(prt = prt.name(), node = node.name.as_str(), passed, score, penalty, "node evaluated");
            result.trace.push(format!(
                "{}: {}({}, {}) = {}; score {} {} = {}",
                node.name, node.answer_test, node.sans, node.tans, passed, branch.mode, branch.score, score,
            ));
            result.path.push(PathEntry {
                node: node.name.clone(),
                branch: passed,
                note: branch.answer_note.clone(),
            });
            result.notes.push(note);
            if !node.quiet && !branch.feedback.trim().is_empty() {
                result.feedback.push(FeedbackItem {
                    text: branch.feedback.clone(),
                    format: branch.feedback_format,
                });
            }

            current = branch.next.as_deref().and_then(|next| prt.node(next));
        }

        result.score = Some(score);
        result.penalty = Some(penalty);
        result
    }

    /// Evaluates independent trees against the same responses, in parallel. Results are in the
    /// order of the trees.
    pub fn evaluate_all(
        &self,
        prts: &[Prt],
        student: &Responses,
        teacher: &Responses,
        options: &StackOptions,
    ) -> Vec<EvaluationResult> {
        prts.par_iter()
            .map(|prt| self.evaluate(prt, student, teacher, options))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use crate::prt::ScoreMode;
    use super::*;

    fn evaluator() -> PrtEvaluator {
        PrtEvaluator::new(&FilterRegistry::new()).unwrap()
    }

    fn evaluate(prt: &Prt, student: &[(&str, &str)], teacher: &[(&str, &str)]) -> EvaluationResult {
        evaluator().evaluate(
            prt,
            &parse_responses(student.iter().copied()),
            &parse_responses(teacher.iter().copied()),
            &StackOptions::default(),
        )
    }

    /// Node 1 checks equivalence with `x^2`. If it fails, node 2 checks whether the student
    /// differentiated instead, scoring half marks minus a penalty.
    fn two_nodes() -> Prt {
        Prt::new("prt1", vec![
            PrtNode::new("1", "AlgEquiv", "ans1", "ta")
                .on_true(Branch::set("1", "prt1-1-T").feedback("Correct."))
                .on_false(Branch::set("0", "prt1-1-F").next("2")),
            PrtNode::new("2", "AlgEquiv", "ans1", "diff_ta")
                .on_true(Branch {
                    mode: ScoreMode::Add,
                    score: "1/2".to_string(),
                    penalty: Some("0.25".to_string()),
                    ..Branch::set("0", "prt1-2-T").feedback("Differentiated.")
                })
                .on_false(Branch::set("0", "prt1-2-F")),
        ], Some("1")).unwrap()
    }

    #[test]
    fn walk_and_score() {
        let teacher = [("ta", "x^2"), ("diff_ta", "2x")];

        let result = evaluate(&two_nodes(), &[("ans1", "x*x")], &teacher);
        assert!(result.is_valid());
        assert_eq!(result.score(), Some(1.0));
        assert_eq!(result.penalty(), Some(0.0));
        assert_eq!(result.answer_notes(), vec!["prt1-1-T"]);
        assert_eq!(result.rendered_feedback(), "Correct.");

        let result = evaluate(&two_nodes(), &[("ans1", "2*x")], &teacher);
        assert_eq!(result.path().iter().map(|e| e.branch).collect::<Vec<_>>(), vec![false, true]);
        assert_eq!(result.score(), Some(0.5));
        assert_eq!(result.penalty(), Some(0.35));
        assert_eq!(result.answer_notes(), vec!["prt1-1-F", "prt1-2-T"]);
        assert_eq!(result.signature(), "prt_prt1(ans1=2*x)");
    }

    #[test]
    fn quiet_nodes_score_without_feedback() {
        let prt = Prt::new("prt1", vec![
            PrtNode::new("1", "AlgEquiv", "ans1", "1")
                .quiet(true)
                .on_true(Branch::set("1", "prt1-1-T").feedback("Hidden.")),
        ], None).unwrap();
        let result = evaluate(&prt, &[("ans1", "1")], &[]);
        assert_eq!(result.score(), Some(1.0));
        assert!(result.feedback().is_empty());
        assert_eq!(result.answer_notes(), vec!["prt1-1-T"]);
    }

    #[test]
    fn feedback_variables_bound_in_order() {
        let prt = Prt::new("prt1", vec![
            PrtNode::new("1", "AlgEquiv", "sq", "4")
                .on_true(Branch::set("1", "prt1-1-T")),
        ], None).unwrap()
            .with_feedback_variables("d: ans1 + 1; sq: d^2;");
        let result = evaluate(&prt, &[("ans1", "1")], &[]);
        assert!(result.is_valid());
        assert_eq!(result.score(), Some(1.0));
        assert_eq!(result.trace()[..2], ["d: 1+1".to_string(), "sq: (1+1)^2".to_string()]);
    }

    #[test]
    fn feedback_variable_errors_kept_apart() {
        let prt = two_nodes().with_feedback_variables("a: 1 +;");
        let result = evaluate(&prt, &[("ans1", "x^2")], &[("ta", "x^2")]);
        assert!(!result.is_valid());
        assert!(result.path().is_empty());
        assert!(result.errors().is_empty());
        assert!(!result.fv_errors().is_empty());
        assert_eq!(result.fv_errors()[0].context, "prt1/fv");
    }

    #[test]
    fn node_errors_keep_partial_path() {
        // node 2 compares against a function that cannot be evaluated
        let result = evaluate(&two_nodes(), &[("ans1", "2*x")], &[("ta", "x^2"), ("diff_ta", "foo(x)")]);
        assert!(!result.is_valid());
        assert_eq!(result.score(), None);
        assert_eq!(result.penalty(), None);
        assert_eq!(result.fraction(), 0.0);
        assert_eq!(result.path().len(), 1);
        assert_eq!(result.errors()[0].context, "prt1/n2");
    }

    #[test]
    fn invalid_responses_fail_closed() {
        let result = evaluate(&two_nodes(), &[("ans1", "x^^2")], &[("ta", "x^2"), ("diff_ta", "2x")]);
        assert!(!result.is_valid());
        assert!(result.path().is_empty());
    }

    #[test]
    fn forbidden_words_in_node_expressions() {
        let prt = Prt::new("prt1", vec![
            PrtNode::new("1", "AlgEquiv", "system(ans1)", "1"),
        ], None).unwrap();
        let result = evaluate(&prt, &[("ans1", "1")], &[]);
        assert!(!result.is_valid());
        assert_eq!(result.errors()[0].context, "prt1/n1");
    }

    #[test]
    fn unknown_answer_test() {
        let prt = Prt::new("prt1", vec![PrtNode::new("1", "AlgEqiv", "ans1", "1")], None).unwrap();
        let result = evaluate(&prt, &[("ans1", "1")], &[]);
        assert_eq!(
            result.errors()[0].message,
            "unknown answer test `AlgEqiv`, did you mean `AlgEquiv`?",
        );
    }

    #[test]
    fn scores_must_be_finite() {
        for (score, penalty, bad) in [("inf", None, "inf"), ("1", Some("nan"), "nan"), ("1/0", None, "1/0")] {
            let branch = Branch { penalty: penalty.map(str::to_string), ..Branch::set(score, "prt1-1-T") };
            let prt = Prt::new("prt1", vec![
                PrtNode::new("1", "AlgEquiv", "ans1", "1").on_true(branch),
            ], None).unwrap();
            let result = evaluate(&prt, &[("ans1", "1")], &[]);
            assert!(!result.is_valid());
            assert_eq!(result.errors()[0].context, "prt1/n1");
            assert_eq!(result.errors()[0].message, format!("`{}` is not a finite number", bad));
        }
    }

    #[test]
    fn timeouts_are_node_errors() {
        let evaluator = evaluator().with_options(EvaluationOptions::default().timeout(std::time::Duration::ZERO));
        let result = evaluator.evaluate(
            &two_nodes(),
            &parse_responses([("ans1", "x^2")]),
            &parse_responses([("ta", "x^2")]),
            &StackOptions::default(),
        );
        assert!(!result.is_valid());
        assert!(result.errors()[0].message.contains("timed out"));
    }

    #[test]
    fn independent_trees_in_parallel() {
        let prts = vec![two_nodes(), two_nodes().with_value(2.0)];
        let results = evaluator().evaluate_all(
            &prts,
            &parse_responses([("ans1", "x^2")]),
            &parse_responses([("ta", "x^2"), ("diff_ta", "2x")]),
            &StackOptions::default(),
        );
        assert_eq!(results.iter().map(EvaluationResult::fraction).collect::<Vec<_>>(), vec![1.0, 2.0]);
    }
}
