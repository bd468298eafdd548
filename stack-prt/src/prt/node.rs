use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// How a branch combines its score with the running score of the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ScoreMode {
    /// `=`: replace the running value.
    Set,

    /// `+`: add to the running value.
    Add,

    /// `-`: subtract from the running value.
    Subtract,
}

impl ScoreMode {
    /// Applies the mode to a running value.
    ///
    /// ```
    /// use stack_prt::prt::ScoreMode;
    ///
    /// assert_eq!(ScoreMode::Set.apply(0.5, 1.0), 1.0);
    /// assert_eq!(ScoreMode::Add.apply(0.5, 0.25), 0.75);
    /// assert_eq!(ScoreMode::Subtract.apply(0.5, 0.25), 0.25);
    /// ```
    pub fn apply(self, running: f64, value: f64) -> f64 {
        match self {
            Self::Set => value,
            Self::Add => running + value,
            Self::Subtract => running - value,
        }
    }
}

impl TryFrom<String> for ScoreMode {
    type Error = String;

    fn try_from(mode: String) -> Result<Self, Self::Error> {
        match mode.trim() {
            "=" => Ok(Self::Set),
            "+" => Ok(Self::Add),
            "-" => Ok(Self::Subtract),
            other => Err(format!("unrecognised score mode `{}`, expected `=`, `+`, or `-`", other)),
        }
    }
}

impl From<ScoreMode> for String {
    fn from(mode: ScoreMode) -> Self {
        mode.to_string()
    }
}

impl Display for ScoreMode {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Set => write!(f, "="),
            Self::Add => write!(f, "+"),
            Self::Subtract => write!(f, "-"),
        }
    }
}

/// One of the two outcomes of a node.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    /// How the score and penalty combine with the running values.
    pub mode: ScoreMode,

    /// The score, as CAS source. Usually a plain number.
    pub score: String,

    /// The penalty, as CAS source. Branches without one use the default penalty of the
    /// evaluation.
    pub penalty: Option<String>,

    /// The node to visit next, or [`None`] to stop.
    pub next: Option<String>,

    /// The answer note recorded when the branch is taken.
    pub answer_note: String,

    /// The feedback shown to the student when the branch is taken.
    pub feedback: String,

    /// The format of the feedback text.
    pub feedback_format: u8,
}

impl Default for Branch {
    fn default() -> Self {
        Self {
            mode: ScoreMode::Add,
            score: "0".to_string(),
            penalty: None,
            next: None,
            answer_note: String::new(),
            feedback: String::new(),
            feedback_format: 1,
        }
    }
}

impl Branch {
    /// Creates a branch that sets the score and stops.
    pub fn set(score: impl Into<String>, answer_note: impl Into<String>) -> Self {
        Self {
            mode: ScoreMode::Set,
            score: score.into(),
            answer_note: answer_note.into(),
            ..Default::default()
        }
    }

    /// Sets the next node. Returns the updated branch for chaining.
    pub fn next(mut self, next: impl Into<String>) -> Self {
        self.next = Some(next.into());
        self
    }

    /// Sets the penalty. Returns the updated branch for chaining.
    pub fn penalty(mut self, penalty: impl Into<String>) -> Self {
        self.penalty = Some(penalty.into());
        self
    }

    /// Sets the feedback. Returns the updated branch for chaining.
    pub fn feedback(mut self, feedback: impl Into<String>) -> Self {
        self.feedback = feedback.into();
        self
    }
}

/// A node of a potential response tree: an answer test, and what to do with its result.
#[derive(Debug, Clone, PartialEq)]
pub struct PrtNode {
    /// The name of the node, unique within its tree.
    pub name: String,

    /// The name of the answer test to run.
    pub answer_test: String,

    /// The student's side of the comparison, as CAS source.
    pub sans: String,

    /// The teacher's side of the comparison, as CAS source.
    pub tans: String,

    /// Options passed to the answer test, as CAS source. Empty if there are none.
    pub test_options: String,

    /// Quiet nodes still score, but never show their feedback.
    pub quiet: bool,

    /// The branch taken when the test passes.
    pub true_branch: Branch,

    /// The branch taken when the test fails.
    pub false_branch: Branch,
}

impl PrtNode {
    /// Creates a node with the given test, and branches that score nothing and stop.
    pub fn new(
        name: impl Into<String>,
        answer_test: impl Into<String>,
        sans: impl Into<String>,
        tans: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            answer_test: answer_test.into(),
            sans: sans.into(),
            tans: tans.into(),
            test_options: String::new(),
            quiet: false,
            true_branch: Branch::default(),
            false_branch: Branch::default(),
        }
    }

    /// Sets the test options. Returns the updated node for chaining.
    pub fn options(mut self, options: impl Into<String>) -> Self {
        self.test_options = options.into();
        self
    }

    /// Sets whether the node is quiet. Returns the updated node for chaining.
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Sets the branch taken when the test passes. Returns the updated node for chaining.
    pub fn on_true(mut self, branch: Branch) -> Self {
        self.true_branch = branch;
        self
    }

    /// Sets the branch taken when the test fails. Returns the updated node for chaining.
    pub fn on_false(mut self, branch: Branch) -> Self {
        self.false_branch = branch;
        self
    }

    /// Returns the branch selected by the result of the test.
    pub fn branch(&self, passed: bool) -> &Branch {
        if passed {
            &self.true_branch
        } else {
            &self.false_branch
        }
    }

    /// Returns the names of the nodes the branches lead to, true branch first.
    pub fn successors(&self) -> impl Iterator<Item = &str> {
        [&self.true_branch, &self.false_branch]
            .into_iter()
            .filter_map(|branch| branch.next.as_deref())
    }
}
