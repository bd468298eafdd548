//! Which identifiers an expression may use.

use serde::Deserialize;
use stack_parser::util::csv_to_vec;
use std::collections::HashSet;

/// Functions of the CAS that students and authors may call without further configuration.
pub const KNOWN_FUNCTIONS: &[&str] = &[
    "sin", "cos", "tan", "sec", "csc", "cot",
    "asin", "acos", "atan", "atan2", "asec", "acsc", "acot",
    "arcsin", "arccos", "arctan",
    "sinh", "cosh", "tanh", "sech", "csch", "coth",
    "asinh", "acosh", "atanh",
    "exp", "log", "ln", "lg", "sqrt", "abs", "signum",
    "floor", "ceiling", "round", "truncate", "mod", "gcd", "lcm",
    "min", "max", "sum", "product", "binomial", "factorial",
    "diff", "integrate", "limit", "taylor",
    "expand", "factor", "simplify", "ratsimp", "fullratsimp", "subst", "solve",
    "matrix", "transpose", "determinant", "invert",
    "length", "first", "last", "rest", "append", "makelist", "map", "apply",
    "conjugate", "realpart", "imagpart", "float", "num", "denom",
    "ntuple", "set", "union", "intersection", "setdifference",
];

/// Functions that are rejected by the security filter in every context, because they reach
/// outside the CAS session.
pub const ALWAYS_FORBIDDEN: &[&str] = &[
    "system", "eval_string", "parse_string", "batch", "batchload", "load", "loadfile",
    "kill", "remfunction", "remvalue", "writefile", "save", "stringout",
    "opena", "openw", "openr", "opena_binary", "openw_binary", "openr_binary",
    "with_stdout", "compile_file", "translate_file", "file_search", "setup_autoload",
    "to_lisp", "run_testsuite", "appendfile", "closefile", "printfile",
];

/// The outcome of checking an identifier against a [`SecurityPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordStatus {
    /// The identifier may be used.
    Allowed,

    /// The identifier is on the forbidden list.
    Forbidden,

    /// An allow list is in force and the identifier is not on it.
    NotAllowed,
}

/// The allowed and forbidden words of one input or question.
///
/// Words are trimmed and case-folded once, when they are set. The policy is only read while
/// filtering, so a single policy can be shared by any number of concurrent pipeline runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "PolicyConfig")]
pub struct SecurityPolicy {
    allowed: HashSet<String>,
    forbidden: HashSet<String>,
}

/// The serialized form of a [`SecurityPolicy`], as comma-separated authoring strings.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PolicyConfig {
    allowed_words: String,
    forbidden_words: String,
}

impl From<PolicyConfig> for SecurityPolicy {
    fn from(config: PolicyConfig) -> Self {
        Self::from_csv(&config.allowed_words, &config.forbidden_words)
    }
}

fn fold<I, S>(words: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    words
        .into_iter()
        .map(|word| word.as_ref().trim().to_lowercase())
        .filter(|word| !word.is_empty())
        .collect()
}

impl SecurityPolicy {
    /// Creates a policy with no allowed or forbidden words.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a policy from comma-separated authoring strings.
    ///
    /// ```
    /// use stack_filter::security::{SecurityPolicy, WordStatus};
    ///
    /// let policy = SecurityPolicy::from_csv("", " Expand , factor");
    /// assert_eq!(policy.check("EXPAND"), WordStatus::Forbidden);
    /// assert_eq!(policy.check("x"), WordStatus::Allowed);
    /// ```
    pub fn from_csv(allowed: &str, forbidden: &str) -> Self {
        let mut policy = Self::new();
        policy.set_allowed_words(csv_to_vec(allowed));
        policy.set_forbidden_words(csv_to_vec(forbidden));
        policy
    }

    /// Replaces the allowed words.
    pub fn set_allowed_words<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allowed = fold(words);
    }

    /// Replaces the forbidden words.
    pub fn set_forbidden_words<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.forbidden = fold(words);
    }

    /// Returns the allowed words.
    pub fn allowed_words(&self) -> &HashSet<String> {
        &self.allowed
    }

    /// Returns the forbidden words.
    pub fn forbidden_words(&self) -> &HashSet<String> {
        &self.forbidden
    }

    /// Checks an identifier against the policy. A forbidden word is always illegal. When the
    /// allow list is not empty, only the words on it are legal.
    pub fn check(&self, word: &str) -> WordStatus {
        let word = word.to_lowercase();
        if self.forbidden.contains(&word) {
            WordStatus::Forbidden
        } else if !self.allowed.is_empty() && !self.allowed.contains(&word) {
            WordStatus::NotAllowed
        } else {
            WordStatus::Allowed
        }
    }

    /// Returns true if the name is a function the CAS knows, or one the author explicitly
    /// allowed.
    pub fn is_known_function(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        KNOWN_FUNCTIONS.contains(&name.as_str()) || self.allowed.contains(&name)
    }

    /// Returns true if the function may never be called.
    pub fn is_always_forbidden(&self, name: &str) -> bool {
        ALWAYS_FORBIDDEN.contains(&name.to_lowercase().as_str())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use super::*;

    #[test]
    fn allow_list_restricts() {
        let policy = SecurityPolicy::from_csv("x, y", "");
        assert_eq!(policy.check("X"), WordStatus::Allowed);
        assert_eq!(policy.check("z"), WordStatus::NotAllowed);
    }

    #[test]
    fn forbidden_wins_over_allowed() {
        let policy = SecurityPolicy::from_csv("a", "a");
        assert_eq!(policy.check("a"), WordStatus::Forbidden);
    }

    #[test]
    fn known_functions() {
        let policy = SecurityPolicy::from_csv("myfun", "");
        assert!(policy.is_known_function("Sin"));
        assert!(policy.is_known_function("myfun"));
        assert!(!policy.is_known_function("xy"));
        assert!(policy.is_always_forbidden("SYSTEM"));
    }

    #[test]
    fn deserialize() {
        let policy: SecurityPolicy = serde_json::from_str(r#"{"forbidden_words": "diff, int"}"#).unwrap();
        assert_eq!(policy.check("int"), WordStatus::Forbidden);
        assert!(policy.allowed_words().is_empty());
    }
}
