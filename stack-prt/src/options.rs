//! Question options, and the options that control a single evaluation.

use levenshtein::levenshtein;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// An option could not be set.
#[derive(Debug, Error)]
pub enum OptionsError {
    /// No option has the given name.
    #[error("unknown option `{name}`{}", did_you_mean(.suggestion))]
    UnknownOption {
        name: String,
        suggestion: Option<String>,
    },

    /// The value is not one the option accepts.
    #[error("invalid value `{value}` for option `{name}`")]
    InvalidValue { name: String, value: String },

    /// The options could not be read.
    #[error("invalid options: {0}")]
    Invalid(#[from] serde_json::Error),
}

fn did_you_mean(suggestion: &Option<String>) -> String {
    suggestion
        .as_ref()
        .map(|s| format!(", did you mean `{}`?", s))
        .unwrap_or_default()
}

/// How mathematics is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MathsDisplay {
    #[serde(rename = "LaTeX")]
    Latex,
    String,
}

/// The sign printed for multiplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MultiplicationSign {
    Dot,
    Cross,
    Onum,
    None,
}

/// How the imaginary unit is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplexNo {
    I,
    J,
    SymI,
    SymJ,
}

/// How inverse trigonometric functions are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InverseTrig {
    #[serde(rename = "cos-1")]
    CosMinusOne,
    #[serde(rename = "acos")]
    Acos,
    #[serde(rename = "arccos")]
    Arccos,
    #[serde(rename = "arccos-arcosh")]
    ArccosArcosh,
}

/// How logical operators are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicSymbol {
    Lang,
    Symbol,
}

/// The brackets printed around matrices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatrixParens {
    #[serde(rename = "[")]
    Square,
    #[serde(rename = "(")]
    Round,
    #[serde(rename = "")]
    None,
    #[serde(rename = "{")]
    Curly,
    #[serde(rename = "|")]
    Bar,
}

/// The options of a question, passed on to the CAS with every evaluation.
///
/// The default values are the following:
/// - [`display`](StackOptions::display): `LaTeX`
/// - [`multiplicationsign`](StackOptions::multiplicationsign): `dot`
/// - [`complexno`](StackOptions::complexno): `i`
/// - [`inversetrig`](StackOptions::inversetrig): `cos-1`
/// - [`logicsymbol`](StackOptions::logicsymbol): `lang`
/// - [`sqrtsign`](StackOptions::sqrtsign): `true`
/// - [`simplify`](StackOptions::simplify): `true`
/// - [`assumepos`](StackOptions::assumepos): `false`
/// - [`assumereal`](StackOptions::assumereal): `false`
/// - [`matrixparens`](StackOptions::matrixparens): `[`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StackOptions {
    pub display: MathsDisplay,
    pub multiplicationsign: MultiplicationSign,
    pub complexno: ComplexNo,
    pub inversetrig: InverseTrig,
    pub logicsymbol: LogicSymbol,
    pub sqrtsign: bool,
    pub simplify: bool,

    /// Variables are assumed to be positive. Answer tests that sample values only pick positive
    /// ones.
    pub assumepos: bool,
    pub assumereal: bool,
    pub matrixparens: MatrixParens,
}

impl Default for StackOptions {
    fn default() -> Self {
        Self {
            display: MathsDisplay::Latex,
            multiplicationsign: MultiplicationSign::Dot,
            complexno: ComplexNo::I,
            inversetrig: InverseTrig::CosMinusOne,
            logicsymbol: LogicSymbol::Lang,
            sqrtsign: true,
            simplify: true,
            assumepos: false,
            assumereal: false,
            matrixparens: MatrixParens::Square,
        }
    }
}

impl StackOptions {
    /// The names of every option.
    pub const NAMES: &'static [&'static str] = &[
        "display", "multiplicationsign", "complexno", "inversetrig", "logicsymbol",
        "sqrtsign", "simplify", "assumepos", "assumereal", "matrixparens",
    ];

    /// Reads options from JSON. Options that are not given keep their default value.
    pub fn from_json(json: &str) -> Result<Self, OptionsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Sets a single option from its textual value, as it would be written by an author.
    ///
    /// ```
    /// use stack_prt::options::{MultiplicationSign, StackOptions};
    ///
    /// let mut options = StackOptions::default();
    /// options.set("multiplicationsign", "cross").unwrap();
    /// options.set("assumepos", "1").unwrap();
    /// assert_eq!(options.multiplicationsign, MultiplicationSign::Cross);
    /// assert!(options.assumepos);
    ///
    /// assert!(options.set("multiplicationsgn", "dot").is_err());
    /// ```
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), OptionsError> {
        if !Self::NAMES.contains(&name) {
            let suggestion = Self::NAMES
                .iter()
                .find(|n| levenshtein(n, name) < 3)
                .map(|n| n.to_string());
            return Err(OptionsError::UnknownOption { name: name.to_string(), suggestion });
        }

        let invalid = || OptionsError::InvalidValue {
            name: name.to_string(),
            value: value.to_string(),
        };

        let mut current = serde_json::to_value(*self)?;
        let parsed = match current.get(name) {
            Some(Value::Bool(_)) => match value.trim().to_lowercase().as_str() {
                "true" | "1" => Value::Bool(true),
                "false" | "0" => Value::Bool(false),
                _ => return Err(invalid()),
            },
            _ => Value::String(value.trim().to_string()),
        };

        if let Some(map) = current.as_object_mut() {
            map.insert(name.to_string(), parsed);
        }
        *self = serde_json::from_value(current).map_err(|_| invalid())?;
        Ok(())
    }
}

/// Controls a single evaluation of a potential response tree.
///
/// The default values are the following:
/// - [`timeout`](EvaluationOptions::timeout): 10 seconds
/// - [`default_penalty`](EvaluationOptions::default_penalty): `0.1`
/// - [`samples`](EvaluationOptions::samples): `12`
/// - [`seed`](EvaluationOptions::seed): `0x57ac`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationOptions {
    /// How long the answer tests of one evaluation may take in total. A test still running when
    /// the time is up fails with an error on its node.
    pub timeout: Duration,

    /// The penalty applied by branches that do not give one.
    pub default_penalty: f64,

    /// How many points answer tests sample when comparing expressions numerically.
    pub samples: usize,

    /// The seed of the sampling. The same seed always picks the same points.
    pub seed: u64,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            default_penalty: 0.1,
            samples: 12,
            seed: 0x57ac,
        }
    }
}

impl EvaluationOptions {
    /// Sets the timeout. Returns an updated [`EvaluationOptions`] for chaining.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the default penalty. Returns an updated [`EvaluationOptions`] for chaining.
    pub fn default_penalty(mut self, penalty: f64) -> Self {
        self.default_penalty = penalty;
        self
    }

    /// Sets the number of sample points. Returns an updated [`EvaluationOptions`] for chaining.
    pub fn samples(mut self, samples: usize) -> Self {
        self.samples = samples;
        self
    }

    /// Sets the sampling seed. Returns an updated [`EvaluationOptions`] for chaining.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}
