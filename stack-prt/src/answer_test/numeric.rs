//! Answer tests that compare the values of the two expressions.

use crate::numerical::ctxt::Ctxt;
use stack_parser::{ast::NodeKind, parser::op::PrefixOpKind};
use super::{AnswerTest, Operand, TestCtxt, TestError, TestOutcome};

/// The tolerance used by [`NumRelative`] and [`NumAbsolute`] when no options are given.
pub const DEFAULT_TOLERANCE: f64 = 0.05;

/// Evaluates both sides. Neither side may have free variables.
fn values(sans: Operand, tans: Operand, ctxt: &TestCtxt) -> Result<(f64, f64), TestError> {
    ctxt.check_deadline()?;
    let empty = Ctxt::new();
    Ok((sans.eval(&empty)?, tans.eval(&empty)?))
}

/// Reads the tolerance from the options, or uses the default.
fn tolerance(test: &'static str, options: Option<Operand>) -> Result<f64, TestError> {
    let Some(options) = options else {
        return Ok(DEFAULT_TOLERANCE);
    };
    match options.eval(&Ctxt::new()) {
        Ok(tol) if tol.is_finite() && tol >= 0.0 => Ok(tol),
        Ok(tol) => Err(TestError::InvalidOptions {
            test,
            reason: format!("the tolerance must be a non-negative number, but is {}", tol),
        }),
        Err(err) => Err(TestError::InvalidOptions { test, reason: err.to_string() }),
    }
}

/// `NumRelative`: the values differ by at most a fraction of the teacher's value. The fraction is
/// given by the options, and is 0.05 by default.
#[derive(Debug)]
pub struct NumRelative;

impl AnswerTest for NumRelative {
    fn name(&self) -> &'static str {
        "NumRelative"
    }

    fn run(
        &self,
        sans: Operand,
        tans: Operand,
        options: Option<Operand>,
        ctxt: &TestCtxt,
    ) -> Result<TestOutcome, TestError> {
        let tol = tolerance(self.name(), options)?;
        let (s, t) = values(sans, tans, ctxt)?;
        Ok(TestOutcome::from_bool((s - t).abs() <= tol * t.abs()))
    }
}

/// `NumAbsolute`: the values differ by at most the tolerance given by the options, 0.05 by
/// default.
#[derive(Debug)]
pub struct NumAbsolute;

impl AnswerTest for NumAbsolute {
    fn name(&self) -> &'static str {
        "NumAbsolute"
    }

    fn run(
        &self,
        sans: Operand,
        tans: Operand,
        options: Option<Operand>,
        ctxt: &TestCtxt,
    ) -> Result<TestOutcome, TestError> {
        let tol = tolerance(self.name(), options)?;
        let (s, t) = values(sans, tans, ctxt)?;
        Ok(TestOutcome::from_bool((s - t).abs() <= tol))
    }
}

/// `NumDecPlaces`: the student wrote a number with exactly the number of decimal places given by
/// the options, and it agrees with the teacher's value rounded to that many places.
#[derive(Debug)]
pub struct NumDecPlaces;

impl NumDecPlaces {
    /// Returns the digits written after the decimal point, if the operand is a plain number.
    fn written_places(operand: Operand) -> Option<usize> {
        let raw = match operand.kind() {
            NodeKind::Number { raw } => raw,
            NodeKind::Prefix { op: PrefixOpKind::Neg | PrefixOpKind::Pos, operand: inner } => {
                match operand.ast.kind(*inner) {
                    NodeKind::Number { raw } => raw,
                    _ => return None,
                }
            },
            _ => return None,
        };
        let mantissa = raw.split(['e', 'E']).next().unwrap_or(raw.as_str());
        Some(mantissa.split_once('.').map_or(0, |(_, decimals)| decimals.len()))
    }

    fn places(options: Option<Operand>) -> Result<usize, TestError> {
        let options = options.ok_or(TestError::MissingOptions("NumDecPlaces"))?;
        let invalid = |reason: String| TestError::InvalidOptions { test: "NumDecPlaces", reason };
        let places = options.eval(&Ctxt::new()).map_err(|err| invalid(err.to_string()))?;
        if places.fract() != 0.0 || places < 1.0 {
            return Err(invalid(format!("the number of places must be a positive integer, but is {}", places)));
        }
        Ok(places as usize)
    }
}

impl AnswerTest for NumDecPlaces {
    fn name(&self) -> &'static str {
        "NumDecPlaces"
    }

    fn requires_options(&self) -> bool {
        true
    }

    fn run(
        &self,
        sans: Operand,
        tans: Operand,
        options: Option<Operand>,
        ctxt: &TestCtxt,
    ) -> Result<TestOutcome, TestError> {
        let places = Self::places(options)?;
        let Some(written) = Self::written_places(sans) else {
            return Ok(TestOutcome::fail().note("ATNumDecPlaces_SA_Not_num"));
        };

        let (s, t) = values(sans, tans, ctxt)?;
        let scale = 10f64.powi(places as i32);
        let equiv = (s * scale).round() == (t * scale).round();

        let note = format!(
            "{}. {}.",
            if written == places { "ATNumDecPlaces_Correct" } else { "ATNumDecPlaces_Wrong_DPs" },
            if equiv { "ATNumDecPlaces_Equiv" } else { "ATNumDecPlaces_Not_equiv" },
        );
        Ok(TestOutcome::from_bool(written == places && equiv).note(note))
    }
}

/// `GT`: the student's value is greater than the teacher's.
#[derive(Debug)]
pub struct Gt;

impl AnswerTest for Gt {
    fn name(&self) -> &'static str {
        "GT"
    }

    fn run(
        &self,
        sans: Operand,
        tans: Operand,
        _: Option<Operand>,
        ctxt: &TestCtxt,
    ) -> Result<TestOutcome, TestError> {
        let (s, t) = values(sans, tans, ctxt)?;
        Ok(TestOutcome::from_bool(s > t))
    }
}

/// `GTE`: the student's value is greater than or equal to the teacher's.
#[derive(Debug)]
pub struct Gte;

impl AnswerTest for Gte {
    fn name(&self) -> &'static str {
        "GTE"
    }

    fn run(
        &self,
        sans: Operand,
        tans: Operand,
        _: Option<Operand>,
        ctxt: &TestCtxt,
    ) -> Result<TestOutcome, TestError> {
        let (s, t) = values(sans, tans, ctxt)?;
        Ok(TestOutcome::from_bool(s >= t))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use super::super::test_util::run;
    use super::*;

    #[test]
    fn relative_and_absolute() {
        assert!(run(&NumRelative, "3.14", "%pi", None).unwrap().passed);
        assert!(!run(&NumRelative, "3.14", "%pi", Some("0.0001")).unwrap().passed);
        assert!(run(&NumAbsolute, "0.01", "0", None).unwrap().passed);
        assert!(!run(&NumAbsolute, "0.1", "0", None).unwrap().passed);

        let err = run(&NumAbsolute, "1", "1", Some("-1")).unwrap_err();
        assert!(matches!(err, TestError::InvalidOptions { test: "NumAbsolute", .. }));
    }

    #[test]
    fn decimal_places() {
        let outcome = run(&NumDecPlaces, "3.14", "%pi", Some("2")).unwrap();
        assert!(outcome.passed);
        assert_eq!(outcome.note.as_deref(), Some("ATNumDecPlaces_Correct. ATNumDecPlaces_Equiv."));

        let outcome = run(&NumDecPlaces, "3.1", "%pi", Some("2")).unwrap();
        assert!(!outcome.passed);
        assert_eq!(outcome.note.as_deref(), Some("ATNumDecPlaces_Wrong_DPs. ATNumDecPlaces_Not_equiv."));

        let outcome = run(&NumDecPlaces, "-3.15", "-3.14159", Some("2")).unwrap();
        assert_eq!(outcome.note.as_deref(), Some("ATNumDecPlaces_Correct. ATNumDecPlaces_Not_equiv."));

        let outcome = run(&NumDecPlaces, "x", "%pi", Some("2")).unwrap();
        assert_eq!(outcome.note.as_deref(), Some("ATNumDecPlaces_SA_Not_num"));
    }

    #[test]
    fn decimal_places_options() {
        assert!(matches!(
            run(&NumDecPlaces, "3.14", "%pi", None),
            Err(TestError::MissingOptions("NumDecPlaces")),
        ));
        assert!(matches!(
            run(&NumDecPlaces, "3.14", "%pi", Some("1.5")),
            Err(TestError::InvalidOptions { .. }),
        ));
    }

    #[test]
    fn comparisons() {
        assert!(run(&Gt, "2", "1", None).unwrap().passed);
        assert!(!run(&Gt, "1", "1", None).unwrap().passed);
        assert!(run(&Gte, "1", "1", None).unwrap().passed);
        assert!(!run(&Gte, "sqrt(2)", "1.5", None).unwrap().passed);
    }
}
