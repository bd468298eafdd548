//! Algebraic equivalence, decided by comparing values at sampled points, and syntactic equality.

use crate::numerical::{ctxt::Ctxt, free_variables};
use rand::{rngs::StdRng, Rng, SeedableRng};
use stack_parser::{ast::NodeKind, parser::op::BinOpKind};
use std::collections::BTreeSet;
use super::{AnswerTest, Operand, TestCtxt, TestError, TestOutcome};

/// Returns true if two values are equal up to rounding.
fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}

/// The shape of an operand, which decides how two operands are compared.
enum Shape<'a> {
    Equation(Operand<'a>, Operand<'a>),
    List(Vec<Operand<'a>>),
    Text(&'a str),
    Expression(Operand<'a>),
}

fn shape(operand: Operand) -> Shape {
    match operand.kind() {
        NodeKind::Binary { op: BinOpKind::Eq, lhs, rhs, .. } => {
            Shape::Equation(operand.at(*lhs), operand.at(*rhs))
        },
        NodeKind::List { items } => Shape::List(items.iter().map(|&item| operand.at(item)).collect()),
        NodeKind::Str { value } => Shape::Text(value),
        _ => Shape::Expression(operand),
    }
}

/// Samples the difference `lhs - rhs` of an equation, or the value of an expression.
struct Sampler<'a> {
    lhs: Operand<'a>,
    rhs: Option<Operand<'a>>,
}

impl Sampler<'_> {
    fn sample(&self, ctxt: &Ctxt) -> Result<f64, TestError> {
        let lhs = self.lhs.eval(ctxt)?;
        match self.rhs {
            Some(rhs) => Ok(lhs - rhs.eval(ctxt)?),
            None => Ok(lhs),
        }
    }

    fn variables(&self) -> BTreeSet<String> {
        let mut vars = free_variables(self.lhs.ast, self.lhs.node);
        if let Some(rhs) = self.rhs {
            vars.extend(free_variables(rhs.ast, rhs.node));
        }
        vars
    }
}

/// Compares two samplers at the same random points.
///
/// Equations are unchanged by swapping their sides or multiplying both sides by a constant, so
/// their differences only need to agree up to one nonzero ratio, shared by every point.
fn agree_at_samples(
    sans: &Sampler,
    tans: &Sampler,
    up_to_scale: bool,
    ctxt: &TestCtxt,
) -> Result<bool, TestError> {
    let vars = sans.variables().into_iter().chain(tans.variables()).collect::<BTreeSet<_>>();
    let points = if vars.is_empty() { 1 } else { ctxt.evaluation.samples.max(1) };
    let range = if ctxt.options.assumepos { 0.1..3.0 } else { -3.0..3.0 };

    let mut rng = StdRng::seed_from_u64(ctxt.evaluation.seed);
    let (mut ratio, mut compared) = (None, 0);
    for _ in 0..points {
        ctxt.check_deadline()?;

        let mut values = Ctxt::new();
        for var in &vars {
            values.add_var(var, rng.gen_range(range.clone()));
        }

        let (s, t) = (sans.sample(&values)?, tans.sample(&values)?);
        if !s.is_finite() || !t.is_finite() {
            continue;
        }
        compared += 1;

        let agrees = if !up_to_scale {
            close(s, t)
        } else {
            match (close(s, 0.0), close(t, 0.0)) {
                (true, true) => true,
                (true, false) | (false, true) => false,
                (false, false) => {
                    let r = s / t;
                    close(*ratio.get_or_insert(r), r)
                },
            }
        };
        if !agrees {
            return Ok(false);
        }
    }

    if compared == 0 {
        let describe = |sampler: &Sampler| sampler.lhs.text();
        return Err(TestError::Incomparable(describe(sans), describe(tans)));
    }
    Ok(true)
}

/// Compares two operands, returning the note explaining a failure, if any.
fn equivalent(sans: Operand, tans: Operand, ctxt: &TestCtxt) -> Result<TestOutcome, TestError> {
    match (shape(sans), shape(tans)) {
        (Shape::Equation(sl, sr), Shape::Equation(tl, tr)) => {
            let s = Sampler { lhs: sl, rhs: Some(sr) };
            let t = Sampler { lhs: tl, rhs: Some(tr) };
            Ok(TestOutcome::from_bool(agree_at_samples(&s, &t, true, ctxt)?))
        },
        (Shape::Equation(..), _) => Ok(TestOutcome::fail().note("ATAlgEquiv_SA_is_equation")),
        (_, Shape::Equation(..)) => Ok(TestOutcome::fail().note("ATAlgEquiv_TA_is_equation")),
        (Shape::List(s), Shape::List(t)) => {
            if s.len() != t.len() {
                return Ok(TestOutcome::fail().note("ATList_wronglen"));
            }
            for (i, (s, t)) in s.into_iter().zip(t).enumerate() {
                let outcome = equivalent(s, t, ctxt)?;
                if !outcome.passed {
                    return Ok(TestOutcome::fail().note(format!("ATList_wrongentries {}", i + 1)));
                }
            }
            Ok(TestOutcome::pass())
        },
        (Shape::List(_), _) => Ok(TestOutcome::fail().note("ATAlgEquiv_SA_is_list")),
        (_, Shape::List(_)) => Ok(TestOutcome::fail().note("ATAlgEquiv_SA_not_list")),
        (Shape::Text(s), Shape::Text(t)) => Ok(TestOutcome::from_bool(s == t)),
        (Shape::Text(_), _) => Ok(TestOutcome::fail().note("ATAlgEquiv_SA_is_string")),
        (_, Shape::Text(_)) => Ok(TestOutcome::fail().note("ATAlgEquiv_SA_not_string")),
        (Shape::Expression(s), Shape::Expression(t)) => {
            let s = Sampler { lhs: s, rhs: None };
            let t = Sampler { lhs: t, rhs: None };
            Ok(TestOutcome::from_bool(agree_at_samples(&s, &t, false, ctxt)?))
        },
    }
}

/// `AlgEquiv`: the two expressions are algebraically equivalent.
///
/// Equivalence is decided numerically, by evaluating both expressions at the same randomly
/// sampled values of their variables. The sampling is seeded, so the same pair of expressions
/// always gets the same decision. Equations are equivalent if the differences of their sides are
/// proportional, and lists are equivalent if their entries are.
#[derive(Debug)]
pub struct AlgEquiv;

impl AnswerTest for AlgEquiv {
    fn name(&self) -> &'static str {
        "AlgEquiv"
    }

    fn run(
        &self,
        sans: Operand,
        tans: Operand,
        _: Option<Operand>,
        ctxt: &TestCtxt,
    ) -> Result<TestOutcome, TestError> {
        equivalent(sans, tans, ctxt)
    }
}

/// `CasEqual`: the two expressions are written identically, once normalised by the parser.
#[derive(Debug)]
pub struct CasEqual;

impl AnswerTest for CasEqual {
    fn name(&self) -> &'static str {
        "CasEqual"
    }

    fn run(
        &self,
        sans: Operand,
        tans: Operand,
        _: Option<Operand>,
        ctxt: &TestCtxt,
    ) -> Result<TestOutcome, TestError> {
        ctxt.check_deadline()?;
        Ok(TestOutcome::from_bool(sans.text() == tans.text()))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use crate::options::StackOptions;
    use super::super::test_util::{run, run_with};
    use super::*;

    fn alg_equiv(sans: &str, tans: &str) -> TestOutcome {
        run(&AlgEquiv, sans, tans, None).unwrap()
    }

    #[test]
    fn expressions() {
        assert!(alg_equiv("x^2", "x^2").passed);
        assert!(alg_equiv("(x+1)^2", "x^2 + 2x + 1").passed);
        assert!(alg_equiv("sin(x)^2 + cos(x)^2", "1").passed);
        assert!(!alg_equiv("x^3", "x^2").passed);
        assert!(!alg_equiv("x + y", "x + 2y").passed);
    }

    #[test]
    fn equations_up_to_scale() {
        assert!(alg_equiv("y = 2x + 1", "2x + 1 = y").passed);
        assert!(alg_equiv("2y = 4x + 2", "y = 2x + 1").passed);
        assert!(alg_equiv("-3y = -6x - 3", "2x + 1 = y").passed);
        assert!(!alg_equiv("2y = 4x + 1", "y = 2x + 1").passed);
        assert!(alg_equiv("y - 1 = 2x", "y = 2x + 1").passed);
        assert!(!alg_equiv("y = 2x", "y = 2x + 1").passed);

        let outcome = alg_equiv("y = x", "x");
        assert_eq!(outcome.note.as_deref(), Some("ATAlgEquiv_SA_is_equation"));
    }

    #[test]
    fn bare_e_and_pi_are_variables() {
        assert!(!alg_equiv("e*x", "x*2.718281828459045").passed);
        assert!(!alg_equiv("pi + x", "x + 3.141592653589793").passed);
        assert!(alg_equiv("e*x", "x*e").passed);
        assert!(alg_equiv("%e*x", "x*2.718281828459045").passed);
    }

    #[test]
    fn lists() {
        assert!(alg_equiv("[x + x, 1]", "[2x, 1]").passed);
        assert_eq!(alg_equiv("[1, 2]", "[1, 2, 3]").note.as_deref(), Some("ATList_wronglen"));
        assert_eq!(alg_equiv("[1, 3]", "[1, 2]").note.as_deref(), Some("ATList_wrongentries 2"));
    }

    #[test]
    fn positive_sampling() {
        let options = StackOptions { assumepos: true, ..Default::default() };
        let outcome = run_with(&AlgEquiv, "sqrt(x^2)", "x", None, &options).unwrap();
        assert!(outcome.passed);
        assert!(!alg_equiv("sqrt(x^2)", "x").passed);
    }

    #[test]
    fn unevaluable() {
        let err = run(&AlgEquiv, "foo(x)", "x", None).unwrap_err();
        assert!(matches!(err, TestError::Evaluation { .. }));
        assert_eq!(err.to_string(), "could not evaluate `foo(x)`: cannot evaluate the function `foo`");

        let err = run(&AlgEquiv, "1/0", "2/0", None).unwrap_err();
        assert!(matches!(err, TestError::Incomparable(..)));
    }

    #[test]
    fn cas_equal() {
        assert!(run(&CasEqual, "x^2+1", "x^2 + 1", None).unwrap().passed);
        assert!(!run(&CasEqual, "1+x^2", "x^2+1", None).unwrap().passed);
    }
}
