//! Functions that can be evaluated numerically.

/// The implementation of a function, by the number of arguments it takes.
#[derive(Clone, Copy)]
pub enum Builtin {
    Unary(fn(f64) -> f64),
    Binary(fn(f64, f64) -> f64),

    /// Takes one argument or more.
    Variadic(fn(&[f64]) -> f64),
}

impl Builtin {
    /// Returns a description of how many arguments the function takes.
    pub fn arity(&self) -> &'static str {
        match self {
            Self::Unary(_) => "1",
            Self::Binary(_) => "2",
            Self::Variadic(_) => "1 or more",
        }
    }

    /// Calls the function, or returns [`None`] if the number of arguments is wrong.
    pub fn call(&self, args: &[f64]) -> Option<f64> {
        match (self, args) {
            (Self::Unary(f), [x]) => Some(f(*x)),
            (Self::Binary(f), [x, y]) => Some(f(*x, *y)),
            (Self::Variadic(f), args) if !args.is_empty() => Some(f(args)),
            _ => None,
        }
    }
}

/// Computes `n!`, or NaN if `n` is not a non-negative integer.
pub(crate) fn factorial(n: f64) -> f64 {
    if n < 0.0 || n.fract() != 0.0 {
        return f64::NAN;
    }
    if n > 170.0 {
        return f64::INFINITY;
    }
    (1..=n as u64).fold(1.0, |acc, k| acc * k as f64)
}

/// Logarithm in the given base. With one argument `lg` is the base-10 logarithm.
fn lg(args: &[f64]) -> f64 {
    match args {
        [x] => x.log10(),
        [x, base] => x.log(*base),
        _ => f64::NAN,
    }
}

/// Every function that can be evaluated, by name.
pub const BUILTINS: &[(&str, Builtin)] = &[
    ("sin", Builtin::Unary(f64::sin)),
    ("cos", Builtin::Unary(f64::cos)),
    ("tan", Builtin::Unary(f64::tan)),
    ("sec", Builtin::Unary(|x: f64| 1.0 / x.cos())),
    ("csc", Builtin::Unary(|x: f64| 1.0 / x.sin())),
    ("cot", Builtin::Unary(|x: f64| 1.0 / x.tan())),
    ("asin", Builtin::Unary(f64::asin)),
    ("acos", Builtin::Unary(f64::acos)),
    ("atan", Builtin::Unary(f64::atan)),
    ("arcsin", Builtin::Unary(f64::asin)),
    ("arccos", Builtin::Unary(f64::acos)),
    ("arctan", Builtin::Unary(f64::atan)),
    ("atan2", Builtin::Binary(f64::atan2)),
    ("sinh", Builtin::Unary(f64::sinh)),
    ("cosh", Builtin::Unary(f64::cosh)),
    ("tanh", Builtin::Unary(f64::tanh)),
    ("asinh", Builtin::Unary(f64::asinh)),
    ("acosh", Builtin::Unary(f64::acosh)),
    ("atanh", Builtin::Unary(f64::atanh)),
    ("exp", Builtin::Unary(f64::exp)),
    ("ln", Builtin::Unary(f64::ln)),
    ("log", Builtin::Unary(f64::ln)),
    ("lg", Builtin::Variadic(lg)),
    ("sqrt", Builtin::Unary(f64::sqrt)),
    ("abs", Builtin::Unary(f64::abs)),
    ("signum", Builtin::Unary(f64::signum)),
    ("floor", Builtin::Unary(f64::floor)),
    ("ceiling", Builtin::Unary(f64::ceil)),
    ("round", Builtin::Unary(f64::round)),
    ("truncate", Builtin::Unary(f64::trunc)),
    ("factorial", Builtin::Unary(factorial)),
    ("mod", Builtin::Binary(f64::rem_euclid)),
    ("min", Builtin::Variadic(|args: &[f64]| args.iter().copied().fold(f64::INFINITY, f64::min))),
    ("max", Builtin::Variadic(|args: &[f64]| args.iter().copied().fold(f64::NEG_INFINITY, f64::max))),
];

/// Returns the function with the given name.
pub fn builtin(name: &str) -> Option<Builtin> {
    BUILTINS.iter().find(|(n, _)| *n == name).map(|(_, f)| *f)
}

