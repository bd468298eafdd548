use std::collections::HashMap;

/// Values of the named constants of the CAS.
const CONSTANTS: &[(&str, f64)] = &[
    ("%pi", std::f64::consts::PI),
    ("%e", std::f64::consts::E),
    ("%phi", 1.618_033_988_749_895),
    ("inf", f64::INFINITY),
];

/// A context to use when evaluating an expression, holding the value of each variable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ctxt {
    vars: HashMap<String, f64>,
}

impl Ctxt {
    /// Creates a context with no variables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the name is a constant, which is never sampled as a variable.
    pub fn is_constant(name: &str) -> bool {
        CONSTANTS.iter().any(|(n, _)| *n == name)
    }

    /// Sets the value of a variable.
    pub fn add_var(&mut self, name: &str, value: f64) {
        self.vars.insert(name.to_string(), value);
    }

    /// Returns the value of a variable, or of a constant if no variable has the name.
    pub fn get_var(&self, name: &str) -> Option<f64> {
        self.vars.get(name).copied().or_else(|| {
            CONSTANTS.iter().find(|(n, _)| *n == name).map(|(_, value)| *value)
        })
    }
}
