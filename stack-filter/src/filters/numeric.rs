//! Parametric filters that check how a numeric answer was written.
//!
//! Both filters look at the leftmost numeric literal of the input only. A bound that is absent or
//! below 1 means there is no limit in that direction.

use crate::{filter::{AstFilter, FilterContext}, report::FilterReport};
use serde::Deserialize;
use stack_parser::ast::{Ast, NodeId, NodeKind};

/// Returns the bound if it limits anything.
fn bound(value: Option<i64>) -> Option<usize> {
    value.filter(|&v| v > 0).and_then(|v| usize::try_from(v).ok())
}

/// Splits a literal into the digits before and after the decimal point, ignoring its sign and
/// exponent.
fn mantissa(raw: &str) -> (String, Option<String>) {
    let raw = raw.to_lowercase();
    let raw = raw.trim_start_matches(['-', '+']);
    let mantissa = raw.split('e').next().unwrap_or_default();
    match mantissa.split_once('.') {
        Some((int, frac)) => (int.to_string(), Some(frac.to_string())),
        None => (mantissa.to_string(), None),
    }
}

/// Counts the digits after the decimal point of a numeric literal.
///
/// ```
/// use stack_filter::filters::numeric::decimal_places;
///
/// assert_eq!(decimal_places("-1.250e3"), 3);
/// assert_eq!(decimal_places("5"), 0);
/// ```
pub fn decimal_places(raw: &str) -> usize {
    mantissa(raw).1.map_or(0, |frac| frac.len())
}

/// Counts the significant figures of a numeric literal, returning the smallest and largest
/// possible count. They only differ for integers with trailing zeros, such as `1200`, which may
/// have anywhere from 2 to 4 significant figures.
///
/// ```
/// use stack_filter::filters::numeric::significant_figures;
///
/// assert_eq!(significant_figures("0.00250"), (3, 3));
/// assert_eq!(significant_figures("1200"), (2, 4));
/// ```
pub fn significant_figures(raw: &str) -> (usize, usize) {
    let (int, frac) = mantissa(raw);
    let digits = format!("{}{}", int, frac.as_deref().unwrap_or_default());
    let significant = digits.trim_start_matches('0');

    if significant.is_empty() {
        // the literal is zero: only the written decimal places count
        let count = frac.map_or(1, |frac| frac.len().max(1));
        return (count, count);
    }

    if frac.is_some() {
        (significant.len(), significant.len())
    } else {
        (significant.trim_end_matches('0').len(), significant.len())
    }
}

/// Finds the node to check: the leftmost numeric literal, or, failing that, the whole expression.
fn target(ast: &Ast) -> Result<(NodeId, String), NodeId> {
    let root = ast.first_expr().unwrap_or_else(|| ast.root());
    match ast.leftmost_number(ast.root()) {
        Some(id) => match ast.kind(id) {
            NodeKind::Number { raw } => Ok((id, raw.clone())),
            _ => Err(root),
        },
        None => Err(root),
    }
}

/// Marks the node invalid and reports the bound it broke.
fn reject(
    ast: &mut Ast,
    report: &mut FilterReport,
    ctx: &FilterContext,
    id: NodeId,
    key: &str,
    limit: usize,
) {
    ast.mark_invalid(id);
    let message = ctx.translate(key, &[("a", &limit.to_string())]);
    report.add_violation(vec![ast.span(id)], key, message);
}

/// `202_decimal_places_validation`: the number of decimal places must lie within bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DecimalPlacesValidation {
    /// The least number of decimal places.
    pub min: Option<i64>,

    /// The greatest number of decimal places.
    pub max: Option<i64>,
}

impl AstFilter for DecimalPlacesValidation {
    fn filter(&self, ast: &mut Ast, report: &mut FilterReport, ctx: &FilterContext) {
        let (min, max) = (bound(self.min), bound(self.max));
        let (id, raw) = match target(ast) {
            Ok(found) => found,
            Err(root) => {
                match (min, max) {
                    (Some(min), _) => reject(ast, report, ctx, root, "numericalinputmindp", min),
                    (None, max) => {
                        ast.mark_invalid(root);
                        let limit = max.map(|m| m.to_string()).unwrap_or_default();
                        let message = ctx.translate("numericalinputmaxdp", &[("a", &limit)]);
                        report.add_violation(vec![ast.span(root)], "numericalinputmaxdp", message);
                    },
                }
                return;
            },
        };

        let places = decimal_places(&raw);
        if let Some(min) = min.filter(|&min| places < min) {
            reject(ast, report, ctx, id, "numericalinputmindp", min);
        }
        if let Some(max) = max.filter(|&max| places > max) {
            reject(ast, report, ctx, id, "numericalinputmaxdp", max);
        }
    }
}

/// `201_sig_figs_validation`: the number of significant figures must lie within bounds.
///
/// Trailing zeros of an integer may or may not be significant, so `1200` passes both a minimum
/// of 4 and a maximum of 2.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SigFigsValidation {
    /// The least number of significant figures.
    pub min: Option<i64>,

    /// The greatest number of significant figures.
    pub max: Option<i64>,
}

impl AstFilter for SigFigsValidation {
    fn filter(&self, ast: &mut Ast, report: &mut FilterReport, ctx: &FilterContext) {
        let (min, max) = (bound(self.min), bound(self.max));
        let (id, raw) = match target(ast) {
            Ok(found) => found,
            Err(root) => {
                match (min, max) {
                    (Some(min), _) => reject(ast, report, ctx, root, "numericalinputminsf", min),
                    (None, Some(max)) => reject(ast, report, ctx, root, "numericalinputmaxsf", max),
                    (None, None) => ast.mark_invalid(root),
                }
                return;
            },
        };

        let (lower, upper) = significant_figures(&raw);
        if let Some(min) = min.filter(|&min| upper < min) {
            reject(ast, report, ctx, id, "numericalinputminsf", min);
        }
        if let Some(max) = max.filter(|&max| lower > max) {
            reject(ast, report, ctx, id, "numericalinputmaxsf", max);
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use crate::filters::test_util::run;
    use super::*;

    fn dp(min: i64, max: i64) -> DecimalPlacesValidation {
        DecimalPlacesValidation { min: Some(min), max: Some(max) }
    }

    #[test]
    fn decimal_places_bounds() {
        let filter = dp(2, 4);

        let (ast, report) = run(&filter, "1.2");
        assert!(!ast.is_valid());
        assert_eq!(report.messages(), vec!["numericalinputmindp(a=2)"]);

        let (ast, report) = run(&filter, "1.23");
        assert!(ast.is_valid());
        assert!(report.is_clean());

        let (ast, report) = run(&filter, "1.23456");
        assert!(!ast.is_valid());
        assert_eq!(report.messages(), vec!["numericalinputmaxdp(a=4)"]);

        let (ast, report) = run(&filter, "5");
        assert!(!ast.is_valid());
        assert_eq!(report.messages(), vec!["numericalinputmindp(a=2)"]);
    }

    #[test]
    fn decimal_places_leftmost_only() {
        let (ast, report) = run(&dp(2, 4), "-1.25*x + 3.1");
        assert!(ast.is_valid());
        assert!(report.is_clean());
    }

    #[test]
    fn decimal_places_without_number() {
        let (ast, report) = run(&dp(2, 4), "x + y");
        assert!(!ast.is_valid());
        assert!(ast.is_invalid(ast.first_expr().unwrap()));
        assert_eq!(report.messages(), vec!["numericalinputmindp(a=2)"]);

        let filter = DecimalPlacesValidation { min: None, max: Some(3) };
        let (_, report) = run(&filter, "x");
        assert_eq!(report.messages(), vec!["numericalinputmaxdp(a=3)"]);
    }

    #[test]
    fn decimal_places_unbounded() {
        let filter = DecimalPlacesValidation { min: Some(0), max: None };
        let (ast, report) = run(&filter, "3.14159265");
        assert!(ast.is_valid());
        assert!(report.is_clean());
    }

    #[test]
    fn sig_figs() {
        let filter = SigFigsValidation { min: Some(3), max: Some(3) };

        let (ast, _) = run(&filter, "0.00250");
        assert!(ast.is_valid());

        let (ast, _) = run(&filter, "1200");
        assert!(ast.is_valid());

        let (_, report) = run(&filter, "1.2");
        assert_eq!(report.messages(), vec!["numericalinputminsf(a=3)"]);

        let (_, report) = run(&filter, "1.2345");
        assert_eq!(report.messages(), vec!["numericalinputmaxsf(a=3)"]);
    }

    #[test]
    fn settings_are_strict() {
        let err = serde_json::from_str::<DecimalPlacesValidation>(r#"{"min": 1, "mx": 2}"#).unwrap_err();
        assert!(err.to_string().contains("unknown field `mx`"));
    }
}
