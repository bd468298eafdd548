use stack_parser::ast::NodeKind;
use super::{AnswerTest, Operand, TestCtxt, TestError, TestOutcome};

/// The text compared by the string tests: the value of a string literal, or the canonical text of
/// any other expression.
fn text_of(operand: Operand) -> String {
    match operand.kind() {
        NodeKind::Str { value } => value.clone(),
        _ => operand.text(),
    }
}

/// `String`: the two texts are identical.
#[derive(Debug)]
pub struct StringExact;

impl AnswerTest for StringExact {
    fn name(&self) -> &'static str {
        "String"
    }

    fn run(
        &self,
        sans: Operand,
        tans: Operand,
        _: Option<Operand>,
        ctxt: &TestCtxt,
    ) -> Result<TestOutcome, TestError> {
        ctxt.check_deadline()?;
        Ok(TestOutcome::from_bool(text_of(sans) == text_of(tans)))
    }
}

/// `StringSloppy`: the two texts are identical, ignoring case and whitespace.
#[derive(Debug)]
pub struct StringSloppy;

impl StringSloppy {
    fn normalize(text: &str) -> String {
        text.chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect()
    }
}

impl AnswerTest for StringSloppy {
    fn name(&self) -> &'static str {
        "StringSloppy"
    }

    fn run(
        &self,
        sans: Operand,
        tans: Operand,
        _: Option<Operand>,
        ctxt: &TestCtxt,
    ) -> Result<TestOutcome, TestError> {
        ctxt.check_deadline()?;
        let (s, t) = (Self::normalize(&text_of(sans)), Self::normalize(&text_of(tans)));
        Ok(TestOutcome::from_bool(s == t))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_util::run;
    use super::*;

    #[test]
    fn exact() {
        assert!(run(&StringExact, r#""Hello""#, r#""Hello""#, None).unwrap().passed);
        assert!(!run(&StringExact, r#""hello""#, r#""Hello""#, None).unwrap().passed);
        assert!(run(&StringExact, "x+1", "x + 1", None).unwrap().passed);
    }

    #[test]
    fn sloppy() {
        assert!(run(&StringSloppy, r#""Hello World""#, r#""helloworld""#, None).unwrap().passed);
        assert!(!run(&StringSloppy, r#""Hello""#, r#""Help""#, None).unwrap().passed);
    }
}
