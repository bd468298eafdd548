//! The seam through which every user-facing string is produced.
//!
//! Filters and the PRT evaluator never format language themselves. They ask a [`Translator`] for
//! the text behind a key, passing named parameters.

use serde::Deserialize;
use std::collections::HashMap;

/// Produces user-facing text for message keys.
pub trait Translator: Send + Sync {
    /// Returns the text for the given key, with the parameters substituted.
    fn translate(&self, key: &str, params: &[(&str, &str)]) -> String;

    /// Neutralises text taken from student input before it is shown back to anyone.
    ///
    /// The default replaces the characters that would let the text open HTML tags or CAS-text
    /// injections. The result must be stable when sanitised again.
    fn sanitize(&self, text: &str) -> String {
        text.replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace("{@", "{ @")
            .replace("{#", "{ #")
    }
}

/// A translator that returns the key itself, followed by any parameters. Useful in tests and
/// when the host does its own translation later.
///
/// ```
/// use stack_filter::translate::{KeyTranslator, Translator};
///
/// assert_eq!(KeyTranslator.translate("Illegal_floats", &[]), "Illegal_floats");
/// assert_eq!(KeyTranslator.translate("numericalinputmindp", &[("a", "2")]), "numericalinputmindp(a=2)");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyTranslator;

impl Translator for KeyTranslator {
    fn translate(&self, key: &str, params: &[(&str, &str)]) -> String {
        if params.is_empty() {
            return key.to_string();
        }

        let params = params
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}({})", key, params)
    }
}

/// A table of message templates.
///
/// Templates use the placeholders `{$a}` for the parameter named `a`, and `{$a->name}` for the
/// parameter named `name`. Keys missing from the table translate to the key itself, so a
/// missing string is visible rather than silently empty.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct StringTable {
    templates: HashMap<String, String>,
}

impl StringTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table holding the English text of every key used by this workspace.
    pub fn english() -> Self {
        let mut table = Self::new();
        for (key, template) in ENGLISH {
            table.insert(*key, *template);
        }
        table
    }

    /// Adds or replaces a template.
    pub fn insert(&mut self, key: impl Into<String>, template: impl Into<String>) {
        self.templates.insert(key.into(), template.into());
    }

    /// Returns the template for the key, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.templates.get(key).map(String::as_str)
    }
}

impl Translator for StringTable {
    fn translate(&self, key: &str, params: &[(&str, &str)]) -> String {
        let Some(template) = self.get(key) else {
            return KeyTranslator.translate(key, params);
        };

        let mut out = template.to_string();
        for (name, value) in params {
            out = out.replace(&format!("{{$a->{}}}", name), value);
            if *name == "a" {
                out = out.replace("{$a}", value);
            }
        }
        out
    }
}

/// English templates for the keys used by the filters and the PRT evaluator.
const ENGLISH: &[(&str, &str)] = &[
    ("Illegal_floats", "Your answer contains floating point numbers, that are not allowed in this question. You need to type in numbers as fractions."),
    ("Illegal_strings", "Your answer contains \"strings\" these are not allowed here."),
    ("Illegal_lists", "Your answer contains lists \"[a,b,c]\" these are not allowed here."),
    ("Illegal_sets", "Your answer contains sets \"{a,b,c}\" these are not allowed here."),
    ("Illegal_groupping", "Your answer contains parenthesis used to group operations, these are forbidden here. You should probably manipulate the expression to eliminate them."),
    ("Illegal_groups", "Your answer contains evaluation groups \"(a,b,c)\" these are not allowed here."),
    ("numericalinputmindp", "You must supply at least {$a} decimal places."),
    ("numericalinputmaxdp", "You must supply at most {$a} decimal places."),
    ("numericalinputminsf", "You must supply at least {$a} significant figures."),
    ("numericalinputmaxsf", "You must supply at most {$a} significant figures."),
    ("stackCas_noFunction", "The use of the function {$a->forbid} in the term {$a->term} is not allowed in this context."),
    ("stackCas_unknownFunction", "Unknown function: {$a->forbid} in the term {$a->term}."),
    ("stackCas_forbiddenFunction", "Forbidden function: {$a->forbid}."),
    ("stackCas_forbiddenWord", "The expression {$a->forbid} is forbidden."),
    ("stackCas_notAllowedWord", "The use of {$a->forbid} is not allowed in this input."),
    ("stackCas_spaces", "Illegal spaces found in expression {$a->expr}."),
    ("stackCas_MissingStars", "You seem to be missing * characters. Perhaps you meant to type {$a->cmd}."),
    ("TEST_FAILED", "The answer test failed to execute correctly: please alert your teacher. {$a->errors}"),
    ("AT_InvalidOptions", "The option field is invalid. {$a->errors}"),
    ("AT_Timeout", "The answer test did not finish within {$a->seconds} seconds."),
    ("feedbackstyle0", "Formative"),
    ("feedbackstyle1", "Standard"),
    ("feedbackstyle2", "Compact"),
    ("feedbackstyle3", "Symbol only"),
];

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use super::*;

    #[test]
    fn placeholders() {
        let table = StringTable::english();
        assert_eq!(
            table.translate("numericalinputmindp", &[("a", "2")]),
            "You must supply at least 2 decimal places.",
        );
        assert_eq!(
            table.translate("stackCas_forbiddenFunction", &[("forbid", "system")]),
            "Forbidden function: system.",
        );
    }

    #[test]
    fn missing_key_falls_back_to_key() {
        assert_eq!(StringTable::new().translate("nothing_here", &[]), "nothing_here");
    }

    #[test]
    fn loaded_from_json() {
        let table: StringTable = serde_json::from_str(r#"{"greet": "Hello {$a->name}!"}"#).unwrap();
        assert_eq!(table.translate("greet", &[("name", "Ada")]), "Hello Ada!");
    }

    #[test]
    fn sanitize_is_stable() {
        let once = KeyTranslator.sanitize("<script>{@x@}");
        assert_eq!(once, "&lt;script&gt;{ @x@}");
        assert_eq!(KeyTranslator.sanitize(&once), once);
    }
}
