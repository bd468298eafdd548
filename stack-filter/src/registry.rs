//! Looking up filters by name and assembling them into pipelines.

use crate::{
    error::ConfigError,
    filter::{AstFilter, FilterContext},
    filters::{corrections::*, forbid::*, functions::*, implicit::*, numeric::*, rewrite::*, security::*, split::*},
    report::FilterReport,
};
use levenshtein::levenshtein;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use stack_parser::ast::Ast;
use std::{collections::HashMap, fmt, sync::Arc};
use tracing::{debug, error};

/// The name of the filter that checks identifiers against the security policy. It is part of
/// every pipeline used for author-written expressions.
pub const SECURITY_FILTER: &str = "998_security";

/// Settings for parametric filters, keyed by filter name.
///
/// ```
/// use serde_json::json;
/// use stack_filter::registry::FilterSettings;
///
/// let settings = FilterSettings::new()
///     .with("202_decimal_places_validation", json!({ "min": 2, "max": 4 }));
/// assert!(settings.get("202_decimal_places_validation").is_some());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct FilterSettings {
    settings: HashMap<String, Value>,
}

impl FilterSettings {
    /// Creates empty settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the settings of a filter, returning the result.
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.insert(name, value);
        self
    }

    /// Adds or replaces the settings of a filter.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.settings.insert(name.into(), value);
    }

    /// Returns the settings of a filter.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.settings.get(name)
    }
}

/// Builds a parametric filter from its settings.
pub type Builder = fn(&Value) -> Result<Arc<dyn AstFilter>, serde_json::Error>;

/// Deserializes a filter from its settings.
fn build<F>(value: &Value) -> Result<Arc<dyn AstFilter>, serde_json::Error>
where
    F: AstFilter + DeserializeOwned + 'static,
{
    F::deserialize(value).map(|filter| Arc::new(filter) as Arc<dyn AstFilter>)
}

/// How a registered filter is obtained.
#[derive(Clone)]
enum Constructor {
    /// A stateless filter, shared by every pipeline.
    Shared(Arc<dyn AstFilter>),

    /// A filter built from settings each time a pipeline is built.
    Parametric(Builder),
}

#[derive(Clone)]
struct Entry {
    key: u32,
    constructor: Constructor,
}

/// Every filter that can be named in a pipeline.
///
/// The registry is only read while building pipelines, so one registry can be shared freely.
#[derive(Clone)]
pub struct FilterRegistry {
    entries: HashMap<String, Entry>,
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterRegistry")
            .field("filters", &self.names())
            .finish()
    }
}

impl FilterRegistry {
    /// Creates a registry holding every built-in filter.
    pub fn new() -> Self {
        let mut registry = Self::empty();

        macro_rules! shared {
            ($($key:literal $name:literal $filter:ident),* $(,)?) => {
                $(
                    registry.register_shared($key, $name, Arc::new($filter));
                )*
            };
        }

        shared! {
            1 "001_fix_call_of_a_group_or_function" FixCallOfAGroupOrFunction,
            2 "002_log_candy" LogCandy,
            5 "005_i_is_never_a_function" ImaginaryUnitIsNeverAFunction,
            101 "101_no_floats" NoFloats,
            102 "102_no_strings" NoStrings,
            103 "103_no_lists" NoLists,
            104 "104_no_sets" NoSets,
            105 "105_no_grouppings" NoGrouppings,
            441 "441_split_unknown_functions" SplitUnknownFunctions,
            442 "442_split_all_functions" SplitAllFunctions,
            502 "502_replace_pm" ReplacePm,
            504 "504_insert_tuples_for_groups" InsertTuplesForGroups,
            505 "505_no_evaluation_groups" NoEvaluationGroups,
            541 "541_no_unknown_functions" NoUnknownFunctions,
            542 "542_no_functions_at_all" NoFunctionsAtAll,
            990 "990_no_fixing_spaces" NoFixingSpaces,
            991 "991_no_fixing_stars" NoFixingStars,
            997 "997_string_security" StringSecurity,
            998 "998_security" Security,
            999 "999_strict" Strict,
        }

        registry.register_parametric(201, "201_sig_figs_validation", build::<SigFigsValidation>);
        registry.register_parametric(202, "202_decimal_places_validation", build::<DecimalPlacesValidation>);
        registry
    }

    /// Creates a registry with no filters.
    pub fn empty() -> Self {
        Self { entries: HashMap::new() }
    }

    /// Registers a stateless filter. Pipelines run filters in ascending order of their key.
    pub fn register_shared(&mut self, key: u32, name: impl Into<String>, filter: Arc<dyn AstFilter>) {
        self.entries.insert(name.into(), Entry { key, constructor: Constructor::Shared(filter) });
    }

    /// Registers a filter that is built from settings each time it is used.
    pub fn register_parametric(&mut self, key: u32, name: impl Into<String>, builder: Builder) {
        self.entries.insert(name.into(), Entry { key, constructor: Constructor::Parametric(builder) });
    }

    /// Returns the names of every registered filter, in the order they would run.
    pub fn names(&self) -> Vec<&str> {
        let mut names = self.entries.iter()
            .map(|(name, entry)| (entry.key, name.as_str()))
            .collect::<Vec<_>>();
        names.sort_unstable();
        names.into_iter().map(|(_, name)| name).collect()
    }

    /// Returns true if a filter with the name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Returns the registered name closest to the given one, if any is close enough to be a
    /// likely typo.
    pub fn suggest(&self, name: &str) -> Option<&str> {
        self.entries
            .keys()
            .map(|n| (levenshtein(n, name), n.as_str()))
            .filter(|(distance, _)| *distance <= 3)
            .min()
            .map(|(_, n)| n)
    }

    /// Returns true if the filter with the name runs in every pipeline built with core filters.
    pub fn is_core(name: &str) -> bool {
        name.starts_with('0')
    }

    /// Builds a pipeline from the named filters, plus the core filters if requested.
    ///
    /// Fails if a name is not registered, if a parametric filter has no settings or settings it
    /// does not understand, or if two of the filters conflict.
    pub fn build_pipeline(
        &self,
        active: &[&str],
        settings: &FilterSettings,
        include_core: bool,
    ) -> Result<Pipeline, ConfigError> {
        let mut names = active.iter().map(|name| name.to_string()).collect::<Vec<_>>();
        if include_core {
            names.extend(self.entries.keys().filter(|name| Self::is_core(name)).cloned());
        }
        names.sort_unstable();
        names.dedup();

        let mut filters = Vec::with_capacity(names.len());
        for name in names {
            let Some(entry) = self.entries.get(&name) else {
                let suggestion = self.suggest(&name).map(str::to_string);
                error!(name = name.as_str(), "unknown filter requested");
                return Err(ConfigError::UnknownFilter { name, suggestion });
            };

            let filter = match &entry.constructor {
                Constructor::Shared(filter) => Arc::clone(filter),
                Constructor::Parametric(builder) => {
                    let Some(value) = settings.get(&name) else {
                        return Err(ConfigError::MissingSettings { name });
                    };
                    match builder(value) {
                        Ok(filter) => filter,
                        Err(source) => return Err(ConfigError::InvalidSettings { name, source }),
                    }
                },
            };
            filters.push((entry.key, name, filter));
        }

        for (i, (_, first, a)) in filters.iter().enumerate() {
            for (_, second, b) in &filters[i + 1..] {
                if a.conflicts_with(second) || b.conflicts_with(first) {
                    error!(first = first.as_str(), second = second.as_str(), "conflicting filters");
                    return Err(ConfigError::Conflict {
                        first: first.clone(),
                        second: second.clone(),
                    });
                }
            }
        }

        filters.sort_by(|(a, name_a, _), (b, name_b, _)| a.cmp(b).then_with(|| name_a.cmp(name_b)));
        Ok(Pipeline {
            filters: filters.into_iter().map(|(_, name, filter)| (name, filter)).collect(),
        })
    }

    /// Builds the pipeline used for author-written expressions: the core filters and the
    /// security filter.
    pub fn author_pipeline(&self) -> Result<Pipeline, ConfigError> {
        self.build_pipeline(&[SECURITY_FILTER], &FilterSettings::new(), true)
    }
}

/// An ordered list of filters, ready to run.
///
/// Pipelines hold no state of their own. The same pipeline can be run over any number of trees,
/// from any number of threads.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    filters: Vec<(String, Arc<dyn AstFilter>)>,
}

impl Pipeline {
    /// Returns the names of the filters, in the order they run.
    pub fn names(&self) -> Vec<&str> {
        self.filters.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Returns the number of filters.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Returns true if the pipeline has no filters.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Runs every filter over the tree, returning what they found.
    pub fn run(&self, ast: &mut Ast, ctx: &FilterContext) -> FilterReport {
        let mut report = FilterReport::new();
        self.run_into(ast, &mut report, ctx);
        report
    }

    /// Runs every filter over the tree, adding what they find to an existing report.
    pub fn run_into(&self, ast: &mut Ast, report: &mut FilterReport, ctx: &FilterContext) {
        for (name, filter) in &self.filters {
            debug!(filter = name.as_str(), "running filter");
            filter.filter(ast, report, ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use crate::{security::SecurityPolicy, translate::KeyTranslator};
    use stack_parser::parse;
    use super::*;

    fn run(pipeline: &Pipeline, source: &str) -> (Ast, FilterReport) {
        let policy = SecurityPolicy::new();
        let mut ast = parse(source);
        let report = pipeline.run(&mut ast, &FilterContext::new(&policy, &KeyTranslator));
        (ast, report)
    }

    #[test]
    fn unknown_filter() {
        let registry = FilterRegistry::new();
        let err = registry.build_pipeline(&["101_no_flaots"], &FilterSettings::new(), false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown filter `101_no_flaots`, did you mean `101_no_floats`?",
        );

        let err = registry.build_pipeline(&["nonsense"], &FilterSettings::new(), false).unwrap_err();
        assert_eq!(err.to_string(), "unknown filter `nonsense`");
    }

    #[test]
    fn settings() {
        let registry = FilterRegistry::new();
        let err = registry
            .build_pipeline(&["202_decimal_places_validation"], &FilterSettings::new(), false)
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingSettings { .. }));

        let settings = FilterSettings::new()
            .with("202_decimal_places_validation", json!({ "min": 2, "maxdp": 4 }));
        let err = registry
            .build_pipeline(&["202_decimal_places_validation"], &settings, false)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSettings { .. }));

        let settings = FilterSettings::new()
            .with("202_decimal_places_validation", json!({ "min": 2, "max": 4 }));
        let pipeline = registry
            .build_pipeline(&["202_decimal_places_validation"], &settings, false)
            .unwrap();
        let (ast, report) = run(&pipeline, "1.2");
        assert_eq!(report.messages(), vec!["numericalinputmindp(a=2)"]);
        assert!(report.notes().is_empty());
        assert!(!ast.is_valid());
    }

    #[test]
    fn conflicts_in_either_order() {
        let registry = FilterRegistry::new();
        for active in [
            ["542_no_functions_at_all", "442_split_all_functions"],
            ["442_split_all_functions", "542_no_functions_at_all"],
        ] {
            let err = registry.build_pipeline(&active, &FilterSettings::new(), false).unwrap_err();
            assert_eq!(
                err.to_string(),
                "conflicting filters present in pipeline: `442_split_all_functions` and `542_no_functions_at_all`",
            );
        }
    }

    #[test]
    fn core_filters_and_order() {
        let registry = FilterRegistry::new();
        let pipeline = registry
            .build_pipeline(&["999_strict", "101_no_floats", "101_no_floats"], &FilterSettings::new(), true)
            .unwrap();
        assert_eq!(pipeline.names(), vec![
            "001_fix_call_of_a_group_or_function",
            "002_log_candy",
            "005_i_is_never_a_function",
            "101_no_floats",
            "999_strict",
        ]);

        let pipeline = registry.build_pipeline(&["999_strict"], &FilterSettings::new(), false).unwrap();
        assert_eq!(pipeline.names(), vec!["999_strict"]);
    }

    #[test]
    fn author_pipeline() {
        let pipeline = FilterRegistry::new().author_pipeline().unwrap();
        assert_eq!(pipeline.len(), 4);
        assert_eq!(pipeline.names().last(), Some(&SECURITY_FILTER));
    }

    #[test]
    fn idempotent() {
        let registry = FilterRegistry::new();
        let pipeline = registry
            .build_pipeline(&["101_no_floats", "441_split_unknown_functions", "999_strict"], &FilterSettings::new(), true)
            .unwrap();

        let policy = SecurityPolicy::new();
        let ctx = FilterContext::new(&policy, &KeyTranslator);
        let mut ast = parse("2.5x + f(y) + (a)(b)");
        let mut report = pipeline.run(&mut ast, &ctx);
        let (errors, notes) = (report.messages(), report.notes().to_vec());
        let invalid = ast.invalid_nodes();
        let printed = ast.to_string();

        pipeline.run_into(&mut ast, &mut report, &ctx);
        assert_eq!(report.messages(), errors);
        assert_eq!(report.notes(), notes.as_slice());
        assert_eq!(ast.invalid_nodes(), invalid);
        assert_eq!(ast.to_string(), printed);
    }

    #[test]
    fn order_sensitivity() {
        let registry = FilterRegistry::new();
        let pipeline = registry
            .build_pipeline(
                &["505_no_evaluation_groups", "442_split_all_functions", "105_no_grouppings"],
                &FilterSettings::new(),
                false,
            )
            .unwrap();
        assert_eq!(pipeline.names(), vec![
            "105_no_grouppings",
            "442_split_all_functions",
            "505_no_evaluation_groups",
        ]);

        let (_, report) = run(&pipeline, "2*(1+x)");
        assert_eq!(report.notes(), &["Illegal_groupping".to_string()]);

        // the group made by splitting the call is only seen by the later filter
        let (_, report) = run(&pipeline, "f(x, y)");
        assert_eq!(report.notes(), &["missing_stars".to_string(), "Illegal_groups".to_string()]);

        let (_, report) = run(&pipeline, "(x, y)");
        assert_eq!(report.notes(), &["Illegal_groups".to_string()]);
    }
}
