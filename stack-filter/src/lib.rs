//! Configurable filters over parsed CAS expressions.
//!
//! A filter walks an [`Ast`](stack_parser::ast::Ast) produced by `stack-parser`, and either
//! rewrites it into the form the CAS expects, or marks the parts it does not allow as invalid.
//! Filters are looked up by name in a [`FilterRegistry`] and assembled into a [`Pipeline`], which
//! runs them in a fixed order and collects their errors and answer notes into a
//! [`FilterReport`].
//!
//! ```
//! use stack_filter::{FilterContext, FilterRegistry, FilterSettings, KeyTranslator, SecurityPolicy};
//! use stack_parser::parse;
//!
//! let registry = FilterRegistry::new();
//! let pipeline = registry
//!     .build_pipeline(&["101_no_floats", "999_strict"], &FilterSettings::new(), true)
//!     .unwrap();
//!
//! let policy = SecurityPolicy::new();
//! let mut ast = parse("2.5x");
//! let report = pipeline.run(&mut ast, &FilterContext::new(&policy, &KeyTranslator));
//!
//! assert!(!ast.is_valid());
//! assert_eq!(report.notes(), &["Illegal_floats", "missing_stars"]);
//! ```

pub mod error;
pub mod filter;
pub mod filters;
pub mod registry;
pub mod report;
pub mod security;
pub mod translate;

pub use error::ConfigError;
pub use filter::{AstFilter, FilterContext};
pub use registry::{FilterRegistry, FilterSettings, Pipeline};
pub use report::FilterReport;
pub use security::{SecurityPolicy, WordStatus};
pub use translate::{KeyTranslator, StringTable, Translator};
