//! Tokenizer and error-tolerant parser for the CAS expression language used by STACK question
//! authors and students.
//!
//! The parser always produces an [`Ast`](ast::Ast), even for broken input. Syntax errors are
//! collected alongside the tree and the affected nodes are marked invalid, which lets the filter
//! pipeline in `stack-filter` keep reporting problems in the rest of the expression.
//!
//! ```
//! use stack_parser::parse;
//!
//! let ast = parse("sin(x + 1");
//! assert!(!ast.is_valid());
//! assert_eq!(ast.call_name(ast.first_expr().unwrap()), Some("sin"));
//! ```

pub mod ast;
pub mod bookends;
pub mod parser;
pub mod tokenizer;
pub mod util;

pub use parser::parse;
