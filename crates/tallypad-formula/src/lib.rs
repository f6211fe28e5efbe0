//! # tallypad-formula
//!
//! Expression language and reactive variables for tallypad.
//!
//! This crate provides:
//! - Tokenizing and parsing (text → AST), with multi-word variable names
//! - Evaluation (AST → [`Value`](tallypad_core::Value)) against a [`Scope`]
//! - Built-in functions (aggregates, math, `today`/`now`)
//! - Dependency tracking and a [`VariableStore`] that recomputes on change
//!
//! ## Example
//!
//! ```rust
//! use tallypad_formula::VariableStore;
//! use tallypad_core::parse;
//!
//! let mut store = VariableStore::new();
//! store.set_variable("monthly rent", "$1200");
//! store.set_variable("yearly rent", "monthly rent * 12");
//! assert_eq!(store.get_variable("yearly rent"), Some(&parse("$14400")));
//! ```

pub mod ast;
pub mod dependency;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod lexer;
pub mod numeric;
pub mod parser;
pub mod store;

pub use ast::{BinaryOperator, ConversionTarget, Expr, PercentOperator, UnaryOperator};
pub use dependency::{extract_dependencies, DependencyGraph};
pub use error::{FormulaError, FormulaResult};
pub use evaluator::{evaluate, evaluate_expression, EmptyScope, Layered, Scope};
pub use lexer::{tokenize, Keyword, Token, TokenKind};
pub use numeric::evaluate_numeric;
pub use parser::parse_expression;
pub use store::{SetOutcome, StoreError, Variable, VariableNode, VariableStore};
