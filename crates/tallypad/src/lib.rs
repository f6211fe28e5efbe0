//! # tallypad
//!
//! The engine of a calculation notepad: write numbers with their meaning
//! attached and let the values keep themselves up to date.
//!
//! ## Features
//!
//! - Semantic values: money, percentages, physical quantities, dates,
//!   times, durations and lists
//! - Unit conversion and dimensional arithmetic
//! - Ranges, filters, slices and aggregates over lists
//! - Multi-word variable names with automatic recomputation and cycle
//!   detection
//! - Line-by-line [`Document`] evaluation with `ans`/`prev`
//!
//! ## Example
//!
//! ```rust
//! use tallypad::prelude::*;
//!
//! let doc = Document::from_text(
//!     "hourly rate = $45\n\
//!      hours = 3.5\n\
//!      hourly rate * hours",
//! );
//! assert_eq!(doc.outcomes()[2].value, Some(parse("$157.50")));
//! ```

pub mod document;
pub mod prelude;

pub use document::{Document, DocumentError, LineKind, LineOutcome};

// Re-export core types
pub use tallypad_core::{
    parse, Aggregate, BinaryOp, Comparator, CurrencyCode, DateFormat, DisplayOptions, Duration,
    DurationUnit, EngineOptions, ErrorKind, List, Notation, Percentage, Quantity, Tolerance, Value,
    ValueError, ValueKind, DEFAULT_MAX_RANGE_ELEMENTS,
};

// Re-export formula types
pub use tallypad_formula::{
    evaluate, evaluate_expression, evaluate_numeric, parse_expression, EmptyScope, Expr,
    FormulaError, FormulaResult, Scope, SetOutcome, StoreError, Variable, VariableStore,
};
