//! # tallypad-core
//!
//! Semantic values and their arithmetic for the tallypad calculation
//! notepad.
//!
//! This crate provides the leaf building blocks used throughout tallypad:
//! - [`Value`] - numbers, percentages, money, quantities, dates, durations,
//!   lists, symbolic expressions and errors
//! - [`units`] and [`Quantity`] - dimensional unit algebra
//! - [`arithmetic`] - the rule table combining any two values
//! - [`list`] - aggregation, sorting, filtering, slicing and ranges
//! - [`calendar`] - date and clock arithmetic
//! - [`parse`] - literal parsing, the inverse of [`Value::to_display`]
//!
//! ## Example
//!
//! ```rust
//! use tallypad_core::{parse, Value};
//!
//! let price = parse("$5/kg");
//! let total = price.multiply(&parse("3 kg"));
//! assert_eq!(total, parse("$15"));
//!
//! let mixed = parse("$10").add(&parse("€5"));
//! assert!(mixed.is_error());
//! ```

pub mod arithmetic;
pub mod calendar;
pub mod error;
pub mod format;
pub mod list;
pub mod options;
pub mod parse;
pub mod quantity;
pub mod units;
pub mod value;

// Re-exports for convenience
pub use arithmetic::BinaryOp;
pub use error::{Error, ErrorKind, Result, ValueError};
pub use format::{DateFormat, DisplayOptions, Notation};
pub use list::{Aggregate, Comparator};
pub use options::{EngineOptions, Tolerance};
pub use parse::parse;
pub use quantity::{Quantity, UnitProduct};
pub use units::{CompoundUnit, Dimension};
pub use value::{
    CurrencyCode, CurrencyQuantity, DateValue, Duration, DurationUnit, List, Money,
    PercentContext, Percentage, TimeOfDay, Value, ValueKind, Zone,
};

/// Default longest list a range may generate
pub const DEFAULT_MAX_RANGE_ELEMENTS: usize = 10_000;
