//! Prelude module - common imports for tallypad users
//!
//! ```rust
//! use tallypad::prelude::*;
//! ```

pub use crate::{
    // Values
    parse,
    CurrencyCode,
    DisplayOptions,
    // Documents
    Document,
    Duration,
    DurationUnit,
    // Configuration
    EngineOptions,
    ErrorKind,
    LineKind,
    LineOutcome,
    Notation,
    Percentage,
    Quantity,
    // Variables
    SetOutcome,
    Value,
    ValueError,
    VariableStore,
};
