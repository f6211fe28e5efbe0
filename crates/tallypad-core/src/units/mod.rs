//! Dimensional unit library
//!
//! This module contains:
//! - [`Dimension`] - exponent vector over the base quantities
//! - [`CompoundUnit`] - parsed unit expressions and their algebra
//! - [`lookup`] - the unit registry (symbols, aliases, SI prefixes)
//! - [`convert`] / [`combine_units`] - string-level entry points

mod compound;
mod dimension;
mod registry;

pub use compound::{CompoundUnit, UnitTerm, MAX_EXPONENT};
pub use dimension::Dimension;
pub use registry::{is_unit, lookup, ResolvedUnit, UnitDef};

pub(crate) use registry::DISPLAY_FAMILIES;

use crate::error::Result;

/// Operation used to combine two units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOp {
    Multiply,
    Divide,
}

/// Convert `value` from one unit expression to another
pub fn convert(value: f64, from: &str, to: &str) -> Result<f64> {
    let from = CompoundUnit::parse(from)?;
    let to = CompoundUnit::parse(to)?;
    from.convert_value(value, &to)
}

/// Combine two unit expressions.
///
/// Returns the resulting unit and the factor that must be applied to the
/// combined scalar when like-dimensioned terms were merged.
pub fn combine_units(a: &str, b: &str, op: UnitOp) -> Result<(CompoundUnit, f64)> {
    let a = CompoundUnit::parse(a)?;
    let b = CompoundUnit::parse(b)?;
    Ok(match op {
        UnitOp::Multiply => a.multiply(&b),
        UnitOp::Divide => a.divide(&b),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert() {
        assert_eq!(convert(2.0, "km", "m").unwrap(), 2000.0);
        assert!((convert(1.0, "mi", "km").unwrap() - 1.609344).abs() < 1e-12);
        assert!((convert(1.0, "kWh", "J").unwrap() - 3.6e6).abs() < 1e-6);
        assert!(convert(1.0, "m", "s").is_err());
        assert!(convert(1.0, "m", "lightyear").is_err());
    }

    #[test]
    fn test_combine_units() {
        let (u, f) = combine_units("m", "m", UnitOp::Multiply).unwrap();
        assert_eq!(u.to_string(), "m^2");
        assert_eq!(f, 1.0);

        let (u, _) = combine_units("km", "h", UnitOp::Divide).unwrap();
        assert_eq!(u.to_string(), "km/h");

        let (u, _) = combine_units("W", "s", UnitOp::Multiply).unwrap();
        assert_eq!(u.dimension(), CompoundUnit::parse("J").unwrap().dimension());
    }
}
