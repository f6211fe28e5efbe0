//! Quantity adapter: a scalar paired with a unit
//!
//! Wraps the unit library so that value-level arithmetic never touches
//! dimensions directly. Unit algebra results that cancel out are reported
//! as [`UnitProduct::Dimensionless`] so callers can demote them to plain
//! numbers.

use crate::error::{Error, Result};
use crate::options::Tolerance;
use crate::units::{CompoundUnit, Dimension, DISPLAY_FAMILIES};
use std::fmt;

/// A scalar with a (possibly compound) unit
#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    value: f64,
    unit: CompoundUnit,
}

/// Result of multiplying, dividing or raising quantities
#[derive(Debug, Clone, PartialEq)]
pub enum UnitProduct {
    Quantity(Quantity),
    Dimensionless(f64),
}

impl Quantity {
    /// Create a quantity from a unit expression
    pub fn new(value: f64, unit: &str) -> Result<Self> {
        Ok(Self {
            value,
            unit: CompoundUnit::parse(unit)?,
        })
    }

    /// Create a quantity from an already parsed unit
    pub fn with_unit(value: f64, unit: CompoundUnit) -> Self {
        Self { value, unit }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn unit(&self) -> &CompoundUnit {
        &self.unit
    }

    pub fn dimension(&self) -> Dimension {
        self.unit.dimension()
    }

    /// Check if the unit cancels out dimensionally
    pub fn is_dimensionless(&self) -> bool {
        self.unit.is_dimensionless()
    }

    /// The same unit with a new scalar
    pub fn scaled(&self, value: f64) -> Self {
        Self {
            value,
            unit: self.unit.clone(),
        }
    }

    /// Convert to a unit expression
    pub fn to(&self, target: &str) -> Result<Quantity> {
        let target = CompoundUnit::parse(target)?;
        self.to_unit(&target)
    }

    /// Convert to a parsed unit
    pub fn to_unit(&self, target: &CompoundUnit) -> Result<Quantity> {
        let value = self.unit.convert_value(self.value, target)?;
        Ok(Self {
            value,
            unit: target.clone(),
        })
    }

    /// Scalar expressed in another unit
    pub fn value_in(&self, target: &CompoundUnit) -> Result<f64> {
        self.unit.convert_value(self.value, target)
    }

    /// Express in the coherent SI unit of this dimension
    pub fn to_base(&self) -> Quantity {
        let base = CompoundUnit::si_base(self.dimension());
        let value = (self.value + self.unit.offset()) * self.unit.si_factor();
        Self { value, unit: base }
    }

    /// Scalar value once the unit cancels (`km/m` → factor 1000)
    fn collapse(value: f64, unit: CompoundUnit) -> UnitProduct {
        if unit.is_dimensionless() {
            UnitProduct::Dimensionless(value * unit.si_factor())
        } else {
            UnitProduct::Quantity(Self { value, unit })
        }
    }

    /// Multiply two quantities, combining their units
    pub fn multiply(&self, other: &Quantity) -> UnitProduct {
        let (unit, scale) = self.unit.multiply(&other.unit);
        Self::collapse(self.value * other.value * scale, unit)
    }

    /// Divide two quantities, cancelling or deriving units.
    ///
    /// The caller is responsible for rejecting a zero divisor.
    pub fn divide(&self, other: &Quantity) -> UnitProduct {
        let (unit, scale) = self.unit.divide(&other.unit);
        Self::collapse(self.value / other.value * scale, unit)
    }

    /// `1 / self`
    pub fn reciprocal(&self) -> Quantity {
        Self {
            value: 1.0 / self.value,
            unit: self.unit.inverse(),
        }
    }

    /// Raise to a power, scaling the unit's exponents
    pub fn powf(&self, exponent: f64) -> Result<UnitProduct> {
        let unit = self.unit.powf(exponent)?;
        Ok(Self::collapse(self.value.powf(exponent), unit))
    }

    /// Check if two quantities are equal after conversion to a common unit
    pub fn approx_eq(&self, other: &Quantity, tolerance: Tolerance) -> bool {
        match other.value_in(&self.unit) {
            Ok(v) => tolerance.approx_eq(self.value, v),
            Err(_) => false,
        }
    }

    /// Pick the most human-scaled unit in this unit's display family:
    /// the largest unit in which the magnitude is still at least 1.
    pub fn best_unit(&self) -> Quantity {
        let symbol = match self.unit.terms() {
            [term] if term.exponent == 1 => term.unit.symbol.as_str(),
            _ => return self.clone(),
        };
        if self.value == 0.0 {
            return self.clone();
        }
        let Some(family) = DISPLAY_FAMILIES.iter().find(|f| f.contains(&symbol)) else {
            return self.clone();
        };

        let mut best: Option<Quantity> = None;
        for candidate in family.iter() {
            let Ok(converted) = self.to(candidate) else {
                continue;
            };
            if converted.value.abs() >= 1.0 || best.is_none() {
                best = Some(converted);
            }
        }
        best.unwrap_or_else(|| self.clone())
    }
}

impl TryFrom<(f64, &str)> for Quantity {
    type Error = Error;

    fn try_from((value, unit): (f64, &str)) -> Result<Self> {
        Quantity::new(value, unit)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}
