//! Compound unit expressions
//!
//! A [`CompoundUnit`] is an ordered product of registered units raised to
//! integer exponents, e.g. `kg*m/s^2` → `[(kg, 1), (m, 1), (s, -2)]`.

use super::dimension::Dimension;
use super::registry::{lookup, ResolvedUnit};
use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Largest exponent magnitude a unit term may be written or raised to
pub const MAX_EXPONENT: i32 = 127;

/// One factor of a compound unit
#[derive(Debug, Clone, PartialEq)]
pub struct UnitTerm {
    pub unit: ResolvedUnit,
    pub exponent: i32,
}

/// A product of units with integer exponents, in written order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompoundUnit {
    terms: Vec<UnitTerm>,
}

impl CompoundUnit {
    /// The empty (dimensionless) unit
    pub fn none() -> Self {
        Self::default()
    }

    /// A single registered unit
    pub fn single(name: &str) -> Result<Self> {
        let unit = lookup(name).ok_or_else(|| Error::UnknownUnit(name.to_string()))?;
        Ok(Self {
            terms: vec![UnitTerm { unit, exponent: 1 }],
        })
    }

    /// The coherent SI unit of a dimension, built from base symbols
    /// (`kg*m^2/s^2` for energy)
    pub fn si_base(dimension: Dimension) -> Self {
        const BASE_UNITS: [&str; 8] = ["kg", "m", "s", "A", "K", "mol", "cd", "bit"];
        // mass is listed first so products read "kg*m/s^2"
        const ORDER: [usize; 8] = [1, 0, 2, 3, 4, 5, 6, 7];

        let exponents = dimension.exponents();
        let mut unit = Self::none();
        for (symbol, index) in BASE_UNITS.iter().zip(ORDER) {
            let exponent = exponents[index];
            if exponent != 0 {
                if let Some(resolved) = lookup(symbol) {
                    unit.push(resolved, exponent);
                }
            }
        }
        unit
    }

    /// Parse expressions like `km/h`, `kg*m/s^2`, `m²`, `1/s`, `s^-1`
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::MalformedUnit(text.to_string()));
        }

        let mut unit = Self::none();
        for (i, part) in text.split('/').enumerate() {
            let sign = if i == 0 { 1 } else { -1 };
            let part = part.trim();
            let part = part
                .strip_prefix('(')
                .and_then(|p| p.strip_suffix(')'))
                .unwrap_or(part);
            if part.is_empty() {
                return Err(Error::MalformedUnit(text.to_string()));
            }
            if i == 0 && part == "1" {
                continue;
            }
            for factor in part.split(|c| c == '*' || c == '·' || c == '×') {
                let (name, exponent) = parse_factor(factor, text)?;
                let resolved =
                    lookup(name).ok_or_else(|| Error::UnknownUnit(name.to_string()))?;
                unit.push(resolved, exponent * sign);
            }
        }
        Ok(unit)
    }

    fn push(&mut self, unit: ResolvedUnit, exponent: i32) {
        if let Some(term) = self.terms.iter_mut().find(|t| t.unit.symbol == unit.symbol) {
            term.exponent += exponent;
        } else {
            self.terms.push(UnitTerm { unit, exponent });
        }
        self.terms.retain(|t| t.exponent != 0);
    }

    pub fn terms(&self) -> &[UnitTerm] {
        &self.terms
    }

    /// Check if there are no terms at all
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Combined dimension of all terms
    pub fn dimension(&self) -> Dimension {
        self.terms.iter().fold(Dimension::DIMENSIONLESS, |acc, t| {
            acc * t.unit.dimension.powi(t.exponent)
        })
    }

    /// Check if the terms cancel dimensionally (`J/(N*m)`, or no terms)
    pub fn is_dimensionless(&self) -> bool {
        self.dimension().is_dimensionless()
    }

    /// Factor taking a value in this unit to the coherent SI unit
    pub fn si_factor(&self) -> f64 {
        self.terms
            .iter()
            .map(|t| t.unit.factor.powi(t.exponent))
            .product()
    }

    /// Offset applied before `si_factor` (only for a lone temperature unit)
    pub fn offset(&self) -> f64 {
        match self.terms.as_slice() {
            [term] if term.exponent == 1 => term.unit.offset,
            _ => 0.0,
        }
    }

    /// Check if both units measure the same dimension
    pub fn is_compatible(&self, other: &CompoundUnit) -> bool {
        self.dimension() == other.dimension()
    }

    /// Convert a value expressed in this unit into `target`
    pub fn convert_value(&self, value: f64, target: &CompoundUnit) -> Result<f64> {
        if !self.is_compatible(target) {
            return Err(Error::IncompatibleUnits {
                from: self.to_string(),
                to: target.to_string(),
            });
        }
        let si = (value + self.offset()) * self.si_factor();
        Ok(si / target.si_factor() - target.offset())
    }

    /// Every exponent negated
    pub fn inverse(&self) -> Self {
        Self {
            terms: self
                .terms
                .iter()
                .map(|t| UnitTerm {
                    unit: t.unit.clone(),
                    exponent: -t.exponent,
                })
                .collect(),
        }
    }

    /// Multiply two units.
    ///
    /// Terms of `other` whose dimension matches an existing term of `self`
    /// are re-expressed in that term's unit; the returned factor must be
    /// applied to the product of the scalars (`km × m` → `km^2`, `0.001`).
    pub fn multiply(&self, other: &CompoundUnit) -> (CompoundUnit, f64) {
        let mut result = self.clone();
        let mut scale = 1.0;
        for term in &other.terms {
            let same_dimension = result.terms.iter().find(|t| {
                t.unit.symbol != term.unit.symbol
                    && t.unit.dimension == term.unit.dimension
                    && t.unit.offset == 0.0
                    && term.unit.offset == 0.0
            });
            match same_dimension {
                Some(existing) => {
                    scale *= (term.unit.factor / existing.unit.factor).powi(term.exponent);
                    let unit = existing.unit.clone();
                    result.push(unit, term.exponent);
                }
                None => result.push(term.unit.clone(), term.exponent),
            }
        }
        (result, scale)
    }

    /// Divide two units; see [`CompoundUnit::multiply`] for the factor
    pub fn divide(&self, other: &CompoundUnit) -> (CompoundUnit, f64) {
        self.multiply(&other.inverse())
    }

    /// Raise to a real power; every resulting exponent must be an integer
    pub fn powf(&self, exponent: f64) -> Result<CompoundUnit> {
        let mut terms = Vec::with_capacity(self.terms.len());
        for t in &self.terms {
            let scaled = t.exponent as f64 * exponent;
            if (scaled - scaled.round()).abs() > 1e-9 {
                return Err(Error::NonIntegralPower {
                    unit: self.to_string(),
                    exponent,
                });
            }
            if scaled.abs() > MAX_EXPONENT as f64 {
                return Err(Error::ExponentOutOfRange {
                    unit: self.to_string(),
                    exponent,
                });
            }
            let scaled = scaled.round() as i32;
            if scaled != 0 {
                terms.push(UnitTerm {
                    unit: t.unit.clone(),
                    exponent: scaled,
                });
            }
        }
        Ok(Self { terms })
    }
}

fn parse_factor<'a>(factor: &'a str, whole: &str) -> Result<(&'a str, i32)> {
    let factor = factor.trim();
    if factor.is_empty() {
        return Err(Error::MalformedUnit(whole.to_string()));
    }
    if let Some(base) = factor.strip_suffix('²') {
        return Ok((base.trim(), 2));
    }
    if let Some(base) = factor.strip_suffix('³') {
        return Ok((base.trim(), 3));
    }
    match factor.split_once('^') {
        Some((base, exp)) => {
            let exp = exp
                .trim()
                .parse::<i32>()
                .map_err(|_| Error::MalformedUnit(whole.to_string()))?;
            if base.trim().is_empty() || exp.abs() > MAX_EXPONENT {
                return Err(Error::MalformedUnit(whole.to_string()));
            }
            Ok((base.trim(), exp))
        }
        None => Ok((factor, 1)),
    }
}

impl FromStr for CompoundUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for CompoundUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn term(symbol: &str, exponent: i32) -> String {
            if exponent == 1 {
                symbol.to_string()
            } else {
                format!("{}^{}", symbol, exponent)
            }
        }

        let num: Vec<String> = self
            .terms
            .iter()
            .filter(|t| t.exponent > 0)
            .map(|t| term(&t.unit.symbol, t.exponent))
            .collect();

        if num.is_empty() {
            let inv: Vec<String> = self
                .terms
                .iter()
                .map(|t| term(&t.unit.symbol, t.exponent))
                .collect();
            return f.write_str(&inv.join("*"));
        }

        let den: Vec<String> = self
            .terms
            .iter()
            .filter(|t| t.exponent < 0)
            .map(|t| term(&t.unit.symbol, -t.exponent))
            .collect();

        if den.is_empty() {
            f.write_str(&num.join("*"))
        } else {
            write!(f, "{}/{}", num.join("*"), den.join("*"))
        }
    }
}
