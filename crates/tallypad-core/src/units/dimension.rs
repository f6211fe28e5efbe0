//! Physical dimensions as exponent vectors over the base quantities

use std::fmt;
use std::ops::{Div, Mul};

const BASE_COUNT: usize = 8;

const BASE_SYMBOLS: [&str; BASE_COUNT] = ["L", "M", "T", "I", "Θ", "N", "J", "D"];

/// Exponents over length, mass, time, current, temperature, amount of
/// substance, luminous intensity and information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Dimension {
    exponents: [i32; BASE_COUNT],
}

impl Dimension {
    pub const DIMENSIONLESS: Self = Self::base(usize::MAX);
    pub const LENGTH: Self = Self::base(0);
    pub const MASS: Self = Self::base(1);
    pub const TIME: Self = Self::base(2);
    pub const CURRENT: Self = Self::base(3);
    pub const TEMPERATURE: Self = Self::base(4);
    pub const AMOUNT: Self = Self::base(5);
    pub const LUMINOSITY: Self = Self::base(6);
    pub const INFORMATION: Self = Self::base(7);

    const fn base(index: usize) -> Self {
        let mut exponents = [0i32; BASE_COUNT];
        if index < BASE_COUNT {
            exponents[index] = 1;
        }
        Self { exponents }
    }

    /// Exponents in base order (length, mass, time, current, temperature,
    /// amount, luminosity, information)
    pub fn exponents(&self) -> [i32; BASE_COUNT] {
        self.exponents
    }

    /// Check if every exponent is zero
    pub fn is_dimensionless(&self) -> bool {
        self.exponents.iter().all(|&e| e == 0)
    }

    /// Raise to an integer power
    pub fn powi(self, n: i32) -> Self {
        let mut exponents = self.exponents;
        for e in exponents.iter_mut() {
            *e = e.saturating_mul(n);
        }
        Self { exponents }
    }

    /// Inverse dimension (every exponent negated)
    pub fn inverse(self) -> Self {
        self.powi(-1)
    }
}

impl Mul for Dimension {
    type Output = Dimension;

    fn mul(self, rhs: Self) -> Self::Output {
        let mut exponents = self.exponents;
        for (e, r) in exponents.iter_mut().zip(rhs.exponents) {
            *e = e.saturating_add(r);
        }
        Dimension { exponents }
    }
}

impl Div for Dimension {
    type Output = Dimension;

    fn div(self, rhs: Self) -> Self::Output {
        self * rhs.inverse()
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dimensionless() {
            return f.write_str("1");
        }
        let parts: Vec<String> = self
            .exponents
            .iter()
            .zip(BASE_SYMBOLS)
            .filter(|(e, _)| **e != 0)
            .map(|(e, sym)| {
                if *e == 1 {
                    sym.to_string()
                } else {
                    format!("{}^{}", sym, e)
                }
            })
            .collect();
        f.write_str(&parts.join("·"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_velocity_and_area() {
        let velocity = Dimension::LENGTH / Dimension::TIME;
        let area = Dimension::LENGTH * Dimension::LENGTH;

        assert_eq!(area, Dimension::LENGTH.powi(2));
        assert_eq!(velocity * Dimension::TIME, Dimension::LENGTH);
        assert_eq!(velocity.to_string(), "L·T^-1");
    }

    #[test]
    fn test_dimensionless() {
        assert!(Dimension::DIMENSIONLESS.is_dimensionless());
        assert!((Dimension::MASS / Dimension::MASS).is_dimensionless());
        assert!(!Dimension::INFORMATION.is_dimensionless());
    }

    #[test]
    fn test_large_powers_keep_their_sign() {
        let d = Dimension::LENGTH.powi(128);
        assert_eq!(d.exponents()[0], 128);
        assert_eq!((d * Dimension::LENGTH).exponents()[0], 129);
        assert_eq!(Dimension::LENGTH.powi(i32::MAX).powi(2).exponents()[0], i32::MAX);
    }
}
