use super::Value;
use crate::units::CompoundUnit;
use std::fmt;
use std::str::FromStr;

/// Supported currencies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CurrencyCode {
    Usd,
    Eur,
    Gbp,
    Jpy,
    Inr,
    Krw,
    Chf,
    Cad,
    Aud,
    Cny,
}

impl CurrencyCode {
    pub const ALL: [CurrencyCode; 10] = [
        CurrencyCode::Usd,
        CurrencyCode::Eur,
        CurrencyCode::Gbp,
        CurrencyCode::Jpy,
        CurrencyCode::Inr,
        CurrencyCode::Krw,
        CurrencyCode::Chf,
        CurrencyCode::Cad,
        CurrencyCode::Aud,
        CurrencyCode::Cny,
    ];

    /// ISO 4217 code
    pub fn code(&self) -> &'static str {
        match self {
            CurrencyCode::Usd => "USD",
            CurrencyCode::Eur => "EUR",
            CurrencyCode::Gbp => "GBP",
            CurrencyCode::Jpy => "JPY",
            CurrencyCode::Inr => "INR",
            CurrencyCode::Krw => "KRW",
            CurrencyCode::Chf => "CHF",
            CurrencyCode::Cad => "CAD",
            CurrencyCode::Aud => "AUD",
            CurrencyCode::Cny => "CNY",
        }
    }

    /// Single-character symbol, where one is unambiguous
    pub fn symbol_char(&self) -> Option<char> {
        match self {
            CurrencyCode::Usd => Some('$'),
            CurrencyCode::Eur => Some('€'),
            CurrencyCode::Gbp => Some('£'),
            CurrencyCode::Jpy => Some('¥'),
            CurrencyCode::Inr => Some('₹'),
            CurrencyCode::Krw => Some('₩'),
            _ => None,
        }
    }

    /// Symbol if there is one, otherwise the code
    pub fn symbol(&self) -> String {
        match self.symbol_char() {
            Some(c) => c.to_string(),
            None => self.code().to_string(),
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|code| code.symbol_char() == Some(symbol))
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }
}

impl FromStr for CurrencyCode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_symbol(c).ok_or(()),
            _ => Self::from_code(s).ok_or(()),
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbol())
    }
}

/// An amount of money in one currency
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Money {
    pub code: CurrencyCode,
    pub amount: f64,
}

impl Money {
    pub fn new(code: CurrencyCode, amount: f64) -> Self {
        Self { code, amount }
    }

    pub fn with_amount(&self, amount: f64) -> Self {
        Self::new(self.code, amount)
    }
}

/// Money priced per unit (`$5/kg`) or multiplied by a unit (`$5*kg`)
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyQuantity {
    pub code: CurrencyCode,
    pub amount: f64,
    pub unit: CompoundUnit,
    /// `true` for a rate (`$/kg`), `false` for a product (`$·kg`)
    pub per: bool,
}

impl CurrencyQuantity {
    pub fn per_unit(code: CurrencyCode, amount: f64, unit: CompoundUnit) -> Self {
        Self {
            code,
            amount,
            unit,
            per: true,
        }
    }

    pub fn times_unit(code: CurrencyCode, amount: f64, unit: CompoundUnit) -> Self {
        Self {
            code,
            amount,
            unit,
            per: false,
        }
    }

    /// The unit multiplying the money (`kg^-1` for `$5/kg`)
    pub fn effective_unit(&self) -> CompoundUnit {
        if self.per {
            self.unit.inverse()
        } else {
            self.unit.clone()
        }
    }

    pub fn with_amount(&self, amount: f64) -> Self {
        Self {
            amount,
            ..self.clone()
        }
    }

    /// Build the value for `amount × code × unit`.
    ///
    /// A unit that cancels out leaves plain money; a unit made only of
    /// negative exponents reads as a rate.
    pub fn from_effective(code: CurrencyCode, amount: f64, unit: CompoundUnit) -> Value {
        if unit.is_dimensionless() {
            return Value::Currency(Money::new(code, amount * unit.si_factor()));
        }
        if unit.terms().iter().all(|t| t.exponent < 0) {
            Value::CurrencyQuantity(Self::per_unit(code, amount, unit.inverse()))
        } else {
            Value::CurrencyQuantity(Self::times_unit(code, amount, unit))
        }
    }
}
