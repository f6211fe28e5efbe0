//! Semantic value kinds
//!
//! This module contains:
//! - [`Value`] - the closed set of value kinds a calculation can produce
//! - [`Percentage`], [`Money`], [`CurrencyQuantity`] - kind payloads
//! - [`DateValue`], [`TimeOfDay`], [`Duration`] - calendar payloads
//! - [`List`] - flattened value sequences

mod currency;
mod list;
mod percentage;
mod temporal;

pub use currency::{CurrencyCode, CurrencyQuantity, Money};
pub use list::List;
pub use percentage::{PercentContext, Percentage};
pub use temporal::{DateValue, Duration, DurationUnit, TimeOfDay, Zone, SECONDS_PER_DAY};

use crate::arithmetic::{self, BinaryOp};
use crate::error::ValueError;
use crate::format::{format_amount, format_number, DisplayOptions};
use crate::options::Tolerance;
use crate::quantity::{Quantity, UnitProduct};
use std::fmt;

/// The kind of a value, without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Number,
    Percentage,
    Currency,
    Quantity,
    CurrencyQuantity,
    Date,
    Time,
    Duration,
    List,
    Symbolic,
    Error,
}

impl ValueKind {
    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::Number => "number",
            ValueKind::Percentage => "percentage",
            ValueKind::Currency => "currency",
            ValueKind::Quantity => "quantity",
            ValueKind::CurrencyQuantity => "currency quantity",
            ValueKind::Date => "date",
            ValueKind::Time => "time",
            ValueKind::Duration => "duration",
            ValueKind::List => "list",
            ValueKind::Symbolic => "symbolic",
            ValueKind::Error => "error",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value that knows what it means
///
/// Values are immutable; every operation returns a new value, and failures
/// are values too ([`Value::Error`]).
#[derive(Debug, Clone)]
pub enum Value {
    /// Finite real number
    Number(f64),
    Percentage(Percentage),
    Currency(Money),
    /// Scalar with a unit; never dimensionless
    Quantity(Quantity),
    CurrencyQuantity(CurrencyQuantity),
    Date(DateValue),
    Time(TimeOfDay),
    Duration(Duration),
    List(List),
    /// Unevaluated expression text
    Symbolic(String),
    Error(ValueError),
}

impl Value {
    /// Create a number.
    ///
    /// # Panics
    ///
    /// Panics if `n` is NaN or infinite; use [`Value::checked_number`] for
    /// computed results.
    pub fn number(n: f64) -> Self {
        assert!(n.is_finite(), "Value::number requires a finite input, got {}", n);
        Value::Number(n)
    }

    /// Create a number, or a runtime error if `n` is not finite
    pub fn checked_number(n: f64) -> Self {
        if n.is_finite() {
            Value::Number(n)
        } else {
            Value::Error(ValueError::runtime(format!(
                "result is not a finite number ({})",
                n
            )))
        }
    }

    pub fn percentage(display: f64) -> Self {
        Value::Percentage(Percentage::new(display))
    }

    pub fn currency(code: CurrencyCode, amount: f64) -> Self {
        Value::Currency(Money::new(code, amount))
    }

    /// Wrap a quantity, demoting it to a number when its unit cancels out
    pub fn from_quantity(quantity: Quantity) -> Self {
        if quantity.is_dimensionless() {
            return Value::checked_number(quantity.value() * quantity.unit().si_factor());
        }
        if !quantity.value().is_finite() {
            return Value::checked_number(quantity.value());
        }
        Value::Quantity(quantity)
    }

    pub(crate) fn from_unit_product(product: UnitProduct) -> Self {
        match product {
            UnitProduct::Quantity(q) => Value::from_quantity(q),
            UnitProduct::Dimensionless(n) => Value::checked_number(n),
        }
    }

    pub fn list(values: Vec<Value>) -> Self {
        Value::List(List::new(values))
    }

    pub fn symbolic<S: Into<String>>(expression: S) -> Self {
        Value::Symbolic(expression.into())
    }

    pub fn error(error: ValueError) -> Self {
        Value::Error(error)
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Number(_) => ValueKind::Number,
            Value::Percentage(_) => ValueKind::Percentage,
            Value::Currency(_) => ValueKind::Currency,
            Value::Quantity(_) => ValueKind::Quantity,
            Value::CurrencyQuantity(_) => ValueKind::CurrencyQuantity,
            Value::Date(_) => ValueKind::Date,
            Value::Time(_) => ValueKind::Time,
            Value::Duration(_) => ValueKind::Duration,
            Value::List(_) => ValueKind::List,
            Value::Symbolic(_) => ValueKind::Symbolic,
            Value::Error(_) => ValueKind::Error,
        }
    }

    /// Lowercase kind name, as used in error messages
    pub fn type_name(&self) -> &'static str {
        self.kind().name()
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    pub fn as_error(&self) -> Option<&ValueError> {
        match self {
            Value::Error(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&List> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    /// The bare scalar of a scalar kind: the number, the percentage's
    /// display number, the money amount, the quantity's value in its own
    /// unit, or a duration's length in seconds.
    pub fn magnitude(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Percentage(p) => Some(p.display_value()),
            Value::Currency(m) => Some(m.amount),
            Value::Quantity(q) => Some(q.value()),
            Value::CurrencyQuantity(cq) => Some(cq.amount),
            Value::Duration(d) => Some(d.total_seconds()),
            _ => None,
        }
    }

    /// Apply `f` to the scalar while keeping kind, unit and currency
    pub fn map_magnitude(&self, f: impl Fn(f64) -> f64 + Copy) -> Value {
        match self {
            Value::Number(n) => Value::checked_number(f(*n)),
            Value::Percentage(p) => {
                Value::Percentage(Percentage::new(f(p.display_value())).with_context(p.context()))
            }
            Value::Currency(m) => Value::Currency(m.with_amount(f(m.amount))),
            Value::Quantity(q) => Value::from_quantity(q.scaled(f(q.value()))),
            Value::CurrencyQuantity(cq) => Value::CurrencyQuantity(cq.with_amount(f(cq.amount))),
            Value::Duration(d) => Value::Duration(d.map(f)),
            Value::List(list) => Value::List(list.map(|v| v.map_magnitude(f))),
            Value::Error(e) => Value::Error(ValueError::propagated(e)),
            other => Value::Error(ValueError::type_mismatch("a number", other.type_name())),
        }
    }

    pub fn negate(&self) -> Value {
        match self {
            Value::Symbolic(s) => Value::Symbolic(format!("-({})", s)),
            other => other.map_magnitude(|v| -v),
        }
    }

    pub fn abs(&self) -> Value {
        self.map_magnitude(f64::abs)
    }

    pub fn add(&self, other: &Value) -> Value {
        arithmetic::apply(BinaryOp::Add, self, other)
    }

    pub fn subtract(&self, other: &Value) -> Value {
        arithmetic::apply(BinaryOp::Subtract, self, other)
    }

    pub fn multiply(&self, other: &Value) -> Value {
        arithmetic::apply(BinaryOp::Multiply, self, other)
    }

    pub fn divide(&self, other: &Value) -> Value {
        arithmetic::apply(BinaryOp::Divide, self, other)
    }

    pub fn power(&self, exponent: f64) -> Value {
        arithmetic::power(self, exponent)
    }

    /// Compare two values of the same kind; scalars within `tolerance`.
    /// Values of different kinds are never equal.
    pub fn equals(&self, other: &Value, tolerance: Tolerance) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => tolerance.approx_eq(*a, *b),
            (Value::Percentage(a), Value::Percentage(b)) => {
                tolerance.approx_eq(a.display_value(), b.display_value())
            }
            (Value::Currency(a), Value::Currency(b)) => {
                a.code == b.code && tolerance.approx_eq(a.amount, b.amount)
            }
            (Value::Quantity(a), Value::Quantity(b)) => a.approx_eq(b, tolerance),
            (Value::CurrencyQuantity(a), Value::CurrencyQuantity(b)) => {
                a.code == b.code
                    && b
                        .effective_unit()
                        .convert_value(b.amount, &a.effective_unit())
                        .map(|amount| tolerance.approx_eq(a.amount, amount))
                        .unwrap_or(false)
            }
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Time(a), Value::Time(b)) => {
                a.day_offset() == b.day_offset() && tolerance.approx_eq(a.seconds(), b.seconds())
            }
            (Value::Duration(a), Value::Duration(b)) => {
                tolerance.approx_eq(a.total_seconds(), b.total_seconds())
            }
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b.iter()).all(|(x, y)| x.equals(y, tolerance))
            }
            (Value::Symbolic(a), Value::Symbolic(b)) => a == b,
            (Value::Error(a), Value::Error(b)) => {
                a.kind() == b.kind() && a.message() == b.message()
            }
            _ => false,
        }
    }

    /// Render the value; the result reads back through [`crate::parse`]
    /// for numbers, percentages, money and quantities.
    pub fn to_display(&self, options: &DisplayOptions) -> String {
        match self {
            Value::Number(n) => format_number(*n, options),
            Value::Percentage(p) => format!("{}%", format_number(p.display_value(), options)),
            Value::Currency(m) => money(m, options),
            Value::Quantity(q) => {
                let q = if options.prefer_base_unit {
                    q.to_base()
                } else {
                    q.clone()
                };
                format!("{} {}", format_number(q.value(), options), q.unit())
            }
            Value::CurrencyQuantity(cq) => {
                let price = money(&Money::new(cq.code, cq.amount), options);
                let unit = cq.unit.to_string();
                match (cq.per, cq.unit.terms().len()) {
                    (true, 1) => format!("{}/{}", price, unit),
                    (true, _) => format!("{}/({})", price, unit),
                    (false, _) => format!("{}*{}", price, unit),
                }
            }
            Value::Date(d) => d.to_display(options),
            Value::Time(t) => t.to_string(),
            Value::Duration(d) => d.to_display(options),
            Value::List(list) => {
                let items: Vec<String> = list.iter().map(|v| v.to_display(options)).collect();
                format!("[{}]", items.join(", "))
            }
            Value::Symbolic(s) => s.clone(),
            Value::Error(e) => format!("Error: {}", e.describe()),
        }
    }
}

fn money(m: &Money, options: &DisplayOptions) -> String {
    let sign = if m.amount < 0.0 { "-" } else { "" };
    let amount = format_amount(m.amount.abs(), options);
    match m.code.symbol_char() {
        Some(symbol) => format!("{}{}{}", sign, symbol, amount),
        None => format!("{}{} {}", sign, m.code.code(), amount),
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other, Tolerance::default())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display(&DisplayOptions::default()))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::checked_number(n)
    }
}

impl From<ValueError> for Value {
    fn from(e: ValueError) -> Self {
        Value::Error(e)
    }
}

impl From<Quantity> for Value {
    fn from(q: Quantity) -> Self {
        Value::from_quantity(q)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn q(value: f64, unit: &str) -> Value {
        Value::from_quantity(Quantity::new(value, unit).unwrap())
    }

    #[test]
    #[should_panic(expected = "finite")]
    fn test_number_rejects_nan() {
        let _ = Value::number(f64::NAN);
    }

    #[test]
    fn test_checked_number() {
        assert_eq!(Value::checked_number(2.0), Value::Number(2.0));
        let err = Value::checked_number(f64::INFINITY);
        assert_eq!(err.as_error().map(|e| e.kind()), Some(ErrorKind::Runtime));
    }

    #[test]
    fn test_cross_kind_never_equal() {
        assert_ne!(Value::Number(20.0), Value::percentage(20.0));
        assert_ne!(Value::Number(5.0), Value::currency(CurrencyCode::Usd, 5.0));
        assert_ne!(
            Value::currency(CurrencyCode::Usd, 5.0),
            Value::currency(CurrencyCode::Eur, 5.0)
        );
    }

    #[test]
    fn test_tolerant_equality() {
        assert_eq!(Value::Number(0.1 + 0.2), Value::Number(0.3));
        assert_eq!(q(1.0, "km"), q(1000.0, "m"));
        assert_ne!(q(1.0, "km"), q(1.0, "kg"));
    }

    #[test]
    fn test_dimensionless_quantity_demotes() {
        let v = Value::from_quantity(Quantity::new(3.0, "km/m").unwrap());
        assert_eq!(v, Value::Number(3000.0));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Number(1.5).to_string(), "1.5");
        assert_eq!(Value::percentage(12.5).to_string(), "12.5%");
        assert_eq!(Value::currency(CurrencyCode::Usd, 12.5).to_string(), "$12.50");
        assert_eq!(Value::currency(CurrencyCode::Eur, -5.0).to_string(), "-€5");
        assert_eq!(Value::currency(CurrencyCode::Chf, 20.0).to_string(), "CHF 20");
        assert_eq!(q(9.8, "m/s^2").to_string(), "9.8 m/s^2");
        assert_eq!(
            Value::list(vec![Value::Number(1.0), Value::percentage(5.0)]).to_string(),
            "[1, 5%]"
        );
    }

    #[test]
    fn test_display_prefer_base_unit() {
        let options = DisplayOptions {
            prefer_base_unit: true,
            ..DisplayOptions::default()
        };
        assert_eq!(q(2.0, "km").to_display(&options), "2000 m");
    }

    #[test]
    fn test_map_magnitude_keeps_kind() {
        let rounded = Value::currency(CurrencyCode::Usd, 12.345).map_magnitude(f64::round);
        assert_eq!(rounded, Value::currency(CurrencyCode::Usd, 12.0));
        assert_eq!(q(-3.0, "m").abs(), q(3.0, "m"));
        assert_eq!(
            Value::symbolic("x").negate(),
            Value::symbolic("-(x)")
        );
        assert!(Value::Date(DateValue::new(chrono::NaiveDate::MIN))
            .negate()
            .is_error());
    }
}
