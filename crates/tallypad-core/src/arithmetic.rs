//! Pair-indexed arithmetic between value kinds
//!
//! [`apply`] is the single rule table for `+ - × ÷`. Rules are tried top to
//! bottom:
//!
//! 1. an `Error` operand propagates
//! 2. a `List` operand broadcasts
//! 3. a `Symbolic` operand builds a larger expression
//! 4. numbers and percentages
//! 5. money, then priced quantities, then physical quantities
//! 6. durations
//!
//! Anything left over is a type error. Date and time arithmetic is not
//! handled here; see [`crate::calendar`].

use crate::error::ValueError;
use crate::list;
use crate::quantity::Quantity;
use crate::value::{CurrencyQuantity, Duration, Money, Percentage, Value};
use std::fmt;

/// A binary arithmetic operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Subtract => "subtract",
            BinaryOp::Multiply => "multiply",
            BinaryOp::Divide => "divide",
        }
    }

    fn is_additive(&self) -> bool {
        matches!(self, BinaryOp::Add | BinaryOp::Subtract)
    }

    fn scalar(&self, a: f64, b: f64) -> f64 {
        match self {
            BinaryOp::Add => a + b,
            BinaryOp::Subtract => a - b,
            BinaryOp::Multiply => a * b,
            BinaryOp::Divide => a / b,
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

fn division_by_zero() -> Value {
    Value::Error(ValueError::runtime("division by zero"))
}

fn mismatch(op: BinaryOp, lhs: &Value, rhs: &Value) -> Value {
    Value::Error(ValueError::incompatible_kinds(
        op.verb(),
        lhs.type_name(),
        rhs.type_name(),
    ))
}

/// Apply `op` to two values
pub fn apply(op: BinaryOp, lhs: &Value, rhs: &Value) -> Value {
    use Value::*;

    match (lhs, rhs) {
        (Error(e), _) | (_, Error(e)) => Error(ValueError::propagated(e)),
        (List(_), _) | (_, List(_)) => list::broadcast(op, lhs, rhs),
        (Symbolic(_), _) | (_, Symbolic(_)) => Symbolic(format!(
            "({} {} {})",
            symbolic_operand(lhs),
            op.symbol(),
            symbolic_operand(rhs)
        )),
        (Number(a), Number(b)) => {
            if op == BinaryOp::Divide && *b == 0.0 {
                return division_by_zero();
            }
            Value::checked_number(op.scalar(*a, *b))
        }
        (Number(_) | Percentage(_), Number(_) | Percentage(_)) => percentages(op, lhs, rhs),
        (Currency(_), _) | (_, Currency(_)) => money(op, lhs, rhs),
        (CurrencyQuantity(_), _) | (_, CurrencyQuantity(_)) => priced(op, lhs, rhs),
        (Quantity(_), _) | (_, Quantity(_)) => quantities(op, lhs, rhs),
        (Duration(_), _) | (_, Duration(_)) => durations(op, lhs, rhs),
        _ => mismatch(op, lhs, rhs),
    }
}

fn symbolic_operand(value: &Value) -> String {
    match value {
        Value::Symbolic(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Number and percentage pairs (at least one percentage)
fn percentages(op: BinaryOp, lhs: &Value, rhs: &Value) -> Value {
    use Value::{Number, Percentage as Pct};

    let pct = |display: f64| {
        if display.is_finite() {
            Pct(Percentage::new(display))
        } else {
            Value::checked_number(display)
        }
    };

    match (op, lhs, rhs) {
        // additive forms work on the number in front of the % sign
        (BinaryOp::Add | BinaryOp::Subtract, Number(a), Pct(p)) => {
            pct(op.scalar(*a, p.display_value()))
        }
        (BinaryOp::Add | BinaryOp::Subtract, Pct(p), Number(b)) => {
            pct(op.scalar(p.display_value(), *b))
        }
        (BinaryOp::Add | BinaryOp::Subtract, Pct(p), Pct(q)) => {
            pct(op.scalar(p.display_value(), q.display_value()))
        }
        (BinaryOp::Multiply, Number(n), Pct(p)) | (BinaryOp::Multiply, Pct(p), Number(n)) => {
            Value::checked_number(n * p.decimal())
        }
        (BinaryOp::Multiply, Pct(p), Pct(q)) => pct(p.decimal() * q.decimal() * 100.0),
        (BinaryOp::Divide, Pct(p), Number(n)) => {
            if *n == 0.0 {
                return division_by_zero();
            }
            pct(p.display_value() / n)
        }
        (BinaryOp::Divide, Number(n), Pct(p)) => {
            if p.display_value() == 0.0 {
                return division_by_zero();
            }
            Value::checked_number(n / p.decimal())
        }
        (BinaryOp::Divide, Pct(p), Pct(q)) => {
            if q.display_value() == 0.0 {
                return division_by_zero();
            }
            Value::checked_number(p.display_value() / q.display_value())
        }
        _ => mismatch(op, lhs, rhs),
    }
}

fn currency_value(code: crate::value::CurrencyCode, amount: f64) -> Value {
    if amount.is_finite() {
        Value::Currency(Money::new(code, amount))
    } else {
        Value::checked_number(amount)
    }
}

fn mixed_currencies(op: BinaryOp, a: &Money, b: &Money) -> Value {
    Value::Error(
        ValueError::semantic(format!(
            "cannot {} {} and {}: different currencies",
            op.verb(),
            a.code.symbol(),
            b.code.symbol()
        ))
        .with_suggestion("convert one amount to the other currency first"),
    )
}

/// Pairs with at least one money operand
fn money(op: BinaryOp, lhs: &Value, rhs: &Value) -> Value {
    use BinaryOp::*;
    use Value::{Currency, CurrencyQuantity as Priced, Number, Percentage as Pct, Quantity as Qty};

    match (op, lhs, rhs) {
        (_, Currency(a), Currency(b)) => match op {
            Add | Subtract if a.code == b.code => currency_value(a.code, op.scalar(a.amount, b.amount)),
            Add | Subtract => mixed_currencies(op, a, b),
            Divide if a.code != b.code => mixed_currencies(op, a, b),
            Divide if b.amount == 0.0 => division_by_zero(),
            Divide => Value::checked_number(a.amount / b.amount),
            Multiply => Value::Error(
                ValueError::type_mismatch("a number", "currency")
                    .with_message("cannot multiply two amounts of money"),
            ),
        },

        (Add | Subtract | Multiply, Currency(m), Number(n)) => {
            currency_value(m.code, op.scalar(m.amount, *n))
        }
        (Divide, Currency(m), Number(n)) => {
            if *n == 0.0 {
                return division_by_zero();
            }
            currency_value(m.code, m.amount / n)
        }
        (Add | Subtract | Multiply, Number(n), Currency(m)) => {
            currency_value(m.code, op.scalar(*n, m.amount))
        }
        (Divide, Number(_), Currency(_)) => Value::Error(
            ValueError::type_mismatch("a number", "currency")
                .with_message("cannot divide a number by an amount of money"),
        ),

        (Add | Subtract, Currency(_), Pct(_)) | (Add | Subtract, Pct(_), Currency(_)) => {
            Value::Error(
                ValueError::semantic(format!(
                    "cannot {} a percentage and an amount of money",
                    op.verb()
                ))
                .with_suggestion("use 'p on x' or 'p off x' to increase or decrease an amount"),
            )
        }
        (Multiply, Currency(m), Pct(p)) | (Multiply, Pct(p), Currency(m)) => {
            currency_value(m.code, m.amount * p.decimal())
        }
        (Divide, Currency(m), Pct(p)) => {
            if p.display_value() == 0.0 {
                return division_by_zero();
            }
            currency_value(m.code, m.amount / p.decimal())
        }

        (Multiply, Currency(m), Qty(q)) | (Multiply, Qty(q), Currency(m)) => {
            CurrencyQuantity::from_effective(m.code, m.amount * q.value(), q.unit().clone())
        }
        (Divide, Currency(m), Qty(q)) => {
            if q.value() == 0.0 {
                return division_by_zero();
            }
            CurrencyQuantity::from_effective(m.code, m.amount / q.value(), q.unit().inverse())
        }

        (Divide, Currency(m), Priced(cq)) => {
            if m.code != cq.code {
                return mixed_currencies(op, m, &Money::new(cq.code, cq.amount));
            }
            if cq.amount == 0.0 {
                return division_by_zero();
            }
            Value::from_quantity(Quantity::with_unit(
                m.amount / cq.amount,
                cq.effective_unit().inverse(),
            ))
        }
        (Divide, Priced(cq), Currency(m)) => {
            if m.code != cq.code {
                return mixed_currencies(op, &Money::new(cq.code, cq.amount), m);
            }
            if m.amount == 0.0 {
                return division_by_zero();
            }
            Value::from_quantity(Quantity::with_unit(cq.amount / m.amount, cq.effective_unit()))
        }

        _ => mismatch(op, lhs, rhs),
    }
}

/// Pairs with a priced quantity and no plain money
fn priced(op: BinaryOp, lhs: &Value, rhs: &Value) -> Value {
    use BinaryOp::*;
    use Value::{CurrencyQuantity as Priced, Number, Percentage as Pct, Quantity as Qty};

    let finite = |cq: CurrencyQuantity| {
        if cq.amount.is_finite() {
            Value::CurrencyQuantity(cq)
        } else {
            Value::checked_number(cq.amount)
        }
    };

    match (op, lhs, rhs) {
        (Multiply, Priced(cq), Qty(q)) | (Multiply, Qty(q), Priced(cq)) => {
            let (unit, scale) = cq.effective_unit().multiply(q.unit());
            CurrencyQuantity::from_effective(cq.code, cq.amount * q.value() * scale, unit)
        }
        (Divide, Priced(cq), Qty(q)) => {
            if q.value() == 0.0 {
                return division_by_zero();
            }
            let (unit, scale) = cq.effective_unit().divide(q.unit());
            CurrencyQuantity::from_effective(cq.code, cq.amount / q.value() * scale, unit)
        }

        (Multiply, Priced(cq), Number(n)) | (Multiply, Number(n), Priced(cq)) => {
            finite(cq.with_amount(cq.amount * n))
        }
        (Divide, Priced(cq), Number(n)) => {
            if *n == 0.0 {
                return division_by_zero();
            }
            finite(cq.with_amount(cq.amount / n))
        }
        (Multiply, Priced(cq), Pct(p)) | (Multiply, Pct(p), Priced(cq)) => {
            finite(cq.with_amount(cq.amount * p.decimal()))
        }

        (Add | Subtract, Priced(a), Priced(b)) => {
            if a.code != b.code {
                return mixed_currencies(
                    op,
                    &Money::new(a.code, a.amount),
                    &Money::new(b.code, b.amount),
                );
            }
            match b.effective_unit().convert_value(b.amount, &a.effective_unit()) {
                Ok(amount) => finite(a.with_amount(op.scalar(a.amount, amount))),
                Err(_) => Value::Error(ValueError::semantic(format!(
                    "cannot {} {} and {}: incompatible units",
                    op.verb(),
                    Priced(a.clone()),
                    Priced(b.clone())
                ))),
            }
        }
        (Divide, Priced(a), Priced(b)) => {
            if a.code != b.code {
                return mixed_currencies(
                    op,
                    &Money::new(a.code, a.amount),
                    &Money::new(b.code, b.amount),
                );
            }
            if b.amount == 0.0 {
                return division_by_zero();
            }
            let (unit, scale) = a.effective_unit().divide(&b.effective_unit());
            Value::from_quantity(Quantity::with_unit(a.amount / b.amount * scale, unit))
        }

        _ => mismatch(op, lhs, rhs),
    }
}

/// Pairs with a physical quantity and no money
fn quantities(op: BinaryOp, lhs: &Value, rhs: &Value) -> Value {
    use BinaryOp::*;
    use Value::{Number, Percentage as Pct, Quantity as Qty};

    match (op, lhs, rhs) {
        (Add | Subtract, Qty(a), Qty(b)) => match b.value_in(a.unit()) {
            Ok(v) => Value::from_quantity(a.scaled(op.scalar(a.value(), v))),
            Err(_) => Value::Error(
                ValueError::semantic(format!(
                    "cannot {} {} and {}: incompatible units",
                    op.verb(),
                    a.unit(),
                    b.unit()
                ))
                .with_suggestion("both sides need the same kind of unit"),
            ),
        },
        (Multiply, Qty(a), Qty(b)) => Value::from_unit_product(a.multiply(b)),
        (Divide, Qty(a), Qty(b)) => {
            if b.value() == 0.0 {
                return division_by_zero();
            }
            Value::from_unit_product(a.divide(b))
        }

        (Add | Subtract | Multiply, Qty(q), Number(n)) => {
            Value::from_quantity(q.scaled(op.scalar(q.value(), *n)))
        }
        (Add | Subtract | Multiply, Number(n), Qty(q)) => {
            Value::from_quantity(q.scaled(op.scalar(*n, q.value())))
        }
        (Divide, Qty(q), Number(n)) => {
            if *n == 0.0 {
                return division_by_zero();
            }
            Value::from_quantity(q.scaled(q.value() / n))
        }
        (Divide, Number(n), Qty(q)) => {
            if q.value() == 0.0 {
                return division_by_zero();
            }
            Value::from_quantity(q.reciprocal().scaled(n / q.value()))
        }

        (Multiply, Qty(q), Pct(p)) | (Multiply, Pct(p), Qty(q)) => {
            Value::from_quantity(q.scaled(q.value() * p.decimal()))
        }
        (Divide, Qty(q), Pct(p)) => {
            if p.display_value() == 0.0 {
                return division_by_zero();
            }
            Value::from_quantity(q.scaled(q.value() / p.decimal()))
        }
        (Add | Subtract, Qty(_), Pct(_)) | (Add | Subtract, Pct(_), Qty(_)) => Value::Error(
            ValueError::semantic(format!(
                "cannot {} a percentage and a quantity",
                op.verb()
            ))
            .with_suggestion("use 'p on x' or 'p off x' to increase or decrease a quantity"),
        ),

        _ => mismatch(op, lhs, rhs),
    }
}

/// Pairs with a duration; only duration ± duration and scaling are defined
fn durations(op: BinaryOp, lhs: &Value, rhs: &Value) -> Value {
    use BinaryOp::*;
    use Value::{Duration as Dur, Number};

    let scaled = |d: &Duration, factor: f64| {
        if factor.is_finite() {
            Dur(d.scaled(factor))
        } else {
            Value::checked_number(factor)
        }
    };

    match (op, lhs, rhs) {
        (Add, Dur(a), Dur(b)) => Dur(a.plus(b)),
        (Subtract, Dur(a), Dur(b)) => Dur(a.plus(&b.negated())),
        (Multiply, Dur(d), Number(n)) | (Multiply, Number(n), Dur(d)) => scaled(d, *n),
        (Divide, Dur(d), Number(n)) => {
            if *n == 0.0 {
                return division_by_zero();
            }
            scaled(d, 1.0 / n)
        }
        _ => mismatch(op, lhs, rhs),
    }
}

/// Raise a value to a real power
pub fn power(base: &Value, exponent: f64) -> Value {
    match base {
        Value::Error(e) => return Value::Error(ValueError::propagated(e)),
        Value::List(items) => return Value::List(items.map(|v| power(v, exponent))),
        Value::Symbolic(s) => return Value::Symbolic(format!("({})^{}", s, exponent)),
        _ => {}
    }
    if exponent == 1.0 {
        return base.clone();
    }

    match base {
        Value::Number(n) => {
            let result = n.powf(exponent);
            if result.is_nan() {
                Value::Error(ValueError::runtime(format!(
                    "{}^{} is not a real number",
                    n, exponent
                )))
            } else {
                Value::checked_number(result)
            }
        }
        Value::Percentage(_) | Value::Currency(_) | Value::Quantity(_) | Value::CurrencyQuantity(_)
            if exponent == 0.0 =>
        {
            Value::Number(1.0)
        }
        Value::Percentage(p) => {
            let display = p.decimal().powf(exponent) * 100.0;
            if display.is_finite() {
                Value::Percentage(Percentage::new(display))
            } else {
                Value::checked_number(display)
            }
        }
        Value::Currency(m) => Value::checked_number(m.amount.powf(exponent)),
        Value::Quantity(q) => match q.powf(exponent) {
            Ok(product) => Value::from_unit_product(product),
            Err(e) => Value::Error(ValueError::from(e)),
        },
        other => Value::Error(
            ValueError::type_mismatch("a number", other.type_name())
                .with_message(format!("cannot raise a {} to a power", other.type_name())),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::value::{CurrencyCode, DurationUnit};
    use pretty_assertions::assert_eq;

    fn n(v: f64) -> Value {
        Value::Number(v)
    }

    fn pct(v: f64) -> Value {
        Value::percentage(v)
    }

    fn usd(v: f64) -> Value {
        Value::currency(CurrencyCode::Usd, v)
    }

    fn eur(v: f64) -> Value {
        Value::currency(CurrencyCode::Eur, v)
    }

    fn q(v: f64, unit: &str) -> Value {
        Value::from_quantity(Quantity::new(v, unit).unwrap())
    }

    fn kind(v: &Value) -> Option<ErrorKind> {
        v.as_error().map(|e| e.kind())
    }

    #[test]
    fn test_numbers() {
        assert_eq!(n(2.0).add(&n(3.0)), n(5.0));
        assert_eq!(n(2.0).divide(&n(8.0)), n(0.25));
        let err = n(1.0).divide(&n(0.0));
        assert_eq!(kind(&err), Some(ErrorKind::Runtime));
        assert_eq!(err.as_error().unwrap().message(), "division by zero");
    }

    #[test]
    fn test_percentage_rules() {
        // additive forms act on the display number
        assert_eq!(n(5.0).add(&pct(20.0)), pct(25.0));
        assert_eq!(pct(20.0).subtract(&pct(5.0)), pct(15.0));
        // multiplication takes the portion
        assert_eq!(n(100.0).multiply(&pct(20.0)), n(20.0));
        assert_eq!(pct(20.0).multiply(&n(100.0)), n(20.0));
        assert_eq!(pct(20.0).multiply(&pct(50.0)), pct(10.0));
        assert_eq!(n(20.0).divide(&pct(20.0)), n(100.0));
        assert_eq!(pct(30.0).divide(&n(3.0)), pct(10.0));
        assert_eq!(pct(30.0).divide(&pct(15.0)), n(2.0));
    }

    #[test]
    fn test_currency_rules() {
        assert_eq!(usd(10.0).add(&usd(5.0)), usd(15.0));
        assert_eq!(usd(100.0).divide(&usd(25.0)), n(4.0));
        assert_eq!(usd(10.0).multiply(&pct(20.0)), usd(2.0));
        assert_eq!(n(3.0).multiply(&usd(2.5)), usd(7.5));

        let mixed = usd(10.0).add(&eur(5.0));
        assert_eq!(kind(&mixed), Some(ErrorKind::Semantic));
        let message = mixed.as_error().unwrap().message().to_string();
        assert!(message.contains('$') && message.contains('€'), "{}", message);

        assert_eq!(kind(&usd(10.0).add(&pct(5.0))), Some(ErrorKind::Semantic));
        assert_eq!(kind(&usd(2.0).multiply(&usd(3.0))), Some(ErrorKind::Type));
        assert_eq!(kind(&n(2.0).divide(&usd(3.0))), Some(ErrorKind::Type));
    }

    #[test]
    fn test_price_per_unit_cancels() {
        let price = usd(5.0).divide(&q(1.0, "kg"));
        assert!(matches!(&price, Value::CurrencyQuantity(cq) if cq.per));
        assert_eq!(price.to_string(), "$5/kg");

        assert_eq!(price.multiply(&q(3.0, "kg")), usd(15.0));
        assert_eq!(price.multiply(&q(500.0, "g")), usd(2.5));
        assert_eq!(usd(10.0).divide(&price), q(2.0, "kg"));
    }

    #[test]
    fn test_price_times_unit() {
        let cost = usd(5.0).multiply(&q(2.0, "h"));
        assert!(matches!(&cost, Value::CurrencyQuantity(cq) if !cq.per));
        assert_eq!(cost.divide(&q(2.0, "h")), usd(5.0));
    }

    #[test]
    fn test_quantity_rules() {
        assert_eq!(q(1.0, "km").add(&q(500.0, "m")), q(1.5, "km"));
        assert_eq!(q(3.0, "m").multiply(&q(4.0, "m")), q(12.0, "m^2"));
        assert_eq!(q(2.0, "km").divide(&q(500.0, "m")), n(4.0));
        assert_eq!(q(5.0, "kg").multiply(&n(2.0)), q(10.0, "kg"));
        assert_eq!(n(10.0).divide(&q(2.0, "s")), q(5.0, "s^-1"));

        let bad = q(1.0, "m").add(&q(1.0, "kg"));
        assert_eq!(kind(&bad), Some(ErrorKind::Semantic));
        assert!(bad.as_error().unwrap().message().contains("kg"));
    }

    #[test]
    fn test_duration_rules() {
        let h = Value::Duration(Duration::of(DurationUnit::Hours, 2.0));
        let m = Value::Duration(Duration::of(DurationUnit::Minutes, 30.0));
        let sum = h.add(&m);
        assert_eq!(sum.magnitude(), Some(9000.0));
        assert_eq!(h.multiply(&n(2.0)).magnitude(), Some(14_400.0));
        assert_eq!(kind(&h.multiply(&m)), Some(ErrorKind::Type));
        assert_eq!(kind(&h.add(&n(1.0))), Some(ErrorKind::Type));
    }

    #[test]
    fn test_error_propagates_with_cause() {
        let failed = n(1.0).divide(&n(0.0));
        let next = failed.add(&n(1.0));
        let err = next.as_error().unwrap();
        assert_eq!(err.kind(), ErrorKind::Runtime);
        assert_eq!(err.message(), "division by zero");
        assert_eq!(err.chain().count(), 2);
    }

    #[test]
    fn test_symbolic_builds_expression() {
        let x = Value::symbolic("x");
        assert_eq!(x.add(&n(1.0)), Value::symbolic("(x + 1)"));
        assert_eq!(n(2.0).multiply(&x), Value::symbolic("(2 * x)"));
    }

    #[test]
    fn test_power() {
        assert_eq!(n(2.0).power(10.0), n(1024.0));
        assert_eq!(usd(5.0).power(1.0), usd(5.0));
        assert_eq!(usd(5.0).power(0.0), n(1.0));
        assert_eq!(usd(5.0).power(2.0), n(25.0));
        assert_eq!(q(3.0, "m").power(2.0), q(9.0, "m^2"));
        assert_eq!(q(2.0, "m").power(0.0), n(1.0));
        assert_eq!(pct(50.0).power(2.0), pct(25.0));
        assert_eq!(kind(&q(4.0, "m").power(0.5)), Some(ErrorKind::Semantic));
        assert_eq!(kind(&n(-8.0).power(0.5)), Some(ErrorKind::Runtime));
        let d = Value::Duration(Duration::of(DurationUnit::Days, 1.0));
        assert_eq!(kind(&d.power(2.0)), Some(ErrorKind::Type));
    }

    #[test]
    fn test_power_beyond_exponent_limit() {
        let err = q(1.0, "m").power(128.0);
        assert_eq!(kind(&err), Some(ErrorKind::Semantic));
        assert!(err.as_error().unwrap().message().contains("too large"));
        assert_eq!(q(1.0, "m").power(127.0), q(1.0, "m^127"));
    }
}
