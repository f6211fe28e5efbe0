//! Math functions
//!
//! All of these apply elementwise to lists.

use crate::error::{FormulaError, FormulaResult};
use tallypad_core::{EngineOptions, Value, ValueError};

/// Apply `f` to a scalar, or to every element of a list
fn elementwise(value: &Value, f: &dyn Fn(&Value) -> Value) -> Value {
    match value {
        Value::List(items) => Value::List(items.map(|v| elementwise(v, f))),
        Value::Error(e) => Value::Error(ValueError::propagated(e)),
        other => f(other),
    }
}

/// Apply `f` to a plain number; units make no sense for transcendental functions
fn plain(name: &'static str, value: &Value, f: impl Fn(f64) -> Result<f64, String>) -> Value {
    match value {
        Value::Number(n) => match f(*n) {
            Ok(result) => Value::checked_number(result),
            Err(message) => Value::Error(ValueError::runtime(message)),
        },
        Value::Percentage(p) => match f(p.decimal()) {
            Ok(result) => Value::checked_number(result),
            Err(message) => Value::Error(ValueError::runtime(message)),
        },
        other => Value::Error(
            ValueError::type_mismatch("number", other.type_name())
                .with_message(format!("{} expects a plain number, not a {}", name, other.type_name())),
        ),
    }
}

fn whole_digits(value: &Value) -> FormulaResult<i32> {
    match value {
        Value::Number(n) if n.fract() == 0.0 && n.abs() <= 15.0 => Ok(*n as i32),
        Value::Number(n) => Err(FormulaError::Argument(format!(
            "round digits must be a whole number between -15 and 15, not {}",
            n
        ))),
        other => Err(FormulaError::Argument(format!(
            "round digits must be a number, not a {}",
            other.type_name()
        ))),
    }
}

/// SQRT function
pub fn fn_sqrt(args: &[Value], _options: &EngineOptions) -> FormulaResult<Value> {
    Ok(elementwise(&args[0], &|v| {
        if v.magnitude().is_some_and(|m| m < 0.0) {
            Value::Error(ValueError::runtime("square root of a negative number"))
        } else {
            v.power(0.5)
        }
    }))
}

/// ABS function
pub fn fn_abs(args: &[Value], _options: &EngineOptions) -> FormulaResult<Value> {
    Ok(elementwise(&args[0], &Value::abs))
}

/// ROUND(x, [digits])
pub fn fn_round(args: &[Value], _options: &EngineOptions) -> FormulaResult<Value> {
    let digits = match args.get(1) {
        Some(Value::Error(e)) => return Ok(Value::Error(ValueError::propagated(e))),
        Some(value) => whole_digits(value)?,
        None => 0,
    };
    let factor = 10f64.powi(digits);
    Ok(elementwise(&args[0], &|v| {
        v.map_magnitude(|m| (m * factor).round() / factor)
    }))
}

pub fn fn_floor(args: &[Value], _options: &EngineOptions) -> FormulaResult<Value> {
    Ok(elementwise(&args[0], &|v| v.map_magnitude(f64::floor)))
}

pub fn fn_ceil(args: &[Value], _options: &EngineOptions) -> FormulaResult<Value> {
    Ok(elementwise(&args[0], &|v| v.map_magnitude(f64::ceil)))
}

/// LN function (natural logarithm)
pub fn fn_ln(args: &[Value], _options: &EngineOptions) -> FormulaResult<Value> {
    Ok(elementwise(&args[0], &|v| {
        plain("ln", v, |x| {
            if x <= 0.0 {
                Err("logarithm of a non-positive number".to_string())
            } else {
                Ok(x.ln())
            }
        })
    }))
}

/// LOG(x, [base]), base 10 by default
pub fn fn_log(args: &[Value], _options: &EngineOptions) -> FormulaResult<Value> {
    let base = match args.get(1) {
        None => 10.0,
        Some(Value::Error(e)) => return Ok(Value::Error(ValueError::propagated(e))),
        Some(Value::Number(b)) if *b > 0.0 && *b != 1.0 => *b,
        Some(other) => {
            return Err(FormulaError::Argument(format!(
                "log base must be a positive number other than 1, got {}",
                other
            )))
        }
    };
    Ok(elementwise(&args[0], &|v| {
        plain("log", v, |x| {
            if x <= 0.0 {
                Err("logarithm of a non-positive number".to_string())
            } else {
                Ok(x.log(base))
            }
        })
    }))
}

pub fn fn_exp(args: &[Value], _options: &EngineOptions) -> FormulaResult<Value> {
    Ok(elementwise(&args[0], &|v| plain("exp", v, |x| Ok(x.exp()))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tallypad_core::{parse, ErrorKind};

    fn call(f: fn(&[Value], &EngineOptions) -> FormulaResult<Value>, args: &[Value]) -> Value {
        f(args, &EngineOptions::default()).unwrap()
    }

    #[test]
    fn test_sqrt() {
        assert_eq!(call(fn_sqrt, &[Value::Number(16.0)]), Value::Number(4.0));
        assert_eq!(call(fn_sqrt, &[parse("9 m^2")]), parse("3 m"));
        let negative = call(fn_sqrt, &[Value::Number(-4.0)]);
        assert_eq!(negative.as_error().map(|e| e.kind()), Some(ErrorKind::Runtime));
    }

    #[test]
    fn test_round_keeps_kind() {
        assert_eq!(
            call(fn_round, &[Value::Number(3.14159), Value::Number(2.0)]),
            Value::Number(3.14)
        );
        assert_eq!(call(fn_round, &[parse("$12.6")]), parse("$13"));
        assert_eq!(call(fn_round, &[Value::Number(1234.0), Value::Number(-2.0)]), Value::Number(1200.0));
        assert!(fn_round(&[Value::Number(1.0), Value::Number(0.5)], &EngineOptions::default()).is_err());
    }

    #[test]
    fn test_floor_ceil_abs() {
        assert_eq!(call(fn_floor, &[Value::Number(2.7)]), Value::Number(2.0));
        assert_eq!(call(fn_ceil, &[Value::Number(2.1)]), Value::Number(3.0));
        assert_eq!(call(fn_abs, &[parse("-5 kg")]), parse("5 kg"));
    }

    #[test]
    fn test_logarithms() {
        assert_eq!(call(fn_log, &[Value::Number(1000.0)]), Value::Number(3.0));
        assert_eq!(call(fn_log, &[Value::Number(8.0), Value::Number(2.0)]), Value::Number(3.0));
        assert_eq!(call(fn_ln, &[Value::Number(1.0)]), Value::Number(0.0));
        assert!(call(fn_ln, &[Value::Number(0.0)]).is_error());
        assert!(call(fn_exp, &[parse("3 kg")]).is_error());
        assert!(fn_log(&[Value::Number(8.0), Value::Number(1.0)], &EngineOptions::default()).is_err());
    }

    #[test]
    fn test_lists_broadcast() {
        let data = Value::list(vec![Value::Number(1.4), Value::Number(2.6)]);
        assert_eq!(
            call(fn_round, &[data]),
            Value::list(vec![Value::Number(1.0), Value::Number(3.0)])
        );
    }
}
