use super::aggregate::magnitudes;
use crate::error::ValueError;
use crate::options::Tolerance;
use crate::value::{List, Value};
use std::fmt;

/// Comparison used by `where` filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparator {
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
    Equal,
    NotEqual,
}

impl Comparator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparator::Greater => ">",
            Comparator::GreaterOrEqual => ">=",
            Comparator::Less => "<",
            Comparator::LessOrEqual => "<=",
            Comparator::Equal => "==",
            Comparator::NotEqual => "!=",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            ">" => Comparator::Greater,
            ">=" => Comparator::GreaterOrEqual,
            "<" => Comparator::Less,
            "<=" => Comparator::LessOrEqual,
            "==" | "=" => Comparator::Equal,
            "!=" | "<>" => Comparator::NotEqual,
            _ => return None,
        })
    }

    /// Check if `lhs <op> rhs` holds; equality is tolerance based
    pub fn holds(&self, lhs: f64, rhs: f64, tolerance: Tolerance) -> bool {
        let equal = tolerance.approx_eq(lhs, rhs);
        match self {
            Comparator::Greater => lhs > rhs && !equal,
            Comparator::GreaterOrEqual => lhs > rhs || equal,
            Comparator::Less => lhs < rhs && !equal,
            Comparator::LessOrEqual => lhs < rhs || equal,
            Comparator::Equal => equal,
            Comparator::NotEqual => !equal,
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Stable sort by magnitude; unit-bearing elements are compared in the
/// first element's unit and keep their own unit in the result.
pub fn sort(value: &Value, descending: bool) -> Value {
    let list = match value {
        Value::List(list) => list,
        Value::Error(e) => return Value::Error(ValueError::propagated(e)),
        other => return Value::Error(ValueError::type_mismatch("list", other.type_name())),
    };
    let keys = match magnitudes(list, "sort") {
        Ok(Some((_, keys))) => keys,
        Ok(None) => return Value::List(List::default()),
        Err(e) => return Value::Error(e),
    };

    let mut order: Vec<usize> = (0..keys.len()).collect();
    if descending {
        order.sort_by(|a, b| keys[*b].total_cmp(&keys[*a]));
    } else {
        order.sort_by(|a, b| keys[*a].total_cmp(&keys[*b]));
    }
    Value::List(order.into_iter().map(|i| list.items()[i].clone()).collect())
}

/// The magnitude of `item` to compare against `threshold`, in the
/// threshold's terms
fn comparable(item: &Value, threshold: &Value) -> Result<(f64, f64), ValueError> {
    let incompatible = || {
        ValueError::semantic(format!(
            "cannot compare {} with {}",
            item, threshold
        ))
    };
    match (item, threshold) {
        (Value::Error(e), _) => Err(ValueError::propagated(e)),
        (_, Value::Number(t)) => item
            .magnitude()
            .map(|m| (m, *t))
            .ok_or_else(|| ValueError::type_mismatch("a number", item.type_name())),
        (Value::Percentage(p), Value::Percentage(t)) => Ok((p.display_value(), t.display_value())),
        (Value::Currency(m), Value::Currency(t)) if m.code == t.code => Ok((m.amount, t.amount)),
        (Value::Quantity(q), Value::Quantity(t)) => t
            .value_in(q.unit())
            .map(|t| (q.value(), t))
            .map_err(|_| incompatible()),
        (Value::Duration(d), Value::Duration(t)) => Ok((d.total_seconds(), t.total_seconds())),
        _ => Err(incompatible()),
    }
}

/// Keep the elements for which `element <cmp> threshold` holds.
///
/// Nothing matching gives an empty list; a non-list input is an error.
pub fn filter(value: &Value, cmp: Comparator, threshold: &Value, tolerance: Tolerance) -> Value {
    let list = match value {
        Value::List(list) => list,
        Value::Error(e) => return Value::Error(ValueError::propagated(e)),
        other => {
            return Value::Error(
                ValueError::type_mismatch("list", other.type_name())
                    .with_message(format!("'where' needs a list, got a {}", other.type_name())),
            )
        }
    };
    if let Value::Error(e) = threshold {
        return Value::Error(ValueError::propagated(e));
    }

    let mut kept = Vec::new();
    for item in list.iter() {
        match comparable(item, threshold) {
            Ok((lhs, rhs)) => {
                if cmp.holds(lhs, rhs, tolerance) {
                    kept.push(item.clone());
                }
            }
            Err(e) => return Value::Error(e),
        }
    }
    Value::List(List::new(kept))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantity::Quantity;
    use crate::value::CurrencyCode;
    use pretty_assertions::assert_eq;

    fn nums(values: &[f64]) -> Value {
        Value::list(values.iter().map(|v| Value::Number(*v)).collect())
    }

    fn q(v: f64, unit: &str) -> Value {
        Value::from_quantity(Quantity::new(v, unit).unwrap())
    }

    #[test]
    fn test_sort_numbers() {
        let list = nums(&[3.0, 1.0, 2.0]);
        assert_eq!(sort(&list, false), nums(&[1.0, 2.0, 3.0]));
        assert_eq!(sort(&list, true), nums(&[3.0, 2.0, 1.0]));
    }

    #[test]
    fn test_sort_mixed_units_keeps_each_unit() {
        let list = Value::list(vec![q(1.0, "km"), q(20.0, "m"), q(3.0, "mm")]);
        let sorted = sort(&list, false);
        let items = sorted.as_list().unwrap().items();
        assert_eq!(items[0].to_string(), "3 mm");
        assert_eq!(items[2].to_string(), "1 km");
    }

    #[test]
    fn test_sort_is_stable() {
        let a = q(1.0, "km");
        let b = q(1000.0, "m");
        let sorted = sort(&Value::list(vec![a, b]), true);
        assert_eq!(sorted.as_list().unwrap().items()[0].to_string(), "1 km");
    }

    #[test]
    fn test_sort_rejects_numbers_mixed_with_units() {
        let list = Value::list(vec![Value::Number(1.0), q(1.0, "m")]);
        let err = sort(&list, false);
        assert!(err.as_error().unwrap().message().contains("plain numbers"));
    }

    #[test]
    fn test_filter() {
        let tol = Tolerance::default();
        let list = nums(&[5.0, 12.0, 8.0, 20.0]);
        assert_eq!(
            filter(&list, Comparator::Greater, &Value::Number(8.0), tol),
            nums(&[12.0, 20.0])
        );
        assert_eq!(
            filter(&list, Comparator::GreaterOrEqual, &Value::Number(8.0), tol),
            nums(&[12.0, 8.0, 20.0])
        );
        assert_eq!(
            filter(&list, Comparator::Greater, &Value::Number(100.0), tol),
            Value::list(vec![])
        );
        assert!(filter(&Value::Number(1.0), Comparator::Less, &Value::Number(0.0), tol).is_error());
    }

    #[test]
    fn test_filter_converts_threshold() {
        let tol = Tolerance::default();
        let list = Value::list(vec![q(500.0, "m"), q(2.0, "km")]);
        assert_eq!(
            filter(&list, Comparator::Greater, &q(1.0, "km"), tol),
            Value::list(vec![q(2.0, "km")])
        );
        assert!(filter(&list, Comparator::Greater, &q(1.0, "kg"), tol).is_error());

        let costs = Value::list(vec![
            Value::currency(CurrencyCode::Usd, 12.0),
            Value::currency(CurrencyCode::Usd, 9.0),
        ]);
        let cheap = filter(
            &costs,
            Comparator::Less,
            &Value::currency(CurrencyCode::Usd, 10.0),
            tol,
        );
        assert_eq!(cheap, Value::list(vec![Value::currency(CurrencyCode::Usd, 9.0)]));
        assert!(filter(
            &costs,
            Comparator::Less,
            &Value::currency(CurrencyCode::Eur, 10.0),
            tol
        )
        .is_error());
    }
}
