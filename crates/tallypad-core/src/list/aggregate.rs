use crate::error::ValueError;
use crate::quantity::Quantity;
use crate::units::CompoundUnit;
use crate::value::{CurrencyCode, Duration, List, Money, Percentage, Value};
use std::fmt;

/// Aggregations over a list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aggregate {
    Sum,
    Mean,
    Median,
    /// Sample standard deviation
    StdDev,
    Min,
    Max,
    /// Max minus min
    Range,
    Count,
}

impl Aggregate {
    pub fn name(&self) -> &'static str {
        match self {
            Aggregate::Sum => "sum",
            Aggregate::Mean => "mean",
            Aggregate::Median => "median",
            Aggregate::StdDev => "stddev",
            Aggregate::Min => "min",
            Aggregate::Max => "max",
            Aggregate::Range => "range",
            Aggregate::Count => "count",
        }
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The common kind of a list's elements, and the unit their magnitudes are
/// expressed in
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Family {
    Numbers,
    Percentages,
    Currency(CurrencyCode),
    Quantity(CompoundUnit),
    Durations,
}

impl Family {
    fn of(value: &Value) -> Option<Family> {
        Some(match value {
            Value::Number(_) => Family::Numbers,
            Value::Percentage(_) => Family::Percentages,
            Value::Currency(m) => Family::Currency(m.code),
            Value::Quantity(q) => Family::Quantity(q.unit().clone()),
            Value::Duration(_) => Family::Durations,
            _ => return None,
        })
    }

    fn is_unit_bearing(&self) -> bool {
        matches!(self, Family::Quantity(_) | Family::Currency(_))
    }

    /// Magnitude of `value` in this family's unit
    fn magnitude(&self, value: &Value, action: &str) -> Result<f64, ValueError> {
        match (self, value) {
            (Family::Numbers, Value::Number(n)) => Ok(*n),
            (Family::Percentages, Value::Percentage(p)) => Ok(p.display_value()),
            (Family::Currency(code), Value::Currency(m)) if m.code == *code => Ok(m.amount),
            (Family::Currency(code), Value::Currency(m)) => Err(ValueError::semantic(format!(
                "cannot {} mixed currencies: {} and {}",
                action,
                code.symbol(),
                m.code.symbol()
            ))),
            (Family::Quantity(unit), Value::Quantity(q)) => q.value_in(unit).map_err(|_| {
                ValueError::semantic(format!(
                    "cannot {} incompatible units: {} and {}",
                    action,
                    unit,
                    q.unit()
                ))
            }),
            (Family::Durations, Value::Duration(d)) => Ok(d.total_seconds()),
            (family, other) => {
                let other_family = Family::of(other);
                let unit_mix = other_family
                    .as_ref()
                    .map(|f| f.is_unit_bearing() != family.is_unit_bearing())
                    .unwrap_or(false);
                let message = if unit_mix {
                    format!(
                        "cannot {} a mix of plain numbers and values with units",
                        action
                    )
                } else {
                    format!(
                        "cannot {} a mix of {} and {} values",
                        action,
                        family.kind_name(),
                        other.type_name()
                    )
                };
                Err(ValueError::semantic(message))
            }
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Family::Numbers => "number",
            Family::Percentages => "percentage",
            Family::Currency(_) => "currency",
            Family::Quantity(_) => "quantity",
            Family::Durations => "duration",
        }
    }

    /// Wrap a magnitude back into this family's kind
    fn wrap(&self, magnitude: f64) -> Value {
        if !magnitude.is_finite() {
            return Value::checked_number(magnitude);
        }
        match self {
            Family::Numbers => Value::Number(magnitude),
            Family::Percentages => Value::Percentage(Percentage::new(magnitude)),
            Family::Currency(code) => Value::Currency(Money::new(*code, magnitude)),
            Family::Quantity(unit) => {
                Value::from_quantity(Quantity::with_unit(magnitude, unit.clone()))
            }
            Family::Durations => Value::Duration(Duration::from_seconds(magnitude)),
        }
    }
}

/// Check a list is flat and of one family; return the family and every
/// element's magnitude in the family's unit.
pub(crate) fn magnitudes(list: &List, action: &str) -> Result<Option<(Family, Vec<f64>)>, ValueError> {
    if list.had_nested() {
        return Err(ValueError::semantic(format!(
            "cannot {} a nested list",
            action
        ))
        .with_suggestion("combine the lists explicitly first"));
    }
    if let Some(e) = list.iter().find_map(|v| v.as_error()) {
        return Err(ValueError::propagated(e));
    }
    let Some(first) = list.items().first() else {
        return Ok(None);
    };
    let family = Family::of(first).ok_or_else(|| {
        ValueError::type_mismatch("numeric values", first.type_name())
            .with_message(format!("cannot {} {} values", action, first.type_name()))
    })?;
    let values = list
        .iter()
        .map(|v| family.magnitude(v, action))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some((family, values)))
}

/// Aggregate a list into one value
pub fn aggregate(value: &Value, kind: Aggregate) -> Value {
    let list = match value {
        Value::List(list) => list,
        Value::Error(e) => return Value::Error(ValueError::propagated(e)),
        other => return Value::Error(ValueError::type_mismatch("list", other.type_name())),
    };

    let action = format!("take the {} of", kind.name());
    let (family, values) = match magnitudes(list, &action) {
        Ok(Some(found)) => found,
        Ok(None) => {
            return match kind {
                Aggregate::Sum | Aggregate::Count => Value::Number(0.0),
                _ => Value::Error(ValueError::runtime(format!(
                    "cannot take the {} of an empty list",
                    kind.name()
                ))),
            }
        }
        Err(e) => return Value::Error(e),
    };

    let n = values.len() as f64;
    let min = || values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = || values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let sum: f64 = values.iter().sum();

    let result = match kind {
        Aggregate::Count => return Value::Number(n),
        Aggregate::Sum => sum,
        Aggregate::Mean => sum / n,
        Aggregate::Median => {
            let mut sorted = values.clone();
            sorted.sort_by(f64::total_cmp);
            let mid = sorted.len() / 2;
            if sorted.len() % 2 == 0 {
                (sorted[mid - 1] + sorted[mid]) / 2.0
            } else {
                sorted[mid]
            }
        }
        Aggregate::StdDev => {
            if values.len() < 2 {
                return Value::Error(ValueError::runtime(
                    "stddev needs at least two values",
                ));
            }
            let mean = sum / n;
            let variance =
                values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
            variance.sqrt()
        }
        Aggregate::Min => min(),
        Aggregate::Max => max(),
        Aggregate::Range => max() - min(),
    };
    family.wrap(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;

    fn nums(values: &[f64]) -> Value {
        Value::list(values.iter().map(|v| Value::Number(*v)).collect())
    }

    fn q(v: f64, unit: &str) -> Value {
        Value::from_quantity(Quantity::new(v, unit).unwrap())
    }

    #[test]
    fn test_numeric_aggregates() {
        let list = nums(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(aggregate(&list, Aggregate::Sum), Value::Number(40.0));
        assert_eq!(aggregate(&list, Aggregate::Mean), Value::Number(5.0));
        assert_eq!(aggregate(&list, Aggregate::Median), Value::Number(4.5));
        assert_eq!(aggregate(&list, Aggregate::Min), Value::Number(2.0));
        assert_eq!(aggregate(&list, Aggregate::Max), Value::Number(9.0));
        assert_eq!(aggregate(&list, Aggregate::Range), Value::Number(7.0));
        assert_eq!(aggregate(&list, Aggregate::Count), Value::Number(8.0));
        // sample standard deviation: sqrt(32 / 7)
        assert_eq!(
            aggregate(&list, Aggregate::StdDev),
            Value::Number((32.0f64 / 7.0).sqrt())
        );
    }

    #[test]
    fn test_empty_list() {
        let empty = Value::list(vec![]);
        assert_eq!(aggregate(&empty, Aggregate::Sum), Value::Number(0.0));
        assert_eq!(aggregate(&empty, Aggregate::Count), Value::Number(0.0));
        assert!(aggregate(&empty, Aggregate::Mean).is_error());
        assert!(aggregate(&empty, Aggregate::Max).is_error());
    }

    #[test]
    fn test_units_convert_to_first() {
        let list = Value::list(vec![q(1.0, "km"), q(500.0, "m")]);
        assert_eq!(aggregate(&list, Aggregate::Sum), q(1.5, "km"));
    }

    #[test]
    fn test_currency_sum_and_conflict() {
        let usd = |v| Value::currency(CurrencyCode::Usd, v);
        let list = Value::list(vec![usd(12.0), usd(15.0), usd(9.0)]);
        assert_eq!(aggregate(&list, Aggregate::Sum), usd(36.0));

        let mixed = Value::list(vec![usd(1.0), Value::currency(CurrencyCode::Gbp, 2.0)]);
        let err = aggregate(&mixed, Aggregate::Sum);
        let err = err.as_error().unwrap();
        assert_eq!(err.kind(), ErrorKind::Semantic);
        assert!(err.message().contains('$') && err.message().contains('£'));
    }

    #[test]
    fn test_rejects_conflicts() {
        let mixed_units = Value::list(vec![q(1.0, "m"), q(1.0, "kg")]);
        assert!(aggregate(&mixed_units, Aggregate::Sum).is_error());

        let nested = Value::list(vec![nums(&[1.0, 2.0]), Value::Number(3.0)]);
        let err = aggregate(&nested, Aggregate::Sum);
        assert!(err.as_error().unwrap().message().contains("nested"));

        let with_error = Value::list(vec![
            Value::Number(1.0),
            Value::Number(1.0).divide(&Value::Number(0.0)),
        ]);
        let err = aggregate(&with_error, Aggregate::Sum);
        assert_eq!(err.as_error().unwrap().message(), "division by zero");

        assert!(aggregate(&Value::Number(3.0), Aggregate::Sum).is_error());
    }

    #[test]
    fn test_stddev_needs_two() {
        assert!(aggregate(&nums(&[1.0]), Aggregate::StdDev).is_error());
    }
}
