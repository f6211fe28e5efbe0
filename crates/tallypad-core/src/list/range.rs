use crate::calendar;
use crate::error::ValueError;
use crate::value::{Duration, DurationUnit, List, Value};
use tracing::debug;

fn too_long(max_elements: usize) -> Value {
    debug!(max_elements, "range rejected");
    Value::Error(
        ValueError::runtime(format!(
            "range would have more than {} elements",
            max_elements
        ))
        .with_suggestion("use a larger step or a shorter range"),
    )
}

/// Largest magnitude a numeric range bound or step may have (2^53)
const MAX_WHOLE: f64 = 9_007_199_254_740_992.0;

fn as_whole(value: f64, what: &str) -> Result<i64, ValueError> {
    if value.abs() > MAX_WHOLE {
        return Err(ValueError::semantic(format!(
            "range {} is too large, got {}",
            what, value
        )));
    }
    if value.fract() != 0.0 {
        return Err(ValueError::semantic(format!(
            "range {} must be a whole number, got {}",
            what, value
        )));
    }
    Ok(value as i64)
}

/// Generate `start..end [step s]`.
///
/// Numeric ranges need whole-number endpoints and steps; the step defaults
/// to 1 (or -1 when counting down), must not be zero, and must point from
/// `start` towards `end`. Date ranges step by a duration (default one day)
/// and time ranges by a duration (default one hour). Ranges longer than
/// `max_elements` are an error rather than being cut short.
pub fn generate_range(start: &Value, end: &Value, step: Option<&Value>, max_elements: usize) -> Value {
    for v in [Some(start), Some(end), step].into_iter().flatten() {
        if let Value::Error(e) = v {
            return Value::Error(ValueError::propagated(e));
        }
    }
    let result = match (start, end) {
        (Value::Number(a), Value::Number(b)) => numeric(*a, *b, step, max_elements),
        (Value::Date(_), Value::Date(_)) => {
            temporal(start, end, step, DurationUnit::Days, max_elements)
        }
        (Value::Time(_), Value::Time(_)) => {
            temporal(start, end, step, DurationUnit::Hours, max_elements)
        }
        _ => Err(ValueError::incompatible_kinds(
            "make a range from",
            start.type_name(),
            end.type_name(),
        )),
    };
    result.unwrap_or_else(Value::Error)
}

fn numeric(start: f64, end: f64, step: Option<&Value>, max_elements: usize) -> Result<Value, ValueError> {
    let a = as_whole(start, "start")?;
    let b = as_whole(end, "end")?;
    let s = match step {
        None => {
            if a <= b {
                1
            } else {
                -1
            }
        }
        Some(Value::Number(s)) => as_whole(*s, "step")?,
        Some(other) => {
            return Err(ValueError::type_mismatch("a number", other.type_name())
                .with_message(format!("a numeric range needs a number step, got a {}", other.type_name())))
        }
    };
    if s == 0 {
        return Err(ValueError::semantic("range step can't be zero"));
    }
    if (b > a && s < 0) || (b < a && s > 0) {
        return Err(ValueError::semantic(format!(
            "step {} goes the wrong way for {}..{}",
            s, a, b
        ))
        .with_suggestion(format!("use step {}", -s)));
    }

    let count = match b.checked_sub(a).and_then(|span| span.checked_div(s)) {
        Some(steps) if steps < max_elements as i64 => steps + 1,
        _ => return Ok(too_long(max_elements)),
    };
    Ok(Value::List(
        (0..count).map(|i| Value::Number((a + i * s) as f64)).collect(),
    ))
}

fn shift(value: &Value, step: &Duration) -> Value {
    match value {
        Value::Date(d) => calendar::add_duration(d, step),
        Value::Time(t) => calendar::shift_time(t, step),
        other => other.clone(),
    }
}

/// Position on a common axis, for direction and end checks
fn position(value: &Value, start: &Value) -> f64 {
    match (value, start) {
        (Value::Date(d), Value::Date(s)) => calendar::difference(d, s).total_seconds(),
        (Value::Time(t), _) => t.absolute_seconds(),
        _ => 0.0,
    }
}

fn temporal(
    start: &Value,
    end: &Value,
    step: Option<&Value>,
    default_unit: DurationUnit,
    max_elements: usize,
) -> Result<Value, ValueError> {
    let origin = position(start, start);
    let target = position(end, start);
    let step = match step {
        None => {
            let sign = if target >= origin { 1.0 } else { -1.0 };
            Duration::of(default_unit, sign)
        }
        Some(Value::Duration(d)) => d.clone(),
        Some(other) => {
            return Err(ValueError::type_mismatch("duration", other.type_name())
                .with_message(format!("a {} range needs a duration step", start.type_name())))
        }
    };
    if step.is_zero() || step.total_seconds() == 0.0 {
        return Err(ValueError::semantic("range step can't be zero"));
    }

    let ascending = target >= origin;
    if ascending != (step.total_seconds() > 0.0) && target != origin {
        return Err(ValueError::semantic(format!(
            "step {} goes the wrong way for this range",
            step.to_display(&Default::default())
        )));
    }

    let mut items = Vec::new();
    let mut current = start.clone();
    loop {
        if let Value::Error(e) = &current {
            return Err(e.clone());
        }
        let at = position(&current, start);
        let past_end = if ascending { at > target } else { at < target };
        if past_end {
            break;
        }
        if items.len() >= max_elements {
            return Ok(too_long(max_elements));
        }
        let next = shift(&current, &step);
        items.push(current);
        current = next;
    }
    Ok(Value::List(List::new(items)))
}
