//! Statistical functions over lists

use crate::error::{FormulaError, FormulaResult};
use tallypad_core::list::{self, Aggregate};
use tallypad_core::{EngineOptions, Value, ValueError};

/// Gather the arguments into one list: a single list argument is used as
/// is, anything else is treated as the elements.
fn collect(args: &[Value]) -> Value {
    if let Some(error) = args.iter().find_map(Value::as_error) {
        return Value::Error(ValueError::propagated(error));
    }
    match args {
        [single @ Value::List(_)] => single.clone(),
        _ => Value::list(args.to_vec()),
    }
}

fn reduce(args: &[Value], kind: Aggregate) -> FormulaResult<Value> {
    Ok(list::aggregate(&collect(args), kind))
}

/// SUM function
pub fn fn_sum(args: &[Value], _options: &EngineOptions) -> FormulaResult<Value> {
    reduce(args, Aggregate::Sum)
}

/// MEAN / AVG / AVERAGE function
pub fn fn_mean(args: &[Value], _options: &EngineOptions) -> FormulaResult<Value> {
    reduce(args, Aggregate::Mean)
}

pub fn fn_median(args: &[Value], _options: &EngineOptions) -> FormulaResult<Value> {
    reduce(args, Aggregate::Median)
}

/// STDDEV function (sample)
pub fn fn_stddev(args: &[Value], _options: &EngineOptions) -> FormulaResult<Value> {
    reduce(args, Aggregate::StdDev)
}

pub fn fn_min(args: &[Value], _options: &EngineOptions) -> FormulaResult<Value> {
    reduce(args, Aggregate::Min)
}

pub fn fn_max(args: &[Value], _options: &EngineOptions) -> FormulaResult<Value> {
    reduce(args, Aggregate::Max)
}

/// RANGE function (max - min)
pub fn fn_range(args: &[Value], _options: &EngineOptions) -> FormulaResult<Value> {
    reduce(args, Aggregate::Range)
}

pub fn fn_count(args: &[Value], _options: &EngineOptions) -> FormulaResult<Value> {
    reduce(args, Aggregate::Count)
}

/// SORT(list, [order])
///
/// `order` is `asc`/`desc` (or the long forms), or a number whose sign
/// picks the direction.
pub fn fn_sort(args: &[Value], _options: &EngineOptions) -> FormulaResult<Value> {
    let descending = match args.get(1) {
        None => false,
        Some(Value::Error(e)) => return Ok(Value::Error(ValueError::propagated(e))),
        Some(Value::Symbolic(word)) => match word.to_lowercase().as_str() {
            "asc" | "ascending" => false,
            "desc" | "descending" => true,
            other => {
                return Err(FormulaError::Argument(format!(
                    "sort order must be asc or desc, not '{}'",
                    other
                )))
            }
        },
        Some(Value::Number(n)) => *n < 0.0,
        Some(other) => {
            return Err(FormulaError::Argument(format!(
                "sort order must be asc or desc, not a {}",
                other.type_name()
            )))
        }
    };
    Ok(list::sort(&args[0], descending))
}
