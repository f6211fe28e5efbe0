//! List and range engine
//!
//! This module contains:
//! - [`aggregate`] - sum, mean, median, stddev, min, max, range, count
//! - [`sort`] / [`filter`] - ordering and `where` filtering
//! - [`index`] / [`slice`] - 1-based element access
//! - [`broadcast`] - elementwise arithmetic
//! - [`generate_range`] - numeric, date and time ranges

mod aggregate;
mod range;
mod sort;

pub use aggregate::{aggregate, Aggregate};
pub use range::generate_range;
pub use sort::{filter, sort, Comparator};

use crate::arithmetic::{apply, BinaryOp};
use crate::error::ValueError;
use crate::value::{List, Value};

fn not_a_list(value: &Value) -> Value {
    match value {
        Value::Error(e) => Value::Error(ValueError::propagated(e)),
        other => Value::Error(ValueError::type_mismatch("list", other.type_name())),
    }
}

/// Turn a 1-based (or negative, from the end) position into an offset
fn resolve(position: i64, len: usize) -> Result<usize, ValueError> {
    let len_i = len as i64;
    let offset = match position {
        0 => return Err(ValueError::runtime("lists are indexed from 1")),
        p if p > 0 => p - 1,
        p => len_i + p,
    };
    if offset < 0 || offset >= len_i {
        return Err(ValueError::runtime(format!(
            "index {} is out of bounds for a list of {}",
            position, len
        )));
    }
    Ok(offset as usize)
}

/// Element at a 1-based position; negative positions count from the end
pub fn index(value: &Value, position: i64) -> Value {
    let Value::List(list) = value else {
        return not_a_list(value);
    };
    match resolve(position, list.len()) {
        Ok(i) => list.items()[i].clone(),
        Err(e) => Value::Error(e),
    }
}

/// Elements `start..=end` (1-based, negatives from the end).
///
/// A slice never reverses: `start` after `end` is an error.
pub fn slice(value: &Value, start: i64, end: i64) -> Value {
    let Value::List(list) = value else {
        return not_a_list(value);
    };
    let bounds = resolve(start, list.len()).and_then(|a| Ok((a, resolve(end, list.len())?)));
    match bounds {
        Ok((a, b)) if a > b => Value::Error(
            ValueError::runtime("range can't go downwards")
                .with_suggestion(format!("write [{}..{}] instead", end, start)),
        ),
        Ok((a, b)) => Value::List(List::new(list.items()[a..=b].to_vec())),
        Err(e) => Value::Error(e),
    }
}

/// Apply `op` elementwise: list with scalar, scalar with list, or two lists
/// of equal length.
pub fn broadcast(op: BinaryOp, lhs: &Value, rhs: &Value) -> Value {
    match (lhs, rhs) {
        (Value::List(a), Value::List(b)) => {
            if a.len() != b.len() {
                return Value::Error(ValueError::semantic(format!(
                    "cannot {} lists of different lengths ({} and {})",
                    op.verb(),
                    a.len(),
                    b.len()
                )));
            }
            Value::List(
                a.iter()
                    .zip(b.iter())
                    .map(|(x, y)| apply(op, x, y))
                    .collect(),
            )
        }
        (Value::List(a), scalar) => Value::List(a.map(|x| apply(op, x, scalar))),
        (scalar, Value::List(b)) => Value::List(b.map(|y| apply(op, scalar, y))),
        _ => apply(op, lhs, rhs),
    }
}
