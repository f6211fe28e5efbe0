//! Date functions

use crate::error::FormulaResult;
use chrono::Local;
use tallypad_core::{DateValue, EngineOptions, Value};

/// TODAY function
pub fn fn_today(_args: &[Value], _options: &EngineOptions) -> FormulaResult<Value> {
    Ok(Value::Date(DateValue::new(Local::now().date_naive())))
}

/// NOW function
pub fn fn_now(_args: &[Value], _options: &EngineOptions) -> FormulaResult<Value> {
    let now = Local::now().naive_local();
    Ok(Value::Date(DateValue::new(now.date()).with_time(now.time())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tallypad_core::ValueKind;

    #[test]
    fn test_today_is_a_date() {
        let today = fn_today(&[], &EngineOptions::default()).unwrap();
        assert_eq!(today.kind(), ValueKind::Date);
        if let Value::Date(d) = today {
            assert!(d.time.is_none());
        }
    }

    #[test]
    fn test_now_has_a_time() {
        match fn_now(&[], &EngineOptions::default()).unwrap() {
            Value::Date(d) => assert!(d.time.is_some()),
            other => panic!("expected a date, got {:?}", other),
        }
    }
}
