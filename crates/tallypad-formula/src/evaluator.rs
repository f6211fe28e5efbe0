//! Expression evaluator
//!
//! Evaluates expression ASTs to values. Evaluation never fails outright:
//! every problem becomes a [`Value::Error`].

use crate::ast::{ConversionTarget, Expr, PercentOperator, UnaryOperator};
use crate::error::FormulaError;
use crate::functions::registry;
use crate::parser::parse_expression;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::hash::BuildHasher;
use tallypad_core::units::{self, CompoundUnit, Dimension};
use tallypad_core::{
    arithmetic, calendar, list, BinaryOp, CurrencyCode, CurrencyQuantity, Duration, DurationUnit,
    EngineOptions, Quantity, Value, ValueError,
};
use tracing::trace;

static DEFAULT_OPTIONS: Lazy<EngineOptions> = Lazy::new(EngineOptions::default);

/// Names visible to an expression
pub trait Scope {
    /// Current value of a variable, if defined
    fn lookup(&self, name: &str) -> Option<Value>;

    /// Options applied while evaluating (tolerance, range limit)
    fn options(&self) -> &EngineOptions {
        &DEFAULT_OPTIONS
    }
}

/// A scope with no variables
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyScope;

impl Scope for EmptyScope {
    fn lookup(&self, _name: &str) -> Option<Value> {
        None
    }
}

impl<S: BuildHasher> Scope for HashMap<String, Value, S> {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

/// Extra bindings layered over another scope
pub struct Layered<'a> {
    parent: &'a dyn Scope,
    bindings: Vec<(String, Value)>,
}

impl<'a> Layered<'a> {
    pub fn new(parent: &'a dyn Scope) -> Self {
        Self {
            parent,
            bindings: Vec::new(),
        }
    }

    pub fn bind<S: Into<String>>(mut self, name: S, value: Value) -> Self {
        self.bindings.push((name.into(), value));
        self
    }
}

impl Scope for Layered<'_> {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.bindings
            .iter()
            .rev()
            .find(|(bound, _)| bound == name)
            .map(|(_, value)| value.clone())
            .or_else(|| self.parent.lookup(name))
    }

    fn options(&self) -> &EngineOptions {
        self.parent.options()
    }
}

/// Parse and evaluate an expression; syntax problems become error values
pub fn evaluate_expression(text: &str, scope: &dyn Scope) -> Value {
    trace!(expression = text, "evaluating");
    match parse_expression(text) {
        Ok(expr) => evaluate(&expr, scope),
        Err(e) => Value::Error(ValueError::from(e).with_expression(text.trim())),
    }
}

/// Evaluate an expression against a scope
pub fn evaluate(expr: &Expr, scope: &dyn Scope) -> Value {
    match expr {
        Expr::Literal(value) => value.clone(),

        Expr::Identifier(name) => resolve(name, scope),

        Expr::List(items) => Value::list(items.iter().map(|item| evaluate(item, scope)).collect()),

        Expr::Unary { op, operand } => {
            let value = evaluate(operand, scope);
            match op {
                UnaryOperator::Negate => value.negate(),
                UnaryOperator::Percent => to_percentage(&value),
            }
        }

        Expr::Binary { op, left, right } => {
            let left = evaluate(left, scope);
            let right = evaluate(right, scope);
            match op.arithmetic() {
                Some(op) => combine(op, &left, &right),
                None => raise(&left, &right),
            }
        }

        Expr::PercentOf { op, percent, base } => {
            let percent = evaluate(percent, scope);
            let base = evaluate(base, scope);
            apply_percent(*op, &percent, &base)
        }

        Expr::Index { target, index } => {
            let target = evaluate(target, scope);
            match whole(&evaluate(index, scope), "index") {
                Ok(i) => list::index(&target, i),
                Err(e) => Value::Error(e),
            }
        }

        Expr::Slice { target, start, end } => {
            let target = evaluate(target, scope);
            let bounds = whole(&evaluate(start, scope), "slice start")
                .and_then(|a| Ok((a, whole(&evaluate(end, scope), "slice end")?)));
            match bounds {
                Ok((a, b)) => list::slice(&target, a, b),
                Err(e) => Value::Error(e),
            }
        }

        Expr::Range { start, end, step } => {
            let start = evaluate(start, scope);
            let end = evaluate(end, scope);
            let step = step.as_ref().map(|s| evaluate(s, scope));
            list::generate_range(
                &start,
                &end,
                step.as_ref(),
                scope.options().max_range_elements,
            )
        }

        Expr::Filter {
            list: items,
            comparator,
            threshold,
        } => {
            let items = evaluate(items, scope);
            let threshold = evaluate(threshold, scope);
            list::filter(&items, *comparator, &threshold, scope.options().tolerance)
        }

        Expr::Convert { expr, target } => convert(&evaluate(expr, scope), target),

        Expr::Call { name, args } => call(name, args, scope),
    }
}

/// Variable, then constant, then unit, then a symbolic name
fn resolve(name: &str, scope: &dyn Scope) -> Value {
    if let Some(value) = scope.lookup(name) {
        return value;
    }
    match name {
        "pi" | "π" => return Value::Number(std::f64::consts::PI),
        "e" => return Value::Number(std::f64::consts::E),
        _ => {}
    }
    if units::is_unit(name) {
        if let Ok(unit) = CompoundUnit::single(name) {
            return Value::from_quantity(Quantity::with_unit(1.0, unit));
        }
    }
    Value::symbolic(name)
}

fn whole(value: &Value, what: &str) -> Result<i64, ValueError> {
    match value {
        Value::Number(n) if n.fract() == 0.0 => Ok(*n as i64),
        Value::Number(n) => Err(ValueError::semantic(format!(
            "{} must be a whole number, got {}",
            what, n
        ))),
        Value::Error(e) => Err(ValueError::propagated(e)),
        other => Err(ValueError::type_mismatch("a number", other.type_name())
            .with_message(format!("{} must be a number, got a {}", what, other.type_name()))),
    }
}

fn to_percentage(value: &Value) -> Value {
    match value {
        Value::Number(n) => Value::percentage(*n),
        Value::List(items) => Value::List(items.map(to_percentage)),
        Value::Error(e) => Value::Error(ValueError::propagated(e)),
        Value::Symbolic(s) => Value::symbolic(format!("({})%", s)),
        other => Value::Error(
            ValueError::type_mismatch("a number", other.type_name())
                .with_message(format!("cannot turn a {} into a percentage", other.type_name())),
        ),
    }
}

fn apply_percent(op: PercentOperator, percent: &Value, base: &Value) -> Value {
    match percent {
        Value::Percentage(p) => match op {
            PercentOperator::Of => p.of(base),
            PercentOperator::On => p.on(base),
            PercentOperator::Off => p.off(base),
        },
        Value::List(items) => Value::List(items.map(|p| apply_percent(op, p, base))),
        Value::Error(e) => Value::Error(ValueError::propagated(e)),
        other => Value::Error(
            ValueError::type_mismatch("percentage", other.type_name()).with_message(format!(
                "'{}' needs a percentage on its left, got a {}",
                op.keyword(),
                other.type_name()
            )),
        ),
    }
}

fn raise(base: &Value, exponent: &Value) -> Value {
    match exponent {
        Value::Number(e) => base.power(*e),
        Value::Error(e) => Value::Error(ValueError::propagated(e)),
        Value::Symbolic(s) => match base {
            Value::Error(e) => Value::Error(ValueError::propagated(e)),
            other => Value::symbolic(format!("({} ^ {})", other, s)),
        },
        other => Value::Error(
            ValueError::type_mismatch("a number", other.type_name())
                .with_message(format!("an exponent must be a plain number, got a {}", other.type_name())),
        ),
    }
}

/// A duration, or a quantity of time read as one
fn as_duration(value: &Value) -> Option<Duration> {
    match value {
        Value::Duration(d) => Some(d.clone()),
        Value::Quantity(q) if q.dimension() == Dimension::TIME => {
            Some(Duration::from_seconds(q.to_base().value()))
        }
        _ => None,
    }
}

fn is_temporal(value: &Value) -> bool {
    matches!(value, Value::Date(_) | Value::Time(_))
}

/// Arithmetic with dates and clock times routed through the calendar; all
/// other pairs go to the rule table.
fn combine(op: BinaryOp, left: &Value, right: &Value) -> Value {
    if matches!(op, BinaryOp::Add | BinaryOp::Subtract) {
        match (left, right) {
            (Value::List(_), Value::List(_)) => {}
            (Value::List(items), other) if is_temporal(other) || items.iter().any(is_temporal) => {
                return Value::List(items.map(|item| combine(op, item, other)));
            }
            (other, Value::List(items)) if is_temporal(other) || items.iter().any(is_temporal) => {
                return Value::List(items.map(|item| combine(op, other, item)));
            }
            _ => {}
        }
    }

    match (op, left, right) {
        (BinaryOp::Subtract, Value::Date(a), Value::Date(b)) => {
            Value::Duration(calendar::difference(a, b))
        }
        (BinaryOp::Subtract, Value::Time(a), Value::Time(b)) => {
            Value::Duration(calendar::time_difference(a, b))
        }
        (BinaryOp::Add | BinaryOp::Subtract, Value::Date(date), other) => match as_duration(other) {
            Some(d) if op == BinaryOp::Add => calendar::add_duration(date, &d),
            Some(d) => calendar::subtract_duration(date, &d),
            None => arithmetic::apply(op, left, right),
        },
        (BinaryOp::Add, other, Value::Date(date)) => match as_duration(other) {
            Some(d) => calendar::add_duration(date, &d),
            None => arithmetic::apply(op, left, right),
        },
        (BinaryOp::Add | BinaryOp::Subtract, Value::Time(time), other) => match as_duration(other) {
            Some(d) if op == BinaryOp::Add => calendar::shift_time(time, &d),
            Some(d) => calendar::shift_time(time, &d.negated()),
            None => arithmetic::apply(op, left, right),
        },
        (BinaryOp::Add, other, Value::Time(time)) => match as_duration(other) {
            Some(d) => calendar::shift_time(time, &d),
            None => arithmetic::apply(op, left, right),
        },
        _ => arithmetic::apply(op, left, right),
    }
}

fn conversion_error(value: &Value, target: &ConversionTarget) -> Value {
    Value::Error(ValueError::conversion(format!(
        "cannot convert a {} to {}",
        value.type_name(),
        target
    )))
}

fn convert(value: &Value, target: &ConversionTarget) -> Value {
    match value {
        Value::Error(e) => return Value::Error(ValueError::propagated(e)),
        Value::List(items) => return Value::List(items.map(|item| convert(item, target))),
        Value::Symbolic(s) => return Value::symbolic(format!("({} to {})", s, target)),
        _ => {}
    }
    match target {
        ConversionTarget::Unit(text) => match CompoundUnit::parse(text) {
            Ok(unit) => convert_to_unit(value, &unit, target),
            Err(e) => Value::Error(ValueError::conversion(e.to_string())),
        },
        ConversionTarget::Currency(code) => convert_to_currency(value, *code, target),
        ConversionTarget::Duration(unit) => convert_to_duration(value, *unit, target),
    }
}

fn convert_to_unit(value: &Value, unit: &CompoundUnit, target: &ConversionTarget) -> Value {
    let converted = match value {
        Value::Number(n) => return Value::from_quantity(Quantity::with_unit(*n, unit.clone())),
        Value::Quantity(q) => q.to_unit(unit).map(Value::from_quantity),
        Value::Duration(d) => Quantity::new(d.total_seconds(), "s")
            .and_then(|q| q.to_unit(unit))
            .map(Value::from_quantity),
        Value::CurrencyQuantity(cq) => {
            // `$5/kg to lb` prices per pound
            let target_unit = if cq.per { unit.inverse() } else { unit.clone() };
            Quantity::with_unit(cq.amount, cq.effective_unit())
                .value_in(&target_unit)
                .map(|amount| CurrencyQuantity::from_effective(cq.code, amount, target_unit))
        }
        other => return conversion_error(other, target),
    };
    converted.unwrap_or_else(|e| Value::Error(ValueError::from(e)))
}

fn convert_to_currency(value: &Value, code: CurrencyCode, target: &ConversionTarget) -> Value {
    let from = match value {
        Value::Number(n) => return Value::currency(code, *n),
        Value::Currency(m) => m.code,
        Value::CurrencyQuantity(cq) => cq.code,
        other => return conversion_error(other, target),
    };
    if from == code {
        return value.clone();
    }
    Value::Error(
        ValueError::conversion(format!(
            "cannot convert {} to {}: no exchange rates are available",
            from, code
        ))
        .with_suggestion(format!("keep amounts in {} or enter them in {} directly", from, code)),
    )
}

fn convert_to_duration(value: &Value, unit: DurationUnit, target: &ConversionTarget) -> Value {
    match as_duration(value) {
        Some(d) => Value::Duration(Duration::of(unit, d.total_seconds() / unit.seconds())),
        None => match value {
            Value::Number(n) => Value::Duration(Duration::of(unit, *n)),
            other => conversion_error(other, target),
        },
    }
}

fn call(name: &str, args: &[Expr], scope: &dyn Scope) -> Value {
    let Some(def) = registry().get(name) else {
        return Value::Error(FormulaError::UnknownFunction(name.to_string()).into());
    };
    if let Err(e) = def.check_arity(args.len()) {
        return Value::Error(e.into());
    }
    let values: Vec<Value> = args.iter().map(|arg| evaluate(arg, scope)).collect();
    match (def.implementation)(&values, scope.options()) {
        Ok(value) => value,
        Err(e) => Value::Error(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tallypad_core::{parse, ErrorKind, Tolerance};

    fn eval(text: &str) -> Value {
        evaluate_expression(text, &EmptyScope)
    }

    fn eval_with(text: &str, vars: &[(&str, &str)]) -> Value {
        let scope: HashMap<String, Value> = vars
            .iter()
            .map(|(name, value)| (name.to_string(), parse(value)))
            .collect();
        evaluate_expression(text, &scope)
    }

    fn kind(value: &Value) -> Option<ErrorKind> {
        value.as_error().map(|e| e.kind())
    }

    #[test]
    fn test_evaluate_arithmetic() {
        assert_eq!(eval("1 + 2 * 3"), parse("7"));
        assert_eq!(eval("(1 + 2) * 3"), parse("9"));
        assert_eq!(eval("2^10"), parse("1024"));
        assert_eq!(eval("-2^2"), parse("-4"));
        assert_eq!(eval("10 / 4"), parse("2.5"));
    }

    #[test]
    fn test_evaluate_semantic_values() {
        assert_eq!(eval("$5/kg * 3 kg"), parse("$15"));
        assert_eq!(eval("$100 / $25"), parse("4"));
        assert_eq!(eval("9.8 m/s^2 * 2 s"), parse("19.6 m/s"));
        assert_eq!(eval("5 + 20%"), parse("25%"));
        assert_eq!(eval("2 km + 500 m"), parse("2.5 km"));
    }

    #[test]
    fn test_percent_operators() {
        assert_eq!(eval("20% of 50"), parse("10"));
        assert_eq!(eval("10% on $200"), parse("$220"));
        assert_eq!(eval("25% off $80"), parse("$60"));
        assert_eq!(kind(&eval("5 of 10")), Some(ErrorKind::Type));
    }

    #[test]
    fn test_identifier_resolution() {
        assert_eq!(eval_with("x * 2", &[("x", "21")]), parse("42"));
        assert_eq!(eval_with("monthly rent * 12", &[("monthly rent", "$1000")]), parse("$12000"));
        assert!(eval("pi").equals(&Value::Number(std::f64::consts::PI), Default::default()));
        assert_eq!(eval("kg * 3"), parse("3 kg"));
        assert_eq!(eval("apples"), Value::symbolic("apples"));
        assert_eq!(eval("apples + 1"), Value::symbolic("(apples + 1)"));
    }

    #[test]
    fn test_variables_shadow_units() {
        assert_eq!(eval_with("m + 1", &[("m", "4")]), parse("5"));
        // a unit right after a number is always a unit
        assert_eq!(eval_with("3 m", &[("m", "4")]), parse("3 m"));
    }

    #[test]
    fn test_calendar_arithmetic() {
        assert_eq!(eval("2024-01-31 + 1 month"), parse("2024-02-29"));
        assert_eq!(eval("2024-01-12 + 1 business day"), parse("2024-01-15"));
        assert_eq!(eval("2024-03-01 - 2024-02-01"), parse("29 days"));
        assert_eq!(eval("14:30 + 2 hours"), parse("16:30"));
        assert_eq!(eval("14:30 + 90 min"), parse("16:00"));
        assert_eq!(eval("17:00 - 09:30"), parse("7 hours 30 minutes"));
        assert_eq!(kind(&eval("2024-01-01 * 2")), Some(ErrorKind::Type));
    }

    #[test]
    fn test_conversions() {
        assert_eq!(eval("5 km to m"), parse("5000 m"));
        assert!(eval("100 km/h to m/s").equals(&parse("27.7777777778 m/s"), Tolerance::default()));
        assert_eq!(eval("90 minutes as hours"), parse("1.5 hours"));
        assert_eq!(eval("2 h to minutes"), parse("120 minutes"));
        assert!(eval("$5/kg to lb").equals(&parse("$2.26796185/lb"), Tolerance::default()));
        assert_eq!(eval("$12 to USD"), parse("$12"));
        assert_eq!(kind(&eval("$10 to EUR")), Some(ErrorKind::Conversion));
        assert_eq!(kind(&eval("5 kg to m")), Some(ErrorKind::Conversion));
        assert_eq!(kind(&eval("5 kg to blorps")), Some(ErrorKind::Conversion));
        assert_eq!(eval("[1 km, 2 km] to m"), parse("[1000 m, 2000 m]"));
    }

    #[test]
    fn test_lists_and_ranges() {
        let costs = [("costs", "[$12, $15, $9]")];
        assert_eq!(eval_with("costs[1..2]", &costs), parse("[$12, $15]"));
        assert_eq!(eval_with("costs[-1]", &costs), parse("$9"));
        assert_eq!(eval_with("costs where > $10", &costs), parse("[$12, $15]"));
        assert_eq!(eval_with("costs where > $100", &costs), parse("[]"));
        assert_eq!(eval_with("sum(costs)", &costs), parse("$36"));
        assert_eq!(eval_with("costs * 2", &costs), parse("[$24, $30, $18]"));
        assert_eq!(eval("1..5 step 2"), parse("[1, 3, 5]"));
        assert_eq!(kind(&eval_with("costs[2..1]", &costs)), Some(ErrorKind::Runtime));
        assert_eq!(kind(&eval_with("costs[1.5]", &costs)), Some(ErrorKind::Semantic));
    }

    #[test]
    fn test_range_limit_follows_options() {
        struct Tight(EngineOptions);
        impl Scope for Tight {
            fn lookup(&self, _name: &str) -> Option<Value> {
                None
            }
            fn options(&self) -> &EngineOptions {
                &self.0
            }
        }
        let scope = Tight(EngineOptions {
            max_range_elements: 5,
            ..EngineOptions::default()
        });
        assert!(evaluate_expression("1..5", &scope).as_list().is_some());
        assert!(evaluate_expression("1..6", &scope).is_error());
    }

    #[test]
    fn test_date_ranges_add_durations() {
        let range = eval("2024-01-01..2024-01-15 step 1 week");
        assert_eq!(range, parse("[2024-01-01, 2024-01-08, 2024-01-15]"));
        let shifted = eval("[2024-01-01, 2024-01-08] + 1 day");
        assert_eq!(shifted, parse("[2024-01-02, 2024-01-09]"));
    }

    #[test]
    fn test_errors_are_values() {
        let err = eval("1 +");
        assert_eq!(kind(&err), Some(ErrorKind::Syntax));
        assert_eq!(err.as_error().unwrap().expression(), Some("1 +"));

        assert_eq!(kind(&eval("1 / 0")), Some(ErrorKind::Runtime));
        assert_eq!(kind(&eval("$10 + €5")), Some(ErrorKind::Semantic));
        assert_eq!(kind(&eval("frobnicate(1)")), Some(ErrorKind::Semantic));
        assert_eq!(kind(&eval("sqrt(1, 2)")), Some(ErrorKind::Semantic));

        // a failing operand propagates with its cause
        let err = eval("(1 / 0) + 1");
        let err = err.as_error().unwrap();
        assert_eq!(err.root_cause().message(), "division by zero");
    }

    #[test]
    fn test_layered_scope() {
        let base: HashMap<String, Value> = [("x".to_string(), parse("2"))].into_iter().collect();
        let layered = Layered::new(&base).bind("ans", parse("40"));
        assert_eq!(evaluate_expression("ans + x", &layered), parse("42"));
    }
}
