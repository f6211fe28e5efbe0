//! Evaluating whole expressions through the public API

use pretty_assertions::assert_eq;
use std::collections::HashMap;
use tallypad_core::{parse, ErrorKind, Tolerance, Value};
use tallypad_formula::{evaluate_expression, evaluate_numeric, EmptyScope, FormulaError};

fn eval(text: &str) -> Value {
    evaluate_expression(text, &EmptyScope)
}

fn scope(vars: &[(&str, &str)]) -> HashMap<String, Value> {
    vars.iter()
        .map(|(name, value)| (name.to_string(), parse(value)))
        .collect()
}

/// Aggregates over list literals, ranges and scalar arguments
#[test]
fn test_aggregate_functions() {
    assert_eq!(eval("sum(1, 2, 3, 4, 5)"), parse("15"));
    assert_eq!(eval("sum(1..100)"), parse("5050"));
    assert_eq!(eval("avg([2, 4, 9])"), parse("5"));
    assert_eq!(eval("median([5, 1, 3])"), parse("3"));
    assert_eq!(eval("max([3 m, 2 km])"), parse("2 km"));
    assert_eq!(eval("count(1..10 where >= 5)"), parse("6"));
    assert_eq!(eval("range([4, 9, 1])"), parse("8"));
    assert!(eval("stddev([2, 4, 4, 4, 5, 5, 7, 9])")
        .equals(&parse("2.138089935"), Tolerance::new(1e-8, 1e-8)));
}

/// Function names are case-insensitive
#[test]
fn test_function_names_ignore_case() {
    assert_eq!(eval("SUM([1, 2])"), eval("sum([1, 2])"));
    assert_eq!(eval("Sqrt(81)"), parse("9"));
}

#[test]
fn test_sort_directions() {
    let vars = scope(&[("prices", "[$3, $1, $2]")]);
    assert_eq!(evaluate_expression("sort(prices)", &vars), parse("[$1, $2, $3]"));
    assert_eq!(evaluate_expression("sort(prices, desc)", &vars), parse("[$3, $2, $1]"));
    assert_eq!(
        evaluate_expression("sum(prices)", &vars),
        evaluate_expression("sum(sort(prices, desc))", &vars)
    );
}

#[test]
fn test_money_and_percentages() {
    let vars = scope(&[("price", "$80"), ("discount", "25%"), ("tax", "8%")]);
    assert_eq!(evaluate_expression("discount off price", &vars), parse("$60"));
    assert_eq!(evaluate_expression("tax on (discount off price)", &vars), parse("$64.80"));
    assert_eq!(evaluate_expression("price * 3 / 4", &vars), parse("$60"));
}

#[test]
fn test_currency_mismatch_names_both_symbols() {
    let err = eval("$10 + €5");
    let message = err.as_error().unwrap().message().to_string();
    assert!(message.contains('$'), "{}", message);
    assert!(message.contains('€'), "{}", message);
    assert_eq!(eval("$100 / $25"), parse("4"));
}

#[test]
fn test_unit_arithmetic_and_conversion() {
    assert_eq!(eval("120 km / 2 h"), parse("60 km/h"));
    assert!(eval("60 km/h * 30 min to km").equals(&parse("30 km"), Tolerance::default()));
    assert_eq!(eval("1.5 hours to minutes"), parse("90 minutes"));
    assert_eq!(eval("5 kg + 3 m").as_error().map(|e| e.kind()), Some(ErrorKind::Semantic));
    assert_eq!(eval("5 kg to m").as_error().map(|e| e.kind()), Some(ErrorKind::Conversion));
}

#[test]
fn test_date_arithmetic() {
    assert_eq!(eval("2024-02-28 + 2 days"), parse("2024-03-01"));
    assert_eq!(eval("2024-12-25 - 2024-12-01"), parse("24 days"));
    assert_eq!(eval("today() - today()"), parse("0 days"));
}

#[test]
fn test_math_functions_broadcast() {
    assert_eq!(eval("round([1.234, 5.678], 1)"), parse("[1.2, 5.7]"));
    assert_eq!(eval("abs(-3 kg)"), parse("3 kg"));
    assert_eq!(eval("sqrt(-1)").as_error().map(|e| e.kind()), Some(ErrorKind::Runtime));
}

#[test]
fn test_syntax_errors_carry_position() {
    let err = eval("2 * (3 + 4");
    let err = err.as_error().unwrap();
    assert_eq!(err.kind(), ErrorKind::Syntax);
    assert!(err.position().is_some());
}

#[test]
fn test_numeric_contract() {
    let result = evaluate_numeric("hourly rate * hours worked", [("hourly rate", 40.0), ("hours worked", 7.5)]);
    assert_eq!(result, Ok(300.0));

    let result = evaluate_numeric("width * height", [("width", 3.0), ("height", 4.0)]);
    assert_eq!(result, Ok(12.0));

    assert!(matches!(
        evaluate_numeric("1 +", std::iter::empty()),
        Err(FormulaError::Parse { .. })
    ));
    assert!(matches!(
        evaluate_numeric("$5", std::iter::empty()),
        Err(FormulaError::Evaluation(_))
    ));
}
