//! Plain numeric evaluation
//!
//! The narrow contract used by callers that only deal in `f64`: bind names
//! to numbers, evaluate, get a number back or a [`FormulaError`].

use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::evaluate;
use crate::parser::parse_expression;
use regex::Regex;
use std::collections::HashMap;
use tallypad_core::Value;

/// A name that can stand alone as one identifier token
fn is_plain_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Phrase names rewritten to `__vN` placeholders, longest first so that
/// `monthly rent total` is replaced before `monthly rent`
struct Placeholders {
    pairs: Vec<(String, String)>,
}

impl Placeholders {
    fn new<'a>(names: impl Iterator<Item = &'a str>) -> Self {
        let mut phrases: Vec<&str> = names.filter(|n| !is_plain_name(n)).collect();
        phrases.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        phrases.dedup();
        let pairs = phrases
            .into_iter()
            .enumerate()
            .map(|(i, name)| (name.to_string(), format!("__v{}", i)))
            .collect();
        Self { pairs }
    }

    fn placeholder(&self, name: &str) -> String {
        self.pairs
            .iter()
            .find(|(phrase, _)| phrase == name)
            .map(|(_, placeholder)| placeholder.clone())
            .unwrap_or_else(|| name.to_string())
    }

    fn pattern(phrase: &str) -> Option<Regex> {
        let words: Vec<String> = phrase.split_whitespace().map(regex::escape).collect();
        Regex::new(&format!(r"\b{}\b", words.join(r"\s+"))).ok()
    }

    fn substitute(&self, text: &str) -> String {
        let mut out = text.to_string();
        for (phrase, placeholder) in &self.pairs {
            if let Some(re) = Self::pattern(phrase) {
                out = re.replace_all(&out, placeholder.as_str()).into_owned();
            }
        }
        out
    }

    fn restore(&self, text: &str) -> String {
        let mut out = text.to_string();
        // Longest placeholder first so `__v1` does not clobber `__v10`
        let mut pairs: Vec<&(String, String)> = self.pairs.iter().collect();
        pairs.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then(b.1.cmp(&a.1)));
        for (phrase, placeholder) in pairs {
            out = out.replace(placeholder.as_str(), phrase);
        }
        out
    }
}

/// Evaluate `expression` with every name in `scope` bound to a number
///
/// Anything other than a plain number as the result is an
/// [`FormulaError::Evaluation`].
pub fn evaluate_numeric<'a, I>(expression: &str, scope: I) -> FormulaResult<f64>
where
    I: IntoIterator<Item = (&'a str, f64)>,
{
    let bindings: Vec<(&str, f64)> = scope.into_iter().collect();
    let placeholders = Placeholders::new(bindings.iter().map(|(name, _)| *name));

    let values: HashMap<String, Value> = bindings
        .iter()
        .map(|(name, n)| (placeholders.placeholder(name), Value::checked_number(*n)))
        .collect();

    let text = placeholders.substitute(expression);
    let expr = parse_expression(&text).map_err(|e| e.rename(|m| placeholders.restore(m)))?;

    match evaluate(&expr, &values) {
        Value::Number(n) => Ok(n),
        Value::Error(e) => Err(FormulaError::Evaluation(
            placeholders.restore(e.root_cause().message()),
        )),
        other => Err(FormulaError::Evaluation(format!(
            "expected a number, got a {} ({})",
            other.type_name(),
            placeholders.restore(&other.to_string())
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_names() {
        let result = evaluate_numeric("x * 2 + y", [("x", 3.0), ("y", 1.0)]).unwrap();
        assert_eq!(result, 7.0);
    }

    #[test]
    fn test_phrase_names() {
        let scope = [("monthly rent", 1200.0), ("months", 12.0)];
        assert_eq!(evaluate_numeric("monthly rent * months", scope).unwrap(), 14400.0);
    }

    #[test]
    fn test_overlapping_phrases() {
        let scope = [("rent", 1.0), ("monthly rent", 10.0), ("monthly rent total", 100.0)];
        assert_eq!(
            evaluate_numeric("monthly rent total + monthly rent + rent", scope).unwrap(),
            111.0
        );
    }

    #[test]
    fn test_non_numeric_result() {
        let err = evaluate_numeric("5 kg", std::iter::empty()).unwrap_err();
        assert!(matches!(err, FormulaError::Evaluation(_)));
    }

    #[test]
    fn test_errors_mention_original_names() {
        let err = evaluate_numeric("tax rate / 0", [("tax rate", 0.2)]).unwrap_err();
        assert_eq!(err, FormulaError::Evaluation("division by zero".to_string()));

        let err = evaluate_numeric("tax rate +", [("tax rate", 0.2)]).unwrap_err();
        assert!(err.position().is_some());
        assert!(!err.to_string().contains("__v"));
    }

    #[test]
    fn test_placeholder_restore_order() {
        let names: Vec<String> = (0..12).map(|i| format!("item {}", (b'a' + i) as char)).collect();
        let placeholders = Placeholders::new(names.iter().map(String::as_str));
        let restored = placeholders.restore("__v10 and __v1");
        assert!(!restored.contains("__v"));
    }
}
