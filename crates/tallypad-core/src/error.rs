//! Error types for tallypad-core
//!
//! Two layers live here:
//! - [`Error`] is the Rust-level error returned by fallible library calls
//!   (unit parsing, conversion).
//! - [`ValueError`] is the payload of [`Value::Error`](crate::Value::Error):
//!   a typed evaluation failure that travels through arithmetic as a value.

use std::fmt;
use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in tallypad-core
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Unit symbol not present in the registry
    #[error("Unknown unit: {0}")]
    UnknownUnit(String),

    /// Unit expression could not be parsed
    #[error("Malformed unit expression: {0}")]
    MalformedUnit(String),

    /// Two units measure different dimensions
    #[error("Cannot convert {from} to {to}")]
    IncompatibleUnits { from: String, to: String },

    /// Raising a unit to a power left a fractional exponent
    #[error("Cannot raise {unit} to the power {exponent}")]
    NonIntegralPower { unit: String, exponent: f64 },

    /// Raising a unit to a power left an exponent too large to represent
    #[error("Cannot raise {unit} to the power {exponent}: exponent too large")]
    ExponentOutOfRange { unit: String, exponent: f64 },

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }
}

/// Category of an evaluation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ErrorKind {
    /// Literal text could not become any value kind
    Parse,
    /// Malformed expression
    Syntax,
    /// Well-formed but meaningless (incompatible units, mixed currencies)
    Semantic,
    /// Evaluation-time failure (division by zero, propagated error, cycle)
    Runtime,
    /// Kind mismatch
    Type,
    /// Unit or currency conversion impossible
    Conversion,
}

impl ErrorKind {
    /// Lowercase name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Parse => "parse",
            ErrorKind::Syntax => "syntax",
            ErrorKind::Semantic => "semantic",
            ErrorKind::Runtime => "runtime",
            ErrorKind::Type => "type",
            ErrorKind::Conversion => "conversion",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed evaluation failure carried inside a value
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ValueError {
    kind: ErrorKind,
    message: String,
    expression: Option<String>,
    position: Option<usize>,
    suggestion: Option<String>,
    expected: Option<&'static str>,
    actual: Option<&'static str>,
    cause: Option<Box<ValueError>>,
}

impl ValueError {
    /// Create an error of the given kind
    pub fn new<S: Into<String>>(kind: ErrorKind, message: S) -> Self {
        Self {
            kind,
            message: message.into(),
            expression: None,
            position: None,
            suggestion: None,
            expected: None,
            actual: None,
            cause: None,
        }
    }

    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::new(ErrorKind::Parse, message)
    }

    pub fn syntax<S: Into<String>>(message: S) -> Self {
        Self::new(ErrorKind::Syntax, message)
    }

    pub fn semantic<S: Into<String>>(message: S) -> Self {
        Self::new(ErrorKind::Semantic, message)
    }

    pub fn runtime<S: Into<String>>(message: S) -> Self {
        Self::new(ErrorKind::Runtime, message)
    }

    pub fn conversion<S: Into<String>>(message: S) -> Self {
        Self::new(ErrorKind::Conversion, message)
    }

    /// Kind mismatch, recording the expected and actual kind names
    pub fn type_mismatch(expected: &'static str, actual: &'static str) -> Self {
        let mut err = Self::new(
            ErrorKind::Type,
            format!("expected {}, got {}", expected, actual),
        );
        err.expected = Some(expected);
        err.actual = Some(actual);
        err
    }

    /// No rule combines these two kinds (`cannot add date and number`)
    pub fn incompatible_kinds(verb: &str, lhs: &'static str, rhs: &'static str) -> Self {
        let mut err = Self::new(
            ErrorKind::Type,
            format!("cannot {} {} and {}", verb, lhs, rhs),
        );
        err.expected = Some(lhs);
        err.actual = Some(rhs);
        err
    }

    /// An error produced by operating on an already-failed operand.
    ///
    /// The new error keeps the operand's message so the user sees the root
    /// failure, and records the operand as its cause.
    pub fn propagated(cause: &ValueError) -> Self {
        let mut err = Self::new(ErrorKind::Runtime, cause.message.clone());
        err.cause = Some(Box::new(cause.clone()));
        err
    }

    pub fn with_message<S: Into<String>>(mut self, message: S) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_expression<S: Into<String>>(mut self, expression: S) -> Self {
        self.expression = Some(expression.into());
        self
    }

    pub fn with_position(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_suggestion<S: Into<String>>(mut self, suggestion: S) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn caused_by(mut self, cause: ValueError) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn expression(&self) -> Option<&str> {
        self.expression.as_deref()
    }

    pub fn position(&self) -> Option<usize> {
        self.position
    }

    pub fn suggestion(&self) -> Option<&str> {
        self.suggestion.as_deref()
    }

    pub fn expected(&self) -> Option<&'static str> {
        self.expected
    }

    pub fn actual(&self) -> Option<&'static str> {
        self.actual
    }

    pub fn cause(&self) -> Option<&ValueError> {
        self.cause.as_deref()
    }

    /// Iterate over this error and its causes, outermost first
    pub fn chain(&self) -> impl Iterator<Item = &ValueError> {
        std::iter::successors(Some(self), |e| e.cause())
    }

    /// The innermost error of the chain
    pub fn root_cause(&self) -> &ValueError {
        self.chain().last().unwrap_or(self)
    }

    /// Message plus the offending expression and suggestion, for display
    /// in place of a result.
    pub fn describe(&self) -> String {
        let mut out = self.message.clone();
        if let Some(expr) = &self.expression {
            out.push_str(&format!(" (in '{}')", expr));
        }
        if let Some(hint) = &self.suggestion {
            out.push_str(&format!("; {}", hint));
        }
        out
    }
}

impl From<Error> for ValueError {
    fn from(err: Error) -> Self {
        match &err {
            Error::UnknownUnit(_) | Error::MalformedUnit(_) => ValueError::parse(err.to_string()),
            Error::IncompatibleUnits { .. } => ValueError::conversion(err.to_string()),
            Error::NonIntegralPower { .. } | Error::ExponentOutOfRange { .. } => {
                ValueError::semantic(err.to_string())
            }
            Error::Other(_) => ValueError::runtime(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_propagated_keeps_message_and_chain() {
        let root = ValueError::runtime("division by zero");
        let outer = ValueError::propagated(&root);
        let outermost = ValueError::propagated(&outer);

        assert_eq!(outermost.message(), "division by zero");
        assert_eq!(outermost.kind(), ErrorKind::Runtime);
        assert_eq!(outermost.chain().count(), 3);
        assert_eq!(outermost.root_cause(), &root);
    }

    #[test]
    fn test_type_mismatch_records_kinds() {
        let err = ValueError::type_mismatch("number", "date");
        assert_eq!(err.kind(), ErrorKind::Type);
        assert_eq!(err.expected(), Some("number"));
        assert_eq!(err.actual(), Some("date"));
        assert_eq!(err.to_string(), "expected number, got date");
    }

    #[test]
    fn test_describe() {
        let err = ValueError::semantic("cannot add $ and €")
            .with_expression("$10 + €5")
            .with_suggestion("convert one side first");
        assert_eq!(
            err.describe(),
            "cannot add $ and € (in '$10 + €5'); convert one side first"
        );
    }

    #[test]
    fn test_unit_error_conversion() {
        let err: ValueError = Error::IncompatibleUnits {
            from: "m".into(),
            to: "kg".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Conversion);
        assert_eq!(err.message(), "Cannot convert m to kg");
    }
}
