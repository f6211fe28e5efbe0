//! Formula error types

use tallypad_core::ValueError;
use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur while reading or evaluating an expression
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    /// A character no token starts with
    #[error("Unexpected character '{found}' at position {position}")]
    UnexpectedChar { found: char, position: usize },

    /// Malformed expression
    #[error("{message} at position {position}")]
    Parse { message: String, position: usize },

    /// Evaluation failed
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    Argument(String),

    /// Unknown function
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// Wrong number of arguments
    #[error("Wrong number of arguments for {function}: expected {expected}, got {actual}")]
    ArgumentCount {
        function: String,
        expected: String,
        actual: usize,
    },
}

impl FormulaError {
    pub(crate) fn parse<S: Into<String>>(message: S, position: usize) -> Self {
        FormulaError::Parse {
            message: message.into(),
            position,
        }
    }

    /// Byte offset into the source text, for lexing and parsing failures
    pub fn position(&self) -> Option<usize> {
        match self {
            FormulaError::UnexpectedChar { position, .. } | FormulaError::Parse { position, .. } => {
                Some(*position)
            }
            _ => None,
        }
    }

    /// Rewrite the names mentioned in this error
    pub(crate) fn rename(self, f: impl Fn(&str) -> String) -> Self {
        match self {
            FormulaError::Parse { message, position } => FormulaError::Parse {
                message: f(&message),
                position,
            },
            FormulaError::Evaluation(m) => FormulaError::Evaluation(f(&m)),
            FormulaError::Argument(m) => FormulaError::Argument(f(&m)),
            other => other,
        }
    }
}

impl From<FormulaError> for ValueError {
    fn from(err: FormulaError) -> Self {
        let position = err.position();
        let converted = match &err {
            FormulaError::UnexpectedChar { .. } | FormulaError::Parse { .. } => {
                ValueError::syntax(err.to_string())
            }
            FormulaError::Evaluation(message) => ValueError::runtime(message.clone()),
            FormulaError::Argument(message) => ValueError::semantic(message.clone()),
            FormulaError::UnknownFunction(name) => {
                ValueError::semantic(format!("unknown function '{}'", name))
            }
            FormulaError::ArgumentCount { .. } => ValueError::semantic(err.to_string()),
        };
        match position {
            Some(p) => converted.with_position(p),
            None => converted,
        }
    }
}
