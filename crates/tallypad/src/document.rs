//! Notepad documents
//!
//! A [`Document`] is the text of a notepad evaluated line by line. Every
//! assignment line defines a variable in one shared [`VariableStore`], so a
//! line can use names defined anywhere in the document; when a name is
//! assigned more than once the last assignment wins. Bare expression lines
//! can refer to the previous result as `ans` or `prev`.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tallypad_core::{EngineOptions, Value};
use tallypad_formula::store::{normalize_name, validate_name};
use tallypad_formula::{tokenize, Keyword, TokenKind, VariableStore};
use thiserror::Error;
use tracing::debug;

/// Result type alias using [`DocumentError`]
pub type Result<T> = std::result::Result<T, DocumentError>;

/// Errors reading a document
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What a line of the document is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    Blank,
    /// `# note` or `// note`
    Comment,
    /// `name = expression`
    Assignment { name: String },
    /// An `=` whose left side is not a name, such as `2*x + 3 = 7`;
    /// recorded but not solved
    Equation,
    /// Anything else
    Expression,
}

/// A line and what it evaluated to
#[derive(Debug, Clone, PartialEq)]
pub struct LineOutcome {
    /// 1-based line number
    pub number: usize,
    pub text: String,
    pub kind: LineKind,
    /// None for blank and comment lines
    pub value: Option<Value>,
}

/// Names the previous result is bound to in expression lines
const PREVIOUS_RESULT: [&str; 2] = ["ans", "prev"];

/// Text of a notepad and the values of its lines
#[derive(Debug, Default)]
pub struct Document {
    lines: Vec<String>,
    store: VariableStore,
    outcomes: Vec<LineOutcome>,
}

impl Document {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty document with the given engine options
    pub fn with_options(options: EngineOptions) -> Self {
        Self {
            store: VariableStore::with_options(options),
            ..Self::default()
        }
    }

    /// Create a document from text
    pub fn from_text(text: &str) -> Self {
        let mut doc = Self::new();
        doc.set_text(text);
        doc
    }

    /// Read a document from a file
    pub fn open<P: AsRef<Path>>(path: P, options: EngineOptions) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| DocumentError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut doc = Self::with_options(options);
        doc.set_text(&text);
        Ok(doc)
    }

    /// Replace the whole text
    pub fn set_text(&mut self, text: &str) {
        self.lines = text.lines().map(str::to_string).collect();
        self.rebuild();
    }

    /// The document's text, one line per line
    pub fn text(&self) -> String {
        let mut text = self.lines.join("\n");
        if !text.is_empty() {
            text.push('\n');
        }
        text
    }

    /// Append a line and return what it evaluated to
    pub fn push_line(&mut self, line: &str) -> &LineOutcome {
        self.lines.push(line.to_string());
        self.rebuild();
        &self.outcomes[self.outcomes.len() - 1]
    }

    /// Replace the line at `index` (0-based); false if there is no such line
    pub fn set_line(&mut self, index: usize, line: &str) -> bool {
        let Some(slot) = self.lines.get_mut(index) else {
            return false;
        };
        *slot = line.to_string();
        self.rebuild();
        true
    }

    /// Remove the line at `index` (0-based); false if there is no such line
    pub fn remove_line(&mut self, index: usize) -> bool {
        if index >= self.lines.len() {
            return false;
        }
        self.lines.remove(index);
        self.rebuild();
        true
    }

    /// Remove every line that assigns `name`; returns how many went
    pub fn remove_assignments(&mut self, name: &str) -> usize {
        let name = normalize_name(name);
        let before = self.lines.len();
        self.lines.retain(|line| {
            !matches!(classify(line).0, LineKind::Assignment { name: assigned } if assigned == name)
        });
        let removed = before - self.lines.len();
        if removed > 0 {
            debug!(name = %name, removed, "removed assignments");
            self.rebuild();
        }
        removed
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Every line with its current value
    pub fn outcomes(&self) -> &[LineOutcome] {
        &self.outcomes
    }

    /// The variables defined by the document
    pub fn store(&self) -> &VariableStore {
        &self.store
    }

    /// Define every assigned name, then evaluate every line
    fn rebuild(&mut self) {
        let options = self.store.options().clone();
        self.store = VariableStore::with_options(options);

        let parsed: Vec<(LineKind, String)> = self.lines.iter().map(|line| classify(line)).collect();
        for (kind, body) in &parsed {
            if let LineKind::Assignment { name } = kind {
                self.store.set_variable(name, body);
            }
        }

        let mut previous: Option<Value> = None;
        let mut outcomes = Vec::with_capacity(parsed.len());
        for (i, (kind, body)) in parsed.into_iter().enumerate() {
            let value = match &kind {
                LineKind::Blank | LineKind::Comment => None,
                LineKind::Assignment { name } => self.store.get_variable(name).cloned(),
                LineKind::Equation => Some(Value::symbolic(body.as_str())),
                LineKind::Expression => Some(match &previous {
                    Some(prev) => {
                        let bindings: Vec<(&str, Value)> =
                            PREVIOUS_RESULT.iter().map(|name| (*name, prev.clone())).collect();
                        self.store.evaluate_with(&body, &bindings)
                    }
                    None => self.store.evaluate(&body),
                }),
            };
            if let Some(value) = &value {
                previous = Some(value.clone());
            }
            outcomes.push(LineOutcome {
                number: i + 1,
                text: self.lines[i].clone(),
                kind,
                value,
            });
        }

        debug!(
            lines = outcomes.len(),
            variables = self.store.len(),
            "document evaluated"
        );
        self.outcomes = outcomes;
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

/// Work out what a line is and the text to evaluate for it
fn classify(line: &str) -> (LineKind, String) {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return (LineKind::Blank, String::new());
    }
    if trimmed.starts_with('#') || trimmed.starts_with("//") {
        return (LineKind::Comment, String::new());
    }
    let body = match trimmed.find("//") {
        Some(at) => trimmed[..at].trim_end(),
        None => trimmed,
    };

    let Some(at) = assignment_sign(body) else {
        return (LineKind::Expression, body.to_string());
    };
    let name = normalize_name(&body[..at]);
    let rhs = body[at + 1..].trim().to_string();
    if validate_name(&name).is_ok() {
        (LineKind::Assignment { name }, rhs)
    } else {
        (LineKind::Equation, body.to_string())
    }
}

/// Byte offset of the `=` that splits a line into two sides
///
/// Only an `=` outside brackets counts, and not one used as a comparison
/// after `where`.
fn assignment_sign(text: &str) -> Option<usize> {
    let tokens = tokenize(text).ok()?;
    let mut depth = 0usize;
    for token in &tokens {
        match &token.kind {
            TokenKind::LeftParen | TokenKind::LeftBracket => depth += 1,
            TokenKind::RightParen | TokenKind::RightBracket => depth = depth.saturating_sub(1),
            TokenKind::Keyword(Keyword::Where) if depth == 0 => return None,
            TokenKind::Assign if depth == 0 => return Some(token.start),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tallypad_core::parse;

    fn kinds(doc: &Document) -> Vec<LineKind> {
        doc.outcomes().iter().map(|o| o.kind.clone()).collect()
    }

    #[test]
    fn test_classify_lines() {
        let doc = Document::from_text("# budget\n\nrent = $1200\nrent * 12\n2*x + 3 = 7\n// done");
        assert_eq!(
            kinds(&doc),
            vec![
                LineKind::Comment,
                LineKind::Blank,
                LineKind::Assignment {
                    name: "rent".to_string()
                },
                LineKind::Expression,
                LineKind::Equation,
                LineKind::Comment,
            ]
        );
    }

    #[test]
    fn test_values_per_line() {
        let doc = Document::from_text("rent = $1200\nrent * 12\n2*x + 3 = 7");
        let values: Vec<Option<Value>> = doc.outcomes().iter().map(|o| o.value.clone()).collect();
        assert_eq!(
            values,
            vec![
                Some(parse("$1200")),
                Some(parse("$14400")),
                Some(Value::symbolic("2*x + 3 = 7")),
            ]
        );
    }

    #[test]
    fn test_phrase_names_and_inline_comments() {
        let doc = Document::from_text("monthly rent = $1000 // before the raise\nmonthly rent * 12");
        assert_eq!(doc.outcomes()[1].value, Some(parse("$12000")));
    }

    #[test]
    fn test_previous_result() {
        let doc = Document::from_text("$100 + $20\n\nans * 2\nprev - $40");
        assert_eq!(doc.outcomes()[2].value, Some(parse("$240")));
        assert_eq!(doc.outcomes()[3].value, Some(parse("$200")));
    }

    #[test]
    fn test_where_equals_is_not_assignment() {
        let doc = Document::from_text("costs = [$12, $15, $12]\ncosts where = $12");
        assert_eq!(doc.outcomes()[1].kind, LineKind::Expression);
        assert_eq!(doc.outcomes()[1].value, Some(parse("[$12, $12]")));
    }

    #[test]
    fn test_later_definitions_are_visible() {
        let doc = Document::from_text("total = price * qty\nprice = $3\nqty = 4");
        assert_eq!(doc.outcomes()[0].value, Some(parse("$12")));
    }

    #[test]
    fn test_editing_recomputes() {
        let mut doc = Document::from_text("rate = 10%\nrate of $50");
        assert_eq!(doc.outcomes()[1].value, Some(parse("$5")));

        assert!(doc.set_line(0, "rate = 20%"));
        assert_eq!(doc.outcomes()[1].value, Some(parse("$10")));

        assert!(doc.remove_line(0));
        assert_ne!(doc.outcomes()[0].value, Some(parse("$10")));
        assert!(doc.store().is_empty());
        assert!(!doc.set_line(5, "x"));
    }

    #[test]
    fn test_push_line() {
        let mut doc = Document::new();
        doc.push_line("a = 2");
        let outcome = doc.push_line("a ^ 10");
        assert_eq!(outcome.number, 2);
        assert_eq!(outcome.value, Some(parse("1024")));
    }

    #[test]
    fn test_remove_assignments() {
        let mut doc = Document::from_text("x = 1\ny = x + 1\nx = 5\ny");
        assert_eq!(doc.store().get_variable("y"), Some(&parse("6")));

        assert_eq!(doc.remove_assignments("x"), 2);
        assert_eq!(doc.lines(), &["y = x + 1".to_string(), "y".to_string()]);
        assert!(doc.store().get_variable("x").is_none());
        assert_eq!(doc.remove_assignments("x"), 0);
    }

    #[test]
    fn test_text_round_trip() {
        let text = "a = 1\n\n# note\na + 1\n";
        assert_eq!(Document::from_text(text).text(), text);
    }
}
