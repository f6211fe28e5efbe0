//! Tokenizer
//!
//! Splits an expression into tokens. Runs of plain words separated by
//! spaces are merged into a single phrase identifier (`monthly rent`), so a
//! multi-word variable name is one token everywhere it is used. A phrase
//! stops before a keyword, before a word that is called like a function,
//! and never starts right after a number (the word there is a unit).

use crate::error::{FormulaError, FormulaResult};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use tallypad_core::{Comparator, CurrencyCode};

static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}(?:T\d{1,2}:\d{2}(?::\d{2}(?:\.\d+)?)?(?:Z|[+-]\d{2}:\d{2})?)?")
        .unwrap()
});

static TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,2}:\d{2}(?::\d{2})?(?:\s*[aApP][mM]\b)?").unwrap());

/// Reserved words of the expression language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Of,
    On,
    Off,
    To,
    In,
    As,
    Per,
    Step,
    Where,
}

impl Keyword {
    pub const ALL: [Keyword; 9] = [
        Keyword::Of,
        Keyword::On,
        Keyword::Off,
        Keyword::To,
        Keyword::In,
        Keyword::As,
        Keyword::Per,
        Keyword::Step,
        Keyword::Where,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Of => "of",
            Keyword::On => "on",
            Keyword::Off => "off",
            Keyword::To => "to",
            Keyword::In => "in",
            Keyword::As => "as",
            Keyword::Per => "per",
            Keyword::Step => "step",
            Keyword::Where => "where",
        }
    }

    /// Keywords match case-insensitively
    pub fn from_word(word: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(word))
    }

    /// Check if this keyword introduces a conversion target
    pub fn is_conversion(&self) -> bool {
        matches!(self, Keyword::To | Keyword::In | Keyword::As)
    }
}

/// Token types
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Number(f64),
    Date(String),
    Time(String),
    Currency(CurrencyCode),

    /// Variable, function, unit or phrase name
    Identifier(String),
    Keyword(Keyword),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Percent,
    DotDot,
    Comparison(Comparator),
    Assign,

    // Delimiters
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Comma,

    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Number(n) => write!(f, "{}", n),
            TokenKind::Date(s) | TokenKind::Time(s) => f.write_str(s),
            TokenKind::Currency(code) => write!(f, "{}", code),
            TokenKind::Identifier(name) => f.write_str(name),
            TokenKind::Keyword(k) => f.write_str(k.as_str()),
            TokenKind::Plus => f.write_str("+"),
            TokenKind::Minus => f.write_str("-"),
            TokenKind::Star => f.write_str("*"),
            TokenKind::Slash => f.write_str("/"),
            TokenKind::Caret => f.write_str("^"),
            TokenKind::Percent => f.write_str("%"),
            TokenKind::DotDot => f.write_str(".."),
            TokenKind::Comparison(c) => write!(f, "{}", c),
            TokenKind::Assign => f.write_str("="),
            TokenKind::LeftParen => f.write_str("("),
            TokenKind::RightParen => f.write_str(")"),
            TokenKind::LeftBracket => f.write_str("["),
            TokenKind::RightBracket => f.write_str("]"),
            TokenKind::Comma => f.write_str(","),
            TokenKind::Eof => f.write_str("end of input"),
        }
    }
}

/// A token and the byte span it came from
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl Token {
    /// Check if `next` starts exactly where this token ends
    pub fn touches(&self, next: &Token) -> bool {
        self.end == next.start
    }
}

/// Tokenize an expression; the result always ends with [`TokenKind::Eof`]
pub fn tokenize(text: &str) -> FormulaResult<Vec<Token>> {
    let mut lexer = Lexer::new(text);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.scan_token(tokens.last())?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

/// Check if `c` can start a word
pub fn is_word_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '°' || c == 'µ'
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '°' || c == '²' || c == '³'
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn scan_token(&mut self, previous: Option<&Token>) -> FormulaResult<Token> {
        self.skip_whitespace();
        let start = self.pos;
        let kind = self.scan_kind(previous)?;
        Ok(Token {
            kind,
            start,
            end: self.pos,
        })
    }

    fn scan_kind(&mut self, previous: Option<&Token>) -> FormulaResult<TokenKind> {
        let Some(c) = self.peek_char() else {
            return Ok(TokenKind::Eof);
        };

        let single = match c {
            '+' => Some(TokenKind::Plus),
            '-' => Some(TokenKind::Minus),
            '*' | '×' | '·' => Some(TokenKind::Star),
            '/' | '÷' => Some(TokenKind::Slash),
            '^' => Some(TokenKind::Caret),
            '%' => Some(TokenKind::Percent),
            '(' => Some(TokenKind::LeftParen),
            ')' => Some(TokenKind::RightParen),
            '[' => Some(TokenKind::LeftBracket),
            ']' => Some(TokenKind::RightBracket),
            ',' => Some(TokenKind::Comma),
            _ => None,
        };
        if let Some(kind) = single {
            self.advance();
            return Ok(kind);
        }

        if let Some(code) = CurrencyCode::from_symbol(c) {
            self.advance();
            return Ok(TokenKind::Currency(code));
        }

        if let Some(kind) = self.scan_operator(c) {
            return Ok(kind);
        }

        if c == '.' && self.peek_char_at(1) == Some('.') {
            self.advance();
            self.advance();
            return Ok(TokenKind::DotDot);
        }

        if c.is_ascii_digit() || (c == '.' && self.peek_char_at(1).is_some_and(|d| d.is_ascii_digit())) {
            if let Some(m) = DATE_RE.find(self.rest()) {
                self.pos += m.end();
                return Ok(TokenKind::Date(m.as_str().to_string()));
            }
            if let Some(m) = TIME_RE.find(self.rest()) {
                self.pos += m.end();
                return Ok(TokenKind::Time(m.as_str().to_string()));
            }
            return self.scan_number();
        }

        if is_word_start(c) {
            let after_number = matches!(previous.map(|t| &t.kind), Some(TokenKind::Number(_)));
            return Ok(self.scan_word(after_number));
        }

        Err(FormulaError::UnexpectedChar {
            found: c,
            position: self.pos,
        })
    }

    fn scan_operator(&mut self, c: char) -> Option<TokenKind> {
        let next = self.peek_char_at(1);
        let (kind, width) = match (c, next) {
            ('>', Some('=')) => (TokenKind::Comparison(Comparator::GreaterOrEqual), 2),
            ('>', _) => (TokenKind::Comparison(Comparator::Greater), 1),
            ('<', Some('=')) => (TokenKind::Comparison(Comparator::LessOrEqual), 2),
            ('<', Some('>')) => (TokenKind::Comparison(Comparator::NotEqual), 2),
            ('<', _) => (TokenKind::Comparison(Comparator::Less), 1),
            ('=', Some('=')) => (TokenKind::Comparison(Comparator::Equal), 2),
            ('=', _) => (TokenKind::Assign, 1),
            ('!', Some('=')) => (TokenKind::Comparison(Comparator::NotEqual), 2),
            _ => return None,
        };
        for _ in 0..width {
            self.advance();
        }
        Some(kind)
    }

    fn scan_number(&mut self) -> FormulaResult<TokenKind> {
        let start = self.pos;

        // Integer part, with `_` separators
        while self.peek_char().is_some_and(|c| c.is_ascii_digit() || c == '_') {
            self.advance();
        }

        // Decimal part, unless this is the start of `..`
        if self.peek_char() == Some('.') && self.peek_char_at(1) != Some('.') {
            self.advance();
            while self.peek_char().is_some_and(|c| c.is_ascii_digit() || c == '_') {
                self.advance();
            }
        }

        // Exponent part, only when digits follow
        if self.peek_char().is_some_and(|c| c == 'e' || c == 'E') {
            let digit_at = match self.peek_char_at(1) {
                Some('+') | Some('-') => 2,
                _ => 1,
            };
            if self.peek_char_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                for _ in 0..digit_at {
                    self.advance();
                }
                while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                    self.advance();
                }
            }
        }

        let text = &self.input[start..self.pos];
        text.replace('_', "")
            .parse::<f64>()
            .map(TokenKind::Number)
            .map_err(|_| FormulaError::parse(format!("invalid number '{}'", text), start))
    }

    fn read_word(&mut self) -> &'a str {
        let start = self.pos;
        while self.peek_char().is_some_and(is_word_char) {
            self.advance();
        }
        &self.input[start..self.pos]
    }

    /// Look at the next word without consuming it: its text, and whether a
    /// `(` follows it
    fn peek_word(&mut self) -> Option<(&'a str, bool)> {
        let saved = self.pos;
        self.skip_whitespace();
        let result = if self.peek_char().is_some_and(is_word_start) {
            let word = self.read_word();
            self.skip_whitespace();
            Some((word, self.peek_char() == Some('(')))
        } else {
            None
        };
        self.pos = saved;
        result
    }

    fn consume_word(&mut self) {
        self.skip_whitespace();
        self.read_word();
    }

    fn scan_word(&mut self, after_number: bool) -> TokenKind {
        let first = self.read_word();
        if let Some(keyword) = Keyword::from_word(first) {
            return TokenKind::Keyword(keyword);
        }

        if after_number {
            // `3 business days` is the one two-word unit
            if first.eq_ignore_ascii_case("business") {
                if let Some((next, _)) = self.peek_word() {
                    if next.to_lowercase().starts_with("day") {
                        self.consume_word();
                        return TokenKind::Identifier(format!("{} {}", first, next));
                    }
                }
            }
            return TokenKind::Identifier(first.to_string());
        }

        let mut phrase = first.to_string();
        if self.next_non_space() == Some('(') {
            return TokenKind::Identifier(phrase);
        }
        while let Some((next, called)) = self.peek_word() {
            if called || Keyword::from_word(next).is_some() {
                break;
            }
            self.consume_word();
            phrase.push(' ');
            phrase.push_str(next);
        }
        TokenKind::Identifier(phrase)
    }

    // === Helper methods ===

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn next_non_space(&self) -> Option<char> {
        self.input[self.pos..].chars().find(|c| !c.is_whitespace())
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().is_some_and(|c| c.is_whitespace()) {
            self.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(text: &str) -> Vec<TokenKind> {
        tokenize(text)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn ident(name: &str) -> TokenKind {
        TokenKind::Identifier(name.to_string())
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("1.5e3 + 1_000 - .5"),
            vec![
                TokenKind::Number(1500.0),
                TokenKind::Plus,
                TokenKind::Number(1000.0),
                TokenKind::Minus,
                TokenKind::Number(0.5),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_range_dots_are_not_decimals() {
        assert_eq!(
            kinds("1..5"),
            vec![
                TokenKind::Number(1.0),
                TokenKind::DotDot,
                TokenKind::Number(5.0),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_phrases_merge() {
        assert_eq!(
            kinds("monthly  rent * 12"),
            vec![
                ident("monthly rent"),
                TokenKind::Star,
                TokenKind::Number(12.0),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_keywords_split_phrases() {
        assert_eq!(
            kinds("20% of monthly rent"),
            vec![
                TokenKind::Number(20.0),
                TokenKind::Percent,
                TokenKind::Keyword(Keyword::Of),
                ident("monthly rent"),
                TokenKind::Eof,
            ]
        );
        assert_eq!(
            kinds("trip distance in km"),
            vec![
                ident("trip distance"),
                TokenKind::Keyword(Keyword::In),
                ident("km"),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_calls_split_phrases() {
        assert_eq!(
            kinds("sum(costs)"),
            vec![
                ident("sum"),
                TokenKind::LeftParen,
                ident("costs"),
                TokenKind::RightParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_words_after_numbers_are_units() {
        assert_eq!(
            kinds("2 hours 30 minutes"),
            vec![
                TokenKind::Number(2.0),
                ident("hours"),
                TokenKind::Number(30.0),
                ident("minutes"),
                TokenKind::Eof,
            ]
        );
        assert_eq!(
            kinds("3 business days"),
            vec![TokenKind::Number(3.0), ident("business days"), TokenKind::Eof]
        );
    }

    #[test]
    fn test_dates_and_times() {
        assert_eq!(
            kinds("2024-01-15 + 14:30"),
            vec![
                TokenKind::Date("2024-01-15".into()),
                TokenKind::Plus,
                TokenKind::Time("14:30".into()),
                TokenKind::Eof,
            ]
        );
        assert_eq!(
            kinds("2024-01-15T10:30Z"),
            vec![TokenKind::Date("2024-01-15T10:30Z".into()), TokenKind::Eof]
        );
        assert_eq!(
            kinds("2:30 pm"),
            vec![TokenKind::Time("2:30 pm".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("$5 × 3 ÷ x >= y != z == w = v"),
            vec![
                TokenKind::Currency(CurrencyCode::Usd),
                TokenKind::Number(5.0),
                TokenKind::Star,
                TokenKind::Number(3.0),
                TokenKind::Slash,
                ident("x"),
                TokenKind::Comparison(Comparator::GreaterOrEqual),
                ident("y"),
                TokenKind::Comparison(Comparator::NotEqual),
                ident("z"),
                TokenKind::Comparison(Comparator::Equal),
                ident("w"),
                TokenKind::Assign,
                ident("v"),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_spans() {
        let tokens = tokenize("12 m^2").unwrap();
        assert_eq!((tokens[1].start, tokens[1].end), (3, 4));
        assert!(tokens[1].touches(&tokens[2]));
        assert!(!tokens[0].touches(&tokens[1]));
    }

    #[test]
    fn test_unexpected_character() {
        let err = tokenize("3 @ 4").unwrap_err();
        assert_eq!(
            err,
            FormulaError::UnexpectedChar {
                found: '@',
                position: 2
            }
        );
    }
}
