//! Expression parser
//!
//! A recursive descent parser over the token stream from [`tokenize`].

use crate::ast::{BinaryOperator, ConversionTarget, Expr, PercentOperator, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};
use crate::lexer::{tokenize, Keyword, Token, TokenKind};
use tallypad_core::parse::{parse_date, parse_time};
use tallypad_core::units::{self, CompoundUnit};
use tallypad_core::{Comparator, CurrencyCode, Duration, DurationUnit, Quantity, Value};

/// Parse an expression
///
/// # Example
/// ```rust
/// use tallypad_formula::parse_expression;
///
/// let ast = parse_expression("20% of monthly rent").unwrap();
/// let ast = parse_expression("costs where > $10 to EUR").unwrap();
/// let ast = parse_expression("2024-01-01..2024-01-31 step 1 week").unwrap();
/// ```
pub fn parse_expression(text: &str) -> FormulaResult<Expr> {
    parse_tokens(tokenize(text)?)
}

/// Parse an already tokenized expression
pub fn parse_tokens(tokens: Vec<Token>) -> FormulaResult<Expr> {
    let mut parser = ExprParser::new(tokens);
    let expr = parser.parse_expression()?;

    // Make sure we consumed all input
    if parser.current().kind != TokenKind::Eof {
        return Err(parser.unexpected("unexpected input after expression"));
    }

    Ok(expr)
}

fn binary(op: BinaryOperator, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn format_exponent(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

struct ExprParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl ExprParser {
    fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| &t.kind) != Some(&TokenKind::Eof) {
            let end = tokens.last().map_or(0, |t| t.end);
            tokens.push(Token {
                kind: TokenKind::Eof,
                start: end,
                end,
            });
        }
        Self { tokens, pos: 0 }
    }

    // === Helper methods ===

    fn current(&self) -> &Token {
        self.peek(0)
    }

    fn peek(&self, offset: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.pos + offset).min(last)]
    }

    fn keyword(&self) -> Option<Keyword> {
        match self.current().kind {
            TokenKind::Keyword(k) => Some(k),
            _ => None,
        }
    }

    fn consume(&mut self) -> Token {
        let token = self.current().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: TokenKind) -> FormulaResult<Token> {
        if self.current().kind == expected {
            Ok(self.consume())
        } else {
            Err(self.unexpected(&format!("expected '{}'", expected)))
        }
    }

    fn unexpected(&self, context: &str) -> FormulaError {
        let token = self.current();
        FormulaError::parse(format!("{}, found '{}'", context, token.kind), token.start)
    }

    // === Expression parsing with precedence ===
    // Precedence (lowest to highest):
    // 1. Conversion: to, in, as
    // 2. Filter: where
    // 3. Range: .. [step]
    // 4. Addition/Subtraction: +, -
    // 5. Multiplication/Division: *, /, per
    // 6. Percentages: of, on, off
    // 7. Unary: -
    // 8. Exponentiation: ^ (right associative)
    // 9. Postfix: [i], [a..b], %
    // 10. Primary: literals, names, calls, parentheses, lists

    fn parse_expression(&mut self) -> FormulaResult<Expr> {
        self.parse_conversion()
    }

    fn parse_conversion(&mut self) -> FormulaResult<Expr> {
        let mut expr = self.parse_filter()?;

        while self.keyword().is_some_and(|k| k.is_conversion()) {
            self.consume();
            let target = self.parse_target()?;
            expr = Expr::Convert {
                expr: Box::new(expr),
                target,
            };
        }

        Ok(expr)
    }

    fn parse_target(&mut self) -> FormulaResult<ConversionTarget> {
        let Token { kind, start, end } = self.consume();
        match kind {
            TokenKind::Currency(code) => Ok(ConversionTarget::Currency(code)),
            TokenKind::Identifier(word) => {
                if let Some(code) = CurrencyCode::from_code(&word.to_uppercase()) {
                    return Ok(ConversionTarget::Currency(code));
                }
                let continues = matches!(
                    self.current().kind,
                    TokenKind::Slash | TokenKind::Star | TokenKind::Caret | TokenKind::Keyword(Keyword::Per)
                );
                if !continues {
                    if let Some(unit) = DurationUnit::from_word(&word) {
                        return Ok(ConversionTarget::Duration(unit));
                    }
                }
                Ok(ConversionTarget::Unit(self.continue_unit(word, end, false)))
            }
            other => Err(FormulaError::parse(
                format!("expected a unit or currency to convert to, found '{}'", other),
                start,
            )),
        }
    }

    /// Extend a unit name with `^n`, `/unit` and `*unit` terms. Literal
    /// suffixes only take `/` and `*` terms written without spaces.
    fn continue_unit(&mut self, mut text: String, mut last_end: usize, adjacent_only: bool) -> String {
        loop {
            let token = self.current();
            match &token.kind {
                TokenKind::Caret => {
                    let (negative, number_at) = match self.peek(1).kind {
                        TokenKind::Minus => (true, 2),
                        _ => (false, 1),
                    };
                    let TokenKind::Number(n) = self.peek(number_at).kind else {
                        break;
                    };
                    for _ in 0..=number_at {
                        last_end = self.consume().end;
                    }
                    text.push('^');
                    if negative {
                        text.push('-');
                    }
                    text.push_str(&format_exponent(n));
                }
                TokenKind::Slash | TokenKind::Star | TokenKind::Keyword(Keyword::Per) => {
                    if adjacent_only && token.start != last_end {
                        break;
                    }
                    let next = self.peek(1);
                    let TokenKind::Identifier(name) = &next.kind else {
                        break;
                    };
                    if !units::is_unit(name) || (adjacent_only && !token.touches(next)) {
                        break;
                    }
                    let op = if token.kind == TokenKind::Star { '*' } else { '/' };
                    let name = name.clone();
                    self.consume();
                    last_end = self.consume().end;
                    text.push(op);
                    text.push_str(&name);
                }
                _ => break,
            }
        }
        text
    }

    fn parse_filter(&mut self) -> FormulaResult<Expr> {
        let mut expr = self.parse_range()?;

        while self.keyword() == Some(Keyword::Where) {
            self.consume();
            let comparator = match self.current().kind {
                TokenKind::Comparison(c) => c,
                TokenKind::Assign => Comparator::Equal,
                _ => return Err(self.unexpected("expected a comparison after 'where'")),
            };
            self.consume();
            let threshold = self.parse_range()?;
            expr = Expr::Filter {
                list: Box::new(expr),
                comparator,
                threshold: Box::new(threshold),
            };
        }

        Ok(expr)
    }

    fn parse_range(&mut self) -> FormulaResult<Expr> {
        let start = self.parse_additive()?;

        if self.current().kind != TokenKind::DotDot {
            return Ok(start);
        }
        self.consume();
        let end = self.parse_additive()?;
        let step = if self.keyword() == Some(Keyword::Step) {
            self.consume();
            Some(Box::new(self.parse_additive()?))
        } else {
            None
        };

        Ok(Expr::Range {
            start: Box::new(start),
            end: Box::new(end),
            step,
        })
    }

    fn parse_additive(&mut self) -> FormulaResult<Expr> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current().kind {
                TokenKind::Plus => BinaryOperator::Add,
                TokenKind::Minus => BinaryOperator::Subtract,
                _ => break,
            };

            self.consume();
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> FormulaResult<Expr> {
        let mut left = self.parse_percent()?;

        loop {
            let op = match self.current().kind {
                TokenKind::Star => BinaryOperator::Multiply,
                TokenKind::Slash | TokenKind::Keyword(Keyword::Per) => BinaryOperator::Divide,
                _ => break,
            };

            self.consume();
            let right = self.parse_percent()?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_percent(&mut self) -> FormulaResult<Expr> {
        let mut expr = self.parse_unary()?;

        loop {
            let op = match self.keyword() {
                Some(Keyword::Of) => PercentOperator::Of,
                Some(Keyword::On) => PercentOperator::On,
                Some(Keyword::Off) => PercentOperator::Off,
                _ => break,
            };

            self.consume();
            let base = self.parse_unary()?;
            expr = Expr::PercentOf {
                op,
                percent: Box::new(expr),
                base: Box::new(base),
            };
        }

        Ok(expr)
    }

    fn parse_unary(&mut self) -> FormulaResult<Expr> {
        match self.current().kind {
            TokenKind::Minus => {
                self.consume();
                let operand = self.parse_unary()?;
                Ok(Expr::Unary {
                    op: UnaryOperator::Negate,
                    operand: Box::new(operand),
                })
            }
            // Prefix plus (no-op)
            TokenKind::Plus => {
                self.consume();
                self.parse_unary()
            }
            _ => self.parse_power(),
        }
    }

    fn parse_power(&mut self) -> FormulaResult<Expr> {
        let base = self.parse_postfix()?;

        if self.current().kind == TokenKind::Caret {
            self.consume();
            let exponent = self.parse_unary()?; // Right associative
            return Ok(binary(BinaryOperator::Power, base, exponent));
        }

        Ok(base)
    }

    fn parse_postfix(&mut self) -> FormulaResult<Expr> {
        let mut expr = self.parse_primary()?;

        loop {
            match self.current().kind {
                TokenKind::LeftBracket => {
                    self.consume();
                    let first = self.parse_additive()?;
                    if self.current().kind == TokenKind::DotDot {
                        self.consume();
                        let end = self.parse_additive()?;
                        self.expect(TokenKind::RightBracket)?;
                        expr = Expr::Slice {
                            target: Box::new(expr),
                            start: Box::new(first),
                            end: Box::new(end),
                        };
                    } else {
                        self.expect(TokenKind::RightBracket)?;
                        expr = Expr::Index {
                            target: Box::new(expr),
                            index: Box::new(first),
                        };
                    }
                }
                TokenKind::Percent => {
                    self.consume();
                    expr = match expr {
                        Expr::Literal(Value::Number(n)) => Expr::Literal(Value::percentage(n)),
                        other => Expr::Unary {
                            op: UnaryOperator::Percent,
                            operand: Box::new(other),
                        },
                    };
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    fn parse_primary(&mut self) -> FormulaResult<Expr> {
        let Token { kind, start, .. } = self.consume();
        match kind {
            TokenKind::Number(n) => self.parse_number_suffix(n),

            TokenKind::Currency(code) => match self.current().kind {
                TokenKind::Number(n) => {
                    self.consume();
                    Ok(Expr::Literal(Value::currency(code, n)))
                }
                _ => Err(self.unexpected(&format!("expected an amount after '{}'", code))),
            },

            TokenKind::Date(text) => parse_date(&text)
                .map(Expr::Literal)
                .ok_or_else(|| FormulaError::parse(format!("invalid date '{}'", text), start)),

            TokenKind::Time(text) => parse_time(&text)
                .map(Expr::Literal)
                .ok_or_else(|| FormulaError::parse(format!("invalid time '{}'", text), start)),

            TokenKind::Identifier(name) => {
                if self.current().kind == TokenKind::LeftParen {
                    return self.parse_call(name);
                }
                // `USD 12`
                if let (Some(code), TokenKind::Number(n)) =
                    (CurrencyCode::from_code(&name), &self.current().kind)
                {
                    let amount = *n;
                    self.consume();
                    return Ok(Expr::Literal(Value::currency(code, amount)));
                }
                Ok(Expr::Identifier(name))
            }

            TokenKind::LeftParen => {
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RightParen)?;
                Ok(expr)
            }

            TokenKind::LeftBracket => self.parse_list(),

            TokenKind::Eof => Err(FormulaError::parse("unexpected end of expression", start)),

            other => Err(FormulaError::parse(format!("unexpected '{}'", other), start)),
        }
    }

    /// A number may carry a duration word, a currency code or a unit; any
    /// other word after it multiplies (`2 x`).
    fn parse_number_suffix(&mut self, n: f64) -> FormulaResult<Expr> {
        let TokenKind::Identifier(word) = &self.current().kind else {
            return Ok(Expr::Literal(Value::Number(n)));
        };
        let word = word.clone();

        if let Some(unit) = DurationUnit::from_word(&word) {
            self.consume();
            let duration = self.parse_duration_rest(Duration::of(unit, n));
            return Ok(Expr::Literal(Value::Duration(duration)));
        }

        if let Some(code) = CurrencyCode::from_code(&word) {
            self.consume();
            return Ok(Expr::Literal(Value::currency(code, n)));
        }

        if units::is_unit(&word) && self.peek(1).kind != TokenKind::LeftParen {
            let Token { start, end, .. } = self.consume();
            let text = self.continue_unit(word, end, true);
            let unit = CompoundUnit::parse(&text).map_err(|e| FormulaError::parse(e.to_string(), start))?;
            return Ok(Expr::Literal(Value::from_quantity(Quantity::with_unit(n, unit))));
        }

        let right = self.parse_power()?;
        Ok(binary(BinaryOperator::Multiply, Expr::Literal(Value::Number(n)), right))
    }

    /// `2 hours 30 minutes`
    fn parse_duration_rest(&mut self, mut duration: Duration) -> Duration {
        loop {
            let (TokenKind::Number(n), TokenKind::Identifier(word)) = (&self.current().kind, &self.peek(1).kind) else {
                break;
            };
            let Some(unit) = DurationUnit::from_word(word) else {
                break;
            };
            let amount = *n;
            self.consume();
            self.consume();
            duration = duration.and(unit, amount);
        }
        duration
    }

    fn parse_list(&mut self) -> FormulaResult<Expr> {
        let mut items = Vec::new();

        if self.current().kind != TokenKind::RightBracket {
            items.push(self.parse_expression()?);

            while self.current().kind == TokenKind::Comma {
                self.consume();
                items.push(self.parse_expression()?);
            }
        }

        self.expect(TokenKind::RightBracket)?;
        Ok(Expr::List(items))
    }

    fn parse_call(&mut self, name: String) -> FormulaResult<Expr> {
        self.expect(TokenKind::LeftParen)?;

        let mut args = Vec::new();

        // Parse arguments
        if self.current().kind != TokenKind::RightParen {
            args.push(self.parse_expression()?);

            while self.current().kind == TokenKind::Comma {
                self.consume();
                args.push(self.parse_expression()?);
            }
        }

        self.expect(TokenKind::RightParen)?;

        Ok(Expr::Call { name, args })
    }
}
