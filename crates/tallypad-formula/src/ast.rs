//! Expression AST types

use std::fmt;
use tallypad_core::{BinaryOp, Comparator, CurrencyCode, DurationUnit, Value};

/// A parsed expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal value (number, money, quantity, percentage, date, time, duration)
    Literal(Value),

    /// Variable, constant or unit name
    Identifier(String),

    /// List literal `[a, b, c]`
    List(Vec<Expr>),

    /// Unary operation
    Unary {
        op: UnaryOperator,
        operand: Box<Expr>,
    },

    /// Binary operation
    Binary {
        op: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// `p of x`, `p on x`, `p off x`
    PercentOf {
        op: PercentOperator,
        percent: Box<Expr>,
        base: Box<Expr>,
    },

    /// `list[i]`
    Index { target: Box<Expr>, index: Box<Expr> },

    /// `list[a..b]`
    Slice {
        target: Box<Expr>,
        start: Box<Expr>,
        end: Box<Expr>,
    },

    /// `a..b step s`
    Range {
        start: Box<Expr>,
        end: Box<Expr>,
        step: Option<Box<Expr>>,
    },

    /// `list where > threshold`
    Filter {
        list: Box<Expr>,
        comparator: Comparator,
        threshold: Box<Expr>,
    },

    /// `x to unit`
    Convert {
        expr: Box<Expr>,
        target: ConversionTarget,
    },

    /// Function call
    Call { name: String, args: Vec<Expr> },
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    /// Negation (-)
    Negate,
    /// Postfix percent (%)
    Percent,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
}

impl BinaryOperator {
    /// The arithmetic rule-table operation, for everything but `^`
    pub fn arithmetic(&self) -> Option<BinaryOp> {
        match self {
            BinaryOperator::Add => Some(BinaryOp::Add),
            BinaryOperator::Subtract => Some(BinaryOp::Subtract),
            BinaryOperator::Multiply => Some(BinaryOp::Multiply),
            BinaryOperator::Divide => Some(BinaryOp::Divide),
            BinaryOperator::Power => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Power => "^",
        }
    }
}

/// Percentage application keywords
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PercentOperator {
    Of,
    On,
    Off,
}

impl PercentOperator {
    pub fn keyword(&self) -> &'static str {
        match self {
            PercentOperator::Of => "of",
            PercentOperator::On => "on",
            PercentOperator::Off => "off",
        }
    }
}

/// Right-hand side of `to` / `in` / `as`
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionTarget {
    /// Unit expression text such as `km/h`
    Unit(String),
    Currency(CurrencyCode),
    Duration(DurationUnit),
}

impl fmt::Display for ConversionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionTarget::Unit(unit) => f.write_str(unit),
            ConversionTarget::Currency(code) => f.write_str(code.code()),
            ConversionTarget::Duration(unit) => f.write_str(unit.plural()),
        }
    }
}
