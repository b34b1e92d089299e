//! Expression operators and their precedence ladder.
//!
//! | prec | operators |
//! |------|-----------|
//! | 1  | `>>` (lambda, see [`Func`](super::Func)) |
//! | 2  | `? :` |
//! | 3  | `\|\|` |
//! | 4  | `&&` |
//! | 5  | `\|` |
//! | 6  | `^` |
//! | 7  | `&` |
//! | 8  | `< <= == != >= >` |
//! | 9  | `+ -` |
//! | 10 | `* / %` |
//! | 11 | unary `! ~ - +` |
//! | 12 | invocation, primaries |

use phf::phf_map;

use super::{Value, PRIMARY_PRECEDENCE};

pub const CONDITIONAL_PRECEDENCE: u8 = 2;
pub const UNARY_PRECEDENCE: u8 = 11;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Or,
    And,
    BitOr,
    BitXor,
    BitAnd,
    Lt,
    Le,
    Eq,
    Ne,
    Ge,
    Gt,
    Plus,
    Minus,
    Times,
    Divide,
    Modulo,
}

/// Binary operator symbols.
pub static BINARY_OPS: phf::Map<&'static str, BinaryOp> = phf_map! {
    "||" => BinaryOp::Or,
    "&&" => BinaryOp::And,
    "|" => BinaryOp::BitOr,
    "^" => BinaryOp::BitXor,
    "&" => BinaryOp::BitAnd,
    "<" => BinaryOp::Lt,
    "<=" => BinaryOp::Le,
    "==" => BinaryOp::Eq,
    "!=" => BinaryOp::Ne,
    ">=" => BinaryOp::Ge,
    ">" => BinaryOp::Gt,
    "+" => BinaryOp::Plus,
    "-" => BinaryOp::Minus,
    "*" => BinaryOp::Times,
    "/" => BinaryOp::Divide,
    "%" => BinaryOp::Modulo,
};

impl BinaryOp {
    pub fn from_symbol(symbol: &str) -> Option<BinaryOp> {
        BINARY_OPS.get(symbol).copied()
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::BitAnd => "&",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Ge => ">=",
            BinaryOp::Gt => ">",
            BinaryOp::Plus => "+",
            BinaryOp::Minus => "-",
            BinaryOp::Times => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
        }
    }

    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Or => 3,
            BinaryOp::And => 4,
            BinaryOp::BitOr => 5,
            BinaryOp::BitXor => 6,
            BinaryOp::BitAnd => 7,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Ge | BinaryOp::Gt => 8,
            BinaryOp::Plus | BinaryOp::Minus => 9,
            BinaryOp::Times | BinaryOp::Divide | BinaryOp::Modulo => 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    BitNot,
    Negative,
    Positive,
}

impl UnaryOp {
    pub fn from_char(c: char) -> Option<UnaryOp> {
        match c {
            '!' => Some(UnaryOp::Not),
            '~' => Some(UnaryOp::BitNot),
            '-' => Some(UnaryOp::Negative),
            '+' => Some(UnaryOp::Positive),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
            UnaryOp::Negative => "-",
            UnaryOp::Positive => "+",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operator {
    Binary { op: BinaryOp, lhs: Box<Value>, rhs: Box<Value> },
    Unary { op: UnaryOp, operand: Box<Value> },
    Conditional { cond: Box<Value>, then: Box<Value>, otherwise: Box<Value> },
    /// Function application, `func(args)`.
    Invoke { func: Box<Value>, args: Box<Value> },
}

impl Operator {
    pub fn binary(op: BinaryOp, lhs: impl Into<Value>, rhs: impl Into<Value>) -> Self {
        Operator::Binary { op, lhs: Box::new(lhs.into()), rhs: Box::new(rhs.into()) }
    }

    pub fn unary(op: UnaryOp, operand: impl Into<Value>) -> Self {
        Operator::Unary { op, operand: Box::new(operand.into()) }
    }

    pub fn conditional(cond: impl Into<Value>, then: impl Into<Value>, otherwise: impl Into<Value>) -> Self {
        Operator::Conditional {
            cond: Box::new(cond.into()),
            then: Box::new(then.into()),
            otherwise: Box::new(otherwise.into()),
        }
    }

    pub fn invoke(func: impl Into<Value>, args: impl Into<Value>) -> Self {
        Operator::Invoke { func: Box::new(func.into()), args: Box::new(args.into()) }
    }

    pub fn precedence(&self) -> u8 {
        match self {
            Operator::Binary { op, .. } => op.precedence(),
            Operator::Unary { .. } => UNARY_PRECEDENCE,
            Operator::Conditional { .. } => CONDITIONAL_PRECEDENCE,
            Operator::Invoke { .. } => PRIMARY_PRECEDENCE,
        }
    }
}
