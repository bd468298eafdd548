//! Operator kinds, with their precedence and associativity.

use crate::tokenizer::TokenKind;
use super::{Associativity, Precedence};
use std::fmt::{self, Display, Formatter};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The prefix operation that is being performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PrefixOpKind {
    Neg,
    Pos,
    PlusMinus,
    Pm,
    Not,
}

impl PrefixOpKind {
    /// Returns the prefix operator the token represents, if any.
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Sub => Some(Self::Neg),
            TokenKind::Add => Some(Self::Pos),
            TokenKind::PlusMinus => Some(Self::PlusMinus),
            TokenKind::Pm => Some(Self::Pm),
            TokenKind::Not => Some(Self::Not),
            _ => None,
        }
    }

    /// Returns the precedence of the prefix operation.
    pub fn precedence(&self) -> Precedence {
        match self {
            Self::Neg | Self::Pos | Self::PlusMinus | Self::Pm => Precedence::Neg,
            Self::Not => Precedence::Not,
        }
    }
}

impl Display for PrefixOpKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Neg => write!(f, "-"),
            Self::Pos => write!(f, "+"),
            Self::PlusMinus => write!(f, "+-"),
            Self::Pm => write!(f, "#pm#"),
            Self::Not => write!(f, "not "),
        }
    }
}

/// The postfix operation that is being performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PostfixOpKind {
    Factorial,
}

impl PostfixOpKind {
    /// Returns the postfix operator the token represents, if any.
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Factorial => Some(Self::Factorial),
            _ => None,
        }
    }

    /// Returns the precedence of the postfix operation.
    pub fn precedence(&self) -> Precedence {
        Precedence::Factorial
    }
}

impl Display for PostfixOpKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Factorial => write!(f, "!"),
        }
    }
}

/// The binary operation that is being performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BinOpKind {
    Assign,
    Define,
    Or,
    And,
    Eq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    Add,
    Sub,

    /// The `+-` operator as typed by a student.
    PlusMinus,

    /// The inert `#pm#` operator.
    Pm,
    Mul,
    Div,

    /// Non-commutative multiplication, `.`.
    Dot,
    Exp,
}

impl BinOpKind {
    /// Returns the binary operator the token represents, if any.
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        Some(match kind {
            TokenKind::Assign => Self::Assign,
            TokenKind::Define => Self::Define,
            TokenKind::Or => Self::Or,
            TokenKind::And => Self::And,
            TokenKind::Eq => Self::Eq,
            TokenKind::NotEq => Self::NotEq,
            TokenKind::Less => Self::Less,
            TokenKind::LessEq => Self::LessEq,
            TokenKind::Greater => Self::Greater,
            TokenKind::GreaterEq => Self::GreaterEq,
            TokenKind::Add => Self::Add,
            TokenKind::Sub => Self::Sub,
            TokenKind::PlusMinus => Self::PlusMinus,
            TokenKind::Pm => Self::Pm,
            TokenKind::Mul => Self::Mul,
            TokenKind::Div => Self::Div,
            TokenKind::Dot => Self::Dot,
            TokenKind::Exp => Self::Exp,
            _ => return None,
        })
    }

    /// Returns the precedence of the binary operation.
    pub fn precedence(&self) -> Precedence {
        match self {
            Self::Assign | Self::Define => Precedence::Assign,
            Self::Or => Precedence::Or,
            Self::And => Precedence::And,
            Self::Eq | Self::NotEq | Self::Less | Self::LessEq
                | Self::Greater | Self::GreaterEq => Precedence::Compare,
            Self::Add | Self::Sub | Self::PlusMinus | Self::Pm => Precedence::Term,
            Self::Mul | Self::Div => Precedence::Factor,
            Self::Dot => Precedence::Dot,
            Self::Exp => Precedence::Exp,
        }
    }

    /// Returns the associativity of the binary operation.
    pub fn associativity(&self) -> Associativity {
        match self {
            Self::Assign | Self::Define | Self::Exp => Associativity::Right,
            Self::Or | Self::And
                | Self::Eq | Self::NotEq | Self::Less | Self::LessEq
                | Self::Greater | Self::GreaterEq
                | Self::Add | Self::Sub | Self::PlusMinus | Self::Pm
                | Self::Mul | Self::Div | Self::Dot => Associativity::Left,
        }
    }

    /// Returns true if this is a comparison or equation operator.
    pub fn is_relation(&self) -> bool {
        self.precedence() == Precedence::Compare
    }
}

impl Display for BinOpKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Assign => write!(f, ":"),
            Self::Define => write!(f, ":="),
            Self::Or => write!(f, " or "),
            Self::And => write!(f, " and "),
            Self::Eq => write!(f, "="),
            Self::NotEq => write!(f, "#"),
            Self::Less => write!(f, "<"),
            Self::LessEq => write!(f, "<="),
            Self::Greater => write!(f, ">"),
            Self::GreaterEq => write!(f, ">="),
            Self::Add => write!(f, "+"),
            Self::Sub => write!(f, "-"),
            Self::PlusMinus => write!(f, "+-"),
            Self::Pm => write!(f, "#pm#"),
            Self::Mul => write!(f, "*"),
            Self::Div => write!(f, "/"),
            Self::Dot => write!(f, "."),
            Self::Exp => write!(f, "^"),
        }
    }
}
