//! The closed set of decomposition operators.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

/// Characters the parser treats as operators, in no particular precedence.
pub const OPERATOR_SYMBOLS: [char; 5] = ['+', '-', '*', '/', '%'];

/// Operator joining the children of a decomposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Subtract,
    #[serde(rename = "*")]
    Multiply,
    #[serde(rename = "/")]
    Divide,
    #[serde(rename = "%")]
    Modulo,
}

impl Operator {
    pub fn symbol(self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Subtract => '-',
            Operator::Multiply => '*',
            Operator::Divide => '/',
            Operator::Modulo => '%',
        }
    }

    /// Returns the operator for `c`, or `None` if `c` is not an operator symbol.
    pub fn from_symbol(c: char) -> Option<Self> {
        match c {
            '+' => Some(Operator::Add),
            '-' => Some(Operator::Subtract),
            '*' => Some(Operator::Multiply),
            '/' => Some(Operator::Divide),
            '%' => Some(Operator::Modulo),
            _ => None,
        }
    }
}

impl TryFrom<char> for Operator {
    type Error = DomainError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        Operator::from_symbol(c).ok_or_else(|| {
            DomainError::validation(c.to_string(), format!("unsupported operator '{c}'"))
        })
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_every_symbol_when_converting_then_round_trips_through_symbol() {
        for c in OPERATOR_SYMBOLS {
            let op = Operator::try_from(c).expect("supported symbol");
            assert_eq!(op.symbol(), c);
        }
    }

    #[test]
    fn given_unsupported_symbol_when_converting_then_validation_error() {
        let err = Operator::try_from('^').unwrap_err();
        assert!(matches!(err, DomainError::Validation { .. }));
    }

    #[test]
    fn given_operator_when_serializing_then_uses_symbol() {
        let json = serde_json::to_string(&Operator::Multiply).unwrap();
        assert_eq!(json, "\"*\"");
        let back: Operator = serde_json::from_str("\"%\"").unwrap();
        assert_eq!(back, Operator::Modulo);
    }
}
