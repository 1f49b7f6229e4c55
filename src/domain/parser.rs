//! Formula parsing: `root = a <op> b <op> c`.
//!
//! Only single-operator splits are supported. The first operator character found
//! scanning left to right decides the split; other operator characters stay inside
//! the operand labels. There is no precedence and no parenthesis handling.

use tracing::instrument;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::operator::{Operator, OPERATOR_SYMBOLS};

/// Right-hand side of a formula split into its operator and operand labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedExpression {
    /// Operand labels in original left-to-right order
    pub operands: Vec<String>,
    /// `None` for a bare alias such as `b`
    pub operator: Option<Operator>,
}

/// A formula separated into root label and right-hand side, both trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormulaParts {
    pub root: String,
    pub expression: String,
}

/// Split a formula on its first `=` into root label and expression.
#[instrument(level = "trace")]
pub fn split_formula(formula: &str) -> DomainResult<FormulaParts> {
    let (lhs, rhs) = formula
        .split_once('=')
        .ok_or_else(|| DomainError::parse(formula, "missing '=' separator"))?;

    let root = lhs.trim();
    if root.is_empty() {
        return Err(DomainError::validation(formula, "root label is empty"));
    }

    Ok(FormulaParts {
        root: root.to_string(),
        expression: rhs.trim().to_string(),
    })
}

/// Parse the right-hand side of a formula.
///
/// Splits on every occurrence of the first operator character found. Without any
/// operator character the whole trimmed string is the single operand.
#[instrument(level = "trace")]
pub fn parse(expression: &str) -> DomainResult<ParsedExpression> {
    let trimmed = expression.trim();
    if trimmed.is_empty() {
        return Err(DomainError::parse(expression, "expression is empty"));
    }

    let symbol = trimmed.chars().find(|c| OPERATOR_SYMBOLS.contains(c));
    let Some(symbol) = symbol else {
        return Ok(ParsedExpression {
            operands: vec![trimmed.to_string()],
            operator: None,
        });
    };
    let operator = Operator::try_from(symbol)?;

    let operands: Vec<String> = trimmed
        .split(symbol)
        .map(|piece| piece.trim().to_string())
        .collect();
    if operands.iter().any(String::is_empty) {
        return Err(DomainError::parse(
            expression,
            format!("empty operand around '{operator}'"),
        ));
    }

    Ok(ParsedExpression {
        operands,
        operator: Some(operator),
    })
}
