//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent violations of the formula and forest rules.
/// These are independent of persistence concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("cannot parse formula '{formula}': {reason}")]
    Parse { formula: String, reason: String },

    #[error("invalid formula '{formula}': {reason}")]
    Validation { formula: String, reason: String },

    /// `from` decomposes into `label`, which already reaches `from`.
    #[error("cycle detected in decomposition at: {label} (via '{from}')")]
    CycleDetected { label: String, from: String },

    #[error("forest is inconsistent: {message}")]
    Consistency { message: String },
}

impl DomainError {
    pub fn parse(formula: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            formula: formula.into(),
            reason: reason.into(),
        }
    }

    pub fn validation(formula: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            formula: formula.into(),
            reason: reason.into(),
        }
    }

    pub fn consistency(message: impl Into<String>) -> Self {
        Self::Consistency {
            message: message.into(),
        }
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
