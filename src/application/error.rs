//! Application-level errors (wraps domain and store errors)

use std::fmt;

use thiserror::Error;

use crate::domain::DomainError;
use crate::infrastructure::traits::StoreError;

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Error raised while processing one formula of a batch (1-based position).
    #[error("formula #{position} '{formula}': {source}")]
    Formula {
        position: usize,
        formula: String,
        #[source]
        source: Box<ApplicationError>,
    },

    #[error("no category for tree type '{tree_type}' and KPI '{kpi}'")]
    CategoryNotFound { tree_type: String, kpi: String },

    #[error("generation cancelled")]
    Cancelled,

    #[error("config error: {message}")]
    Config { message: String },
}

/// Error category shown to users next to the rejected formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    Validation,
    Conflict,
    Consistency,
    Store,
    NotFound,
    Cancelled,
    Config,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Parse => "ParseError",
            ErrorKind::Validation => "ValidationError",
            ErrorKind::Conflict => "ConflictError",
            ErrorKind::Consistency => "ConsistencyError",
            ErrorKind::Store => "StoreError",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Cancelled => "Cancelled",
            ErrorKind::Config => "ConfigError",
        };
        f.write_str(name)
    }
}

impl ApplicationError {
    /// Attach the offending formula and its 1-based input position.
    pub fn in_formula(self, position: usize, formula: &str) -> Self {
        Self::Formula {
            position,
            formula: formula.to_string(),
            source: Box::new(self),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApplicationError::Domain(e) => domain_kind(e),
            ApplicationError::Store(e) => match e {
                StoreError::Conflict { .. } => ErrorKind::Conflict,
                StoreError::NotFound { .. } => ErrorKind::Consistency,
                StoreError::Invalid(e) => domain_kind(e),
                StoreError::Corrupt { .. } | StoreError::Unavailable { .. } => ErrorKind::Store,
            },
            ApplicationError::Formula { source, .. } => source.kind(),
            ApplicationError::CategoryNotFound { .. } => ErrorKind::NotFound,
            ApplicationError::Cancelled => ErrorKind::Cancelled,
            ApplicationError::Config { .. } => ErrorKind::Config,
        }
    }

    /// Input position of the offending formula, if the error is tied to one.
    pub fn position(&self) -> Option<usize> {
        match self {
            ApplicationError::Formula { position, .. } => Some(*position),
            _ => None,
        }
    }
}

fn domain_kind(e: &DomainError) -> ErrorKind {
    match e {
        DomainError::Parse { .. } => ErrorKind::Parse,
        DomainError::Validation { .. } => ErrorKind::Validation,
        DomainError::CycleDetected { .. } | DomainError::Consistency { .. } => {
            ErrorKind::Consistency
        }
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
