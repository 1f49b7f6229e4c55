//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::{ApplicationError, ErrorKind};
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("{0}")]
    Usage(String),
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Error category of the underlying application error, if any.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            CliError::Infra(InfraError::Application(e)) => Some(e.kind()),
            _ => None,
        }
    }

    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) | CliError::Usage(_) => crate::exitcode::USAGE,
            CliError::Infra(e) => match e {
                InfraError::Io { .. } => crate::exitcode::IOERR,
                InfraError::Catalog { .. } => crate::exitcode::CONFIG,
                InfraError::Application(e) => match e.kind() {
                    ErrorKind::Parse | ErrorKind::Validation => crate::exitcode::DATAERR,
                    ErrorKind::Conflict => crate::exitcode::TEMPFAIL,
                    ErrorKind::Store => crate::exitcode::IOERR,
                    ErrorKind::Config => crate::exitcode::CONFIG,
                    ErrorKind::NotFound => crate::exitcode::USAGE,
                    ErrorKind::Consistency | ErrorKind::Cancelled => crate::exitcode::SOFTWARE,
                },
            },
        }
    }
}
