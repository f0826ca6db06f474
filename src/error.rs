//! Error types for mapping, statement building and execution.

use std::fmt;

use crate::executor::ExecError;

/// Errors returned by the mapping, building and pagination layers.
#[derive(Debug)]
pub enum TidelineError {
    /// Input is not a record or mapping after dereferencing.
    TypeMismatch {
        expected: &'static str,
        found: String,
    },
    /// A keyset column does not name any field of the record.
    UnresolvedColumn { column: String, record: String },
    /// An update encoded to zero columns.
    EmptyUpdatePayload { table: String },
    /// Keyset pagination was requested without key columns.
    MissingKeySet,
    /// Statement assembly failed.
    Build(String),
    /// The executor or row scanner failed.
    Execution { context: String, source: ExecError },
    /// Configuration could not be loaded.
    Config(config::ConfigError),
}

impl TidelineError {
    /// Wrap an executor error with a short description of what was being done.
    pub fn execution(context: impl Into<String>, source: ExecError) -> Self {
        TidelineError::Execution {
            context: context.into(),
            source,
        }
    }

    /// The underlying executor error, if any.
    pub fn exec_error(&self) -> Option<&ExecError> {
        match self {
            TidelineError::Execution { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl fmt::Display for TidelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TidelineError::TypeMismatch { expected, found } => {
                write!(f, "Type mismatch: expected {expected}, found {found}")
            }
            TidelineError::UnresolvedColumn { column, record } => {
                write!(f, "Column {column} not found in record {record}")
            }
            TidelineError::EmptyUpdatePayload { table } => {
                write!(f, "No values to update for table {table}")
            }
            TidelineError::MissingKeySet => {
                write!(f, "Keyset pagination requires at least one key column")
            }
            TidelineError::Build(s) => {
                write!(f, "Build error: {s}")
            }
            TidelineError::Execution { context, source } => {
                write!(f, "{context}: {source}")
            }
            TidelineError::Config(e) => {
                write!(f, "Configuration error: {e}")
            }
        }
    }
}

impl std::error::Error for TidelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TidelineError::Execution { source, .. } => Some(source),
            TidelineError::Config(e) => Some(e),
            _ => None,
        }
    }
}
