//! Error types for the loader.
//!
//! Every failure is fatal to a load. Variants that happen while rows are
//! flowing carry the 1-based ordinal of the row being handled so the
//! diagnostic points at the offending record. Driver failures are kept as
//! the error `source` rather than flattened into the message.

use std::path::PathBuf;
use thiserror::Error;

/// Error type returned by destination drivers.
pub type DriverError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias for loader operations
pub type LoadResult<T> = Result<T, LoadError>;

#[derive(Error, Debug)]
pub enum LoadError {
    /// The input file could not be opened
    #[error("cannot open input stream '{}'", path.display())]
    StreamOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The column header is missing or malformed
    #[error("invalid stream header: {reason}")]
    SchemaDecode { reason: String },

    /// A row record is malformed, truncated or has the wrong arity
    #[error("row {row}: {reason}")]
    RowDecode { row: u64, reason: String },

    /// Unknown dialect name
    #[error("unsupported dialect '{name}'. Valid options: mysql, oci8, postgres")]
    DialectUnsupported { name: String },

    /// Configuration that cannot describe a load
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to truncate table {table}")]
    Truncate {
        table: String,
        #[source]
        source: DriverError,
    },

    #[error("row {row}: failed to begin transaction")]
    Begin {
        row: u64,
        #[source]
        source: DriverError,
    },

    #[error("row {row}: failed to prepare insert")]
    Prepare {
        row: u64,
        #[source]
        source: DriverError,
    },

    #[error("row {row}: insert failed")]
    Exec {
        row: u64,
        #[source]
        source: DriverError,
    },

    #[error("row {row}: commit failed")]
    Commit {
        row: u64,
        #[source]
        source: DriverError,
    },
}

impl LoadError {
    /// Row ordinal the error is attributed to, if it happened while rows were flowing
    pub fn row(&self) -> Option<u64> {
        match self {
            LoadError::RowDecode { row, .. }
            | LoadError::Begin { row, .. }
            | LoadError::Prepare { row, .. }
            | LoadError::Exec { row, .. }
            | LoadError::Commit { row, .. } => Some(*row),
            _ => None,
        }
    }

    pub(crate) fn row_decode(row: u64, reason: impl Into<String>) -> Self {
        LoadError::RowDecode {
            row,
            reason: reason.into(),
        }
    }

    pub(crate) fn schema(reason: impl Into<String>) -> Self {
        LoadError::SchemaDecode {
            reason: reason.into(),
        }
    }
}
