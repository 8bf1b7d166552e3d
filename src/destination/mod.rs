//! Destination databases.
//!
//! The loader only needs a handful of operations from a database: clear a
//! table, begin/commit/roll back a transaction, and prepare an INSERT that is
//! then executed once per row. [`Destination`] captures exactly that, so the
//! loader can run against any driver that provides it.
//!
//! Two embedded engines are provided: DuckDB and SQLite.

mod duckdb;
mod sqlite;

pub use self::duckdb::{DuckDbDestination, DuckDbInsert};
pub use self::sqlite::{SqliteDestination, SqliteInsert};

use crate::dialect::Dialect;
use crate::error::{DriverError, LoadError};
use crate::stream::Value;
use std::fmt;
use std::str::FromStr;

/// A database the loader can write into.
///
/// All methods take `&self`: transaction state lives in the connection, and
/// prepared statements borrow it for as long as they are open.
pub trait Destination {
    /// Prepared INSERT bound to this connection
    type Insert<'a>: PreparedInsert
    where
        Self: 'a;

    /// Remove every row from `table`
    fn truncate(&self, table: &str) -> Result<(), DriverError>;

    fn begin(&self) -> Result<(), DriverError>;

    fn prepare(&self, sql: &str) -> Result<Self::Insert<'_>, DriverError>;

    fn commit(&self) -> Result<(), DriverError>;

    fn rollback(&self) -> Result<(), DriverError>;
}

/// An open prepared INSERT. Dropping it closes the statement.
pub trait PreparedInsert {
    /// Execute once, binding `row` as ordered parameters
    fn execute(&mut self, row: &[Value]) -> Result<(), DriverError>;
}

/// Supported embedded engines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    DuckDb,
    Sqlite,
}

impl Engine {
    /// Placeholder style the engine parses natively
    pub fn native_dialect(&self) -> Dialect {
        match self {
            Engine::DuckDb => Dialect::Indexed,
            Engine::Sqlite => Dialect::Anonymous,
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Engine::DuckDb => write!(f, "duckdb"),
            Engine::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Parsed `--db` value: `duckdb:<path>` or `sqlite:<path>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseUrl {
    pub engine: Engine,
    /// File path, or `:memory:`
    pub path: String,
}

impl FromStr for DatabaseUrl {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (scheme, rest) = s.split_once(':').ok_or_else(|| {
            LoadError::InvalidConfig(format!(
                "database url '{}' has no scheme. Use duckdb:<path> or sqlite:<path>",
                s
            ))
        })?;

        let engine = match scheme.to_lowercase().as_str() {
            "duckdb" => Engine::DuckDb,
            "sqlite" | "sqlite3" => Engine::Sqlite,
            _ => {
                return Err(LoadError::InvalidConfig(format!(
                    "unknown database scheme '{}'. Valid options: duckdb, sqlite",
                    scheme
                )))
            }
        };

        let path = rest.strip_prefix("//").unwrap_or(rest);
        if path.is_empty() {
            return Err(LoadError::InvalidConfig(format!(
                "database url '{}' has no path",
                s
            )));
        }

        Ok(Self {
            engine,
            path: path.to_string(),
        })
    }
}

impl fmt::Display for DatabaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.engine, self.path)
    }
}
