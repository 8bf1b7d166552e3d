//! SQLite destination.
//!
//! SQLite accepts `?`, `:name` and `$name` placeholders, so every dialect
//! can be loaded here; parameters are always bound by position.

use super::{Destination, PreparedInsert};
use crate::error::DriverError;
use crate::stream::{RowStreamWriter, Value};
use anyhow::{Context, Result};
use rusqlite::types::{ToSql, ToSqlOutput, Value as SqliteValue, ValueRef};
use rusqlite::{Connection, Statement};
use std::io::Write;

/// Loads into a SQLite database
pub struct SqliteDestination {
    conn: Connection,
}

impl SqliteDestination {
    /// Open a database file, or an in-memory database for `:memory:`
    pub fn open(path: &str) -> Result<Self> {
        let conn = if path == ":memory:" {
            Connection::open_in_memory().context("Failed to create in-memory SQLite database")?
        } else {
            Connection::open(path)
                .with_context(|| format!("Failed to open SQLite database: {}", path))?
        };
        Ok(Self { conn })
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Run `sql` and write its result set as a row stream. Returns the row count.
    pub fn export_query<W: Write>(&self, sql: &str, out: W) -> Result<u64> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .with_context(|| format!("Failed to prepare query: {}", sql))?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut writer = RowStreamWriter::new(out, &columns)?;
        let mut rows = stmt
            .query([])
            .with_context(|| format!("Failed to execute query: {}", sql))?;

        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                values.push(from_sqlite(row.get_ref(i)?));
            }
            writer.write_row(&values)?;
        }

        let count = writer.rows();
        writer.finish()?;
        Ok(count)
    }
}

fn from_sqlite(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(s) => Value::Text(String::from_utf8_lossy(s).into_owned()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(SqliteValue::Null),
            Value::Bool(b) => ToSqlOutput::Owned(SqliteValue::Integer(i64::from(*b))),
            Value::Integer(i) => ToSqlOutput::Owned(SqliteValue::Integer(*i)),
            Value::Float(f) => ToSqlOutput::Owned(SqliteValue::Real(*f)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

/// Prepared INSERT on a SQLite connection
pub struct SqliteInsert<'conn> {
    stmt: Statement<'conn>,
}

impl PreparedInsert for SqliteInsert<'_> {
    fn execute(&mut self, row: &[Value]) -> Result<(), DriverError> {
        self.stmt.execute(rusqlite::params_from_iter(row.iter()))?;
        Ok(())
    }
}

impl Destination for SqliteDestination {
    type Insert<'a> = SqliteInsert<'a>;

    fn truncate(&self, table: &str) -> Result<(), DriverError> {
        self.conn.execute_batch(&format!("delete from {}", table))?;
        Ok(())
    }

    fn begin(&self) -> Result<(), DriverError> {
        self.conn.execute_batch("BEGIN")?;
        Ok(())
    }

    fn prepare(&self, sql: &str) -> Result<Self::Insert<'_>, DriverError> {
        let stmt = self.conn.prepare(sql)?;
        Ok(SqliteInsert { stmt })
    }

    fn commit(&self) -> Result<(), DriverError> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&self) -> Result<(), DriverError> {
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }
}
