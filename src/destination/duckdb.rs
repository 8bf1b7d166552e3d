//! DuckDB destination.

use super::{Destination, PreparedInsert};
use crate::error::DriverError;
use crate::stream::{RowStreamWriter, Value};
use anyhow::{Context, Result};
use duckdb::types::{TimeUnit, ToSql, ToSqlOutput, Value as DuckValue, ValueRef};
use duckdb::{Connection, Statement};
use std::io::Write;

/// Loads into an embedded DuckDB database
pub struct DuckDbDestination {
    conn: Connection,
}

impl DuckDbDestination {
    /// Open a database file, or an in-memory database for `:memory:`
    pub fn open(path: &str) -> Result<Self> {
        let conn = if path == ":memory:" {
            Connection::open_in_memory().context("Failed to create in-memory DuckDB database")?
        } else {
            Connection::open(path)
                .with_context(|| format!("Failed to open DuckDB database: {}", path))?
        };
        Ok(Self { conn })
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// Get the underlying DuckDB connection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Run `sql` and write its result set as a row stream. Returns the row count.
    pub fn export_query<W: Write>(&self, sql: &str, out: W) -> Result<u64> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .with_context(|| format!("Failed to prepare query: {}", sql))?;

        let mut rows_result = stmt
            .query([])
            .with_context(|| format!("Failed to execute query: {}", sql))?;

        // Column names are only known once the query has produced a row, so
        // the header is written lazily.
        let mut sink = Some(out);
        let mut writer: Option<RowStreamWriter<W>> = None;
        let mut rows_read = 0u64;

        while let Some(row) = rows_result.next()? {
            let column_count = row.as_ref().column_count();
            let mut values = Vec::with_capacity(column_count);
            for i in 0..column_count {
                match from_duckdb(row.get_ref(i)?) {
                    Ok(v) => values.push(v),
                    Err(e) => anyhow::bail!(
                        "column '{}' of row {}: {}; cast it in the query",
                        row.as_ref().column_name(i).map_or("?", |n| n.as_str()),
                        rows_read + 1,
                        e
                    ),
                }
            }
            rows_read += 1;

            if let Some(out) = sink.take() {
                writer = Some(RowStreamWriter::new(out, &column_names(row.as_ref()))?);
            }
            if let Some(w) = writer.as_mut() {
                w.write_row(&values)?;
            }
        }

        drop(rows_result);

        let writer = match (writer, sink) {
            (Some(w), _) => w,
            (None, Some(out)) => RowStreamWriter::new(out, &column_names(&stmt))?,
            (None, None) => anyhow::bail!("query produced neither rows nor a column list"),
        };
        let rows = writer.rows();
        writer.finish()?;
        Ok(rows)
    }
}

fn column_names(stmt: &Statement<'_>) -> Vec<String> {
    (0..stmt.column_count())
        .map(|i| {
            stmt.column_name(i)
                .map(|s| s.to_string())
                .unwrap_or_else(|_| format!("col{}", i))
        })
        .collect()
}

fn to_micros(unit: TimeUnit, n: i64) -> i64 {
    match unit {
        TimeUnit::Second => n.saturating_mul(1_000_000),
        TimeUnit::Millisecond => n.saturating_mul(1000),
        TimeUnit::Microsecond => n,
        TimeUnit::Nanosecond => n / 1000,
    }
}

/// Formats an interval as `<m> months <d> days [-]HH:MM:SS[.ffffff]`.
fn format_interval(months: i32, days: i32, nanos: i64) -> String {
    let sign = if nanos < 0 { "-" } else { "" };
    let micros = (nanos / 1000).unsigned_abs();
    let secs = micros / 1_000_000;
    let frac = micros % 1_000_000;
    let mut out = format!(
        "{} months {} days {}{:02}:{:02}:{:02}",
        months,
        days,
        sign,
        secs / 3600,
        secs / 60 % 60,
        secs % 60
    );
    if frac != 0 {
        out.push_str(&format!(".{:06}", frac));
    }
    out
}

/// Converts one result cell. Types with no stream representation are an error
/// naming the DuckDB type.
fn from_duckdb(value: ValueRef<'_>) -> Result<Value, String> {
    Ok(match value {
        ValueRef::Null => Value::Null,
        ValueRef::Boolean(b) => Value::Bool(b),
        ValueRef::TinyInt(n) => Value::Integer(n.into()),
        ValueRef::SmallInt(n) => Value::Integer(n.into()),
        ValueRef::Int(n) => Value::Integer(n.into()),
        ValueRef::BigInt(n) => Value::Integer(n),
        ValueRef::UTinyInt(n) => Value::Integer(n.into()),
        ValueRef::USmallInt(n) => Value::Integer(n.into()),
        ValueRef::UInt(n) => Value::Integer(n.into()),
        ValueRef::UBigInt(n) => match i64::try_from(n) {
            Ok(i) => Value::Integer(i),
            Err(_) => Value::Text(n.to_string()),
        },
        ValueRef::HugeInt(n) => match i64::try_from(n) {
            Ok(i) => Value::Integer(i),
            Err(_) => Value::Text(n.to_string()),
        },
        ValueRef::Float(f) => Value::Float(f.into()),
        ValueRef::Double(f) => Value::Float(f),
        ValueRef::Decimal(d) => Value::Text(d.to_string()),
        ValueRef::Text(s) => Value::Text(String::from_utf8_lossy(s).into_owned()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
        ValueRef::Timestamp(unit, ts) => {
            let micros = to_micros(unit, ts);
            let secs = micros.div_euclid(1_000_000);
            let nanos = (micros.rem_euclid(1_000_000) * 1000) as u32;
            match chrono::DateTime::from_timestamp(secs, nanos) {
                Some(dt) => Value::Text(dt.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
                None => return Err(format!("timestamp {} out of range", ts)),
            }
        }
        ValueRef::Date32(days) => {
            // 719163 = days from 0001-01-01 to 1970-01-01
            match chrono::NaiveDate::from_num_days_from_ce_opt(719163 + days) {
                Some(date) => Value::Text(date.format("%Y-%m-%d").to_string()),
                None => return Err(format!("date {} out of range", days)),
            }
        }
        ValueRef::Time64(unit, t) => {
            let micros = to_micros(unit, t);
            let time = u32::try_from(micros.div_euclid(1_000_000)).ok().and_then(|secs| {
                let nanos = (micros.rem_euclid(1_000_000) * 1000) as u32;
                chrono::NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos)
            });
            match time {
                Some(time) => Value::Text(time.format("%H:%M:%S%.f").to_string()),
                None => return Err(format!("time {} out of range", t)),
            }
        }
        ValueRef::Interval {
            months,
            days,
            nanos,
        } => Value::Text(format_interval(months, days, nanos)),
        ValueRef::Enum(..) => match value.as_str() {
            Ok(label) => Value::Text(label.to_string()),
            Err(e) => return Err(e.to_string()),
        },
        other => return Err(format!("unsupported type {}", other.data_type())),
    })
}

impl ToSql for Value {
    fn to_sql(&self) -> duckdb::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::Owned(match self {
            Value::Null => DuckValue::Null,
            Value::Bool(b) => DuckValue::Boolean(*b),
            Value::Integer(i) => DuckValue::BigInt(*i),
            Value::Float(f) => DuckValue::Double(*f),
            Value::Text(s) => DuckValue::Text(s.clone()),
            Value::Blob(b) => DuckValue::Blob(b.clone()),
        }))
    }
}

/// Prepared INSERT on a DuckDB connection
pub struct DuckDbInsert<'conn> {
    stmt: Statement<'conn>,
}

impl PreparedInsert for DuckDbInsert<'_> {
    fn execute(&mut self, row: &[Value]) -> Result<(), DriverError> {
        self.stmt.execute(duckdb::params_from_iter(row.iter()))?;
        Ok(())
    }
}

impl Destination for DuckDbDestination {
    type Insert<'a> = DuckDbInsert<'a>;

    fn truncate(&self, table: &str) -> Result<(), DriverError> {
        self.conn.execute_batch(&format!("delete from {}", table))?;
        Ok(())
    }

    fn begin(&self) -> Result<(), DriverError> {
        self.conn.execute_batch("BEGIN TRANSACTION")?;
        Ok(())
    }

    fn prepare(&self, sql: &str) -> Result<Self::Insert<'_>, DriverError> {
        let stmt = self.conn.prepare(sql)?;
        Ok(DuckDbInsert { stmt })
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
