//! Column header decoding.

use super::{HeaderRecord, Record, Records};
use crate::error::{LoadError, LoadResult};
use std::collections::HashSet;
use std::io::Read;

/// Read the column list that opens every stream.
///
/// Consumes exactly one record. Anything other than a well-formed header
/// with unique, non-empty names is rejected.
pub(crate) fn read_header<R: Read>(records: &mut Records<R>) -> LoadResult<Vec<String>> {
    let record = match records.next() {
        None => return Err(LoadError::schema("stream is empty")),
        Some(Err(e)) if e.is_eof() => {
            return Err(LoadError::schema("stream closed before the header was complete"))
        }
        Some(Err(e)) => return Err(LoadError::schema(format!("malformed header: {}", e))),
        Some(Ok(record)) => record,
    };

    match record {
        Record::Header(HeaderRecord { columns }) => {
            validate_columns(&columns)?;
            Ok(columns)
        }
        Record::Row(_) => Err(LoadError::schema("expected column header, found a row")),
        Record::End(_) => Err(LoadError::schema(
            "expected column header, found the end marker",
        )),
    }
}

pub(crate) fn validate_columns(columns: &[String]) -> LoadResult<()> {
    if columns.is_empty() {
        return Err(LoadError::schema("column list is empty"));
    }

    let mut seen = HashSet::with_capacity(columns.len());
    for (i, name) in columns.iter().enumerate() {
        if name.trim().is_empty() {
            return Err(LoadError::schema(format!("column {} has an empty name", i)));
        }
        if !seen.insert(name.as_str()) {
            return Err(LoadError::schema(format!("duplicate column '{}'", name)));
        }
    }
    Ok(())
}
