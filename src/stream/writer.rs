//! Row stream encoder, the producing side of [`RowDecoder`](super::RowDecoder).

use super::value::Value;
use super::{EndMarker, HeaderRef};
use std::io::{self, Write};

/// Writes a header, rows and the end marker, one JSON record per line
pub struct RowStreamWriter<W: Write> {
    writer: W,
    columns: usize,
    rows: u64,
}

impl<W: Write> RowStreamWriter<W> {
    /// Start a stream by writing the column header
    pub fn new(mut writer: W, columns: &[String]) -> io::Result<Self> {
        if columns.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "a row stream needs at least one column",
            ));
        }
        serde_json::to_writer(&mut writer, &HeaderRef { columns })?;
        writer.write_all(b"\n")?;

        Ok(Self {
            writer,
            columns: columns.len(),
            rows: 0,
        })
    }

    pub fn write_row(&mut self, row: &[Value]) -> io::Result<()> {
        if row.len() != self.columns {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "row has {} values but the stream has {} columns",
                    row.len(),
                    self.columns
                ),
            ));
        }
        // JSON has no NaN or infinity; serde_json would write them as null
        if let Some(pos) = row
            .iter()
            .position(|v| matches!(v, Value::Float(f) if !f.is_finite()))
        {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "value {} of row {} is not a finite number",
                    pos + 1,
                    self.rows + 1
                ),
            ));
        }
        serde_json::to_writer(&mut self.writer, row)?;
        self.writer.write_all(b"\n")?;
        self.rows += 1;
        Ok(())
    }

    /// Rows written so far
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Write the end marker, flush, and hand back the underlying writer
    pub fn finish(mut self) -> io::Result<W> {
        serde_json::to_writer(
            &mut self.writer,
            &EndRef {
                end: EndMarker { rows: self.rows },
            },
        )?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(self.writer)
    }
}

#[derive(serde::Serialize)]
struct EndRef {
    end: EndMarker,
}
