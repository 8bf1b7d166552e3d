//! Lazy row decoding.

use super::{schema, EndRecord, Record, Records, Row, Value};
use crate::error::{LoadError, LoadResult};
use std::io::{BufReader, Read};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecoderState {
    Reading,
    Finished,
    Failed,
}

/// Forward-only decoder over a captured row stream.
///
/// The header is read when the decoder is created; rows are then decoded one
/// at a time, so memory use does not grow with the size of the stream.
pub struct RowDecoder<R: Read> {
    records: Records<R>,
    columns: Vec<String>,
    rows_read: u64,
    state: DecoderState,
}

impl<R: Read> RowDecoder<R> {
    /// Decode the header from `reader` and position the decoder at the first row
    pub fn new(reader: R) -> LoadResult<Self> {
        let mut records = serde_json::Deserializer::from_reader(BufReader::with_capacity(
            super::STREAM_BUFFER_SIZE,
            reader,
        ))
        .into_iter::<Record>();
        let columns = schema::read_header(&mut records)?;

        Ok(Self {
            records,
            columns,
            rows_read: 0,
            state: DecoderState::Reading,
        })
    }

    /// Column names from the stream header, in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows successfully decoded so far
    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    /// Decode the next row.
    ///
    /// Returns `Ok(None)` once the end marker has been read. After the end
    /// marker or any error the decoder is exhausted and keeps returning
    /// `Ok(None)`.
    pub fn next_row(&mut self) -> LoadResult<Option<Row>> {
        if self.state != DecoderState::Reading {
            return Ok(None);
        }

        match self.decode_next() {
            Ok(Some(row)) => {
                self.rows_read += 1;
                Ok(Some(row))
            }
            Ok(None) => {
                self.state = DecoderState::Finished;
                Ok(None)
            }
            Err(e) => {
                self.state = DecoderState::Failed;
                Err(e)
            }
        }
    }

    fn decode_next(&mut self) -> LoadResult<Option<Row>> {
        let ordinal = self.rows_read + 1;

        let record = match self.records.next() {
            None => {
                return Err(LoadError::row_decode(
                    ordinal,
                    "stream ended without an end marker",
                ))
            }
            Some(Err(e)) if e.is_eof() => {
                return Err(LoadError::row_decode(ordinal, "stream truncated mid-record"))
            }
            Some(Err(e)) => {
                return Err(LoadError::row_decode(
                    ordinal,
                    format!("corrupt record: {}", e),
                ))
            }
            Some(Ok(record)) => record,
        };

        match record {
            Record::Row(values) => self.convert_row(ordinal, values).map(Some),
            Record::Header(_) => Err(LoadError::row_decode(
                ordinal,
                "unexpected second header record",
            )),
            Record::End(EndRecord { end }) => {
                if end.rows != self.rows_read {
                    return Err(LoadError::row_decode(
                        ordinal,
                        format!(
                            "end marker declares {} rows but {} were read",
                            end.rows, self.rows_read
                        ),
                    ));
                }
                match self.records.next() {
                    None => Ok(None),
                    Some(_) => Err(LoadError::row_decode(
                        ordinal,
                        "unexpected data after end marker",
                    )),
                }
            }
        }
    }

    fn convert_row(&self, ordinal: u64, values: Vec<serde_json::Value>) -> LoadResult<Row> {
        if values.len() != self.columns.len() {
            return Err(LoadError::row_decode(
                ordinal,
                format!(
                    "expected {} values, found {}",
                    self.columns.len(),
                    values.len()
                ),
            ));
        }

        values
            .into_iter()
            .zip(&self.columns)
            .map(|(value, column)| {
                Value::from_json(value)
                    .map_err(|reason| LoadError::row_decode(ordinal, format!("{}: {}", column, reason)))
            })
            .collect()
    }
}

impl<R: Read> Iterator for RowDecoder<R> {
    type Item = LoadResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row().transpose()
    }
}
