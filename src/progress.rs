//! Load progress: checkpoint throughput records and a byte-counting reader.

use serde::Serialize;
use std::fmt;
use std::io::Read;
use std::time::Duration;

/// Throughput observed between two checkpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressRecord {
    /// Rows executed since the start of the load
    pub rows_total: u64,
    /// Rows executed since the previous checkpoint
    pub rows_since_checkpoint: u64,
    /// Milliseconds since the previous checkpoint
    pub elapsed_ms: u64,
    /// Rows per second, rounded to the nearest integer
    pub rows_per_sec: u64,
}

impl ProgressRecord {
    /// Compute the record for a checkpoint.
    ///
    /// A zero elapsed interval reports a rate of 0.
    pub fn compute(rows_since_checkpoint: u64, elapsed: Duration, rows_total: u64) -> Self {
        let secs = elapsed.as_secs_f64();
        let rows_per_sec = if secs > 0.0 {
            (rows_since_checkpoint as f64 / secs).round() as u64
        } else {
            0
        };

        Self {
            rows_total,
            rows_since_checkpoint,
            elapsed_ms: elapsed.as_millis() as u64,
            rows_per_sec,
        }
    }
}

impl fmt::Display for ProgressRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} rows ({} rows/s)", self.rows_total, self.rows_per_sec)
    }
}

/// A reader wrapper that tracks bytes read and calls a progress callback.
///
/// Drives the byte progress bar while the loader pulls from the input file.
pub struct ProgressReader<R: Read> {
    reader: R,
    callback: Box<dyn Fn(u64)>,
    bytes_read: u64,
}

impl<R: Read> ProgressReader<R> {
    /// The callback receives the total bytes read so far after each read
    pub fn new<F>(reader: R, callback: F) -> Self
    where
        F: Fn(u64) + 'static,
    {
        Self {
            reader,
            callback: Box::new(callback),
            bytes_read: 0,
        }
    }
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.reader.read(buf)?;
        self.bytes_read += n as u64;
        (self.callback)(self.bytes_read);
        Ok(n)
    }
}
