//! Captured row streams.
//!
//! A stream is a sequence of self-delimiting JSON records: a column header,
//! zero or more rows, and an end marker carrying the row count.
//!
//! ```text
//! {"columns":["id","name"]}
//! [1,"a"]
//! [2,null]
//! {"end":{"rows":2}}
//! ```
//!
//! The explicit end marker lets the decoder tell a complete stream from one
//! that was cut short, even when the cut falls on a record boundary.

mod compression;
mod rows;
mod schema;
mod value;
mod writer;

pub use compression::{CompressedWriter, Compression};
pub use rows::RowDecoder;
pub use value::{Row, Value};
pub use writer::RowStreamWriter;

use crate::error::{LoadError, LoadResult};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read};
use std::path::Path;

/// Read buffer used in front of the JSON decoder
pub const STREAM_BUFFER_SIZE: usize = 256 * 1024;

/// Records as they appear on the wire
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Record {
    Row(Vec<serde_json::Value>),
    Header(HeaderRecord),
    End(EndRecord),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct HeaderRecord {
    pub columns: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct EndRecord {
    pub end: EndMarker,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct EndMarker {
    pub rows: u64,
}

#[derive(Serialize)]
pub(crate) struct HeaderRef<'a> {
    pub columns: &'a [String],
}

pub(crate) type Records<R> = serde_json::StreamDeserializer<
    'static,
    serde_json::de::IoRead<BufReader<R>>,
    Record,
>;

/// Open a stream file for reading, decompressing according to its extension
pub fn open_input(path: &Path) -> LoadResult<Box<dyn Read>> {
    let open_err = |source| LoadError::StreamOpen {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(open_err)?;
    Compression::from_path(path)
        .wrap_reader(Box::new(file))
        .map_err(open_err)
}

/// A stream file opened by [`create_output`]
pub type OutputFile = CompressedWriter<BufWriter<File>>;

/// Create a stream file for writing, compressing according to its extension.
///
/// The file is complete only after [`finish_output`] succeeds.
pub fn create_output(path: &Path) -> std::io::Result<OutputFile> {
    let file = File::create(path)?;
    Compression::from_path(path).wrap_writer(BufWriter::new(file))
}

/// Write the compression trailer, flush buffers and sync the file to disk
pub fn finish_output(out: OutputFile) -> std::io::Result<()> {
    let file = out.finish()?.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()
}
