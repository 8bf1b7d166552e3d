//! Checkpointed bulk loading of captured row streams into database tables.
//!
//! A row stream (see [`stream`]) carries a column header followed by rows.
//! The [`Loader`] turns the header into a dialect-specific parameterized
//! INSERT, executes it once per row inside a transaction, and commits at
//! wall-clock checkpoints so an interrupted load keeps everything up to the
//! last checkpoint.

pub mod config;
pub mod destination;
pub mod dialect;
pub mod error;
pub mod loader;
pub mod progress;
pub mod stream;

pub use config::{LoadConfig, DEFAULT_CHECKPOINT_INTERVAL};
pub use destination::{Destination, DuckDbDestination, PreparedInsert, SqliteDestination};
pub use dialect::{build_insert, Dialect};
pub use error::{DriverError, LoadError, LoadResult};
pub use loader::{Clock, LoadStats, Loader, SystemClock};
pub use progress::ProgressRecord;
pub use stream::{Row, RowDecoder, RowStreamWriter, Value};
