//! Checkpointed bulk loader.
//!
//! Rows are executed one at a time against a prepared INSERT inside a
//! transaction. Once the checkpoint interval has elapsed, the loader reports
//! progress, commits, and reopens a fresh transaction and statement. A
//! failure rolls back only the rows since the last checkpoint; everything
//! committed before stays in the table.
//!
//! # Example
//!
//! ```ignore
//! use sql_loader::{Dialect, DuckDbDestination, LoadConfig, Loader, RowDecoder};
//!
//! let dest = DuckDbDestination::open("target.duckdb")?;
//! let config = LoadConfig::new(Dialect::Indexed, "users")?;
//! let rows = RowDecoder::new(std::fs::File::open("export.dat")?)?;
//! let stats = Loader::new(&dest, config).load(rows)?;
//! println!("{}", stats);
//! ```

mod batch;
mod clock;

pub use clock::{Clock, SystemClock};

use crate::config::LoadConfig;
use crate::destination::Destination;
use crate::dialect::build_insert;
use crate::error::{LoadError, LoadResult};
use crate::progress::ProgressRecord;
use crate::stream::RowDecoder;
use batch::Batch;
use serde::Serialize;
use std::io::Read;
use std::time::Instant;
use tracing::{debug, info};

/// Statistics from a completed load
#[derive(Debug, Default, Clone, Serialize)]
pub struct LoadStats {
    /// Destination table
    pub table: String,
    /// Rows inserted and committed
    pub rows_loaded: u64,
    /// Intermediate commits taken before the final one
    pub checkpoints: u64,
    /// Load duration in seconds
    pub duration_secs: f64,
}

impl std::fmt::Display for LoadStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} rows loaded into {} in {:.2}s ({} checkpoints)",
            self.rows_loaded, self.table, self.duration_secs, self.checkpoints
        )
    }
}

/// Row counters and time of the last checkpoint
#[derive(Debug, Clone, Copy)]
struct Checkpoint {
    rows: u64,
    rows_at_checkpoint: u64,
    at: Instant,
    taken: u64,
}

impl Checkpoint {
    fn new(at: Instant) -> Self {
        Self {
            rows: 0,
            rows_at_checkpoint: 0,
            at,
            taken: 0,
        }
    }

    fn progress(&self, now: Instant) -> ProgressRecord {
        ProgressRecord::compute(
            self.rows - self.rows_at_checkpoint,
            now.saturating_duration_since(self.at),
            self.rows,
        )
    }

    fn reset(&mut self, now: Instant) {
        self.rows_at_checkpoint = self.rows;
        self.at = now;
        self.taken += 1;
    }
}

/// Loads a row stream into one table of a [`Destination`]
pub struct Loader<'d, D: Destination, C: Clock = SystemClock> {
    dest: &'d D,
    config: LoadConfig,
    clock: C,
    progress_fn: Option<Box<dyn FnMut(&ProgressRecord) + 'd>>,
}

impl<'d, D: Destination> Loader<'d, D, SystemClock> {
    pub fn new(dest: &'d D, config: LoadConfig) -> Self {
        Self {
            dest,
            config,
            clock: SystemClock,
            progress_fn: None,
        }
    }
}

impl<'d, D: Destination, C: Clock> Loader<'d, D, C> {
    /// Replace the clock that drives checkpoints
    pub fn with_clock<C2: Clock>(self, clock: C2) -> Loader<'d, D, C2> {
        Loader {
            dest: self.dest,
            config: self.config,
            clock,
            progress_fn: self.progress_fn,
        }
    }

    /// Call `f` with the progress record of every checkpoint
    pub fn with_progress<F: FnMut(&ProgressRecord) + 'd>(mut self, f: F) -> Self {
        self.progress_fn = Some(Box::new(f));
        self
    }

    pub fn config(&self) -> &LoadConfig {
        &self.config
    }

    /// Decode the stream header from `reader` and load every row
    pub fn load_reader<R: Read>(&mut self, reader: R) -> LoadResult<LoadStats> {
        let rows = RowDecoder::new(reader)?;
        self.load(rows)
    }

    /// Load every remaining row of `rows`
    pub fn load<R: Read>(&mut self, mut rows: RowDecoder<R>) -> LoadResult<LoadStats> {
        self.config.validate()?;
        let started = self.clock.now();
        let table = self.config.table.clone();

        let sql = build_insert(self.config.dialect, &table, rows.columns());
        debug!(%sql, dialect = %self.config.dialect, "built insert statement");

        if self.config.truncate {
            self.dest
                .truncate(&table)
                .map_err(|source| LoadError::Truncate {
                    table: table.clone(),
                    source,
                })?;
            info!(%table, "table truncated");
        }

        let mut state = Checkpoint::new(self.clock.now());
        let mut batch = Batch::open(self.dest, &sql, 1)?;

        while let Some(row) = rows.next_row()? {
            state.rows += 1;
            batch.execute(&row).map_err(|source| LoadError::Exec {
                row: state.rows,
                source,
            })?;

            let now = self.clock.now();
            if now.saturating_duration_since(state.at) > self.config.checkpoint_interval {
                let record = state.progress(now);
                self.report(&record);

                batch.commit(state.rows)?;
                state.reset(now);
                batch = Batch::open(self.dest, &sql, state.rows + 1)?;
            }
        }

        batch.commit(state.rows)?;

        let stats = LoadStats {
            table,
            rows_loaded: state.rows,
            checkpoints: state.taken,
            duration_secs: self
                .clock
                .now()
                .saturating_duration_since(started)
                .as_secs_f64(),
        };
        debug!(rows = stats.rows_loaded, checkpoints = stats.checkpoints, "load complete");
        Ok(stats)
    }

    fn report(&mut self, record: &ProgressRecord) {
        info!(
            rows = record.rows_total,
            rate = record.rows_per_sec,
            "progress"
        );
        if let Some(f) = self.progress_fn.as_mut() {
            f(record);
        }
    }
}
