//! One transaction and the INSERT prepared inside it.

use crate::destination::{Destination, PreparedInsert};
use crate::error::{DriverError, LoadError, LoadResult};
use crate::stream::Value;
use tracing::{debug, warn};

/// An open transaction with its prepared INSERT.
///
/// The transaction is rolled back when the batch is dropped without a
/// successful [`commit`](Batch::commit), so every early return on the error
/// path discards the rows executed since the last checkpoint.
pub(crate) struct Batch<'d, D: Destination + 'd> {
    dest: &'d D,
    insert: Option<D::Insert<'d>>,
    open: bool,
}

impl<'d, D: Destination + 'd> Batch<'d, D> {
    /// Begin a transaction and prepare `sql` in it.
    ///
    /// `next_row` is the ordinal of the first row this batch will receive,
    /// used to attribute failures.
    pub fn open(dest: &'d D, sql: &str, next_row: u64) -> LoadResult<Self> {
        dest.begin()
            .map_err(|source| LoadError::Begin {
                row: next_row,
                source,
            })?;

        let mut batch = Self {
            dest,
            insert: None,
            open: true,
        };

        let insert = dest.prepare(sql).map_err(|source| LoadError::Prepare {
            row: next_row,
            source,
        })?;
        batch.insert = Some(insert);

        Ok(batch)
    }

    pub fn execute(&mut self, row: &[Value]) -> Result<(), DriverError> {
        match self.insert.as_mut() {
            Some(insert) => insert.execute(row),
            None => Err("insert statement is closed".into()),
        }
    }

    /// Commit the transaction, then close the statement.
    ///
    /// `row` is the ordinal of the last row executed in this batch.
    pub fn commit(mut self, row: u64) -> LoadResult<()> {
        self.dest
            .commit()
            .map_err(|source| LoadError::Commit { row, source })?;
        self.open = false;
        self.insert = None;
        debug!(row, "transaction committed");
        Ok(())
    }
}

impl<'d, D: Destination + 'd> Drop for Batch<'d, D> {
    fn drop(&mut self) {
        self.insert = None;
        if self.open {
            match self.dest.rollback() {
                Ok(()) => debug!("transaction rolled back"),
                Err(e) => warn!(error = %e, "rollback failed"),
            }
        }
    }
}
