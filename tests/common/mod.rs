//! Shared fixtures: an in-memory destination with fault injection and
//! simulated clocks.

#![allow(dead_code)]

use sql_loader::{Clock, Destination, DriverError, PreparedInsert, Row, RowStreamWriter, Value};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Clock that only moves when told to
#[derive(Clone)]
pub struct ManualClock(Rc<Cell<Instant>>);

impl ManualClock {
    pub fn new() -> Self {
        Self(Rc::new(Cell::new(Instant::now())))
    }

    pub fn advance(&self, by: Duration) {
        self.0.set(self.0.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.0.get()
    }
}

/// Clock that moves forward by a fixed step on every reading
pub struct TickingClock {
    now: Cell<Instant>,
    step: Duration,
}

impl TickingClock {
    pub fn new(step: Duration) -> Self {
        Self {
            now: Cell::new(Instant::now()),
            step,
        }
    }
}

impl Clock for TickingClock {
    fn now(&self) -> Instant {
        let next = self.now.get() + self.step;
        self.now.set(next);
        next
    }
}

#[derive(Default)]
pub struct MemoryState {
    pub committed: Vec<Row>,
    pub pending: Vec<Row>,
    pub in_tx: bool,
    pub begins: usize,
    pub commits: usize,
    pub rollbacks: usize,
    pub truncates: usize,
    pub prepared_sql: Vec<String>,
    pub open_statements: usize,
    pub executed: u64,
}

/// Destination that keeps rows in memory and can fail on demand
#[derive(Default)]
pub struct MemoryDestination {
    pub state: RefCell<MemoryState>,
    /// Advance this clock on every successful execute
    pub tick: Option<(ManualClock, Duration)>,
    /// Fail the n-th execute call (1-based, counted over the whole run)
    pub fail_exec_at: Option<u64>,
    /// Fail the n-th prepare call (1-based)
    pub fail_prepare_at: Option<usize>,
    /// Fail the n-th commit call (1-based)
    pub fail_commit_at: Option<usize>,
    pub fail_truncate: bool,
}

impl MemoryDestination {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<Row>) -> Self {
        let dest = Self::default();
        dest.state.borrow_mut().committed = rows;
        dest
    }

    pub fn committed(&self) -> Vec<Row> {
        self.state.borrow().committed.clone()
    }

    pub fn commits(&self) -> usize {
        self.state.borrow().commits
    }

    pub fn begins(&self) -> usize {
        self.state.borrow().begins
    }

    pub fn rollbacks(&self) -> usize {
        self.state.borrow().rollbacks
    }

    pub fn prepared_sql(&self) -> Vec<String> {
        self.state.borrow().prepared_sql.clone()
    }
}

pub struct MemoryInsert<'a> {
    dest: &'a MemoryDestination,
    params: usize,
}

impl PreparedInsert for MemoryInsert<'_> {
    fn execute(&mut self, row: &[Value]) -> Result<(), DriverError> {
        let mut state = self.dest.state.borrow_mut();
        if !state.in_tx {
            return Err("execute outside of a transaction".into());
        }
        state.executed += 1;
        if self.dest.fail_exec_at == Some(state.executed) {
            return Err(format!("injected failure on execute {}", state.executed).into());
        }
        if row.len() != self.params {
            return Err(format!("expected {} parameters, got {}", self.params, row.len()).into());
        }
        state.pending.push(row.to_vec());
        drop(state);

        if let Some((clock, by)) = &self.dest.tick {
            clock.advance(*by);
        }
        Ok(())
    }
}

impl Drop for MemoryInsert<'_> {
    fn drop(&mut self) {
        self.dest.state.borrow_mut().open_statements -= 1;
    }
}

/// Count placeholders in the VALUES list of an insert statement
fn count_params(sql: &str) -> usize {
    match sql.rsplit_once("values(") {
        Some((_, list)) => list.trim_end_matches(')').split(',').count(),
        None => 0,
    }
}

impl Destination for MemoryDestination {
    type Insert<'a> = MemoryInsert<'a>;

    fn truncate(&self, _table: &str) -> Result<(), DriverError> {
        if self.fail_truncate {
            return Err("injected truncate failure".into());
        }
        let mut state = self.state.borrow_mut();
        state.truncates += 1;
        state.committed.clear();
        Ok(())
    }

    fn begin(&self) -> Result<(), DriverError> {
        let mut state = self.state.borrow_mut();
        if state.in_tx {
            return Err("transaction already open".into());
        }
        state.in_tx = true;
        state.begins += 1;
        Ok(())
    }

    fn prepare(&self, sql: &str) -> Result<Self::Insert<'_>, DriverError> {
        let mut state = self.state.borrow_mut();
        state.prepared_sql.push(sql.to_string());
        if self.fail_prepare_at == Some(state.prepared_sql.len()) {
            return Err("injected prepare failure".into());
        }
        state.open_statements += 1;
        Ok(MemoryInsert {
            dest: self,
            params: count_params(sql),
        })
    }

    fn commit(&self) -> Result<(), DriverError> {
        let mut state = self.state.borrow_mut();
        if !state.in_tx {
            return Err("commit without transaction".into());
        }
        if self.fail_commit_at == Some(state.commits + 1) {
            return Err("injected commit failure".into());
        }
        state.commits += 1;
        let pending = std::mem::take(&mut state.pending);
        state.committed.extend(pending);
        state.in_tx = false;
        Ok(())
    }

    fn rollback(&self) -> Result<(), DriverError> {
        let mut state = self.state.borrow_mut();
        state.rollbacks += 1;
        state.pending.clear();
        state.in_tx = false;
        Ok(())
    }
}

/// Encode a stream with the given columns and rows
pub fn encode_stream(columns: &[&str], rows: &[Row]) -> Vec<u8> {
    let columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
    let mut writer = RowStreamWriter::new(Vec::new(), &columns).unwrap();
    for row in rows {
        writer.write_row(row).unwrap();
    }
    writer.finish().unwrap()
}

/// Rows `(i, "name<i>")` for i in 1..=n
pub fn numbered_rows(n: i64) -> Vec<Row> {
    (1..=n)
        .map(|i| vec![Value::Integer(i), Value::Text(format!("name{}", i))])
        .collect()
}
