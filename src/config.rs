//! Load configuration.
//!
//! [`LoadConfig`] is built once by the command layer and passed into the
//! loader; nothing below it reads flags or the environment. An optional YAML
//! file supplies defaults that command-line flags override.

use crate::dialect::Dialect;
use crate::error::{LoadError, LoadResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Default wall-clock interval between checkpoints
pub const DEFAULT_CHECKPOINT_INTERVAL: Duration = Duration::from_secs(15);

/// Everything the loader needs to know about a run
#[derive(Debug, Clone, PartialEq)]
pub struct LoadConfig {
    pub dialect: Dialect,
    pub table: String,
    /// Clear the table before the first row is inserted
    pub truncate: bool,
    /// Commit and reopen the transaction once this much time has passed
    pub checkpoint_interval: Duration,
}

impl LoadConfig {
    /// Create a config with the default checkpoint interval and no truncate
    pub fn new(dialect: Dialect, table: impl Into<String>) -> LoadResult<Self> {
        let config = Self {
            dialect,
            table: table.into(),
            truncate: false,
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_truncate(mut self, truncate: bool) -> Self {
        self.truncate = truncate;
        self
    }

    pub fn with_checkpoint_interval(mut self, interval: Duration) -> Self {
        self.checkpoint_interval = interval;
        self
    }

    pub fn validate(&self) -> LoadResult<()> {
        if self.table.trim().is_empty() {
            return Err(LoadError::InvalidConfig("table name is empty".to_string()));
        }
        Ok(())
    }
}

/// Optional YAML defaults for the load command
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoadFileConfig {
    /// Destination database url (duckdb:<path> or sqlite:<path>)
    pub db: Option<String>,
    pub table: Option<String>,
    pub dialect: Option<Dialect>,
    pub truncate: Option<bool>,
    /// Seconds between checkpoints
    pub checkpoint_secs: Option<u64>,
}

impl LoadFileConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: LoadFileConfig = serde_yaml_ng::from_str(&content)?;
        Ok(config)
    }
}
