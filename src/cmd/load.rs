//! Load command: stream file → destination table.

use crate::config::{LoadConfig, LoadFileConfig, DEFAULT_CHECKPOINT_INTERVAL};
use crate::destination::{DatabaseUrl, Destination, DuckDbDestination, Engine, SqliteDestination};
use crate::dialect::Dialect;
use crate::error::LoadResult;
use crate::loader::{LoadStats, Loader};
use crate::progress::ProgressReader;
use crate::stream::{open_input, Compression};
use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

#[derive(Args, Debug)]
#[command(after_help = "Examples:
  sql-loader load export.dat --db duckdb:target.duckdb --table users
  sql-loader load users.dat.gz --db sqlite:app.db --table users --dialect oci8
  sql-loader load export.dat --db duckdb:target.duckdb --table users --truncate --checkpoint-secs 5
  sql-loader load export.dat --config load.yaml --progress")]
pub struct LoadArgs {
    /// Row stream to load (supports .gz, .bz2, .xz, .zst compression)
    #[arg(value_name = "FILE", default_value = "export.dat")]
    pub file: PathBuf,

    /// Destination database: duckdb:<path> or sqlite:<path>
    #[arg(long, value_name = "URL")]
    pub db: Option<String>,

    /// Destination table
    #[arg(short, long)]
    pub table: Option<String>,

    /// Placeholder dialect: mysql (?), oci8 (:p0), postgres ($1). Defaults to the engine's own
    #[arg(short, long)]
    pub dialect: Option<String>,

    /// Delete all rows from the table before loading
    #[arg(long)]
    pub truncate: bool,

    /// Seconds between checkpoint commits (default 15)
    #[arg(long, value_name = "SECS")]
    pub checkpoint_secs: Option<u64>,

    /// YAML file with defaults for db, table, dialect, truncate, checkpoint_secs
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Show a progress bar over the input file
    #[arg(short, long)]
    pub progress: bool,

    /// Print the load statistics as JSON
    #[arg(long)]
    pub json: bool,
}

/// JSON output for the load command
#[derive(Serialize)]
struct LoadJsonOutput<'a> {
    input_file: String,
    database: String,
    dialect: String,
    truncate: bool,
    checkpoint_secs: f64,
    statistics: &'a LoadStats,
}

pub fn run(args: LoadArgs) -> Result<()> {
    let file_config = match args.config {
        Some(ref path) => LoadFileConfig::load(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?,
        None => LoadFileConfig::default(),
    };

    let db = args.db.or(file_config.db).ok_or_else(|| {
        anyhow::anyhow!("a destination is required: pass --db or set db in the config file")
    })?;
    let url: DatabaseUrl = db.parse()?;

    let dialect = match args.dialect {
        Some(ref name) => name.parse::<Dialect>()?,
        None => file_config
            .dialect
            .unwrap_or_else(|| url.engine.native_dialect()),
    };

    let checkpoint_interval = args
        .checkpoint_secs
        .or(file_config.checkpoint_secs)
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_CHECKPOINT_INTERVAL);

    let config = LoadConfig::new(dialect, args.table.or(file_config.table).unwrap_or_default())?
        .with_truncate(args.truncate || file_config.truncate.unwrap_or(false))
        .with_checkpoint_interval(checkpoint_interval);

    let reader = open_input(&args.file)?;
    let progress_bar = if args.progress {
        Some(input_progress_bar(&args.file)?)
    } else {
        None
    };
    let reader: Box<dyn Read> = match progress_bar {
        Some(ref pb) => {
            let pb_clone = pb.clone();
            Box::new(ProgressReader::new(reader, move |bytes| {
                pb_clone.set_position(bytes);
            }))
        }
        None => reader,
    };

    info!(
        file = %args.file.display(),
        db = %url,
        table = %config.table,
        dialect = %config.dialect,
        "starting load"
    );

    let stats = match url.engine {
        Engine::DuckDb => {
            let dest = DuckDbDestination::open(&url.path)?;
            load_into(&dest, config.clone(), reader)?
        }
        Engine::Sqlite => {
            let dest = SqliteDestination::open(&url.path)?;
            load_into(&dest, config.clone(), reader)?
        }
    };

    if let Some(pb) = progress_bar {
        pb.finish_with_message("Load complete");
    }

    info!(
        table = %stats.table,
        file = %args.file.display(),
        rows = stats.rows_loaded,
        "finish"
    );

    if args.json {
        let output = LoadJsonOutput {
            input_file: args.file.display().to_string(),
            database: url.to_string(),
            dialect: config.dialect.to_string(),
            truncate: config.truncate,
            checkpoint_secs: config.checkpoint_interval.as_secs_f64(),
            statistics: &stats,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        eprintln!("Loaded {}", stats);
    }

    Ok(())
}

fn load_into<D: Destination>(dest: &D, config: LoadConfig, reader: Box<dyn Read>) -> LoadResult<LoadStats> {
    Loader::new(dest, config).load_reader(reader)
}

/// Byte bar for plain files; compressed input only reports decompressed bytes, so it gets a spinner
fn input_progress_bar(path: &Path) -> Result<ProgressBar> {
    if Compression::from_path(path) != Compression::None {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {bytes} read ({bytes_per_sec})")?,
        );
        return Ok(pb);
    }

    let file_size = std::fs::metadata(path)
        .with_context(|| format!("Cannot access file: {}", path.display()))?
        .len();
    let pb = ProgressBar::new(file_size);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({percent}%)")?
            .progress_chars("=>-"),
    );
    Ok(pb)
}
