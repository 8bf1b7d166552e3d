//! Export command: query result → row stream file.

use crate::destination::{DatabaseUrl, DuckDbDestination, Engine, SqliteDestination};
use crate::stream::{create_output, finish_output};
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug)]
#[command(after_help = "Examples:
  sql-loader export --db duckdb:source.duckdb --query \"SELECT * FROM users\"
  sql-loader export --db sqlite:app.db --query \"SELECT id, name FROM users\" -o users.dat.zst")]
pub struct ExportArgs {
    /// Source database: duckdb:<path> or sqlite:<path>
    #[arg(long, value_name = "URL")]
    pub db: String,

    /// Query whose result set is exported
    #[arg(short, long)]
    pub query: String,

    /// Output file (compressed when it ends in .gz, .bz2, .xz or .zst)
    #[arg(short, long, value_name = "FILE", default_value = "export.dat")]
    pub output: PathBuf,
}

pub fn run(args: ExportArgs) -> Result<()> {
    let url: DatabaseUrl = args.db.parse()?;
    let mut out = create_output(&args.output)
        .with_context(|| format!("Cannot create output file: {}", args.output.display()))?;

    let rows = match url.engine {
        Engine::DuckDb => DuckDbDestination::open(&url.path)?.export_query(&args.query, &mut out)?,
        Engine::Sqlite => SqliteDestination::open(&url.path)?.export_query(&args.query, &mut out)?,
    };
    finish_output(out)
        .with_context(|| format!("Failed to finish output file: {}", args.output.display()))?;

    info!(file = %args.output.display(), db = %url, rows, "export finished");
    eprintln!("Exported {} rows to {}", rows, args.output.display());
    Ok(())
}
