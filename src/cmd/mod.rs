mod export;
mod load;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sql-loader")]
#[command(author = "Helge Sverre <helge.sverre@gmail.com>")]
#[command(version)]
#[command(about = "Bulk-load captured row streams into database tables", long_about = None)]
pub struct Cli {
    /// Verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load a row stream into a table, committing at regular checkpoints
    Load(load::LoadArgs),

    /// Write the result of a query as a row stream
    Export(export::ExportArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Load(args) => load::run(args),
        Commands::Export(args) => export::run(args),
        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "sql-loader", &mut io::stdout());
            Ok(())
        }
    }
}

fn setup_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("sql_loader=debug,warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sql_loader=info,warn"))
    };

    // Ignore the error if a subscriber is already installed
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}
