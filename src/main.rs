// Allow dead code for items that are part of the public API but only used in tests
#![allow(dead_code)]

mod cmd;
mod config;
mod destination;
mod dialect;
mod error;
mod loader;
mod progress;
mod stream;

use clap::Parser;
use cmd::Cli;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = cmd::run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
