mod append;
mod events;
mod streams;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use ess::SystemClock;
use ess_filestore::FlatFileEventStore;
use tracing::debug;

use self::append::Append;
use self::events::Events;
use self::streams::Streams;

/// Inspect and append to an ess event log
#[derive(Parser, Debug)]
#[command(name = "ess", version)]
struct Cli {
    /// Path of the newline delimited JSON event log
    #[arg(long, env = "ESS_LOG", default_value = "./events.json")]
    log: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Clone, Debug)]
enum Commands {
    Events(Events),
    Streams(Streams),
    Append(Append),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    debug!(log = %cli.log.display(), "opening event log");

    let store = FlatFileEventStore::new(&cli.log, SystemClock);
    let mut out = io::stdout().lock();

    match cli.command {
        Commands::Events(events) => events.run(&store, &mut out),
        Commands::Streams(streams) => streams.run(&store, &mut out),
        Commands::Append(append) => append.run(&store, &mut out),
    }
}
