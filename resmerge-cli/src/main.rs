//! resmerge CLI: merge overlaid resource folder sets into one tree.

mod commands;
mod error;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::merge::MergeArgs;
use commands::snapshot::SnapshotAction;

#[derive(Debug, Parser)]
#[command(name = "resmerge", version, about = "Incremental resource merging")]
struct Cli {
    /// Increase log verbosity (-v: debug, -vv: trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Scan resource folders and write the merged output tree
    Merge(MergeArgs),
    /// Work with persisted merge snapshots
    Snapshot {
        #[command(subcommand)]
        action: SnapshotAction,
    },
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "resmerge={default_level},resmerge_cli={default_level}"
        ))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Merge(args) => commands::merge::run(args).await,
        Command::Snapshot { action } => commands::snapshot::run(action),
    };

    if let Err(error) = result {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}
