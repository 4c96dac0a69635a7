//! Snapshot subcommands.

use std::path::PathBuf;

use clap::Subcommand;

use resmerge::merge::snapshot::load_snapshot;
use resmerge::ResourceSet;

use crate::error::CliError;

/// Snapshot action subcommands.
#[derive(Debug, Subcommand)]
pub enum SnapshotAction {
    /// Print the sets, files and items recorded in a snapshot
    Inspect {
        /// Snapshot file written by `merge --snapshot`
        file: PathBuf,
    },
}

/// Run a snapshot subcommand.
pub fn run(action: SnapshotAction) -> Result<(), CliError> {
    match action {
        SnapshotAction::Inspect { file } => {
            let merger = load_snapshot(&file)?;
            println!("Snapshot: {}", file.display());
            println!("Sets: {}", merger.sets().len());
            for set in merger.sets() {
                print_set(set, 1);
            }
            Ok(())
        }
    }
}

fn print_set(set: &ResourceSet, depth: usize) {
    let pad = "  ".repeat(depth);
    let items: usize = set.data_map().values().map(Vec::len).sum();
    let origin = match set.library_name() {
        Some(library) => format!(" (library: {library})"),
        None => String::new(),
    };
    println!(
        "{pad}{}{origin}: {} file(s), {} item(s)",
        set.name(),
        set.file_count(),
        items
    );
    if let Some(generated) = set.generated_set() {
        print_set(generated, depth + 1);
    }
}
