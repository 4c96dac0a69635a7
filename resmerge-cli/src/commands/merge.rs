//! Merge command: scan resource folder sets and write the merged tree.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use tracing::info;

use resmerge::blame::MergingLog;
use resmerge::merge::snapshot::write_snapshot;
use resmerge::{CopyCompiler, MergedResourceWriter, ResourceMerger, ResourceSet};

use crate::error::CliError;

/// Arguments for the merge command.
#[derive(Debug, Args)]
pub struct MergeArgs {
    /// Resource folder to merge; repeat for overlays, last wins conflicts
    #[arg(long = "res", required = true)]
    pub res: Vec<PathBuf>,

    /// Output folder for the merged resource tree
    #[arg(long)]
    pub out: PathBuf,

    /// Library dependency set as NAME=DIR; merged below all --res sets
    #[arg(long = "library")]
    pub libraries: Vec<String>,

    /// Divert public declarations into this file
    #[arg(long)]
    pub public_txt: Option<PathBuf>,

    /// Folder for the blame log mapping outputs back to sources
    #[arg(long)]
    pub blame: Option<PathBuf>,

    /// Persist the merge state here for later inspection or resumption
    #[arg(long)]
    pub snapshot: Option<PathBuf>,
}

/// Run the merge command.
pub async fn run(args: MergeArgs) -> Result<(), CliError> {
    let mut merger = ResourceMerger::new();

    // Dependencies sit below local sources in priority.
    for library in &args.libraries {
        let (name, dir) = library.split_once('=').ok_or_else(|| {
            CliError::Usage(format!("--library expects NAME=DIR, got '{library}'"))
        })?;
        let mut set = ResourceSet::new(name).with_library_name(name);
        set.add_source(dir);
        set.scan()?;
        info!(library = name, files = set.file_count(), "scanned library set");
        merger.add_set(set);
    }

    for (index, dir) in args.res.iter().enumerate() {
        let mut set = ResourceSet::new(format!("res{index}"));
        set.add_source(dir);
        set.scan()?;
        info!(root = %dir.display(), files = set.file_count(), "scanned resource set");
        merger.add_set(set);
    }

    let mut writer = MergedResourceWriter::new(&args.out, Arc::new(CopyCompiler));
    if let Some(public_txt) = &args.public_txt {
        writer = writer.with_public_file(public_txt);
    }
    if let Some(blame) = &args.blame {
        writer = writer.with_blame_log(MergingLog::open(blame)?);
    }

    merger.merge_to(&mut writer)?;
    writer.end().await?;
    merger.post_merge_cleanup();

    if let Some(snapshot) = &args.snapshot {
        write_snapshot(&merger, snapshot)?;
    }

    println!(
        "Merged {} set(s) into {}",
        merger.sets().len(),
        args.out.display()
    );
    Ok(())
}
