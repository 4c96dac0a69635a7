//! Blame tracking: which source produced which merged output.
//!
//! The log maps merged outputs back to original sources so tools can point
//! diagnostics at the file a developer actually edits. It persists as a
//! JSON document in the blame folder and survives across incremental
//! merges; nothing here is consulted by the merge itself.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::MergeError;

const LOG_FILE: &str = "merger.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct LogContent {
    /// Merged output file → source file it was copied/compiled from.
    copies: BTreeMap<String, String>,
    /// Merged values entry (`folder/type/name`) → defining source file.
    sources: BTreeMap<String, String>,
}

/// Persistent source-attribution log.
#[derive(Debug)]
pub struct MergingLog {
    folder: PathBuf,
    content: LogContent,
    dirty: bool,
}

impl MergingLog {
    /// Opens the log in the given folder, loading any previous state.
    pub fn open(folder: impl Into<PathBuf>) -> Result<Self, MergeError> {
        let folder = folder.into();
        let file = folder.join(LOG_FILE);
        let content = if file.is_file() {
            let raw = std::fs::read_to_string(&file).map_err(|e| MergeError::io(&file, e))?;
            serde_json::from_str(&raw).map_err(|e| MergeError::parse(&file, e.to_string()))?
        } else {
            LogContent::default()
        };
        Ok(Self {
            folder,
            content,
            dirty: false,
        })
    }

    /// Records that `output` was produced from `source`.
    pub fn log_copy(&mut self, source: &Path, output: &Path) {
        self.content.copies.insert(
            output.display().to_string(),
            source.display().to_string(),
        );
        self.dirty = true;
    }

    /// Records that a merged values entry came from `source`.
    pub fn log_source(&mut self, entry: impl Into<String>, source: &Path) {
        self.content
            .sources
            .insert(entry.into(), source.display().to_string());
        self.dirty = true;
    }

    /// Drops attributions under `folder/` for entries no longer present in
    /// the rewritten bucket, so deleted definitions do not stay attributed
    /// across sessions.
    pub fn prune_sources(&mut self, folder: &str, live: &BTreeSet<String>) {
        let prefix = format!("{folder}/");
        let before = self.content.sources.len();
        self.content
            .sources
            .retain(|entry, _| !entry.starts_with(&prefix) || live.contains(entry));
        if self.content.sources.len() != before {
            self.dirty = true;
        }
    }

    /// Forgets an output that was deleted from the merged tree.
    pub fn log_remove(&mut self, output: &Path) {
        let key = output.display().to_string();
        self.content.copies.remove(&key);
        self.dirty = true;
    }

    /// The recorded source of a merged output, if known.
    pub fn source_of(&self, output: &Path) -> Option<&str> {
        self.content
            .copies
            .get(&output.display().to_string())
            .map(String::as_str)
    }

    /// The recorded source of a merged values entry, if known.
    pub fn source_of_entry(&self, entry: &str) -> Option<&str> {
        self.content.sources.get(entry).map(String::as_str)
    }

    /// Persists the log if anything changed since the last write.
    pub fn write(&mut self) -> Result<(), MergeError> {
        if !self.dirty {
            return Ok(());
        }
        std::fs::create_dir_all(&self.folder).map_err(|e| MergeError::io(&self.folder, e))?;
        let file = self.folder.join(LOG_FILE);
        let raw = serde_json::to_string_pretty(&self.content)
            .map_err(|e| MergeError::parse(&file, e.to_string()))?;
        std::fs::write(&file, raw).map_err(|e| MergeError::io(&file, e))?;
        self.dirty = false;
        Ok(())
    }
}
