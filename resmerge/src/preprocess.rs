//! Source preprocessing hooks.
//!
//! A preprocessor turns one source file into several generated outputs
//! (density variants of a vector image, for example). The set layer asks it
//! which sources it claims and which outputs each source stands for; actual
//! generation is deferred to the writer's `end()` phase so it can run on
//! blocking workers.

use std::path::{Path, PathBuf};

use crate::error::MergeError;

/// Expands claimed source files into generated outputs.
pub trait ResourcePreprocessor: Send + Sync {
    /// Whether this preprocessor claims the given source file.
    fn needs_preprocessing(&self, source: &Path) -> bool;

    /// The output files one claimed source stands for.
    ///
    /// Each path's parent folder name carries the output's qualifiers
    /// (`drawable-hdpi/icon.png`).
    fn files_to_generate(&self, source: &Path) -> Result<Vec<PathBuf>, MergeError>;

    /// Produces one output file from its source.
    fn generate_file(&self, to_generate: &Path, source: &Path) -> Result<(), MergeError>;
}

/// Preprocessor that claims nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpPreprocessor;

impl ResourcePreprocessor for NoOpPreprocessor {
    fn needs_preprocessing(&self, _source: &Path) -> bool {
        false
    }

    fn files_to_generate(&self, _source: &Path) -> Result<Vec<PathBuf>, MergeError> {
        Ok(Vec::new())
    }

    fn generate_file(&self, to_generate: &Path, _source: &Path) -> Result<(), MergeError> {
        Err(MergeError::Internal(format!(
            "no preprocessor is configured to generate {}",
            to_generate.display()
        )))
    }
}
