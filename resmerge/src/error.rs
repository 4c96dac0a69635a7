//! Error types for the merge engine.
//!
//! Errors fall into four buckets, each with its own propagation policy:
//!
//! - **Structural** (bad folder or qualifier names): collected across a full
//!   directory walk and reported together as [`MergeError::Multiple`], so a
//!   user sees every bad folder in one pass.
//! - **Content** (XML parse failures, duplicate definitions, invalid resource
//!   names): raised per file with the offending path attached.
//! - **I/O / compilation**: wrapped with the source file and abort the
//!   current writer session immediately.
//! - **Internal** invariant violations: not a user input problem; the message
//!   directs the user to a full clean rebuild.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during resource scanning, merging and writing.
#[derive(Debug, Error)]
pub enum MergeError {
    /// A resource folder name failed qualifier parsing.
    #[error("Invalid resource directory name: {}", .0.display())]
    InvalidResourceDirectory(PathBuf),

    /// A file-based resource has an invalid name.
    #[error("Invalid resource file name '{}': {reason}", file.display())]
    InvalidFileName {
        /// The offending file.
        file: PathBuf,
        /// Why the name was rejected.
        reason: String,
    },

    /// A source file could not be parsed.
    #[error("Failed to parse {}: {message}", file.display())]
    Parse {
        /// The offending file.
        file: PathBuf,
        /// Parser diagnostic.
        message: String,
    },

    /// The same resource is defined twice within one source set.
    #[error(
        "Duplicate resource '{key}' defined in {} and {}",
        first.display(),
        second.display()
    )]
    DuplicateResource {
        /// The `qualifiers/type/name` key that collided.
        key: String,
        /// File holding the first definition.
        first: PathBuf,
        /// File holding the second definition.
        second: PathBuf,
    },

    /// An I/O failure, wrapped with the file being processed.
    #[error("I/O error on {}: {source}", file.display())]
    Io {
        /// The file being read or written.
        file: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A resource compiler failure, wrapped with the source file.
    #[error("Compilation of {} failed: {message}", file.display())]
    Compile {
        /// The file that was being compiled.
        file: PathBuf,
        /// Compiler diagnostic.
        message: String,
    },

    /// An internal invariant was violated.
    ///
    /// This is not a user input error. The only recovery is a full clean
    /// rebuild, which the message says explicitly.
    #[error(
        "{0}. This is an internal error in the incremental merge state; \
         to work around it, try a full clean build"
    )]
    Internal(String),

    /// Aggregate of several errors collected during one directory walk.
    #[error("{} error(s) during resource scan", .0.len())]
    Multiple(Vec<MergeError>),
}

impl MergeError {
    /// Wraps an I/O error with the file that was being processed.
    pub fn io(file: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MergeError::Io {
            file: file.into(),
            source,
        }
    }

    /// Builds a parse error for the given file.
    pub fn parse(file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        MergeError::Parse {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Aggregates collected errors, if any.
    ///
    /// Returns `Ok(())` for an empty list, the single error unchanged for a
    /// list of one, and [`MergeError::Multiple`] otherwise.
    pub fn throw_if_non_empty(mut errors: Vec<MergeError>) -> Result<(), MergeError> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(MergeError::Multiple(errors)),
        }
    }

    /// Flattens this error into its leaf errors.
    pub fn leaves(&self) -> Vec<&MergeError> {
        match self {
            MergeError::Multiple(inner) => inner.iter().flat_map(|e| e.leaves()).collect(),
            other => vec![other],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throw_if_non_empty_ok_when_empty() {
        assert!(MergeError::throw_if_non_empty(Vec::new()).is_ok());
    }

    #[test]
    fn test_throw_if_non_empty_single_passes_through() {
        let errors = vec![MergeError::InvalidResourceDirectory("res/bogus-xyz".into())];
        let err = MergeError::throw_if_non_empty(errors).unwrap_err();
        assert!(matches!(err, MergeError::InvalidResourceDirectory(_)));
    }

    #[test]
    fn test_throw_if_non_empty_aggregates() {
        let errors = vec![
            MergeError::InvalidResourceDirectory("res/bogus-a".into()),
            MergeError::InvalidResourceDirectory("res/bogus-b".into()),
        ];
        let err = MergeError::throw_if_non_empty(errors).unwrap_err();
        match &err {
            MergeError::Multiple(inner) => assert_eq!(inner.len(), 2),
            other => panic!("expected Multiple, got {other:?}"),
        }
        assert_eq!(err.leaves().len(), 2);
    }

    #[test]
    fn test_invalid_directory_names_the_folder() {
        let err = MergeError::InvalidResourceDirectory("res/bogus-xyz".into());
        assert!(err.to_string().contains("bogus-xyz"));
        assert!(err.to_string().contains("Invalid resource directory name"));
    }

    #[test]
    fn test_internal_error_mentions_clean_build() {
        let err = MergeError::Internal("no data file for changed file".to_string());
        assert!(err.to_string().contains("full clean build"));
    }
}
