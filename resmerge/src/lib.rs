//! Incremental resource merging engine.
//!
//! Merges ordered sets of resource folders (base resources, flavor
//! overlays, library dependencies) into one output tree, and keeps that
//! tree up to date from per-file change events without a full rebuild.
//!
//! # Design
//!
//! - **Sets** ([`set::ResourceSet`]) scan source roots into files and
//!   items, and reconcile file change events with a minimal item diff.
//! - **The merger** ([`merge::ResourceMerger`]) resolves each item key
//!   across sets by priority and streams winners and removals to a
//!   [`merge::MergeConsumer`].
//! - **The writer** ([`writer::MergedResourceWriter`]) materializes that
//!   stream: values items become per-qualifier `values*.xml` documents,
//!   file items are compiled concurrently through a
//!   [`compiler::ResourceCompiler`].
//! - **The repository** ([`repository::ResourceRepository`]) answers
//!   configuration-aware lookups (`which drawable serves en-rUS-hdpi?`)
//!   over the merged state.
//! - **Snapshots** ([`merge::snapshot`]) persist the merge state between
//!   builds so the next one starts from change events, not a re-scan.
//!
//! Item statuses drive incrementality: everything starts `Touched`, a
//! merge emits what is touched, and the post-merge cleanup resets the
//! surviving state to `Untouched`.

pub mod blame;
pub mod compiler;
pub mod config;
pub mod error;
pub mod merge;
pub mod model;
pub mod preprocess;
pub mod repository;
pub mod resources;
pub mod set;
pub mod values;
pub mod writer;

pub use compiler::{BoxFuture, CompileRequest, CopyCompiler, ResourceCompiler};
pub use error::MergeError;
pub use merge::{MergeConsumer, ResourceMerger};
pub use model::{FileType, ItemStatus, ResourceFile, ResourceItem, ResourceValue};
pub use preprocess::{NoOpPreprocessor, ResourcePreprocessor};
pub use repository::ResourceRepository;
pub use resources::{ResourceFolderType, ResourceType};
pub use set::ResourceSet;
pub use writer::MergedResourceWriter;
