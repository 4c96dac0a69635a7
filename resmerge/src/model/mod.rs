//! Core data model: resource items and the files that define them.

mod file;
mod item;

pub use file::{FileType, ResourceFile};
pub use item::{ItemStatus, ResourceItem, ResourceValue};
