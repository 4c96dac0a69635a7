//! Resource files: the unit of scanning and change tracking.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::FolderConfiguration;
use crate::model::item::ResourceItem;

/// How a resource file maps to items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// One file, one item (a drawable PNG, a layout XML, ...).
    SingleFile,
    /// One source file standing for several preprocessor-generated files.
    GeneratedFiles,
    /// A values XML file defining many named items.
    XmlValues,
}

impl FileType {
    /// Stable name used by the snapshot format.
    pub fn name(self) -> &'static str {
        match self {
            FileType::SingleFile => "single_file",
            FileType::GeneratedFiles => "generated_files",
            FileType::XmlValues => "xml_values",
        }
    }

    /// Parses a snapshot type name.
    pub fn from_name(name: &str) -> Option<FileType> {
        match name {
            "single_file" => Some(FileType::SingleFile),
            "generated_files" => Some(FileType::GeneratedFiles),
            "xml_values" => Some(FileType::XmlValues),
            _ => None,
        }
    }
}

/// A source file and the items it defines.
///
/// Owns its items; each item holds a weak back-reference set by the
/// constructors, so dropping the file releases the whole subgraph.
pub struct ResourceFile {
    path: PathBuf,
    file_type: FileType,
    qualifiers: String,
    configuration: FolderConfiguration,
    items: Mutex<Vec<Arc<ResourceItem>>>,
}

impl ResourceFile {
    /// Creates a single-file resource with its one item.
    pub fn single_file(
        path: impl Into<PathBuf>,
        item: Arc<ResourceItem>,
        qualifiers: impl Into<String>,
        configuration: FolderConfiguration,
    ) -> Arc<Self> {
        Self::with_items(path, FileType::SingleFile, vec![item], qualifiers, configuration)
    }

    /// Creates a file whose items are preprocessor-generated outputs.
    pub fn generated_files(
        path: impl Into<PathBuf>,
        items: Vec<Arc<ResourceItem>>,
        qualifiers: impl Into<String>,
        configuration: FolderConfiguration,
    ) -> Arc<Self> {
        Self::with_items(path, FileType::GeneratedFiles, items, qualifiers, configuration)
    }

    /// Creates a values file with its parsed items.
    pub fn xml_values(
        path: impl Into<PathBuf>,
        items: Vec<Arc<ResourceItem>>,
        qualifiers: impl Into<String>,
        configuration: FolderConfiguration,
    ) -> Arc<Self> {
        Self::with_items(path, FileType::XmlValues, items, qualifiers, configuration)
    }

    fn with_items(
        path: impl Into<PathBuf>,
        file_type: FileType,
        items: Vec<Arc<ResourceItem>>,
        qualifiers: impl Into<String>,
        configuration: FolderConfiguration,
    ) -> Arc<Self> {
        let file = Arc::new(Self {
            path: path.into(),
            file_type,
            qualifiers: qualifiers.into(),
            configuration,
            items: Mutex::new(Vec::new()),
        });
        file.add_items(items);
        file
    }

    /// The underlying filesystem path (file identity).
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The file's type.
    pub fn file_type(&self) -> FileType {
        self.file_type
    }

    /// The folder qualifier string (e.g. `"en-rGB"`).
    pub fn qualifiers(&self) -> &str {
        &self.qualifiers
    }

    /// The parsed folder configuration.
    pub fn configuration(&self) -> &FolderConfiguration {
        &self.configuration
    }

    /// All owned items, in document/registration order.
    pub fn items(&self) -> Vec<Arc<ResourceItem>> {
        self.items.lock().clone()
    }

    /// The single item of a [`FileType::SingleFile`] file.
    pub fn single_item(&self) -> Option<Arc<ResourceItem>> {
        let items = self.items.lock();
        match self.file_type {
            FileType::SingleFile => items.first().cloned(),
            _ => None,
        }
    }

    /// Items keyed by their set key, for the item-diff pass.
    pub fn item_map(self: &Arc<Self>) -> HashMap<String, Arc<ResourceItem>> {
        self.items
            .lock()
            .iter()
            .map(|item| (item.key(), Arc::clone(item)))
            .collect()
    }

    /// Appends items and attaches them to this file.
    pub fn add_items(self: &Arc<Self>, new_items: Vec<Arc<ResourceItem>>) {
        let mut items = self.items.lock();
        for item in new_items {
            item.set_source(Some(self));
            items.push(item);
        }
    }

    /// Marks every owned item removed.
    pub fn set_items_removed(&self) {
        for item in self.items.lock().iter() {
            item.set_removed();
        }
    }

    /// Drops items that are marked removed, detaching them.
    pub fn purge_removed_items(&self) {
        self.items.lock().retain(|item| {
            if item.is_removed() {
                item.set_source(None);
                false
            } else {
                true
            }
        });
    }
}

impl fmt::Debug for ResourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceFile")
            .field("path", &self.path)
            .field("type", &self.file_type)
            .field("qualifiers", &self.qualifiers)
            .field("items", &self.items.lock().len())
            .finish()
    }
}
