//! Resource sets: ordered source roots scanned into files and items.
//!
//! A [`ResourceSet`] owns the files found under its source roots and the
//! items parsed out of them. It supports one full [`scan`](ResourceSet::scan)
//! and, afterwards, per-file incremental updates that keep item statuses
//! minimal: untouched items stay untouched, so downstream consumers only
//! re-emit what actually changed.
//!
//! Sets with a preprocessor carry a linked *generated set* holding the
//! expansion of claimed source files; the incremental handlers route each
//! file event to whichever set currently tracks the file.

pub mod ids;
mod validate;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::config::FolderConfiguration;
use crate::error::MergeError;
use crate::model::{ResourceFile, ResourceItem, ResourceValue};
use crate::preprocess::{NoOpPreprocessor, ResourcePreprocessor};
use crate::resources::{ResourceFolderType, ResourceType};
use crate::values::parse_values_file;

pub use validate::validate_file_resource_name;

/// Classification of one resource folder.
#[derive(Debug, Clone)]
pub struct FolderData {
    /// The folder's kind (`values`, `drawable`, ...).
    pub folder_type: ResourceFolderType,
    /// Parsed qualifiers from the folder name suffix.
    pub configuration: FolderConfiguration,
    /// Qualifier string attached to items from this folder.
    pub qualifiers: String,
}

/// An ordered collection of source roots and the resources inside them.
pub struct ResourceSet {
    name: String,
    namespace: String,
    library_name: Option<String>,
    from_dependency: bool,
    source_roots: Vec<PathBuf>,
    files: BTreeMap<PathBuf, Arc<ResourceFile>>,
    generated_set: Option<Box<ResourceSet>>,
    preprocessor: Arc<dyn ResourcePreprocessor>,
    validate_names: bool,
    normalize_qualifiers: bool,
    parse_ids: bool,
}

impl ResourceSet {
    /// Creates an empty set.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: String::new(),
            library_name: None,
            from_dependency: false,
            source_roots: Vec::new(),
            files: BTreeMap::new(),
            generated_set: None,
            preprocessor: Arc::new(NoOpPreprocessor),
            validate_names: true,
            normalize_qualifiers: true,
            parse_ids: true,
        }
    }

    /// Sets the namespace items from this set belong to.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Marks this set as coming from the named library dependency.
    pub fn with_library_name(mut self, library_name: impl Into<String>) -> Self {
        self.library_name = Some(library_name.into());
        self.from_dependency = true;
        self
    }

    /// Sets the dependency flag without naming a library.
    pub fn with_from_dependency(mut self, from_dependency: bool) -> Self {
        self.from_dependency = from_dependency;
        self
    }

    /// Installs a preprocessor and the linked generated set that will hold
    /// the expansion of claimed source files.
    pub fn with_preprocessor(mut self, preprocessor: Arc<dyn ResourcePreprocessor>) -> Self {
        self.preprocessor = preprocessor;
        let mut generated = ResourceSet::new(format!("{}$Generated", self.name));
        generated.namespace = self.namespace.clone();
        generated.library_name = self.library_name.clone();
        generated.from_dependency = self.from_dependency;
        self.generated_set = Some(Box::new(generated));
        self
    }

    /// Enables or disables file-based resource name validation.
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate_names = validate;
        self
    }

    /// Enables or disables qualifier normalization (canonical casing and
    /// ordering of the qualifier string).
    pub fn with_qualifier_normalization(mut self, normalize: bool) -> Self {
        self.normalize_qualifiers = normalize;
        self
    }

    /// Enables or disables `@+id/` extraction from layout and menu XML.
    pub fn with_id_parsing(mut self, parse_ids: bool) -> Self {
        self.parse_ids = parse_ids;
        self
    }

    /// Appends a source root. Later roots do not shadow earlier ones;
    /// duplicate keys across roots are merge conflicts.
    pub fn add_source(&mut self, root: impl Into<PathBuf>) {
        self.source_roots.push(root.into());
    }

    /// The set's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The set's namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Library this set came from, if dependency-derived.
    pub fn library_name(&self) -> Option<&str> {
        self.library_name.as_deref()
    }

    /// Whether this set belongs to a dependency rather than local sources.
    pub fn is_from_dependency(&self) -> bool {
        self.from_dependency
    }

    /// The source roots in registration order.
    pub fn source_roots(&self) -> &[PathBuf] {
        &self.source_roots
    }

    /// The linked generated set, if a preprocessor is installed.
    pub fn generated_set(&self) -> Option<&ResourceSet> {
        self.generated_set.as_deref()
    }

    /// All tracked files, in path order.
    pub fn files(&self) -> impl Iterator<Item = &Arc<ResourceFile>> {
        self.files.values()
    }

    /// Number of tracked files.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Whether the set tracks no files at all.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
            && self
                .generated_set
                .as_ref()
                .is_none_or(|g| g.files.is_empty())
    }

    /// Key → items across all tracked files, in deterministic order.
    ///
    /// A key can map to several items during an incremental update (a
    /// removed item plus its replacement); two *live* items under one key
    /// are a duplicate conflict, surfaced at merge time.
    pub fn data_map(&self) -> BTreeMap<String, Vec<Arc<ResourceItem>>> {
        let mut map: BTreeMap<String, Vec<Arc<ResourceItem>>> = BTreeMap::new();
        for file in self.files.values() {
            for item in file.items() {
                map.entry(item.key()).or_default().push(item);
            }
        }
        map
    }

    // ================================================================
    // Full scan
    // ================================================================

    /// Walks every source root, classifying folders and parsing files.
    ///
    /// Structural and content errors are collected across the whole walk and
    /// reported together, so one pass surfaces every problem.
    pub fn scan(&mut self) -> Result<(), MergeError> {
        let mut errors = Vec::new();
        let roots = self.source_roots.clone();
        for root in &roots {
            if let Err(error) = self.scan_root(root, &mut errors) {
                errors.push(error);
            }
        }
        debug!(
            set = %self.name,
            files = self.files.len(),
            errors = errors.len(),
            "scan complete"
        );
        MergeError::throw_if_non_empty(errors)
    }

    fn scan_root(&mut self, root: &Path, errors: &mut Vec<MergeError>) -> Result<(), MergeError> {
        let entries = std::fs::read_dir(root).map_err(|e| MergeError::io(root, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| MergeError::io(root, e))?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let Some(folder_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if is_ignored(folder_name) {
                continue;
            }
            match self.folder_data(&path, folder_name) {
                Ok(Some(folder)) => self.scan_folder(&path, &folder, errors),
                Ok(None) => {
                    debug!(folder = %path.display(), "skipping unrecognized folder");
                }
                Err(error) => errors.push(error),
            }
        }
        Ok(())
    }

    fn scan_folder(&mut self, folder_path: &Path, folder: &FolderData, errors: &mut Vec<MergeError>) {
        let entries = match std::fs::read_dir(folder_path) {
            Ok(entries) => entries,
            Err(e) => {
                errors.push(MergeError::io(folder_path, e));
                return;
            }
        };
        for entry in entries {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    errors.push(MergeError::io(folder_path, e));
                    continue;
                }
            };
            if !path.is_file() {
                continue;
            }
            if path
                .file_name()
                .and_then(|n| n.to_str())
                .is_none_or(is_ignored)
            {
                continue;
            }
            if let Err(error) = self.track_file(&path, folder) {
                errors.push(error);
            }
        }
    }

    /// Creates the file record for `path` in this set or, for preprocessed
    /// sources, in the generated set.
    fn track_file(&mut self, path: &Path, folder: &FolderData) -> Result<(), MergeError> {
        if self.generated_set.is_some() && self.preprocessor.needs_preprocessing(path) {
            let file = self.create_generated_file(path, folder)?;
            if let Some(generated) = &mut self.generated_set {
                generated.files.insert(path.to_path_buf(), file);
            }
            return Ok(());
        }
        let file = self.create_file(path, folder)?;
        self.files.insert(path.to_path_buf(), file);
        Ok(())
    }

    // ================================================================
    // Incremental updates
    // ================================================================

    /// Tracks a newly created file.
    ///
    /// Files in unrecognized folders are skipped; a recognized folder with
    /// invalid qualifiers is an error.
    pub fn handle_new_file(&mut self, path: &Path) -> Result<(), MergeError> {
        let Some(folder) = self.classify_parent(path)? else {
            return Ok(());
        };
        debug!(set = %self.name, file = %path.display(), "new file");
        self.track_file(path, &folder)
    }

    /// Updates the merge state for a changed file.
    ///
    /// The file may move between this set and the generated set when the
    /// preprocessor's claim on it changes.
    pub fn handle_changed_file(&mut self, path: &Path) -> Result<(), MergeError> {
        let Some(folder) = self.classify_parent(path)? else {
            return Ok(());
        };
        let was_generated = self
            .generated_set
            .as_ref()
            .is_some_and(|g| g.files.contains_key(path));
        let needs_preprocessing = self.preprocessor.needs_preprocessing(path);
        debug!(
            set = %self.name,
            file = %path.display(),
            was_generated,
            needs_preprocessing,
            "changed file"
        );

        match (was_generated, needs_preprocessing) {
            // Still preprocessed: regenerate the expansion and diff it.
            (true, true) => {
                let old_file = self
                    .generated_set
                    .as_ref()
                    .and_then(|g| g.files.get(path))
                    .cloned()
                    .ok_or_else(|| untracked_error(path))?;
                let new_file = self.create_generated_file(path, &folder)?;
                diff_file_items(&old_file, &new_file);
                Ok(())
            }
            // No longer claimed: retire the expansion, track as a plain file.
            (true, false) => {
                if let Some(generated) = &self.generated_set {
                    if let Some(old_file) = generated.files.get(path) {
                        old_file.set_items_removed();
                    }
                }
                let file = self.create_file(path, &folder)?;
                self.files.insert(path.to_path_buf(), file);
                Ok(())
            }
            // Newly claimed: retire the plain file, track the expansion.
            (false, true) => {
                let old_file = self
                    .files
                    .get(path)
                    .cloned()
                    .ok_or_else(|| untracked_error(path))?;
                old_file.set_items_removed();
                let file = self.create_generated_file(path, &folder)?;
                if let Some(generated) = &mut self.generated_set {
                    generated.files.insert(path.to_path_buf(), file);
                }
                Ok(())
            }
            // Plain change: re-parse and diff in place.
            (false, false) => {
                let file = self
                    .files
                    .get(path)
                    .cloned()
                    .ok_or_else(|| untracked_error(path))?;
                let new_file = self.create_file(path, &folder)?;
                diff_file_items(&file, &new_file);
                Ok(())
            }
        }
    }

    /// Marks every item of a deleted file removed.
    ///
    /// The file record stays tracked until the post-merge cleanup so the
    /// removal can propagate to outputs.
    pub fn handle_removed_file(&mut self, path: &Path) -> Result<(), MergeError> {
        debug!(set = %self.name, file = %path.display(), "removed file");
        if let Some(file) = self.files.get(path) {
            file.set_items_removed();
            return Ok(());
        }
        if let Some(generated) = &self.generated_set {
            if let Some(file) = generated.files.get(path) {
                file.set_items_removed();
                return Ok(());
            }
        }
        Err(untracked_error(path))
    }

    /// Drops removed items and resets survivors to `Untouched`.
    ///
    /// Called after a successful merge; a following no-op merge then sees
    /// zero touched items.
    pub fn post_merge_cleanup(&mut self) {
        self.files.retain(|_, file| {
            file.purge_removed_items();
            !file.items().is_empty()
        });
        for file in self.files.values() {
            for item in file.items() {
                item.reset_status();
            }
        }
        if let Some(generated) = &mut self.generated_set {
            generated.post_merge_cleanup();
        }
    }

    // ================================================================
    // Classification and parsing
    // ================================================================

    /// Classifies one resource folder name.
    ///
    /// An unrecognized prefix is not an error (`Ok(None)`: the folder is
    /// simply not a resource folder); a recognized prefix with unparsable
    /// qualifiers is.
    pub fn folder_data(
        &self,
        folder_path: &Path,
        folder_name: &str,
    ) -> Result<Option<FolderData>, MergeError> {
        let (prefix, qualifiers) = match folder_name.split_once('-') {
            Some((prefix, qualifiers)) => (prefix, Some(qualifiers)),
            None => (folder_name, None),
        };
        let Some(folder_type) = ResourceFolderType::from_name(prefix) else {
            return Ok(None);
        };
        match qualifiers {
            None => Ok(Some(FolderData {
                folder_type,
                configuration: FolderConfiguration::new(),
                qualifiers: String::new(),
            })),
            Some(raw) => match FolderConfiguration::from_qualifier_string(raw) {
                Some(configuration) => {
                    let qualifiers = if self.normalize_qualifiers {
                        configuration.qualifier_string()
                    } else {
                        raw.to_string()
                    };
                    Ok(Some(FolderData {
                        folder_type,
                        configuration,
                        qualifiers,
                    }))
                }
                None => Err(MergeError::InvalidResourceDirectory(
                    folder_path.to_path_buf(),
                )),
            },
        }
    }

    fn classify_parent(&self, file: &Path) -> Result<Option<FolderData>, MergeError> {
        let Some(parent) = file.parent() else {
            return Ok(None);
        };
        let Some(name) = parent.file_name().and_then(|n| n.to_str()) else {
            return Ok(None);
        };
        self.folder_data(parent, name)
    }

    /// Parses a file into its items, without attaching them to a file yet.
    fn parse_items(
        &self,
        path: &Path,
        folder: &FolderData,
    ) -> Result<Vec<Arc<ResourceItem>>, MergeError> {
        if folder.folder_type == ResourceFolderType::Values {
            return parse_values_file(path, &self.namespace, self.library_name.as_deref());
        }

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        if self.validate_names {
            validate_file_resource_name(file_name).map_err(|reason| {
                MergeError::InvalidFileName {
                    file: path.to_path_buf(),
                    reason,
                }
            })?;
        }

        let resource_type = folder.folder_type.related_resource_type().ok_or_else(|| {
            MergeError::Internal(format!(
                "folder type {} has no resource type",
                folder.folder_type
            ))
        })?;
        let name = resource_name_of(file_name);
        let mut items = vec![ResourceItem::new(
            name,
            &self.namespace,
            resource_type,
            None,
            self.library_name.clone(),
        )];

        if self.parse_ids
            && folder.folder_type.is_id_generating()
            && path.extension().is_some_and(|e| e == "xml")
        {
            let content = std::fs::read_to_string(path).map_err(|e| MergeError::io(path, e))?;
            for id in ids::extract_declared_ids(&content) {
                let value = id_item_value(&id);
                items.push(ResourceItem::new(
                    id,
                    &self.namespace,
                    ResourceType::Id,
                    Some(value),
                    self.library_name.clone(),
                ));
            }
        }
        Ok(items)
    }

    /// Builds the tracked file record for a plain (non-preprocessed) source.
    fn create_file(
        &self,
        path: &Path,
        folder: &FolderData,
    ) -> Result<Arc<ResourceFile>, MergeError> {
        let mut items = self.parse_items(path, folder)?;
        if folder.folder_type == ResourceFolderType::Values || items.len() > 1 {
            return Ok(ResourceFile::xml_values(
                path,
                items,
                folder.qualifiers.clone(),
                folder.configuration.clone(),
            ));
        }
        let item = items.pop().ok_or_else(|| {
            MergeError::Internal(format!("no item parsed from {}", path.display()))
        })?;
        Ok(ResourceFile::single_file(
            path,
            item,
            folder.qualifiers.clone(),
            folder.configuration.clone(),
        ))
    }

    /// Builds the generated-set record for a preprocessed source: one item
    /// per output the preprocessor will generate.
    fn create_generated_file(
        &self,
        path: &Path,
        folder: &FolderData,
    ) -> Result<Arc<ResourceFile>, MergeError> {
        let resource_type = folder.folder_type.related_resource_type().ok_or_else(|| {
            MergeError::Internal(format!(
                "preprocessed file {} is not in a file-based folder",
                path.display()
            ))
        })?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        if self.validate_names {
            validate_file_resource_name(file_name).map_err(|reason| {
                MergeError::InvalidFileName {
                    file: path.to_path_buf(),
                    reason,
                }
            })?;
        }
        let name = resource_name_of(file_name);

        let mut items = Vec::new();
        for generated_path in self.preprocessor.files_to_generate(path)? {
            let qualifiers = self.qualifiers_of_output(&generated_path);
            items.push(ResourceItem::generated(
                name.clone(),
                &self.namespace,
                resource_type,
                generated_path,
                qualifiers,
                self.library_name.clone(),
            ));
        }
        Ok(ResourceFile::generated_files(
            path,
            items,
            folder.qualifiers.clone(),
            folder.configuration.clone(),
        ))
    }

    /// Qualifiers of a generated output, from its parent folder name.
    fn qualifiers_of_output(&self, generated_path: &Path) -> String {
        let folder_name = generated_path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        match self.folder_data(generated_path, folder_name) {
            Ok(Some(folder)) => folder.qualifiers,
            _ => String::new(),
        }
    }

    // Snapshot reconstruction hooks.

    pub(crate) fn insert_file(&mut self, path: PathBuf, file: Arc<ResourceFile>) {
        self.files.insert(path, file);
    }

    pub(crate) fn attach_generated_set(&mut self, set: ResourceSet) {
        self.generated_set = Some(Box::new(set));
    }
}

impl std::fmt::Debug for ResourceSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceSet")
            .field("name", &self.name)
            .field("roots", &self.source_roots)
            .field("files", &self.files.len())
            .field("from_dependency", &self.from_dependency)
            .finish()
    }
}

/// The synthesized values payload of an implicit ID declaration.
fn id_item_value(name: &str) -> ResourceValue {
    ResourceValue::new(
        "item",
        vec![
            ("name".to_string(), name.to_string()),
            ("type".to_string(), "id".to_string()),
        ],
        "",
    )
}

/// Resource name from a file name: everything before the first `.`.
fn resource_name_of(file_name: &str) -> String {
    file_name.split('.').next().unwrap_or_default().to_string()
}

/// Files and folders the scanner never looks at.
fn is_ignored(name: &str) -> bool {
    name.starts_with('.') || name.ends_with('~') || name == "Thumbs.db"
}

fn untracked_error(path: &Path) -> MergeError {
    MergeError::Internal(format!(
        "file {} is not tracked by the merge state",
        path.display()
    ))
}

/// Minimal-diff reconciliation of a re-parsed file against its tracked
/// items.
///
/// - keys only in the new parse: added (and already touched);
/// - matched keys where either side carries a value: value copied over only
///   if it differs, so unchanged definitions stay untouched;
/// - matched valueless keys (file-based items): touched, since the file
///   content changed;
/// - keys only in the old parse: removed.
fn diff_file_items(file: &Arc<ResourceFile>, new_file: &Arc<ResourceFile>) {
    let mut old_items = file.item_map();
    let mut added = Vec::new();

    for new_item in new_file.items() {
        let key = new_item.key();
        match old_items.remove(&key) {
            Some(old_item) => {
                if old_item.value().is_some() || new_item.value().is_some() {
                    if !old_item.compare_value_with(&new_item) {
                        old_item.set_value_from(&new_item);
                    }
                } else {
                    old_item.set_touched();
                }
            }
            None => added.push(new_item),
        }
    }
    for leftover in old_items.values() {
        leftover.set_removed();
    }
    file.add_items(added);
}
