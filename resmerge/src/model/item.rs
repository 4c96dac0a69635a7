//! Resource items: one named, typed value or file reference.

use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use quick_xml::escape::escape;

use crate::config::{Configurable, FolderConfiguration};
use crate::model::file::{FileType, ResourceFile};
use crate::resources::ResourceType;

/// Per-item status driving incremental output regeneration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    /// Unchanged since the last successful merge.
    Untouched,
    /// Added or modified since the last merge; must be re-emitted.
    Touched,
    /// Deleted since the last merge; output must be cleaned up.
    Removed,
}

/// The parsed payload of a values-file resource definition.
///
/// Holds the defining element's tag, attributes and inner XML. Attributes
/// are kept sorted by name so structural comparison and serialization are
/// independent of attribute order in the source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceValue {
    tag: String,
    attributes: Vec<(String, String)>,
    body: String,
}

impl ResourceValue {
    /// Creates a value from a parsed element.
    pub fn new(
        tag: impl Into<String>,
        mut attributes: Vec<(String, String)>,
        body: impl Into<String>,
    ) -> Self {
        attributes.sort_by(|a, b| a.0.cmp(&b.0));
        Self {
            tag: tag.into(),
            attributes,
            body: body.into(),
        }
    }

    /// The defining element's tag name.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Looks up an attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// The inner XML of the defining element, trimmed.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// If this value is a reference to another resource (`@type/name`),
    /// returns the referenced type and name.
    ///
    /// Namespaced references (`@ns:type/name`) resolve against the bare
    /// type; tool-private `@null`/`@empty` bodies are not references.
    pub fn reference(&self) -> Option<(ResourceType, String)> {
        let body = self.body.trim();
        let target = body.strip_prefix('@')?;
        let (type_part, name) = target.split_once('/')?;
        let type_name = type_part.rsplit(':').next()?;
        let ty = ResourceType::from_tag(type_name)?;
        if name.is_empty() {
            return None;
        }
        Some((ty, name.to_string()))
    }

    /// Serializes this value back to its XML element form.
    ///
    /// Attributes render in sorted order and text content is re-escaped, so
    /// two structurally equal values always serialize to identical bytes.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        out.push('<');
        out.push_str(&self.tag);
        for (name, value) in &self.attributes {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&escape(value.as_str()));
            out.push('"');
        }
        if self.body.is_empty() {
            out.push_str("/>");
        } else {
            out.push('>');
            out.push_str(&self.body);
            out.push_str("</");
            out.push_str(&self.tag);
            out.push('>');
        }
        out
    }
}

/// Mutable portion of a resource item, updated during incremental re-scans.
#[derive(Debug, Default)]
struct ItemInner {
    status: Option<ItemStatus>,
    value: Option<ResourceValue>,
    source: Option<Weak<ResourceFile>>,
}

/// A single named, typed resource value or file reference.
///
/// Identity is `(namespace, type, name)`. The item back-references its
/// owning [`ResourceFile`] through a weak handle, avoiding an ownership
/// cycle with the file's item list.
pub struct ResourceItem {
    name: String,
    namespace: String,
    resource_type: ResourceType,
    library_name: Option<String>,
    /// For items produced by a preprocessor: the generated file this item
    /// stands for, distinct from the source file that produced it.
    generated_path: Option<PathBuf>,
    /// Qualifiers of the generated output folder. Generated outputs land in
    /// their own qualified folders, independent of the source file's.
    generated_qualifiers: Option<String>,
    inner: Mutex<ItemInner>,
}

impl ResourceItem {
    /// Creates a new item, marked `Touched`.
    ///
    /// A freshly parsed item is by definition new to the merge state; the
    /// post-merge cleanup resets survivors to `Untouched`.
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        resource_type: ResourceType,
        value: Option<ResourceValue>,
        library_name: Option<String>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            namespace: namespace.into(),
            resource_type,
            library_name,
            generated_path: None,
            generated_qualifiers: None,
            inner: Mutex::new(ItemInner {
                status: Some(ItemStatus::Touched),
                value,
                source: None,
            }),
        })
    }

    /// Creates an item representing one preprocessor-generated file.
    pub fn generated(
        name: impl Into<String>,
        namespace: impl Into<String>,
        resource_type: ResourceType,
        generated_path: PathBuf,
        qualifiers: impl Into<String>,
        library_name: Option<String>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            namespace: namespace.into(),
            resource_type,
            library_name,
            generated_path: Some(generated_path),
            generated_qualifiers: Some(qualifiers.into()),
            inner: Mutex::new(ItemInner {
                status: Some(ItemStatus::Touched),
                ..ItemInner::default()
            }),
        })
    }

    /// The resource name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The resource namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The resource type.
    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    /// Library this item came from, if it is dependency-derived.
    pub fn library_name(&self) -> Option<&str> {
        self.library_name.as_deref()
    }

    /// Current incremental status.
    pub fn status(&self) -> ItemStatus {
        self.inner.lock().status.unwrap_or(ItemStatus::Untouched)
    }

    /// Whether the item was added or modified since the last merge.
    pub fn is_touched(&self) -> bool {
        self.status() == ItemStatus::Touched
    }

    /// Whether the item was deleted since the last merge.
    pub fn is_removed(&self) -> bool {
        self.status() == ItemStatus::Removed
    }

    /// Marks the item touched. A removed item stays removed.
    pub fn set_touched(&self) {
        let mut inner = self.inner.lock();
        if inner.status != Some(ItemStatus::Removed) {
            inner.status = Some(ItemStatus::Touched);
        }
    }

    /// Marks the item removed.
    pub fn set_removed(&self) {
        self.inner.lock().status = Some(ItemStatus::Removed);
    }

    /// Resets the item to `Untouched` after a successful merge.
    pub fn reset_status(&self) {
        self.inner.lock().status = None;
    }

    /// The parsed value, for values-file items.
    pub fn value(&self) -> Option<ResourceValue> {
        self.inner.lock().value.clone()
    }

    /// Structural value comparison with another item.
    pub fn compare_value_with(&self, other: &ResourceItem) -> bool {
        self.value() == other.value()
    }

    /// Copies another item's value into this one and marks it touched.
    ///
    /// Used by the item-diff pass when a re-parsed values file changed one
    /// definition: the existing item object is kept (so unchanged siblings
    /// stay untouched) and only its payload is replaced.
    pub fn set_value_from(&self, other: &ResourceItem) {
        let new_value = other.value();
        {
            let mut inner = self.inner.lock();
            inner.value = new_value;
            if inner.status != Some(ItemStatus::Removed) {
                inner.status = Some(ItemStatus::Touched);
            }
        }
    }

    /// The owning file, if the item is attached to one.
    pub fn source(&self) -> Option<Arc<ResourceFile>> {
        self.inner.lock().source.as_ref().and_then(Weak::upgrade)
    }

    /// Attaches or detaches the owning file.
    pub fn set_source(&self, source: Option<&Arc<ResourceFile>>) {
        self.inner.lock().source = source.map(Arc::downgrade);
    }

    /// The owning file's type, if attached.
    pub fn source_type(&self) -> Option<FileType> {
        self.source().map(|f| f.file_type())
    }

    /// The item's qualifier string: the generated output folder's for
    /// generated items, otherwise the owning file's (empty when detached).
    pub fn qualifiers(&self) -> String {
        if let Some(qualifiers) = &self.generated_qualifiers {
            return qualifiers.clone();
        }
        self.source()
            .map(|f| f.qualifiers().to_string())
            .unwrap_or_default()
    }

    /// The file this item materializes from: the generated file for
    /// preprocessor-produced items, otherwise the source file itself.
    pub fn path(&self) -> Option<PathBuf> {
        if let Some(generated) = &self.generated_path {
            return Some(generated.clone());
        }
        self.source().map(|f| f.path().to_path_buf())
    }

    /// Whether this item stands for a preprocessor-generated file.
    pub fn is_generated(&self) -> bool {
        self.generated_path.is_some()
    }

    /// The unique key of this item within a source set:
    /// `qualifiers/type/name`.
    pub fn key(&self) -> String {
        format!("{}/{}/{}", self.qualifiers(), self.resource_type, self.name)
    }
}

impl fmt::Debug for ResourceItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceItem")
            .field("name", &self.name)
            .field("namespace", &self.namespace)
            .field("type", &self.resource_type)
            .field("status", &self.status())
            .field("library", &self.library_name)
            .finish()
    }
}

impl Configurable for Arc<ResourceItem> {
    fn configuration(&self) -> FolderConfiguration {
        if let Some(qualifiers) = &self.generated_qualifiers {
            return FolderConfiguration::from_qualifier_string(qualifiers).unwrap_or_default();
        }
        self.source()
            .map(|f| f.configuration().clone())
            .unwrap_or_default()
    }
}
