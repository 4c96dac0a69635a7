//! Snapshot persistence of the merge state.
//!
//! A snapshot captures the merger's sets, files and items as one XML
//! document so an incremental build can resume without re-scanning and
//! re-parsing every source. Statuses are not persisted: loaded items come
//! back `Untouched`, matching the state right after a post-merge cleanup.

use std::path::Path;
use std::sync::Arc;

use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::config::FolderConfiguration;
use crate::error::MergeError;
use crate::merge::ResourceMerger;
use crate::model::{FileType, ResourceFile, ResourceItem};
use crate::resources::ResourceType;
use crate::set::ResourceSet;
use crate::values::{element_attributes, parse_value_snippet};

/// Persists the merger's current state.
pub fn write_snapshot(merger: &ResourceMerger, path: &Path) -> Result<(), MergeError> {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<merger>\n");
    for set in merger.sets() {
        write_set(&mut out, set, 1);
    }
    out.push_str("</merger>\n");

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| MergeError::io(parent, e))?;
    }
    std::fs::write(path, out).map_err(|e| MergeError::io(path, e))
}

fn write_set(out: &mut String, set: &ResourceSet, depth: usize) {
    let pad = "    ".repeat(depth);
    out.push_str(&format!("{pad}<dataSet name=\"{}\"", escape(set.name())));
    if !set.namespace().is_empty() {
        out.push_str(&format!(" namespace=\"{}\"", escape(set.namespace())));
    }
    if let Some(library) = set.library_name() {
        out.push_str(&format!(" library=\"{}\"", escape(library)));
    }
    if set.is_from_dependency() {
        out.push_str(" from-dependency=\"true\"");
    }
    out.push_str(">\n");

    for root in set.source_roots() {
        out.push_str(&format!(
            "{pad}    <source path=\"{}\"/>\n",
            escape(&root.display().to_string())
        ));
    }
    for file in set.files() {
        write_file(out, file, depth + 1);
    }
    if let Some(generated) = set.generated_set() {
        out.push_str(&format!("{pad}    <generated>\n"));
        write_set(out, generated, depth + 2);
        out.push_str(&format!("{pad}    </generated>\n"));
    }
    out.push_str(&format!("{pad}</dataSet>\n"));
}

fn write_file(out: &mut String, file: &Arc<ResourceFile>, depth: usize) {
    let pad = "    ".repeat(depth);
    out.push_str(&format!(
        "{pad}<file path=\"{}\" qualifiers=\"{}\" type=\"{}\">\n",
        escape(&file.path().display().to_string()),
        escape(file.qualifiers()),
        file.file_type().name()
    ));
    for item in file.items() {
        write_item(out, &item, depth + 1);
    }
    out.push_str(&format!("{pad}</file>\n"));
}

fn write_item(out: &mut String, item: &Arc<ResourceItem>, depth: usize) {
    let pad = "    ".repeat(depth);
    out.push_str(&format!(
        "{pad}<item name=\"{}\" type=\"{}\"",
        escape(item.name()),
        item.resource_type()
    ));
    if item.is_generated() {
        if let Some(generated_path) = item.path() {
            out.push_str(&format!(
                " generated-path=\"{}\"",
                escape(&generated_path.display().to_string())
            ));
        }
        out.push_str(&format!(
            " generated-qualifiers=\"{}\"",
            escape(&item.qualifiers())
        ));
    }
    match item.value() {
        Some(value) => {
            out.push('>');
            out.push_str(&escape(&value.to_xml()));
            out.push_str("</item>\n");
        }
        None => out.push_str("/>\n"),
    }
}

/// Loads a previously written snapshot.
pub fn load_snapshot(path: &Path) -> Result<ResourceMerger, MergeError> {
    let content = std::fs::read_to_string(path).map_err(|e| MergeError::io(path, e))?;
    let mut reader = Reader::from_str(&content);
    let mut merger = ResourceMerger::new();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| MergeError::parse(path, e.to_string()))?;
        match event {
            Event::Start(e) if e.name().as_ref() == b"merger" => {}
            Event::Start(e) if e.name().as_ref() == b"dataSet" => {
                let attributes = element_attributes(&e, path)?;
                merger.add_set(read_set(&mut reader, path, &attributes)?);
            }
            Event::End(_) | Event::Eof => break,
            _ => {}
        }
    }
    Ok(merger)
}

fn attribute<'a>(attributes: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

fn read_set(
    reader: &mut Reader<&[u8]>,
    path: &Path,
    attributes: &[(String, String)],
) -> Result<ResourceSet, MergeError> {
    let name = attribute(attributes, "name").unwrap_or_default();
    let namespace = attribute(attributes, "namespace").unwrap_or_default().to_string();
    let mut set = ResourceSet::new(name).with_namespace(&namespace);
    if let Some(library) = attribute(attributes, "library") {
        set = set.with_library_name(library);
    } else if attribute(attributes, "from-dependency") == Some("true") {
        set = set.with_from_dependency(true);
    }
    let library = set.library_name().map(str::to_string);

    loop {
        let event = reader
            .read_event()
            .map_err(|e| MergeError::parse(path, e.to_string()))?;
        match event {
            Event::Empty(e) | Event::Start(e) if e.name().as_ref() == b"source" => {
                let attrs = element_attributes(&e, path)?;
                if let Some(root) = attribute(&attrs, "path") {
                    set.add_source(root);
                }
            }
            Event::Start(e) if e.name().as_ref() == b"file" => {
                let attrs = element_attributes(&e, path)?;
                let file = read_file(reader, path, &attrs, &namespace, library.as_deref())?;
                set.insert_file(file.path().to_path_buf(), file);
            }
            Event::Start(e) if e.name().as_ref() == b"generated" => {
                loop {
                    let event = reader
                        .read_event()
                        .map_err(|e| MergeError::parse(path, e.to_string()))?;
                    match event {
                        Event::Start(e) if e.name().as_ref() == b"dataSet" => {
                            let attrs = element_attributes(&e, path)?;
                            set.attach_generated_set(read_set(reader, path, &attrs)?);
                        }
                        Event::End(e) if e.name().as_ref() == b"generated" => break,
                        Event::Eof => {
                            return Err(MergeError::parse(path, "unterminated <generated>"));
                        }
                        _ => {}
                    }
                }
            }
            Event::End(e) if e.name().as_ref() == b"dataSet" => break,
            Event::Eof => return Err(MergeError::parse(path, "unterminated <dataSet>")),
            _ => {}
        }
    }
    Ok(set)
}

fn read_file(
    reader: &mut Reader<&[u8]>,
    path: &Path,
    attributes: &[(String, String)],
    namespace: &str,
    library: Option<&str>,
) -> Result<Arc<ResourceFile>, MergeError> {
    let file_path = attribute(attributes, "path")
        .ok_or_else(|| MergeError::parse(path, "<file> is missing a path"))?
        .to_string();
    let qualifiers = attribute(attributes, "qualifiers")
        .unwrap_or_default()
        .to_string();
    let file_type = attribute(attributes, "type")
        .and_then(FileType::from_name)
        .ok_or_else(|| MergeError::parse(path, format!("bad file type for {file_path}")))?;
    let configuration = FolderConfiguration::from_qualifier_string(&qualifiers)
        .ok_or_else(|| MergeError::parse(path, format!("bad qualifiers '{qualifiers}'")))?;

    let mut items = Vec::new();
    loop {
        let event = reader
            .read_event()
            .map_err(|e| MergeError::parse(path, e.to_string()))?;
        match event {
            Event::Empty(e) if e.name().as_ref() == b"item" => {
                let attrs = element_attributes(&e, path)?;
                items.push(read_item(path, &attrs, None, namespace, library)?);
            }
            Event::Start(e) if e.name().as_ref() == b"item" => {
                let attrs = element_attributes(&e, path)?;
                let mut text = String::new();
                loop {
                    let event = reader
                        .read_event()
                        .map_err(|e| MergeError::parse(path, e.to_string()))?;
                    match event {
                        Event::Text(t) => {
                            text.push_str(
                                &t.unescape()
                                    .map_err(|e| MergeError::parse(path, e.to_string()))?,
                            );
                        }
                        Event::End(e) if e.name().as_ref() == b"item" => break,
                        Event::Eof => {
                            return Err(MergeError::parse(path, "unterminated <item>"));
                        }
                        _ => {}
                    }
                }
                let snippet = if text.trim().is_empty() {
                    None
                } else {
                    Some(text)
                };
                items.push(read_item(path, &attrs, snippet, namespace, library)?);
            }
            Event::End(e) if e.name().as_ref() == b"file" => break,
            Event::Eof => return Err(MergeError::parse(path, "unterminated <file>")),
            _ => {}
        }
    }

    let file = match file_type {
        FileType::SingleFile => {
            let item = items
                .pop()
                .ok_or_else(|| MergeError::parse(path, format!("{file_path} has no item")))?;
            ResourceFile::single_file(&file_path, item, qualifiers, configuration)
        }
        FileType::GeneratedFiles => {
            ResourceFile::generated_files(&file_path, items, qualifiers, configuration)
        }
        FileType::XmlValues => {
            ResourceFile::xml_values(&file_path, items, qualifiers, configuration)
        }
    };
    Ok(file)
}

fn read_item(
    path: &Path,
    attributes: &[(String, String)],
    snippet: Option<String>,
    namespace: &str,
    library: Option<&str>,
) -> Result<Arc<ResourceItem>, MergeError> {
    let name = attribute(attributes, "name")
        .ok_or_else(|| MergeError::parse(path, "<item> is missing a name"))?;
    let resource_type = attribute(attributes, "type")
        .and_then(ResourceType::from_tag)
        .ok_or_else(|| MergeError::parse(path, format!("bad item type for '{name}'")))?;

    let item = if let Some(generated_path) = attribute(attributes, "generated-path") {
        ResourceItem::generated(
            name,
            namespace,
            resource_type,
            generated_path.into(),
            attribute(attributes, "generated-qualifiers").unwrap_or_default(),
            library.map(str::to_string),
        )
    } else {
        let value = snippet
            .map(|s| parse_value_snippet(&s, path))
            .transpose()?;
        ResourceItem::new(
            name,
            namespace,
            resource_type,
            value,
            library.map(str::to_string),
        )
    };
    // Snapshot state corresponds to a completed merge.
    item.reset_status();
    Ok(item)
}
