//! Values-file XML parsing and serialization.
//!
//! A values file (`values*/...xml`) holds many named resource definitions as
//! children of a `<resources>` root. Parsing walks the top-level children
//! and produces one [`ResourceItem`] per recognized element, preserving
//! document order. Unknown tags are skipped silently for forward
//! compatibility; `<declare-styleable>` elements additionally synthesize
//! child `attr` items.
//!
//! Serialization is the inverse used by the merged-values writer: items are
//! rendered from their structural [`ResourceValue`] form, so output bytes
//! depend only on content, never on source formatting or insertion order.

use std::path::Path;
use std::sync::Arc;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::MergeError;
use crate::model::{ResourceItem, ResourceValue};
use crate::resources::ResourceType;

/// Parses a values file into items, in document order.
pub fn parse_values_file(
    path: &Path,
    namespace: &str,
    library_name: Option<&str>,
) -> Result<Vec<Arc<ResourceItem>>, MergeError> {
    let content = std::fs::read_to_string(path).map_err(|e| MergeError::io(path, e))?;
    parse_values_str(&content, path, namespace, library_name)
}

/// Parses values-file content. `path` is used for error context only.
pub fn parse_values_str(
    content: &str,
    path: &Path,
    namespace: &str,
    library_name: Option<&str>,
) -> Result<Vec<Arc<ResourceItem>>, MergeError> {
    let mut reader = Reader::from_str(content);
    let mut items = Vec::new();
    let mut in_resources = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| MergeError::parse(path, e.to_string()))?;
        match event {
            Event::Start(e) if !in_resources => {
                if e.name().as_ref() != b"resources" {
                    return Err(MergeError::parse(
                        path,
                        format!(
                            "expected <resources> root, found <{}>",
                            String::from_utf8_lossy(e.name().as_ref())
                        ),
                    ));
                }
                in_resources = true;
            }
            Event::Start(e) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let attributes = element_attributes(&e, path)?;
                let (body, attr_children) =
                    capture_inner(&mut reader, path, e.name().as_ref(), tag == "declare-styleable")?;
                push_item(
                    &mut items,
                    path,
                    &tag,
                    attributes,
                    body,
                    attr_children,
                    namespace,
                    library_name,
                )?;
            }
            Event::Empty(e) if in_resources => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let attributes = element_attributes(&e, path)?;
                push_item(
                    &mut items,
                    path,
                    &tag,
                    attributes,
                    String::new(),
                    Vec::new(),
                    namespace,
                    library_name,
                )?;
            }
            Event::End(_) => {
                // Closing </resources>.
                break;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(items)
}

/// Parses one serialized value element back into a [`ResourceValue`].
///
/// Used by the snapshot loader, which stores each item's value as a
/// self-contained XML snippet.
pub fn parse_value_snippet(snippet: &str, path: &Path) -> Result<ResourceValue, MergeError> {
    let mut reader = Reader::from_str(snippet);
    loop {
        let event = reader
            .read_event()
            .map_err(|e| MergeError::parse(path, e.to_string()))?;
        match event {
            Event::Start(e) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let attributes = element_attributes(&e, path)?;
                let (body, _) = capture_inner(&mut reader, path, e.name().as_ref(), false)?;
                return Ok(ResourceValue::new(tag, attributes, body));
            }
            Event::Empty(e) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let attributes = element_attributes(&e, path)?;
                return Ok(ResourceValue::new(tag, attributes, String::new()));
            }
            Event::Eof => {
                return Err(MergeError::parse(path, "empty value snippet".to_string()));
            }
            _ => {}
        }
    }
}

/// Serializes sorted values into one merged `<resources>` document.
///
/// Items render with a four-space indent, one per line. Byte output is a
/// pure function of the value list.
pub fn serialize_values_document(values: &[ResourceValue]) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<resources>");
    for value in values {
        out.push_str("\n    ");
        out.push_str(&value.to_xml());
    }
    out.push_str("\n</resources>\n");
    out
}

#[allow(clippy::too_many_arguments)]
fn push_item(
    items: &mut Vec<Arc<ResourceItem>>,
    path: &Path,
    tag: &str,
    attributes: Vec<(String, String)>,
    body: String,
    attr_children: Vec<ResourceValue>,
    namespace: &str,
    library_name: Option<&str>,
) -> Result<(), MergeError> {
    let resource_type = match tag {
        // <item type="..."> carries its type as an attribute.
        "item" => {
            let Some(ty) = attributes
                .iter()
                .find(|(k, _)| k == "type")
                .and_then(|(_, v)| ResourceType::from_tag(v))
            else {
                // Unknown or missing item type: forward-compat skip.
                return Ok(());
            };
            ty
        }
        other => match ResourceType::from_tag(other) {
            Some(ty) => ty,
            // Unknown tag: intentionally permissive, skip.
            None => return Ok(()),
        },
    };

    let Some(name) = attributes
        .iter()
        .find(|(k, _)| k == "name")
        .map(|(_, v)| v.clone())
    else {
        return Err(MergeError::parse(
            path,
            format!("<{tag}> element is missing a name attribute"),
        ));
    };

    let value = ResourceValue::new(tag, attributes, body);
    items.push(ResourceItem::new(
        name,
        namespace,
        resource_type,
        Some(value),
        library_name.map(str::to_string),
    ));

    // declare-styleable children become standalone attr items.
    for child in attr_children {
        if let Some(attr_name) = child.attribute("name") {
            // Namespaced attrs (android:foo) reference framework attrs and
            // don't define anything new here.
            if attr_name.contains(':') {
                continue;
            }
            let attr_name = attr_name.to_string();
            items.push(ResourceItem::new(
                attr_name,
                namespace,
                ResourceType::Attr,
                Some(child),
                library_name.map(str::to_string),
            ));
        }
    }

    Ok(())
}

/// Extracts unescaped attributes from a start tag.
pub(crate) fn element_attributes(
    element: &BytesStart<'_>,
    path: &Path,
) -> Result<Vec<(String, String)>, MergeError> {
    let mut attributes = Vec::new();
    for attr in element.attributes() {
        let attr = attr.map_err(|e| MergeError::parse(path, e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| MergeError::parse(path, e.to_string()))?
            .into_owned();
        attributes.push((key, value));
    }
    Ok(attributes)
}

/// Re-serializes a start or empty tag, preserving raw attribute values.
fn render_tag(element: &BytesStart<'_>, self_closing: bool, path: &Path) -> Result<String, MergeError> {
    let mut out = String::from("<");
    out.push_str(&String::from_utf8_lossy(element.name().as_ref()));
    for attr in element.attributes().with_checks(false) {
        let attr = attr.map_err(|e| MergeError::parse(path, e.to_string()))?;
        out.push(' ');
        out.push_str(&String::from_utf8_lossy(attr.key.as_ref()));
        out.push_str("=\"");
        out.push_str(&String::from_utf8_lossy(&attr.value));
        out.push('"');
    }
    out.push_str(if self_closing { "/>" } else { ">" });
    Ok(out)
}

/// Consumes events until the matching end tag, reconstructing the inner XML.
///
/// When `collect_attrs` is set, direct `<attr>` children are additionally
/// captured as structured values (for `declare-styleable` synthesis).
fn capture_inner(
    reader: &mut Reader<&[u8]>,
    path: &Path,
    end_tag: &[u8],
    collect_attrs: bool,
) -> Result<(String, Vec<ResourceValue>), MergeError> {
    let mut body = String::new();
    let mut open_tags: Vec<Vec<u8>> = Vec::new();
    let mut attr_children = Vec::new();
    // Pending direct <attr> child: its attributes and where its inner XML
    // starts in `body`.
    let mut pending_attr: Option<(Vec<(String, String)>, usize)> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| MergeError::parse(path, e.to_string()))?;
        match event {
            Event::Start(e) => {
                if collect_attrs && open_tags.is_empty() && e.name().as_ref() == b"attr" {
                    let attributes = element_attributes(&e, path)?;
                    body.push_str(&render_tag(&e, false, path)?);
                    pending_attr = Some((attributes, body.len()));
                } else {
                    body.push_str(&render_tag(&e, false, path)?);
                }
                open_tags.push(e.name().as_ref().to_vec());
            }
            Event::Empty(e) => {
                if collect_attrs && open_tags.is_empty() && e.name().as_ref() == b"attr" {
                    let attributes = element_attributes(&e, path)?;
                    attr_children.push(ResourceValue::new("attr", attributes, String::new()));
                }
                body.push_str(&render_tag(&e, true, path)?);
            }
            Event::End(e) => {
                if let Some(open) = open_tags.pop() {
                    let inner_end = body.len();
                    body.push_str("</");
                    body.push_str(&String::from_utf8_lossy(&open));
                    body.push('>');
                    if open_tags.is_empty() {
                        if let Some((attributes, inner_start)) = pending_attr.take() {
                            let inner = body[inner_start..inner_end].to_string();
                            attr_children.push(ResourceValue::new("attr", attributes, inner));
                        }
                    }
                } else if e.name().as_ref() == end_tag {
                    break;
                } else {
                    return Err(MergeError::parse(
                        path,
                        format!(
                            "unexpected closing tag </{}>",
                            String::from_utf8_lossy(e.name().as_ref())
                        ),
                    ));
                }
            }
            Event::Text(t) => {
                // Keep the raw (still escaped) text so the body round-trips.
                body.push_str(&String::from_utf8_lossy(t.as_ref()));
            }
            Event::CData(c) => {
                body.push_str("<![CDATA[");
                body.push_str(&String::from_utf8_lossy(c.as_ref()));
                body.push_str("]]>");
            }
            Event::Eof => {
                return Err(MergeError::parse(
                    path,
                    format!(
                        "unterminated <{}> element",
                        String::from_utf8_lossy(end_tag)
                    ),
                ));
            }
            _ => {}
        }
    }

    Ok((body, attr_children))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn parse(content: &str) -> Vec<Arc<ResourceItem>> {
        parse_values_str(content, &PathBuf::from("values.xml"), "", None)
            .expect("content should parse")
    }

    #[test]
    fn test_parses_simple_strings_in_document_order() {
        let items = parse(
            r#"<?xml version="1.0" encoding="utf-8"?>
<resources>
    <string name="b">second</string>
    <string name="a">first</string>
</resources>"#,
        );
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name(), "b");
        assert_eq!(items[1].name(), "a");
        assert_eq!(items[0].resource_type(), ResourceType::String);
        assert_eq!(items[0].value().unwrap().body(), "second");
    }

    #[test]
    fn test_item_tag_uses_type_attribute() {
        let items = parse(r#"<resources><item type="id" name="button"/></resources>"#);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].resource_type(), ResourceType::Id);
    }

    #[test]
    fn test_unknown_tags_are_skipped_silently() {
        let items = parse(
            r#"<resources>
    <futuristic-thing name="x">whatever</futuristic-thing>
    <string name="kept">v</string>
</resources>"#,
        );
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name(), "kept");
    }

    #[test]
    fn test_missing_name_is_a_parse_error() {
        let err = parse_values_str(
            r#"<resources><string>v</string></resources>"#,
            &PathBuf::from("values.xml"),
            "",
            None,
        )
        .unwrap_err();
        assert!(matches!(err, MergeError::Parse { .. }));
    }

    #[test]
    fn test_declare_styleable_synthesizes_attr_items() {
        let items = parse(
            r#"<resources>
    <declare-styleable name="MyView">
        <attr name="myColor" format="color"/>
        <attr name="android:gravity"/>
        <attr name="myFlags">
            <flag name="one" value="1"/>
        </attr>
    </declare-styleable>
</resources>"#,
        );
        // styleable + myColor + myFlags (android:gravity is a reference)
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].resource_type(), ResourceType::Styleable);
        assert_eq!(items[0].name(), "MyView");
        assert_eq!(items[1].resource_type(), ResourceType::Attr);
        assert_eq!(items[1].name(), "myColor");
        assert_eq!(items[2].name(), "myFlags");
        assert!(items[2].value().unwrap().body().contains("<flag"));
    }

    #[test]
    fn test_nested_inner_xml_is_preserved() {
        let items = parse(
            r#"<resources>
    <style name="AppTheme" parent="Base">
        <item name="color">#ff0000</item>
    </style>
</resources>"#,
        );
        assert_eq!(items.len(), 1);
        let body = items[0].value().unwrap().body().to_string();
        assert!(body.contains(r#"<item name="color">#ff0000</item>"#));
    }

    #[test]
    fn test_escaped_text_round_trips() {
        let items = parse(r#"<resources><string name="s">a &lt; b</string></resources>"#);
        let value = items[0].value().unwrap();
        assert_eq!(value.body(), "a &lt; b");
        assert!(value.to_xml().contains("a &lt; b"));
    }

    #[test]
    fn test_bad_xml_is_a_parse_error() {
        let err = parse_values_str(
            "<resources><string name=\"s\">oops</wrong></resources>",
            &PathBuf::from("values.xml"),
            "",
            None,
        )
        .unwrap_err();
        assert!(matches!(err, MergeError::Parse { .. }));
    }

    #[test]
    fn test_value_snippet_round_trip() {
        let path = PathBuf::from("snapshot.xml");
        let original = ResourceValue::new(
            "string",
            vec![("name".to_string(), "s".to_string())],
            "hello",
        );
        let reparsed = parse_value_snippet(&original.to_xml(), &path).unwrap();
        assert_eq!(original, reparsed);
    }

    #[test]
    fn test_serialize_values_document_is_deterministic() {
        let a = ResourceValue::new("string", vec![("name".to_string(), "a".to_string())], "1");
        let b = ResourceValue::new("string", vec![("name".to_string(), "b".to_string())], "2");
        let doc = serialize_values_document(&[a.clone(), b.clone()]);
        assert!(doc.starts_with("<?xml"));
        assert!(doc.contains("\n    <string name=\"a\">1</string>"));
        assert!(doc.ends_with("</resources>\n"));
        // Same values, same bytes.
        assert_eq!(doc, serialize_values_document(&[a, b]));
    }
}
