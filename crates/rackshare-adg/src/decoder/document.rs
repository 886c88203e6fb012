//! Parsed rack document and element helpers.
//!
//! Live stores almost every scalar as an empty element with a `Value`
//! attribute (`<IsSoloed Value="false" />`), so most lookups here are
//! "find the child with this tag and read its `Value`".

use crate::error::{Error, Result};
use roxmltree::{Document, Node};
use std::path::Path;

/// Name of the root element of every Live document.
pub const ROOT_TAG: &str = "Ableton";

/// Deepest element nesting accepted. The XML parser recurses per level.
pub const MAX_ELEMENT_DEPTH: usize = 512;

/// An XML rack document, borrowed from its decompressed text.
pub struct RackDocument<'input> {
    doc: Document<'input>,
}

impl<'input> RackDocument<'input> {
    /// Parse decompressed XML text. `label` names the source in errors.
    ///
    /// Element nesting is checked before the tree is built; a document
    /// deeper than [`MAX_ELEMENT_DEPTH`] is rejected as corrupt.
    pub fn parse(xml: &'input str, label: &Path) -> Result<Self> {
        if exceeds_depth(xml, MAX_ELEMENT_DEPTH) {
            return Err(Error::corrupt(
                label,
                format!("XML nesting exceeds {} levels", MAX_ELEMENT_DEPTH),
            ));
        }
        let doc = Document::parse(xml)
            .map_err(|e| Error::corrupt(label, format!("malformed XML: {}", e)))?;
        Ok(Self { doc })
    }

    /// The document's root element.
    pub fn root(&self) -> Node<'_, 'input> {
        self.doc.root_element()
    }

    /// Whether the root element is the expected `<Ableton>`.
    pub fn has_live_root(&self) -> bool {
        self.root().has_tag_name(ROOT_TAG)
    }
}

/// Whether element nesting in `xml` goes deeper than `limit`.
///
/// Byte-level scan that stops at the first element past the limit. Comments,
/// CDATA sections, processing instructions and markup declarations are
/// skipped, and quoted attribute values may contain `>` or `/`. Malformed
/// markup is left for the parser to report.
fn exceeds_depth(xml: &str, limit: usize) -> bool {
    let bytes = xml.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'<' {
            i += 1;
            continue;
        }
        let rest = &bytes[i..];
        i = if rest.starts_with(b"<!--") {
            skip_past(bytes, i + 4, b"-->")
        } else if rest.starts_with(b"<![CDATA[") {
            skip_past(bytes, i + 9, b"]]>")
        } else if rest.starts_with(b"<?") {
            skip_past(bytes, i + 2, b"?>")
        } else if rest.starts_with(b"<!") {
            skip_declaration(bytes, i + 2)
        } else if rest.starts_with(b"</") {
            depth = depth.saturating_sub(1);
            skip_past(bytes, i + 2, b">")
        } else {
            let (end, self_closing) = scan_start_tag(bytes, i + 1);
            if !self_closing {
                depth += 1;
                if depth > limit {
                    return true;
                }
            }
            end
        };
    }

    false
}

/// Index just past the next `pattern` at or after `from`.
fn skip_past(bytes: &[u8], from: usize, pattern: &[u8]) -> usize {
    bytes
        .get(from..)
        .and_then(|tail| tail.windows(pattern.len()).position(|w| w == pattern))
        .map_or(bytes.len(), |pos| from + pos + pattern.len())
}

/// End of a `<!DOCTYPE ...>` style declaration, internal subset included.
fn skip_declaration(bytes: &[u8], from: usize) -> usize {
    let mut brackets = 0usize;
    let mut quote = None;
    for (i, &b) in bytes.iter().enumerate().skip(from) {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'[' => brackets += 1,
                b']' => brackets = brackets.saturating_sub(1),
                b'>' if brackets == 0 => return i + 1,
                _ => {}
            },
        }
    }
    bytes.len()
}

/// End of a start tag and whether it closes itself (`<X />`).
fn scan_start_tag(bytes: &[u8], from: usize) -> (usize, bool) {
    let mut quote = None;
    let mut prev = 0u8;
    for (i, &b) in bytes.iter().enumerate().skip(from) {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'>' => return (i + 1, prev == b'/'),
                _ => {}
            },
        }
        prev = b;
    }
    (bytes.len(), false)
}

/// Element children of `node`, in document order.
pub fn element_children<'a, 'input>(
    node: Node<'a, 'input>,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(|n| n.is_element())
}

/// First element child named `tag`.
pub fn child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    element_children(node).find(|n| n.has_tag_name(tag))
}

/// Follow a chain of child tags, e.g. `["GroupDevicePreset", "Device"]`.
pub fn path<'a, 'input>(node: Node<'a, 'input>, tags: &[&str]) -> Option<Node<'a, 'input>> {
    tags.iter().try_fold(node, |current, tag| child(current, tag))
}

/// `Value` attribute of the child named `tag`.
pub fn value_of<'a>(node: Node<'a, '_>, tag: &str) -> Option<&'a str> {
    child(node, tag).and_then(|c| c.attribute("Value"))
}

/// Parse a Live boolean (`"true"` / `"false"`).
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Boolean `Value` of the child named `tag`.
pub fn bool_of(node: Node<'_, '_>, tag: &str) -> Option<bool> {
    value_of(node, tag).and_then(parse_bool)
}

/// Numeric `Value` of the child named `tag`.
pub fn number_of(node: Node<'_, '_>, tag: &str) -> Option<f64> {
    value_of(node, tag).and_then(|v| v.trim().parse().ok())
}

/// Non-empty, trimmed `Value` of the child named `tag`.
pub fn text_of<'a>(node: Node<'a, '_>, tag: &str) -> Option<&'a str> {
    value_of(node, tag)
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Read a `<Tag><Manual Value=".."/></Tag>` style automatable parameter.
pub fn manual_of<'a>(node: Node<'a, '_>, tag: &str) -> Option<&'a str> {
    child(node, tag).and_then(|p| value_of(p, "Manual"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const XML: &str = r#"<Ableton MajorVersion="5">
        <Outer>
            <Inner Value=" hello " />
            <Flag Value="true" />
            <Num Value="63.5" />
            <Empty Value="   " />
            <On><Manual Value="false" /></On>
        </Outer>
    </Ableton>"#;

    #[test]
    fn test_value_helpers() {
        let doc = RackDocument::parse(XML, Path::new("t")).unwrap();
        assert!(doc.has_live_root());

        let outer = child(doc.root(), "Outer").unwrap();
        assert_eq!(value_of(outer, "Inner"), Some(" hello "));
        assert_eq!(text_of(outer, "Inner"), Some("hello"));
        assert_eq!(text_of(outer, "Empty"), None);
        assert_eq!(bool_of(outer, "Flag"), Some(true));
        assert_eq!(number_of(outer, "Num"), Some(63.5));
        assert_eq!(manual_of(outer, "On"), Some("false"));
        assert_eq!(value_of(outer, "Missing"), None);
    }

    #[test]
    fn test_path() {
        let doc = RackDocument::parse(XML, Path::new("t")).unwrap();
        let inner = path(doc.root(), &["Outer", "Inner"]).unwrap();
        assert!(inner.has_tag_name("Inner"));
        assert!(path(doc.root(), &["Outer", "Nope"]).is_none());
    }

    #[test]
    fn test_depth_scan() {
        assert!(!exceeds_depth("<a><b><c /></b></a>", 2));
        assert!(exceeds_depth("<a><b><c></c></b></a>", 2));
        // Siblings do not add up
        assert!(!exceeds_depth("<a><b></b><b></b><b /></a>", 2));
    }

    #[test]
    fn test_depth_scan_skips_non_elements() {
        let xml = r#"<?xml version="1.0"?>
            <!DOCTYPE a [ <!ENTITY e "<x>"> ]>
            <a k="1 > 0" p="a/">
                <!-- <b><b><b> -->
                <![CDATA[ <b><b><b> ]]>
                <b q='/>'></b>
            </a>"#;
        assert!(!exceeds_depth(xml, 2));
        assert!(exceeds_depth(xml, 1));
    }

    #[test]
    fn test_deep_nesting_is_corrupt() {
        let depth = MAX_ELEMENT_DEPTH + 1;
        let xml = format!("{}{}", "<X>".repeat(depth), "</X>".repeat(depth));
        let err = RackDocument::parse(&xml, Path::new("t")).err().unwrap();
        assert!(err.is_corrupt_file());
        assert!(err.to_string().contains("nesting"));

        let at_limit = format!(
            "{}{}",
            "<X>".repeat(MAX_ELEMENT_DEPTH),
            "</X>".repeat(MAX_ELEMENT_DEPTH)
        );
        assert!(!exceeds_depth(&at_limit, MAX_ELEMENT_DEPTH));

        let xml = format!("{}{}", "<X>".repeat(200), "</X>".repeat(200));
        assert!(RackDocument::parse(&xml, Path::new("t")).is_ok());
    }

    #[test]
    fn test_malformed_is_corrupt() {
        let err = RackDocument::parse("<Ableton><Open></Ableton>", Path::new("t"))
            .err()
            .unwrap();
        assert!(err.is_corrupt_file());

        assert!(RackDocument::parse("just text", Path::new("t")).is_err());
    }
}
