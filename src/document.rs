//! Read-only XML tree model used by the comparison engine.
//!
//! Documents are parsed once with `roxmltree` and converted into owned
//! `XmlNode` trees. Text made only of XML whitespace, comments and processing
//! instructions are dropped at this stage; everything else is kept in
//! document order.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DocumentError, DocumentResult};
use crate::normalizer::is_xml_whitespace;

/// Name given to text nodes, mirroring the DOM convention.
pub const TEXT_NODE_NAME: &str = "#text";

/// Kind of a node in the comparison model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Element,
    Attribute,
    Text,
}

/// A node of a parsed document.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlNode {
    name: String,
    kind: NodeKind,
    path: String,
    value: Option<String>,
    attributes: Vec<XmlNode>,
    children: Vec<XmlNode>,
}

impl XmlNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Location of the node from the document root, e.g. `/root/v` or
    /// `/root/v/@unit`. Text nodes share the path of their parent element.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Scalar value of text and attribute nodes, `None` for elements.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn attributes(&self) -> &[XmlNode] {
        &self.attributes
    }

    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    /// What a report shows for this node when it has no counterpart:
    /// the tag name for elements, the value otherwise.
    pub fn display_value(&self) -> &str {
        match self.kind {
            NodeKind::Element => &self.name,
            NodeKind::Attribute | NodeKind::Text => self.value.as_deref().unwrap_or_default(),
        }
    }

    /// Convert a parsed element and its subtree. The walk keeps its own
    /// stack of open elements, so nesting depth is bounded by the parser
    /// and not by the call stack.
    fn from_element(root: roxmltree::Node<'_, '_>, parent_path: &str) -> Self {
        let mut current = OpenElement::new(root, parent_path);
        let mut ancestors: Vec<OpenElement<'_, '_>> = Vec::new();

        loop {
            match current.next_child.take() {
                Some(child) => {
                    current.next_child = child.next_sibling();
                    if child.is_element() {
                        let opened = OpenElement::new(child, &current.path);
                        ancestors.push(std::mem::replace(&mut current, opened));
                    } else if let Some(text) = child
                        .is_text()
                        .then(|| child.text())
                        .flatten()
                        .filter(|text| !text.chars().all(is_xml_whitespace))
                    {
                        current.children.push(XmlNode {
                            name: TEXT_NODE_NAME.to_string(),
                            kind: NodeKind::Text,
                            path: current.path.clone(),
                            value: Some(text.to_string()),
                            attributes: Vec::new(),
                            children: Vec::new(),
                        });
                    }
                }
                None => {
                    let finished = current.close();
                    match ancestors.pop() {
                        Some(parent) => {
                            current = parent;
                            current.children.push(finished);
                        }
                        None => return finished,
                    }
                }
            }
        }
    }
}

/// An element whose children are still being converted.
struct OpenElement<'a, 'input> {
    name: String,
    path: String,
    attributes: Vec<XmlNode>,
    children: Vec<XmlNode>,
    next_child: Option<roxmltree::Node<'a, 'input>>,
}

impl<'a, 'input> OpenElement<'a, 'input> {
    fn new(node: roxmltree::Node<'a, 'input>, parent_path: &str) -> Self {
        let name = qualified_name(node, node.tag_name().name(), node.tag_name().namespace());
        let path = format!("{}/{}", parent_path, name);

        let attributes = node
            .attributes()
            .map(|attr| {
                let attr_name = qualified_name(node, attr.name(), attr.namespace());
                XmlNode {
                    path: format!("{}/@{}", path, attr_name),
                    name: attr_name,
                    kind: NodeKind::Attribute,
                    value: Some(attr.value().to_string()),
                    attributes: Vec::new(),
                    children: Vec::new(),
                }
            })
            .collect();

        Self {
            name,
            path,
            attributes,
            children: Vec::new(),
            next_child: node.first_child(),
        }
    }

    fn close(self) -> XmlNode {
        XmlNode {
            name: self.name,
            kind: NodeKind::Element,
            path: self.path,
            value: None,
            attributes: self.attributes,
            children: self.children,
        }
    }
}

/// `prefix:local` when the namespace is bound to a non-empty prefix,
/// `local` otherwise.
fn qualified_name(node: roxmltree::Node<'_, '_>, local: &str, namespace: Option<&str>) -> String {
    match namespace.and_then(|uri| node.lookup_prefix(uri)) {
        Some(prefix) if !prefix.is_empty() => format!("{}:{}", prefix, local),
        _ => local.to_string(),
    }
}

/// A parsed document: its root element plus where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    source_id: String,
    root: XmlNode,
}

impl XmlDocument {
    /// Parse XML text. `source_id` only labels errors and logs.
    pub fn parse_str(source_id: impl Into<String>, text: &str) -> DocumentResult<Self> {
        let source_id = source_id.into();
        let parsed = roxmltree::Document::parse(text).map_err(|e| DocumentError::Parse {
            source_id: source_id.clone(),
            details: e.to_string(),
        })?;

        let root = XmlNode::from_element(parsed.root_element(), "");
        debug!(source = %source_id, root = %root.name(), "parsed document");

        Ok(Self { source_id, root })
    }

    /// Read and parse a file.
    pub fn from_file(path: &Path) -> DocumentResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_str(path.display().to_string(), &text)
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn root(&self) -> &XmlNode {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_builds_paths() {
        let doc = XmlDocument::parse_str("t", r#"<root><v unit="m">1</v></root>"#).unwrap();
        let root = doc.root();
        assert_eq!(root.name(), "root");
        assert_eq!(root.path(), "/root");

        let v = &root.children()[0];
        assert_eq!(v.path(), "/root/v");
        assert_eq!(v.attributes()[0].path(), "/root/v/@unit");
        assert_eq!(v.attributes()[0].value(), Some("m"));

        let text = &v.children()[0];
        assert_eq!(text.kind(), NodeKind::Text);
        assert_eq!(text.name(), TEXT_NODE_NAME);
        assert_eq!(text.path(), "/root/v");
        assert_eq!(text.value(), Some("1"));
    }

    #[test]
    fn test_whitespace_only_text_and_comments_dropped() {
        let doc = XmlDocument::parse_str(
            "t",
            "<root>\n  <!-- note -->\n  <a/>\n  <?pi data?>\n</root>",
        )
        .unwrap();
        let children = doc.root().children();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].name(), "a");
    }

    #[test]
    fn test_unicode_space_text_is_kept() {
        let doc = XmlDocument::parse_str("t", "<root><a/>\u{A0}<b/></root>").unwrap();
        let children = doc.root().children();
        assert_eq!(children.len(), 3);
        assert_eq!(children[1].value(), Some("\u{A0}"));
    }

    #[test]
    fn test_deep_nesting_converts() {
        let depth = 1000;
        let xml = format!("{}x{}", "<n>".repeat(depth), "</n>".repeat(depth));
        let doc = XmlDocument::parse_str("deep", &xml).unwrap();

        let mut node = doc.root();
        let mut levels = 1;
        while let Some(child) = node.children().first().filter(|c| c.is_element()) {
            node = child;
            levels += 1;
        }
        assert_eq!(levels, depth);
        assert_eq!(node.children()[0].value(), Some("x"));
        assert_eq!(node.path().matches('/').count(), depth);
    }

    #[test]
    fn test_prefixed_names_are_kept() {
        let doc = XmlDocument::parse_str(
            "t",
            r#"<root xmlns:x="urn:x"><x:item x:id="1"/></root>"#,
        )
        .unwrap();
        let item = &doc.root().children()[0];
        assert_eq!(item.name(), "x:item");
        assert_eq!(item.attributes()[0].name(), "x:id");
        assert_eq!(item.path(), "/root/x:item");
    }

    #[test]
    fn test_malformed_xml_is_parse_error() {
        let result = XmlDocument::parse_str("broken.xml", "<root><unclosed>");
        match result {
            Err(DocumentError::Parse { source_id, .. }) => assert_eq!(source_id, "broken.xml"),
            other => panic!("Expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "<root><a>x</a></root>").unwrap();
        file.flush().unwrap();

        let doc = XmlDocument::from_file(file.path()).unwrap();
        assert_eq!(doc.root().children()[0].display_value(), "a");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = XmlDocument::from_file(Path::new("/nonexistent/doc.xml"));
        assert!(matches!(result, Err(DocumentError::Io { .. })));
    }
}
