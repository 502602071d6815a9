//! Owned document snapshot.
//!
//! A [`Document`] is an arena of element and text nodes rooted at the
//! document element (`<html>`), plus the page location and the few
//! document-level properties the extractors read. Removing a node detaches
//! its subtree; arena slots are never reused, so a [`NodeId`] stays valid for
//! the lifetime of the document.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

use super::node::{Element, Node};
use super::selector::Selector;

// ============================================================================
// Constants
// ============================================================================

/// Character set assumed when the snapshot does not declare one.
const DEFAULT_CHARACTER_SET: &str = "UTF-8";

// ============================================================================
// NodeId
// ============================================================================

/// Index of a node within its [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

// ============================================================================
// Arena Types
// ============================================================================

/// Element name and attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    tag: String,
    attrs: Vec<(String, String)>,
}

impl ElementData {
    /// Lowercase tag name.
    #[inline]
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Returns an attribute value. Names compare case-insensitively.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns `true` if the `class` attribute lists `class`.
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.attribute("class")
            .is_some_and(|list| list.split_ascii_whitespace().any(|c| c == class))
    }
}

#[derive(Debug, Clone)]
pub(crate) enum NodeKind {
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

// ============================================================================
// DocumentSnapshot
// ============================================================================

/// Serialized form of a page, as posted by a content script.
///
/// # Format
///
/// ```json
/// {
///   "url": "https://example.com/post",
///   "characterSet": "UTF-8",
///   "lastModified": "01/02/2025 10:00:00",
///   "root": { "tag": "html", "children": [ ... ] }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSnapshot {
    /// Page URL.
    pub url: String,
    /// Declared character set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_set: Option<String>,
    /// `document.lastModified` string.
    #[serde(default)]
    pub last_modified: String,
    /// Document element.
    pub root: Element,
}

// ============================================================================
// Document
// ============================================================================

/// A parsed page snapshot.
#[derive(Debug, Clone)]
pub struct Document {
    location: Url,
    character_set: String,
    last_modified: String,
    nodes: Vec<NodeData>,
    root: NodeId,
}

// ============================================================================
// Document - Constructors
// ============================================================================

impl Document {
    /// Builds a document from a page URL and its document element.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Url`] if `url` is not an absolute URL.
    pub fn new(url: &str, root: Element) -> Result<Self> {
        let location = Url::parse(url)?;
        let mut document = Self {
            location,
            character_set: DEFAULT_CHARACTER_SET.to_string(),
            last_modified: String::new(),
            nodes: Vec::new(),
            root: NodeId(0),
        };
        document.root = document.insert_element(root, None);
        Ok(document)
    }

    /// Builds a document from a posted snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Url`] if the snapshot URL is not absolute.
    pub fn from_snapshot(snapshot: DocumentSnapshot) -> Result<Self> {
        let mut document = Self::new(&snapshot.url, snapshot.root)?;
        if let Some(charset) = snapshot.character_set {
            document.character_set = charset;
        }
        document.last_modified = snapshot.last_modified;
        Ok(document)
    }

    /// Parses a posted JSON snapshot.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if the JSON does not describe a snapshot
    /// - [`Error::Url`] if the snapshot URL is not absolute
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_snapshot(serde_json::from_str(json)?)
    }

    /// Sets the declared character set.
    #[must_use]
    pub fn with_character_set(mut self, charset: impl Into<String>) -> Self {
        self.character_set = charset.into();
        self
    }

    /// Sets the last-modified stamp.
    #[must_use]
    pub fn with_last_modified(mut self, stamp: impl Into<String>) -> Self {
        self.last_modified = stamp.into();
        self
    }

    fn insert_element(&mut self, element: Element, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind: NodeKind::Element(ElementData {
                tag: element.tag.to_ascii_lowercase(),
                attrs: element.attrs.into_iter().collect(),
            }),
            parent,
            children: Vec::with_capacity(element.children.len()),
        });

        for child in element.children {
            let child_id = match child {
                Node::Element(el) => self.insert_element(el, Some(id)),
                Node::Text(text) => {
                    let text_id = NodeId(self.nodes.len());
                    self.nodes.push(NodeData {
                        kind: NodeKind::Text(text),
                        parent: Some(id),
                        children: Vec::new(),
                    });
                    text_id
                }
            };
            self.nodes[id.0].children.push(child_id);
        }

        id
    }
}

// ============================================================================
// Document - Accessors
// ============================================================================

impl Document {
    /// Page location.
    #[inline]
    #[must_use]
    pub fn location(&self) -> &Url {
        &self.location
    }

    /// Declared character set.
    #[inline]
    #[must_use]
    pub fn character_set(&self) -> &str {
        &self.character_set
    }

    /// Last-modified stamp.
    #[inline]
    #[must_use]
    pub fn last_modified(&self) -> &str {
        &self.last_modified
    }

    /// The document element.
    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Element data, or `None` for text nodes.
    #[must_use]
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.nodes.get(id.0)?.kind {
            NodeKind::Element(data) => Some(data),
            NodeKind::Text(_) => None,
        }
    }

    /// Attribute of an element node.
    #[must_use]
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.attribute(name)
    }

    /// Children of a node in document order.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
    }

    /// Parent of a node, `None` for the root and detached subtrees.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0)?.parent
    }

    pub(crate) fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id.0).map(|node| &node.kind)
    }

    /// Pre-order descendants of `id`, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            stack.extend(self.children(next).iter().rev().copied());
            Some(next)
        })
    }

    /// Attached elements in document order, root first.
    pub fn elements(&self) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::once(self.root)
            .chain(self.descendants(self.root))
            .filter(|&id| self.element(id).is_some())
    }

    /// `<body>`, if the document element has one.
    #[must_use]
    pub fn body(&self) -> Option<NodeId> {
        self.children(self.root)
            .iter()
            .copied()
            .find(|&id| self.element(id).is_some_and(|el| el.tag() == "body"))
    }

    /// Whitespace-collapsed text of the first `<title>`.
    #[must_use]
    pub fn title(&self) -> String {
        self.elements()
            .find(|&id| self.element(id).is_some_and(|el| el.tag() == "title"))
            .map(|id| {
                self.text_content(id)
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default()
    }

    /// `content` of the first `<meta name=...>`, `None` if absent or empty.
    #[must_use]
    pub fn meta_content(&self, name: &str) -> Option<&str> {
        self.elements()
            .find(|&id| {
                self.element(id).is_some_and(|el| {
                    el.tag() == "meta" && el.attribute("name").is_some_and(|n| n == name)
                })
            })
            .and_then(|id| self.attribute(id, "content"))
            .filter(|content| !content.is_empty())
    }

    /// `lang` attribute of the document element, `None` if absent or empty.
    #[must_use]
    pub fn language(&self) -> Option<&str> {
        self.attribute(self.root, "lang")
            .filter(|lang| !lang.is_empty())
    }
}

// ============================================================================
// Document - Queries
// ============================================================================

impl Document {
    /// First attached element matching `selector`, in document order.
    #[must_use]
    pub fn query_selector(&self, selector: &Selector) -> Option<NodeId> {
        self.elements().find(|&id| selector.matches(self, id))
    }

    /// All attached elements matching `selector`, in document order.
    #[must_use]
    pub fn query_selector_all(&self, selector: &Selector) -> Vec<NodeId> {
        self.elements()
            .filter(|&id| selector.matches(self, id))
            .collect()
    }

    /// Parses `selector` and returns the first match.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSelector`] if `selector` does not parse.
    pub fn select_first(&self, selector: &str) -> Result<Option<NodeId>> {
        Ok(self.query_selector(&Selector::parse(selector)?))
    }

    /// Parses `selector` and counts matches.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSelector`] if `selector` does not parse.
    pub fn count(&self, selector: &str) -> Result<usize> {
        let selector = Selector::parse(selector)?;
        Ok(self.elements().filter(|&id| selector.matches(self, id)).count())
    }
}

// ============================================================================
// Document - Mutation
// ============================================================================

impl Document {
    /// Detaches a node and its subtree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Dom`] when asked to remove the document element.
    pub fn remove(&mut self, id: NodeId) -> Result<()> {
        if id == self.root {
            return Err(Error::dom("cannot remove the document element"));
        }
        let Some(parent) = self.nodes.get_mut(id.0).and_then(|node| node.parent.take()) else {
            return Ok(());
        };
        self.nodes[parent.0].children.retain(|&child| child != id);
        Ok(())
    }

    /// Detaches every element matching `selector` and returns how many were removed.
    pub fn remove_matching(&mut self, selector: &Selector) -> usize {
        let targets = self.query_selector_all(selector);
        let mut removed = 0;
        for id in targets {
            // A target nested in an earlier one is already detached with it.
            if self.is_attached(id) && self.remove(id).is_ok() {
                removed += 1;
            }
        }
        removed
    }

    /// Returns `true` if `id` is reachable from the document element.
    #[must_use]
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        let root = Element::new("html").attr("lang", "en").children([
            Element::new("head")
                .child(Element::new("title").text("  Sample \n Page "))
                .child(
                    Element::new("meta")
                        .attr("name", "description")
                        .attr("content", "A page"),
                )
                .child(
                    Element::new("meta")
                        .attr("name", "keywords")
                        .attr("content", ""),
                ),
            Element::new("body").children([
                Element::new("header").child(Element::new("nav").text("menu")),
                Element::new("main").class("content").text("body text"),
            ]),
        ]);
        Document::new("https://example.com/a/b?q=1", root).expect("valid document")
    }

    #[test]
    fn test_document_properties() {
        let doc = sample();
        assert_eq!(doc.title(), "Sample Page");
        assert_eq!(doc.meta_content("description"), Some("A page"));
        assert_eq!(doc.meta_content("keywords"), None);
        assert_eq!(doc.meta_content("author"), None);
        assert_eq!(doc.language(), Some("en"));
        assert_eq!(doc.character_set(), "UTF-8");
        assert!(doc.body().is_some());
    }

    #[test]
    fn test_relative_url_rejected() {
        let err = Document::new("/relative", Element::new("html")).unwrap_err();
        assert!(matches!(err, Error::Url(_)));
    }

    #[test]
    fn test_query_in_document_order() {
        let doc = sample();
        let nav = doc.select_first("nav").expect("selector").expect("nav");
        let header = doc
            .select_first("header")
            .expect("selector")
            .expect("header");
        assert_eq!(doc.parent(nav), Some(header));
        assert_eq!(doc.count("meta").expect("selector"), 2);
    }

    #[test]
    fn test_remove_detaches_subtree() {
        let mut doc = sample();
        let header = doc
            .select_first("header")
            .expect("selector")
            .expect("header");
        let nav = doc.select_first("nav").expect("selector").expect("nav");

        doc.remove(header).expect("remove");

        assert!(!doc.is_attached(header));
        assert!(!doc.is_attached(nav));
        assert_eq!(doc.select_first("nav").expect("selector"), None);
    }

    #[test]
    fn test_remove_matching_counts_outermost_only() {
        let mut doc = sample();
        let selector = Selector::parse("header, nav").expect("selector");
        assert_eq!(doc.remove_matching(&selector), 1);
        assert_eq!(doc.count("header, nav").expect("selector"), 0);
    }

    #[test]
    fn test_cannot_remove_root() {
        let mut doc = sample();
        let root = doc.root();
        assert!(matches!(doc.remove(root), Err(Error::Dom { .. })));
    }

    #[test]
    fn test_from_json_snapshot() {
        let json = r#"{
            "url": "https://example.com/",
            "characterSet": "windows-1252",
            "lastModified": "01/02/2025 10:00:00",
            "root": {"tag": "HTML", "children": [{"tag": "BODY", "children": ["hi"]}]}
        }"#;

        let doc = Document::from_json(json).expect("parse");
        assert_eq!(doc.character_set(), "windows-1252");
        assert_eq!(doc.last_modified(), "01/02/2025 10:00:00");
        assert_eq!(doc.element(doc.root()).map(ElementData::tag), Some("html"));
        assert!(doc.body().is_some());
    }
}
