//! Node trees used to build document snapshots.
//!
//! A content script posts its page as a JSON tree of these nodes; tests build
//! the same tree with the fluent [`Element`] API.
//!
//! # Example
//!
//! ```
//! use page_relay::dom::{Element, Node};
//!
//! let html = Element::new("html").child(
//!     Element::new("body")
//!         .child(Element::new("h1").text("Hello"))
//!         .child(Element::new("a").attr("href", "/about").text("About")),
//! );
//! let node: Node = html.into();
//! assert!(matches!(node, Node::Element(_)));
//! ```

// ============================================================================
// Imports
// ============================================================================

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// ============================================================================
// Node
// ============================================================================

/// A node in a posted page tree.
///
/// Text nodes are plain JSON strings, elements are objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    /// Character data.
    Text(String),
    /// An element with attributes and children.
    Element(Element),
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Node {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

// ============================================================================
// Element
// ============================================================================

/// An element in a posted page tree.
///
/// # Format
///
/// ```json
/// { "tag": "a", "attrs": { "href": "/x" }, "children": ["Link"] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    /// Tag name. Matching is case-insensitive.
    pub tag: String,

    /// Attributes in source order.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub attrs: IndexMap<String, String>,

    /// Child nodes in document order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl Element {
    /// Creates an element with no attributes or children.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: IndexMap::new(),
            children: Vec::new(),
        }
    }

    /// Sets an attribute.
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Sets the `id` attribute.
    #[must_use]
    pub fn id(self, id: impl Into<String>) -> Self {
        self.attr("id", id)
    }

    /// Sets the `class` attribute.
    #[must_use]
    pub fn class(self, class: impl Into<String>) -> Self {
        self.attr("class", class)
    }

    /// Appends a child node.
    #[must_use]
    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    /// Appends several child nodes.
    #[must_use]
    pub fn children(mut self, nodes: impl IntoIterator<Item = impl Into<Node>>) -> Self {
        self.children.extend(nodes.into_iter().map(Into::into));
        self
    }

    /// Appends a text child.
    #[must_use]
    pub fn text(self, text: impl Into<String>) -> Self {
        self.child(Node::Text(text.into()))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let el = Element::new("div")
            .id("main")
            .class("content wide")
            .text("hi")
            .child(Element::new("span"));

        assert_eq!(el.attrs.get("id").map(String::as_str), Some("main"));
        assert_eq!(
            el.attrs.get("class").map(String::as_str),
            Some("content wide")
        );
        assert_eq!(el.children.len(), 2);
    }

    #[test]
    fn test_json_tree_parse() {
        let json = r#"{
            "tag": "body",
            "children": [
                "intro",
                {"tag": "a", "attrs": {"href": "/x"}, "children": ["Link"]}
            ]
        }"#;

        let el: Element = serde_json::from_str(json).expect("parse");
        assert_eq!(el.children[0], Node::Text("intro".into()));
        let Node::Element(anchor) = &el.children[1] else {
            panic!("expected element");
        };
        assert_eq!(anchor.attrs["href"], "/x");
    }

    #[test]
    fn test_json_tree_roundtrip_omits_empty_fields() {
        let json = serde_json::to_string(&Element::new("br")).expect("serialize");
        assert_eq!(json, r#"{"tag":"br"}"#);
    }
}
