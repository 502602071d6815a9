//! Text rendering of document subtrees.
//!
//! [`Document::text_content`] concatenates every descendant text node, like
//! `Node.textContent`. [`Document::inner_text`] approximates the rendered
//! text of `HTMLElement.innerText`: non-rendered subtrees are skipped, source
//! whitespace collapses, and block boundaries become line breaks.

use super::document::{Document, NodeId, NodeKind};

// ============================================================================
// Constants
// ============================================================================

/// Elements whose contents are never rendered.
const NON_RENDERED_TAGS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Elements that start and end a line of rendered text.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "dd", "details", "dialog", "div", "dl",
    "dt", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5",
    "h6", "header", "hr", "html", "li", "main", "nav", "ol", "p", "pre", "section", "summary",
    "table", "tr", "ul",
];

// ============================================================================
// Document - Text
// ============================================================================

impl Document {
    /// Raw concatenated text of all descendant text nodes.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(NodeKind::Text(text)) = self.kind(id) {
            out.push_str(text);
        }
        for node in self.descendants(id) {
            if let Some(NodeKind::Text(text)) = self.kind(node) {
                out.push_str(text);
            }
        }
        out
    }

    /// Rendered text of a subtree, one line per block.
    ///
    /// Lines are trimmed and empty lines dropped.
    #[must_use]
    pub fn inner_text(&self, id: NodeId) -> String {
        let mut raw = String::new();
        self.render_into(id, &mut raw);

        raw.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn render_into(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            Some(NodeKind::Text(text)) => push_collapsed(out, text),
            Some(NodeKind::Element(element)) => {
                let tag = element.tag();
                if NON_RENDERED_TAGS.contains(&tag) || element.attribute("hidden").is_some() {
                    return;
                }
                match tag {
                    "br" => {
                        out.push('\n');
                        return;
                    }
                    "td" | "th" => out.push(' '),
                    _ => {}
                }

                let block = BLOCK_TAGS.contains(&tag);
                if block {
                    out.push('\n');
                }
                for &child in self.children(id) {
                    self.render_into(child, out);
                }
                if block {
                    out.push('\n');
                }
            }
            None => {}
        }
    }
}

/// Appends `text` with whitespace runs collapsed to one space.
fn push_collapsed(out: &mut String, text: &str) {
    let mut in_space = out.ends_with(' ');
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
                in_space = true;
            }
        } else {
            out.push(c);
            in_space = false;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
