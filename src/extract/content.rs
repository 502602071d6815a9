//! Main readable text of a page.

use tracing::debug;

use crate::dom::{Document, NodeId, Selector};
use crate::error::{Error, Result};
use crate::protocol::{PageContent, PageMetadata};

use super::{normalize_whitespace, truncate_chars};

// ============================================================================
// Constants
// ============================================================================

/// Hard cap on extracted content, in characters.
pub const MAX_CONTENT_CHARS: usize = 10_000;

/// Elements removed from the document before reading text.
pub const PRUNED_ELEMENTS: &str = "script, style, nav, header, footer";

/// Main-content candidates, tried in order. First match wins.
pub const MAIN_CONTENT_SELECTORS: [&str; 8] = [
    "main",
    r#"[role="main"]"#,
    ".main-content",
    ".content",
    ".post-content",
    ".article-content",
    "article",
    ".container",
];

/// Fallback content when the page has no title either.
const NO_CONTENT_FALLBACK: &str = "Unable to extract content";

// ============================================================================
// Extraction
// ============================================================================

/// Extracts the main readable text of `document`.
///
/// Pruning is destructive: `script`, `style`, `nav`, `header` and `footer`
/// elements stay detached from `document` afterwards.
///
/// # Errors
///
/// Returns [`Error::Dom`] if no main-content candidate matches and the
/// document has no `<body>`.
pub fn extract_page_content(document: &mut Document) -> Result<PageContent> {
    let pruned = document.remove_matching(&Selector::parse(PRUNED_ELEMENTS)?);
    debug!(pruned, "Pruned non-content elements");

    let source = match main_content_element(document)? {
        Some(id) => id,
        None => document
            .body()
            .ok_or_else(|| Error::dom("document has no body"))?,
    };

    let content = truncate_chars(
        &normalize_whitespace(&visible_text(document, source)),
        MAX_CONTENT_CHARS,
    );
    let word_count = content.split(' ').count();

    Ok(PageContent {
        content,
        metadata: page_metadata(document),
        word_count,
    })
}

/// Content reported alongside an extraction failure.
#[must_use]
pub fn fallback_content(document: &Document) -> String {
    let title = document.title();
    if title.is_empty() {
        NO_CONTENT_FALLBACK.to_string()
    } else {
        title
    }
}

fn main_content_element(document: &Document) -> Result<Option<NodeId>> {
    for candidate in MAIN_CONTENT_SELECTORS {
        if let Some(id) = document.select_first(candidate)? {
            debug!(selector = candidate, "Main content element selected");
            return Ok(Some(id));
        }
    }
    Ok(None)
}

/// Rendered text, or raw text when nothing renders.
fn visible_text(document: &Document, id: NodeId) -> String {
    let text = document.inner_text(id);
    if text.is_empty() {
        document.text_content(id)
    } else {
        text
    }
}

fn page_metadata(document: &Document) -> PageMetadata {
    PageMetadata {
        title: document.title(),
        url: document.location().to_string(),
        description: document
            .meta_content("description")
            .unwrap_or_default()
            .to_string(),
        keywords: document
            .meta_content("keywords")
            .unwrap_or_default()
            .to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Element;

    fn page(body: Element) -> Document {
        let root = Element::new("html").children([
            Element::new("head")
                .child(Element::new("title").text("Post"))
                .child(
                    Element::new("meta")
                        .attr("name", "description")
                        .attr("content", "About posts"),
                ),
            body,
        ]);
        Document::new("https://blog.example.com/post/1", root).expect("valid document")
    }

    #[test]
    fn test_prefers_main_over_body() {
        let mut doc = page(Element::new("body").children([
            Element::new("div").text("sidebar junk"),
            Element::new("main").child(Element::new("p").text("The   real\n\n story")),
        ]));

        let content = extract_page_content(&mut doc).expect("extract");
        assert_eq!(content.content, "The real story");
        assert_eq!(content.word_count, 3);
        assert_eq!(content.metadata.title, "Post");
        assert_eq!(content.metadata.description, "About posts");
        assert_eq!(content.metadata.keywords, "");
        assert_eq!(content.metadata.url, "https://blog.example.com/post/1");
    }

    #[test]
    fn test_candidate_order_beats_document_order() {
        let mut doc = page(Element::new("body").children([
            Element::new("div")
                .class("container")
                .text("container text"),
            Element::new("article").text("article text"),
        ]));

        let content = extract_page_content(&mut doc).expect("extract");
        assert_eq!(content.content, "article text");
    }

    #[test]
    fn test_falls_back_to_body() {
        let mut doc = page(Element::new("body").children([
            Element::new("p").text("alpha"),
            Element::new("p").text("beta"),
        ]));

        let content = extract_page_content(&mut doc).expect("extract");
        assert_eq!(content.content, "alpha beta");
    }

    #[test]
    fn test_pruning_is_destructive() {
        let mut doc = page(Element::new("body").children([
            Element::new("header").text("site header"),
            Element::new("nav").text("menu"),
            Element::new("script").text("track()"),
            Element::new("p").text("kept"),
            Element::new("footer").text("legal"),
        ]));

        let content = extract_page_content(&mut doc).expect("extract");
        assert_eq!(content.content, "kept");
        assert_eq!(
            doc.count("header, nav, script, footer").expect("selector"),
            0
        );
    }

    #[test]
    fn test_truncates_to_cap() {
        let long = "word ".repeat(3_000);
        let mut doc = page(Element::new("body").child(Element::new("main").text(long)));

        let content = extract_page_content(&mut doc).expect("extract");
        assert_eq!(content.content.chars().count(), MAX_CONTENT_CHARS);
        // The cut lands after a space, leaving an empty trailing token.
        assert!(content.content.ends_with(' '));
        assert_eq!(content.word_count, 2_001);
    }

    #[test]
    fn test_missing_body_is_an_error() {
        let mut doc = Document::new(
            "https://example.com/",
            Element::new("html").child(Element::new("head").child(Element::new("title").text("T"))),
        )
        .expect("valid document");

        assert!(matches!(extract_page_content(&mut doc), Err(Error::Dom { .. })));
        assert_eq!(fallback_content(&doc), "T");
    }

    #[test]
    fn test_fallback_without_title() {
        let doc = Document::new("https://example.com/", Element::new("html"))
            .expect("valid document");
        assert_eq!(fallback_content(&doc), "Unable to extract content");
    }

    #[test]
    fn test_empty_main_uses_text_content() {
        let mut doc = page(Element::new("body").child(
            Element::new("main").child(Element::new("div").attr("hidden", "").text("only hidden")),
        ));

        let content = extract_page_content(&mut doc).expect("extract");
        assert_eq!(content.content, "only hidden");
    }
}
