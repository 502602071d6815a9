//! Link enumeration and grouping.

use tracing::debug;

use crate::dom::{Document, NodeId, Selector};
use crate::error::Result;
use crate::protocol::{ExtractedLink, LinkReport};

// ============================================================================
// Constants
// ============================================================================

/// Maximum number of links reported.
pub const MAX_LINKS: usize = 100;

/// Text used when an anchor has neither text nor title.
const NO_TEXT: &str = "No text";

// ============================================================================
// Extraction
// ============================================================================

/// Collects up to [`MAX_LINKS`] links in document order, grouped by domain.
///
/// Empty hrefs and `javascript:` URLs are skipped before the cap is applied.
/// An href that cannot be resolved against the page URL is skipped on its
/// own; the rest of the page is still extracted.
///
/// # Errors
///
/// Only fails if the built-in anchor selector does not parse.
pub fn extract_links(document: &Document) -> Result<LinkReport> {
    let anchors = document.query_selector_all(&Selector::parse("a[href]")?);

    let links: Vec<ExtractedLink> = anchors
        .into_iter()
        .filter_map(|id| to_link(document, id))
        .take(MAX_LINKS)
        .collect();

    debug!(links = links.len(), "Links extracted");
    Ok(LinkReport::new(links))
}

fn to_link(document: &Document, id: NodeId) -> Option<ExtractedLink> {
    let href = document.attribute(id, "href")?.trim();
    if href.is_empty() {
        return None;
    }

    let url = match document.location().join(href) {
        Ok(url) => url,
        Err(e) => {
            debug!(href, error = %e, "Skipping unresolvable link");
            return None;
        }
    };
    if url.scheme() == "javascript" {
        return None;
    }

    Some(ExtractedLink {
        text: link_text(document, id),
        domain: url.host_str().unwrap_or_default().to_string(),
        url: url.into(),
    })
}

fn link_text(document: &Document, id: NodeId) -> String {
    let text = document.inner_text(id);
    let text = text.trim();
    if !text.is_empty() {
        return text.to_string();
    }

    document
        .attribute(id, "title")
        .filter(|title| !title.is_empty())
        .unwrap_or(NO_TEXT)
        .to_string()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use proptest::prelude::*;

    use super::*;
    use crate::dom::Element;

    fn page(anchors: impl IntoIterator<Item = Element>) -> Document {
        let root = Element::new("html").child(Element::new("body").children(anchors));
        Document::new("https://example.com/docs/", root).expect("valid document")
    }

    fn anchor(href: &str) -> Element {
        Element::new("a").attr("href", href)
    }

    #[test]
    fn test_resolves_relative_urls() {
        let doc = page([anchor("guide").text("Guide"), anchor("/about").text("About")]);
        let report = extract_links(&doc).expect("extract");

        assert_eq!(report.links[0].url, "https://example.com/docs/guide");
        assert_eq!(report.links[1].url, "https://example.com/about");
        assert_eq!(report.links[0].domain, "example.com");
    }

    #[test]
    fn test_text_fallbacks() {
        let doc = page([
            anchor("/a").text("  Visible  "),
            anchor("/b").attr("title", "Titled"),
            anchor("/c"),
        ]);
        let report = extract_links(&doc).expect("extract");
        let texts: Vec<_> = report.links.iter().map(|l| l.text.as_str()).collect();

        assert_eq!(texts, ["Visible", "Titled", "No text"]);
    }

    #[test]
    fn test_skips_javascript_and_empty() {
        let doc = page([
            anchor("javascript:void(0)").text("js"),
            anchor("JavaScript:alert(1)").text("js2"),
            anchor("").text("empty"),
            anchor("   ").text("blank"),
            Element::new("a").text("no href"),
            anchor("https://other.org/").text("kept"),
        ]);
        let report = extract_links(&doc).expect("extract");

        assert_eq!(report.total_links, 1);
        assert_eq!(report.links[0].text, "kept");
    }

    #[test]
    fn test_malformed_href_skipped_alone() {
        let doc = page([
            anchor("http://").text("broken"),
            anchor("https://[::1").text("broken ipv6"),
            anchor("https://ok.example/").text("fine"),
        ]);
        let report = extract_links(&doc).expect("extract");

        assert_eq!(report.total_links, 1);
        assert_eq!(report.links[0].domain, "ok.example");
    }

    #[test]
    fn test_caps_at_limit() {
        let anchors = (0..150).map(|i| anchor(&format!("https://site{}.com/{i}", i % 7)));
        let doc = page(anchors);
        let report = extract_links(&doc).expect("extract");

        assert_eq!(report.total_links, MAX_LINKS);
        assert_eq!(
            report.links.last().map(|l| l.url.as_str()),
            Some("https://site1.com/99")
        );
    }

    #[test]
    fn test_cap_applies_after_filtering() {
        let anchors = (0..120).map(|i| {
            if i % 2 == 0 {
                anchor("javascript:void(0)")
            } else {
                anchor(&format!("/p{i}"))
            }
        });
        let report = extract_links(&page(anchors)).expect("extract");
        assert_eq!(report.total_links, 60);
    }

    #[test]
    fn test_hostless_schemes_have_empty_domain() {
        let doc = page([anchor("mailto:someone@example.com").text("mail")]);
        let report = extract_links(&doc).expect("extract");
        assert_eq!(report.links[0].domain, "");
        assert!(report.links_by_domain.contains_key(""));
    }

    proptest! {
        #[test]
        fn prop_grouping_partitions_links(hosts in prop::collection::vec(0u8..5, 0..160)) {
            let anchors = hosts
                .iter()
                .enumerate()
                .map(|(i, h)| anchor(&format!("https://h{h}.test/{i}")));
            let report = extract_links(&page(anchors)).expect("extract");

            prop_assert!(report.total_links <= MAX_LINKS);
            let grouped: usize = report.links_by_domain.values().map(Vec::len).sum();
            prop_assert_eq!(grouped, report.total_links);

            let flat: HashSet<_> = report.links.iter().map(|l| l.url.clone()).collect();
            for (domain, links) in &report.links_by_domain {
                for link in links {
                    prop_assert_eq!(&link.domain, domain);
                    prop_assert!(flat.contains(&link.url));
                }
            }
        }
    }
}
