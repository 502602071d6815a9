//! Page statistics and metadata.

use crate::dom::Document;
use crate::error::{Error, Result};
use crate::protocol::{HeadingCounts, PageInfo};

use super::whitespace_token_count;

const NO_DESCRIPTION: &str = "No description";
const NO_KEYWORDS: &str = "No keywords";
const UNKNOWN_AUTHOR: &str = "Unknown";
const NOT_SPECIFIED: &str = "Not specified";

/// Reads counts and metadata from `document` as it is now.
///
/// Nothing is cached, so earlier pruning by content extraction shows up in
/// the counts.
///
/// # Errors
///
/// Returns [`Error::Dom`] if the document has no `<body>`.
pub fn collect_page_info(document: &Document) -> Result<PageInfo> {
    let body = document
        .body()
        .ok_or_else(|| Error::dom("document has no body"))?;
    let location = document.location();

    Ok(PageInfo {
        title: document.title(),
        url: location.to_string(),
        domain: location.host_str().unwrap_or_default().to_string(),
        path: location.path().to_string(),
        description: meta_or(document, "description", NO_DESCRIPTION),
        keywords: meta_or(document, "keywords", NO_KEYWORDS),
        author: meta_or(document, "author", UNKNOWN_AUTHOR),
        charset: document.character_set().to_string(),
        language: document.language().unwrap_or(NOT_SPECIFIED).to_string(),
        last_modified: document.last_modified().to_string(),
        word_count: whitespace_token_count(&document.inner_text(body)),
        image_count: document.count("img")?,
        video_count: document.count("video")?,
        link_count: document.count("a[href]")?,
        headings: heading_counts(document)?,
        viewport: meta_or(document, "viewport", NOT_SPECIFIED),
    })
}

fn meta_or(document: &Document, name: &str, default: &str) -> String {
    document.meta_content(name).unwrap_or(default).to_string()
}

fn heading_counts(document: &Document) -> Result<HeadingCounts> {
    Ok(HeadingCounts {
        h1: document.count("h1")?,
        h2: document.count("h2")?,
        h3: document.count("h3")?,
        h4: document.count("h4")?,
        h5: document.count("h5")?,
        h6: document.count("h6")?,
    })
}
