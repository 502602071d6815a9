//! Page extraction over document snapshots.
//!
//! Every extractor is a plain function of a [`Document`](crate::dom::Document)
//! so it can run inside the content-script context, inside an injected
//! script, or directly in tests.
//!
//! # Modules
//!
//! | Module | Action | Description |
//! |--------|--------|-------------|
//! | `content` | `getPageContent` | Main readable text plus metadata |
//! | `links` | `extractLinks` | Links grouped by domain |
//! | `page_info` | `getPageInfo` | Counts and metadata |
//! | `injected` | `getPageContent` (background) | Headings and paragraphs summary |
//! | `div_text` | `getDivText` | Legacy `#aditya` reader |

// ============================================================================
// Imports
// ============================================================================

use std::sync::LazyLock;

use regex::Regex;

// ============================================================================
// Submodules
// ============================================================================

pub mod content;
pub mod div_text;
pub mod injected;
pub mod links;
pub mod page_info;

// ============================================================================
// Re-exports
// ============================================================================

pub use content::{MAX_CONTENT_CHARS, extract_page_content, fallback_content};
pub use div_text::read_div_text;
pub use injected::extract_injected;
pub use links::{MAX_LINKS, extract_links};
pub use page_info::collect_page_info;

// ============================================================================
// Text Helpers
// ============================================================================

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Collapses whitespace runs (line breaks included) to one space and trims.
#[must_use]
pub fn normalize_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Number of pieces `text` splits into on whitespace runs.
///
/// Leading or trailing whitespace yields an empty piece, and empty input
/// counts as one piece.
#[must_use]
pub fn whitespace_token_count(text: &str) -> usize {
    WHITESPACE.split(text).count()
}

/// Keeps the first `max` characters of `text`.
#[must_use]
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================
