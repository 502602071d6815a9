//! Result payloads carried by successful responses.
//!
//! Field names follow the camelCase wire format the extension UI consumes.

// ============================================================================
// Imports
// ============================================================================

use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64Standard;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::identifiers::TabId;

// ============================================================================
// Payload
// ============================================================================

/// The success payload of a [`Response`](super::Response).
///
/// Variants are distinguished on the wire by their field sets, so the
/// declaration order matters for deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    /// `getPageContent` from the content script.
    PageContent(PageContent),

    /// `extractLinks`.
    Links(LinkReport),

    /// `getPageInfo`.
    PageInfo {
        /// Collected page information.
        #[serde(rename = "pageInfo")]
        page_info: PageInfo,
    },

    /// `captureScreen`.
    Screenshot {
        /// Base64 `data:` URI of the capture.
        image: String,
    },

    /// `getTabInfo`.
    Tab {
        /// The active tab.
        tab: TabDescriptor,
    },

    /// `getPageContent` answered by the background via script injection.
    Injected {
        /// Result of the injected extraction.
        content: InjectedPage,
    },

    /// `getDivText`.
    DivText(DivText),
}

// ============================================================================
// Page Content
// ============================================================================

/// Metadata accompanying extracted page content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    /// Document title.
    pub title: String,
    /// Page URL.
    pub url: String,
    /// `meta[name="description"]`, empty if absent.
    pub description: String,
    /// `meta[name="keywords"]`, empty if absent.
    pub keywords: String,
}

/// Main readable text of a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageContent {
    /// Normalized, truncated text.
    pub content: String,
    /// Page metadata.
    pub metadata: PageMetadata,
    /// Space-separated token count of `content`.
    pub word_count: usize,
}

// ============================================================================
// Links
// ============================================================================

/// A link found on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedLink {
    /// Visible text, title attribute, or `"No text"`.
    pub text: String,
    /// Absolute URL.
    pub url: String,
    /// Hostname of `url`, empty for host-less schemes.
    pub domain: String,
}

/// Links grouped by hostname.
///
/// Groups keep first-seen order, and links keep document order within a group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkReport {
    /// Number of entries in `links`.
    pub total_links: usize,
    /// Links in document order.
    pub links: Vec<ExtractedLink>,
    /// Same links partitioned by `domain`.
    pub links_by_domain: IndexMap<String, Vec<ExtractedLink>>,
}

impl LinkReport {
    /// Builds a report, grouping `links` by domain.
    #[must_use]
    pub fn new(links: Vec<ExtractedLink>) -> Self {
        let mut links_by_domain: IndexMap<String, Vec<ExtractedLink>> = IndexMap::new();
        for link in &links {
            links_by_domain
                .entry(link.domain.clone())
                .or_default()
                .push(link.clone());
        }

        Self {
            total_links: links.len(),
            links,
            links_by_domain,
        }
    }
}

// ============================================================================
// Page Info
// ============================================================================

/// Heading counts by level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingCounts {
    /// Number of `h1` elements.
    pub h1: usize,
    /// Number of `h2` elements.
    pub h2: usize,
    /// Number of `h3` elements.
    pub h3: usize,
    /// Number of `h4` elements.
    pub h4: usize,
    /// Number of `h5` elements.
    pub h5: usize,
    /// Number of `h6` elements.
    pub h6: usize,
}

impl HeadingCounts {
    /// Returns the count for heading level 1-6.
    #[must_use]
    pub fn level(&self, level: u8) -> Option<usize> {
        match level {
            1 => Some(self.h1),
            2 => Some(self.h2),
            3 => Some(self.h3),
            4 => Some(self.h4),
            5 => Some(self.h5),
            6 => Some(self.h6),
            _ => None,
        }
    }
}

/// Counts and metadata read from the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// Document title.
    pub title: String,
    /// Full page URL.
    pub url: String,
    /// Host name, empty for hostless URLs.
    pub domain: String,
    /// URL path.
    pub path: String,
    /// Meta description, or `"No description"`.
    pub description: String,
    /// Meta keywords, or `"No keywords"`.
    pub keywords: String,
    /// Meta author, or `"Unknown"`.
    pub author: String,
    /// Declared character set.
    pub charset: String,
    /// `<html lang>`, or `"Not specified"`.
    pub language: String,
    /// `document.lastModified` stamp.
    pub last_modified: String,
    /// Whitespace-separated tokens in the body's visible text.
    pub word_count: usize,
    /// Number of `img` elements.
    pub image_count: usize,
    /// Number of `video` elements.
    pub video_count: usize,
    /// Number of `a[href]` elements.
    pub link_count: usize,
    /// Per-level heading counts.
    pub headings: HeadingCounts,
    /// Meta viewport, or `"Not specified"`.
    pub viewport: String,
}

// ============================================================================
// Tabs
// ============================================================================

/// Loading state of a tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabStatus {
    /// Navigation in progress.
    Loading,
    /// Load finished.
    Complete,
}

/// Public description of a tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabDescriptor {
    /// Tab id.
    pub id: TabId,
    /// Current URL.
    pub url: String,
    /// Current title.
    pub title: String,
    /// Favicon URL, when the tab has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fav_icon_url: Option<String>,
    /// Loading state, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TabStatus>,
}

// ============================================================================
// Injected Extraction
// ============================================================================

/// Summary produced by the extraction function the background injects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjectedPage {
    /// Document title.
    pub title: String,
    /// Meta description, empty when absent.
    pub description: String,
    /// First ten non-empty `h1`-`h3` texts.
    pub headings: Vec<String>,
    /// First five non-empty paragraph texts.
    pub paragraphs: Vec<String>,
    /// Page URL.
    pub url: String,
    /// Set when extraction degraded to the fallback record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============================================================================
// Div Text
// ============================================================================

/// Legacy `getDivText` reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DivText {
    /// Fixed status line.
    pub message: String,
    /// Visible text of the div, or a not-found notice.
    #[serde(rename = "textOfdiv")]
    pub text_of_div: String,
}

// ============================================================================
// Data URIs
// ============================================================================

/// A decoded `data:<mime>;base64,<data>` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    /// MIME type, e.g. `image/png`.
    pub mime_type: String,
    /// Decoded bytes.
    pub bytes: Vec<u8>,
}

impl DataUri {
    /// Parses and decodes a base64 data URI.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if the URI is not a base64 data URI
    /// - [`Error::Base64`] if the data section does not decode
    pub fn parse(uri: &str) -> Result<Self> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| Error::invalid_argument("not a data URI"))?;
        let (header, data) = rest
            .split_once(',')
            .ok_or_else(|| Error::invalid_argument("data URI has no payload"))?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| Error::invalid_argument("data URI is not base64 encoded"))?;

        Ok(Self {
            mime_type: mime_type.to_string(),
            bytes: Base64Standard.decode(data)?,
        })
    }

    /// Encodes bytes as a base64 data URI.
    #[must_use]
    pub fn encode(mime_type: &str, bytes: &[u8]) -> String {
        format!("data:{mime_type};base64,{}", Base64Standard.encode(bytes))
    }
}

// ============================================================================
// Tests
// ============================================================================
