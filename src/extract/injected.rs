//! Extraction function injected by the background relay.

use tracing::warn;

use crate::dom::{Document, Selector};
use crate::error::{Error, Result};
use crate::protocol::InjectedPage;

/// Maximum headings reported.
const MAX_HEADINGS: usize = 10;

/// Maximum paragraphs reported.
const MAX_PARAGRAPHS: usize = 5;

/// Summarizes the title, description, headings and paragraphs of a page.
///
/// Never fails: on error the result is a record holding only the title and
/// URL, with `error` set.
#[must_use]
pub fn extract_injected(document: &Document) -> InjectedPage {
    summarize(document).unwrap_or_else(|e| {
        warn!(error = %e, "Injected extraction degraded");
        degraded(document, &e)
    })
}

fn summarize(document: &Document) -> Result<InjectedPage> {
    Ok(InjectedPage {
        title: document.title(),
        description: document
            .meta_content("description")
            .unwrap_or_default()
            .to_string(),
        headings: trimmed_texts(document, "h1, h2, h3", MAX_HEADINGS)?,
        paragraphs: trimmed_texts(document, "p", MAX_PARAGRAPHS)?,
        url: document.location().to_string(),
        error: None,
    })
}

fn degraded(document: &Document, error: &Error) -> InjectedPage {
    InjectedPage {
        title: document.title(),
        url: document.location().to_string(),
        error: Some(error.to_string()),
        ..InjectedPage::default()
    }
}

/// Non-empty trimmed `textContent` of the first `limit` matches.
fn trimmed_texts(document: &Document, selector: &str, limit: usize) -> Result<Vec<String>> {
    let selector = Selector::parse(selector)?;
    Ok(document
        .query_selector_all(&selector)
        .into_iter()
        .map(|id| document.text_content(id).trim().to_string())
        .filter(|text| !text.is_empty())
        .take(limit)
        .collect())
}
