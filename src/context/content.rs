//! Content-script context: extraction handlers for one tab.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::bus::{Handler, MessageBus, MessageSender, Router};
use crate::error::Result;
use crate::extract::{
    collect_page_info, extract_links, extract_page_content, fallback_content, read_div_text,
};
use crate::identifiers::TabId;
use crate::platform::SharedDocument;
use crate::protocol::{ActionKind, Payload, Request, Response};

// ============================================================================
// ContentScript
// ============================================================================

/// The script a tab runs against its own document.
///
/// Handles `getPageContent`, `extractLinks`, `getPageInfo`, `getDivText`,
/// and relays `captureScreen` to the background.
#[derive(Clone)]
pub struct ContentScript {
    tab: TabId,
    document: SharedDocument,
    bus: MessageBus,
}

impl ContentScript {
    /// Creates the content script of `tab`.
    #[must_use]
    pub fn new(tab: TabId, document: SharedDocument, bus: MessageBus) -> Self {
        Self { tab, document, bus }
    }

    /// Tab this script runs in.
    #[inline]
    #[must_use]
    pub fn tab(&self) -> TabId {
        self.tab
    }

    /// Router with every content-side handler registered.
    #[must_use]
    pub fn router(&self) -> Router {
        Router::new()
            .with_handler(
                ActionKind::GetPageContent,
                PageContentHandler(self.document.clone()),
            )
            .with_handler(
                ActionKind::ExtractLinks,
                LinksHandler(self.document.clone()),
            )
            .with_handler(
                ActionKind::GetPageInfo,
                PageInfoHandler(self.document.clone()),
            )
            .with_handler(
                ActionKind::GetDivText,
                DivTextHandler(self.document.clone()),
            )
            .with_handler(
                ActionKind::CaptureScreen,
                CaptureRelay {
                    tab: self.tab,
                    bus: self.bus.clone(),
                },
            )
    }

    /// Attaches to the bus and serves requests until detached.
    pub fn start(self) -> JoinHandle<()> {
        info!(tab_id = %self.tab, "Content script ready");
        let inbox = self.bus.attach_content(self.tab);
        self.router().serve(inbox)
    }
}

// ============================================================================
// Handlers
// ============================================================================

struct PageContentHandler(SharedDocument);

#[async_trait]
impl Handler for PageContentHandler {
    async fn handle(&self, _request: Request, _sender: MessageSender) -> Result<Response> {
        let mut document = self.0.lock();
        Ok(match extract_page_content(&mut document) {
            Ok(content) => {
                debug!(words = content.word_count, "Page content extracted");
                Response::success(Payload::PageContent(content))
            }
            Err(e) => Response::failure_with_content(e.to_string(), fallback_content(&document)),
        })
    }
}

struct LinksHandler(SharedDocument);

#[async_trait]
impl Handler for LinksHandler {
    async fn handle(&self, _request: Request, _sender: MessageSender) -> Result<Response> {
        let report = extract_links(&self.0.lock())?;
        Ok(Response::success(Payload::Links(report)))
    }
}

struct PageInfoHandler(SharedDocument);

#[async_trait]
impl Handler for PageInfoHandler {
    async fn handle(&self, _request: Request, _sender: MessageSender) -> Result<Response> {
        let page_info = collect_page_info(&self.0.lock())?;
        Ok(Response::success(Payload::PageInfo { page_info }))
    }
}

struct DivTextHandler(SharedDocument);

#[async_trait]
impl Handler for DivTextHandler {
    async fn handle(&self, _request: Request, _sender: MessageSender) -> Result<Response> {
        Ok(Response::success(Payload::DivText(read_div_text(
            &self.0.lock(),
        ))))
    }
}

/// Forwards `captureScreen` to the background and returns its reply as is.
struct CaptureRelay {
    tab: TabId,
    bus: MessageBus,
}

#[async_trait]
impl Handler for CaptureRelay {
    async fn handle(&self, request: Request, _sender: MessageSender) -> Result<Response> {
        let reply = self
            .bus
            .send_runtime_message(MessageSender::content_script(self.tab), request)
            .await;
        Ok(reply.unwrap_or_else(|e| Response::from_error(&e)))
    }
}

// ============================================================================
// Tests
// ============================================================================
