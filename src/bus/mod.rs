//! Cross-context message bus.
//!
//! Popup, background and content-script contexts never share state; they
//! exchange [`Request`]/[`Response`] messages over a [`MessageBus`].
//! Runtime messages go to the background endpoint, tab messages to the
//! content endpoint of one tab.
//!
//! Each endpoint is an unbounded queue drained by a [`Router`]. Callers get a
//! future per request, bounded by the configured timeout, and every request
//! receives exactly one [`Response`] through its [`Responder`].
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `responder` | Exactly-once reply handle |
//! | `router` | Action-to-handler dispatch |

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::RelayOptions;
use crate::error::{Error, Result};
use crate::identifiers::{RequestId, TabId};
use crate::protocol::{Request, Response};

// ============================================================================
// Submodules
// ============================================================================

mod responder;
mod router;

// ============================================================================
// Re-exports
// ============================================================================

pub use responder::{NO_RESPONSE, Responder};
pub use router::{ChannelState, Handler, Router};

// ============================================================================
// Types
// ============================================================================

/// Outstanding requests, keyed by ID, with their action for logging.
type PendingMap = FxHashMap<RequestId, String>;

/// Queue feeding one endpoint.
type Endpoint = mpsc::UnboundedSender<Envelope>;

/// Kind of execution context a message came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    /// The popup UI.
    Popup,
    /// The background service worker.
    Background,
    /// A content script running in a tab.
    ContentScript,
}

/// Who sent a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageSender {
    /// Sending context.
    pub origin: ContextKind,
    /// Tab of a content-script sender.
    pub tab: Option<TabId>,
}

impl MessageSender {
    /// A sender outside any tab.
    #[inline]
    #[must_use]
    pub const fn new(origin: ContextKind) -> Self {
        Self { origin, tab: None }
    }

    /// A content script in `tab`.
    #[inline]
    #[must_use]
    pub const fn content_script(tab: TabId) -> Self {
        Self {
            origin: ContextKind::ContentScript,
            tab: Some(tab),
        }
    }
}

/// A request in flight to an endpoint.
#[derive(Debug)]
pub struct Envelope {
    /// The request.
    pub request: Request,
    /// Who sent it.
    pub sender: MessageSender,
    /// Where the reply goes.
    pub responder: Responder,
}

/// Receiving half of an endpoint.
#[derive(Debug)]
pub struct Inbox {
    rx: mpsc::UnboundedReceiver<Envelope>,
}

impl Inbox {
    /// Next envelope, or `None` once the endpoint is detached.
    pub async fn recv(&mut self) -> Option<Envelope> {
        self.rx.recv().await
    }
}

/// Message target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Runtime,
    Tab(TabId),
}

impl Target {
    fn no_receiver(self) -> Error {
        match self {
            Self::Runtime => Error::no_runtime_receiver(),
            Self::Tab(tab) => Error::no_tab_receiver(tab),
        }
    }
}

// ============================================================================
// MessageBus
// ============================================================================

/// Request/response transport between contexts.
///
/// Cloning shares the endpoints.
#[derive(Clone)]
pub struct MessageBus {
    inner: Arc<BusInner>,
}

struct BusInner {
    runtime: RwLock<Option<Endpoint>>,
    tabs: RwLock<FxHashMap<TabId, Endpoint>>,
    pending: Mutex<PendingMap>,
    request_timeout: Duration,
    max_pending: usize,
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new(&RelayOptions::default())
    }
}

impl MessageBus {
    /// Creates a bus with no endpoints attached.
    #[must_use]
    pub fn new(options: &RelayOptions) -> Self {
        Self {
            inner: Arc::new(BusInner {
                runtime: RwLock::new(None),
                tabs: RwLock::new(FxHashMap::default()),
                pending: Mutex::new(PendingMap::default()),
                request_timeout: options.request_timeout,
                max_pending: options.max_pending_requests,
            }),
        }
    }

    // ========================================================================
    // Endpoints
    // ========================================================================

    /// Attaches the background endpoint, replacing any previous one.
    #[must_use]
    pub fn attach_background(&self) -> Inbox {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.inner.runtime.write() = Some(tx);
        debug!("Background endpoint attached");
        Inbox { rx }
    }

    /// Attaches the content endpoint of `tab`, replacing any previous one.
    #[must_use]
    pub fn attach_content(&self, tab: TabId) -> Inbox {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.tabs.write().insert(tab, tx);
        debug!(tab_id = %tab, "Content endpoint attached");
        Inbox { rx }
    }

    /// Detaches the background endpoint.
    pub fn detach_background(&self) {
        self.inner.runtime.write().take();
    }

    /// Detaches the content endpoint of `tab`.
    pub fn detach_content(&self, tab: TabId) {
        self.inner.tabs.write().remove(&tab);
    }

    /// Returns the number of requests awaiting a response.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.pending.lock().len()
    }

    // ========================================================================
    // Sending
    // ========================================================================

    /// Sends `request` to the background endpoint.
    ///
    /// # Errors
    ///
    /// - [`Error::NoReceiver`] if no background endpoint is attached
    /// - [`Error::RequestTimeout`] if no response arrives in time
    /// - [`Error::Protocol`] if too many requests are pending
    pub async fn send_runtime_message(
        &self,
        sender: MessageSender,
        request: Request,
    ) -> Result<Response> {
        self.send(Target::Runtime, sender, request).await
    }

    /// Sends `request` to the content endpoint of `tab`.
    ///
    /// # Errors
    ///
    /// - [`Error::NoReceiver`] if no content script listens in `tab`
    /// - [`Error::RequestTimeout`] if no response arrives in time
    /// - [`Error::Protocol`] if too many requests are pending
    pub async fn send_tab_message(
        &self,
        sender: MessageSender,
        tab: TabId,
        request: Request,
    ) -> Result<Response> {
        self.send(Target::Tab(tab), sender, request).await
    }

    async fn send(
        &self,
        target: Target,
        sender: MessageSender,
        request: Request,
    ) -> Result<Response> {
        let endpoint = self.endpoint(target).ok_or_else(|| target.no_receiver())?;

        let request_id = RequestId::generate();
        let action = request.action.clone();
        {
            let mut pending = self.inner.pending.lock();
            if pending.len() >= self.inner.max_pending {
                warn!(
                    pending = pending.len(),
                    max = self.inner.max_pending,
                    "Too many pending requests"
                );
                return Err(Error::protocol(format!(
                    "Too many pending requests: {}/{}",
                    pending.len(),
                    self.inner.max_pending
                )));
            }
            pending.insert(request_id, action.clone());
        }
        let _pending = PendingGuard {
            pending: &self.inner.pending,
            request_id,
        };

        let (tx, rx) = tokio::sync::oneshot::channel();
        let envelope = Envelope {
            request,
            sender,
            responder: Responder::new(request_id, action.clone(), tx),
        };

        if endpoint.send(envelope).is_err() {
            self.forget(target);
            return Err(target.no_receiver());
        }

        match timeout(self.inner.request_timeout, rx).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(Error::ChannelClosed(e)),
            Err(_) => {
                warn!(%request_id, action = %action, "Request timed out");
                Err(Error::request_timeout(
                    request_id,
                    action,
                    self.inner.request_timeout.as_millis() as u64,
                ))
            }
        }
    }

    fn endpoint(&self, target: Target) -> Option<Endpoint> {
        match target {
            Target::Runtime => self.inner.runtime.read().clone(),
            Target::Tab(tab) => self.inner.tabs.read().get(&tab).cloned(),
        }
    }

    /// Drops an endpoint whose receiver is gone.
    fn forget(&self, target: Target) {
        debug!(?target, "Endpoint receiver dropped");
        match target {
            Target::Runtime => {
                let mut runtime = self.inner.runtime.write();
                if runtime.as_ref().is_some_and(|tx| tx.is_closed()) {
                    *runtime = None;
                }
            }
            Target::Tab(tab) => {
                let mut tabs = self.inner.tabs.write();
                if tabs.get(&tab).is_some_and(|tx| tx.is_closed()) {
                    tabs.remove(&tab);
                }
            }
        }
    }
}

// ============================================================================
// PendingGuard
// ============================================================================

/// Releases a pending-map entry when the send future completes or is dropped.
struct PendingGuard<'a> {
    pending: &'a Mutex<PendingMap>,
    request_id: RequestId,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.pending.lock().remove(&self.request_id);
    }
}

// ============================================================================
// Tests
// ============================================================================
