//! Action dispatch for one context.

// ============================================================================
// Imports
// ============================================================================

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::Result;
use crate::protocol::{ActionKind, Request, Response};

use super::{Envelope, Inbox, MessageSender};

// ============================================================================
// Handler
// ============================================================================

/// Handles one action.
///
/// An `Err` becomes a failure response; it never reaches the caller as an
/// error.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Produces the response for `request`.
    async fn handle(&self, request: Request, sender: MessageSender) -> Result<Response>;
}

#[async_trait]
impl<F, Fut> Handler for F
where
    F: Fn(Request, MessageSender) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response>> + Send + 'static,
{
    async fn handle(&self, request: Request, sender: MessageSender) -> Result<Response> {
        (self)(request, sender).await
    }
}

// ============================================================================
// ChannelState
// ============================================================================

/// Whether the reply channel stays open after dispatch returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// The reply was sent during dispatch.
    Closed,
    /// A handler task will reply later.
    Open,
}

// ============================================================================
// Router
// ============================================================================

/// Maps actions to handlers.
///
/// Unrecognised actions, and recognised ones with no handler here, are
/// rejected synchronously with `{"error":"Unknown action"}`.
#[derive(Clone, Default)]
pub struct Router {
    handlers: FxHashMap<ActionKind, Arc<dyn Handler>>,
}

impl Router {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `action`, replacing any previous one.
    #[must_use]
    pub fn with_handler(mut self, action: ActionKind, handler: impl Handler) -> Self {
        self.register(action, handler);
        self
    }

    /// Registers `handler` for `action`, replacing any previous one.
    pub fn register(&mut self, action: ActionKind, handler: impl Handler) {
        self.handlers.insert(action, Arc::new(handler));
    }

    /// Returns `true` if `action` has a handler.
    #[inline]
    #[must_use]
    pub fn handles(&self, action: ActionKind) -> bool {
        self.handlers.contains_key(&action)
    }

    /// Routes one request.
    ///
    /// Known actions run on a spawned task and return [`ChannelState::Open`].
    pub fn dispatch(&self, envelope: Envelope) -> ChannelState {
        let Envelope {
            request,
            sender,
            responder,
        } = envelope;

        let handler = request
            .kind()
            .and_then(|kind| self.handlers.get(&kind))
            .map(Arc::clone);

        let Some(handler) = handler else {
            debug!(action = %request.action, "Rejecting unknown action");
            responder.respond(Response::unknown_action());
            return ChannelState::Closed;
        };

        debug!(
            action = %request.action,
            request_id = %responder.request_id(),
            "Dispatching request"
        );
        tokio::spawn(async move {
            let action = request.action.clone();
            let response = match handler.handle(request, sender).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(action = %action, error = %e, "Handler failed");
                    Response::from_error(&e)
                }
            };
            responder.respond(response);
        });
        ChannelState::Open
    }

    /// Drains `inbox` until every sender is gone.
    pub fn serve(self, mut inbox: Inbox) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(envelope) = inbox.recv().await {
                self.dispatch(envelope);
            }
            debug!("Inbox closed, router stopped");
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
