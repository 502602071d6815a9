//! Single-use reply handle.

use tokio::sync::oneshot;
use tracing::{trace, warn};

use crate::identifiers::RequestId;
use crate::protocol::Response;

/// Failure delivered when a responder is dropped without replying.
pub const NO_RESPONSE: &str = "The message port closed before a response was received.";

/// Delivers exactly one [`Response`] for a request.
///
/// [`respond`](Self::respond) consumes the responder, so a second reply does
/// not compile. Dropping it unanswered, including while a handler panics,
/// sends a failure instead.
#[derive(Debug)]
pub struct Responder {
    request_id: RequestId,
    action: String,
    tx: Option<oneshot::Sender<Response>>,
}

impl Responder {
    pub(crate) fn new(
        request_id: RequestId,
        action: impl Into<String>,
        tx: oneshot::Sender<Response>,
    ) -> Self {
        Self {
            request_id,
            action: action.into(),
            tx: Some(tx),
        }
    }

    /// Creates a responder and the receiver its reply arrives on.
    #[must_use]
    pub fn channel(action: impl Into<String>) -> (Self, oneshot::Receiver<Response>) {
        let (tx, rx) = oneshot::channel();
        (Self::new(RequestId::generate(), action, tx), rx)
    }

    /// ID of the request being answered.
    #[inline]
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Action of the request being answered.
    #[inline]
    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Sends the reply. Returns `false` if the caller stopped waiting.
    pub fn respond(mut self, response: Response) -> bool {
        self.send(response)
    }

    fn send(&mut self, response: Response) -> bool {
        let Some(tx) = self.tx.take() else {
            return false;
        };
        let delivered = tx.send(response).is_ok();
        if delivered {
            trace!(request_id = %self.request_id, action = %self.action, "Response delivered");
        } else {
            trace!(
                request_id = %self.request_id,
                action = %self.action,
                "Caller gone, response dropped"
            );
        }
        delivered
    }
}

impl Drop for Responder {
    fn drop(&mut self) {
        if self.tx.is_some() {
            warn!(
                request_id = %self.request_id,
                action = %self.action,
                "Responder dropped without a response"
            );
            self.send(Response::failure(NO_RESPONSE));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{DivText, Payload};

    #[tokio::test]
    async fn test_respond_delivers() {
        let (responder, rx) = Responder::channel("getDivText");
        let reply = Response::success(Payload::DivText(DivText {
            message: "working brother".into(),
            text_of_div: "hi".into(),
        }));

        assert!(responder.respond(reply.clone()));
        assert_eq!(rx.await.expect("reply"), reply);
    }

    #[tokio::test]
    async fn test_drop_sends_failure() {
        let (responder, rx) = Responder::channel("getPageInfo");
        drop(responder);

        let reply = rx.await.expect("reply");
        assert!(!reply.is_success());
        assert_eq!(reply.error_message(), Some(NO_RESPONSE));
    }

    #[tokio::test]
    async fn test_panicking_holder_still_replies() {
        let (responder, rx) = Responder::channel("extractLinks");
        let task = tokio::spawn(async move {
            let _held = responder;
            panic!("handler blew up");
        });

        assert!(task.await.is_err());
        assert_eq!(rx.await.expect("reply").error_message(), Some(NO_RESPONSE));
    }

    #[test]
    fn test_respond_after_caller_left() {
        let (responder, rx) = Responder::channel("captureScreen");
        drop(rx);
        assert!(!responder.respond(Response::failure("late")));
    }
}
