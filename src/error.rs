//! Error types for page-relay.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use page_relay::{Result, Error};
//!
//! async fn example(bus: &MessageBus, tab: TabId) -> Result<()> {
//!     let response = bus.send_tab_message(tab, Request::new(ActionKind::GetPageInfo)).await?;
//!     let payload = response.into_result()?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Bus | [`Error::NoReceiver`], [`Error::RequestTimeout`], [`Error::Protocol`], [`Error::UnknownAction`] |
//! | Extraction | [`Error::InvalidSelector`], [`Error::Dom`] |
//! | Platform | [`Error::Platform`] |
//! | Remote API | [`Error::Http`], [`Error::Auth`], [`Error::InvalidArgument`] |
//! | External | [`Error::Json`], [`Error::Url`], [`Error::Base64`], [`Error::ChannelClosed`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;
use tokio::sync::oneshot::error::RecvError;

use crate::identifiers::{RequestId, TabId};
use crate::platform::PlatformError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when [`RelayOptions`](crate::RelayOptions) fail validation.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Bus Errors
    // ========================================================================
    /// No context is listening on the addressed channel.
    #[error(
        "Could not establish connection. Receiving end does not exist.{}",
        target_suffix(.tab_id)
    )]
    NoReceiver {
        /// Addressed tab, `None` for the runtime (background) channel.
        tab_id: Option<TabId>,
    },

    /// A bus request was not answered in time.
    #[error("Request {request_id} ({action}) timed out after {timeout_ms}ms")]
    RequestTimeout {
        /// The request that timed out.
        request_id: RequestId,
        /// Action name of the request.
        action: String,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// Action string outside the recognised set.
    #[error("Unknown action: {action}")]
    UnknownAction {
        /// The unrecognised action.
        action: String,
    },

    /// Protocol violation or unexpected response shape.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    // ========================================================================
    // Extraction Errors
    // ========================================================================
    /// Selector string could not be parsed.
    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector {
        /// The offending selector.
        selector: String,
        /// What went wrong.
        reason: String,
    },

    /// Document access failed.
    #[error("Document error: {message}")]
    Dom {
        /// Description of the failure.
        message: String,
    },

    // ========================================================================
    // Platform Errors
    // ========================================================================
    /// A platform capability reported a failure.
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    // ========================================================================
    // Remote API Errors
    // ========================================================================
    /// Request to the remote API failed at the transport level.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote API rejected the credentials or session.
    ///
    /// Displays the backend's message unchanged.
    #[error("{message}")]
    Auth {
        /// Message reported by the backend.
        message: String,
    },

    /// Invalid caller-supplied argument.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parse error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Base64 decode error.
    #[error("Base64 error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Channel receive error.
    #[error("Channel closed")]
    ChannelClosed(#[from] RecvError),
}

fn target_suffix(tab_id: &Option<TabId>) -> String {
    tab_id.map(|id| format!(" (tab {id})")).unwrap_or_default()
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a no-receiver error for the runtime channel.
    #[inline]
    pub fn no_runtime_receiver() -> Self {
        Self::NoReceiver { tab_id: None }
    }

    /// Creates a no-receiver error for a tab channel.
    #[inline]
    pub fn no_tab_receiver(tab_id: TabId) -> Self {
        Self::NoReceiver {
            tab_id: Some(tab_id),
        }
    }

    /// Creates a request timeout error.
    #[inline]
    pub fn request_timeout(
        request_id: RequestId,
        action: impl Into<String>,
        timeout_ms: u64,
    ) -> Self {
        Self::RequestTimeout {
            request_id,
            action: action.into(),
            timeout_ms,
        }
    }

    /// Creates an unknown action error.
    #[inline]
    pub fn unknown_action(action: impl Into<String>) -> Self {
        Self::UnknownAction {
            action: action.into(),
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates an invalid selector error.
    #[inline]
    pub fn invalid_selector(selector: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSelector {
            selector: selector.into(),
            reason: reason.into(),
        }
    }

    /// Creates a document error.
    #[inline]
    pub fn dom(message: impl Into<String>) -> Self {
        Self::Dom {
            message: message.into(),
        }
    }

    /// Creates an authentication error.
    #[inline]
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::RequestTimeout { .. } => true,
            Self::Http(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// Returns `true` if this error came from the message bus.
    #[inline]
    #[must_use]
    pub fn is_bus_error(&self) -> bool {
        matches!(
            self,
            Self::NoReceiver { .. }
                | Self::RequestTimeout { .. }
                | Self::Protocol { .. }
                | Self::ChannelClosed(_)
        )
    }

    /// Returns `true` if this error may succeed on retry.
    ///
    /// A missing receiver usually means the content script has not loaded yet.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::NoReceiver { .. } | Self::RequestTimeout { .. } => true,
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
