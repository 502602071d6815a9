//! Request and Response message types.
//!
//! Defines the message format exchanged between the popup, the content
//! script and the background relay.

// ============================================================================
// Imports
// ============================================================================

use serde::de::Error as DeError;
use serde::ser::Error as SerError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

use super::{ActionKind, Payload};

// ============================================================================
// Constants
// ============================================================================

/// Error text of the rejection sent for unrecognised actions.
pub const UNKNOWN_ACTION: &str = "Unknown action";

// ============================================================================
// Request
// ============================================================================

/// A request sent over the message bus.
///
/// # Format
///
/// ```json
/// { "action": "getPageInfo", "payload": { ... } }
/// ```
///
/// The action is kept as its raw string so that unrecognised actions reach
/// the router and are rejected there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Action name.
    pub action: String,

    /// Optional action arguments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl Request {
    /// Creates a request for a recognised action.
    #[inline]
    #[must_use]
    pub fn new(action: ActionKind) -> Self {
        Self {
            action: action.as_str().to_string(),
            payload: None,
        }
    }

    /// Creates a request with an arbitrary action string.
    #[inline]
    #[must_use]
    pub fn raw(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            payload: None,
        }
    }

    /// Attaches a payload.
    #[inline]
    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Returns the recognised action, or `None` if unrecognised.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> Option<ActionKind> {
        self.action.parse().ok()
    }
}

// ============================================================================
// Failure
// ============================================================================

/// Failure variant of a [`Response`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    /// Human-readable error.
    pub error: String,

    /// Best-effort fallback content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

// ============================================================================
// Response
// ============================================================================

/// A response delivered to the requester.
///
/// # Format
///
/// Success:
/// ```json
/// { "success": true, "pageInfo": { ... } }
/// ```
///
/// Failure:
/// ```json
/// { "success": false, "error": "No active tab found" }
/// ```
///
/// Rejected (unrecognised action):
/// ```json
/// { "error": "Unknown action" }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// The operation succeeded.
    Success(Payload),
    /// The operation failed inside its handler.
    Failure(Failure),
    /// The request was refused before any handler ran.
    Rejected {
        /// Rejection reason.
        error: String,
    },
}

impl Response {
    /// Creates a success response.
    #[inline]
    #[must_use]
    pub fn success(payload: Payload) -> Self {
        Self::Success(payload)
    }

    /// Creates a failure response.
    #[inline]
    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure(Failure {
            error: error.into(),
            content: None,
        })
    }

    /// Creates a failure response carrying fallback content.
    #[inline]
    #[must_use]
    pub fn failure_with_content(error: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Failure(Failure {
            error: error.into(),
            content: Some(content.into()),
        })
    }

    /// Creates a failure response from a crate error.
    ///
    /// Platform errors carry the platform's message unchanged.
    #[must_use]
    pub fn from_error(error: &Error) -> Self {
        match error {
            Error::Platform(e) => Self::failure(e.message()),
            other => Self::failure(other.to_string()),
        }
    }

    /// Creates the unknown-action rejection.
    #[inline]
    #[must_use]
    pub fn unknown_action() -> Self {
        Self::Rejected {
            error: UNKNOWN_ACTION.to_string(),
        }
    }

    /// Returns `true` if this is a success response.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns the error text of a failure or rejection.
    #[inline]
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(&failure.error),
            Self::Rejected { error } => Some(error),
        }
    }

    /// Extracts the payload, returning error if the response was not a success.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownAction`] for a rejection
    /// - [`Error::Protocol`] for a failure
    pub fn into_result(self) -> Result<Payload> {
        match self {
            Self::Success(payload) => Ok(payload),
            Self::Failure(failure) => Err(Error::protocol(failure.error)),
            Self::Rejected { error } => Err(Error::unknown_action(error)),
        }
    }

    /// Converts to the JSON wire shape.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the payload is not representable.
    pub fn to_value(&self) -> Result<Value> {
        let value = match self {
            Self::Success(payload) => {
                let mut map = match serde_json::to_value(payload)? {
                    Value::Object(map) => map,
                    other => {
                        return Err(Error::protocol(format!(
                            "payload serialized to non-object: {other}"
                        )));
                    }
                };
                map.insert("success".to_string(), Value::Bool(true));
                Value::Object(map)
            }
            Self::Failure(failure) => {
                let mut map = Map::new();
                map.insert("success".to_string(), Value::Bool(false));
                map.insert("error".to_string(), Value::String(failure.error.clone()));
                if let Some(content) = &failure.content {
                    map.insert("content".to_string(), Value::String(content.clone()));
                }
                Value::Object(map)
            }
            Self::Rejected { error } => {
                let mut map = Map::new();
                map.insert("error".to_string(), Value::String(error.clone()));
                Value::Object(map)
            }
        };
        Ok(value)
    }
}

impl Serialize for Response {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_value()
            .map_err(S::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Response {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let mut map = Map::<String, Value>::deserialize(deserializer)?;

        match map.remove("success") {
            Some(Value::Bool(true)) => Payload::deserialize(Value::Object(map))
                .map(Self::Success)
                .map_err(D::Error::custom),
            Some(Value::Bool(false)) => Failure::deserialize(Value::Object(map))
                .map(Self::Failure)
                .map_err(D::Error::custom),
            None => match map.remove("error") {
                Some(Value::String(error)) => Ok(Self::Rejected { error }),
                _ => Err(D::Error::custom("response has neither `success` nor `error`")),
            },
            Some(other) => Err(D::Error::custom(format!(
                "`success` must be a boolean, got {other}"
            ))),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
