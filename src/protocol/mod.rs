//! Message types for the cross-context bus.
//!
//! This module defines the format of messages exchanged between the popup,
//! the content script and the background relay.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `Request` | Sender → Context | `{action, payload?}` |
//! | `Response` | Context → Sender | Success, failure or rejection |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `action` | Recognised action names |
//! | `payload` | Success payload records |
//! | `request` | Request and Response types |

// ============================================================================
// Submodules
// ============================================================================

/// Recognised action names.
pub mod action;

/// Success payload records.
pub mod payload;

/// Request and Response message types.
pub mod request;

// ============================================================================
// Re-exports
// ============================================================================

pub use action::ActionKind;
pub use payload::{
    DataUri, DivText, ExtractedLink, HeadingCounts, InjectedPage, LinkReport, PageContent,
    PageInfo, PageMetadata, Payload, TabDescriptor, TabStatus,
};
pub use request::{Failure, Request, Response, UNKNOWN_ACTION};
