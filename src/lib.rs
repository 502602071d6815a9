//! Page Relay - message relay and page extraction for a chat assistant extension.
//!
//! A browser extension runs code in three isolated contexts that only talk
//! through message passing. This crate models those contexts and the bus
//! between them, and implements the page-reading operations they perform.
//!
//! # Architecture
//!
//! - **Popup**: user commands, a chat transcript, calls to the chatbot backend
//! - **Background**: owns privileged APIs (tab queries, capture, injection)
//! - **Content script**: one per tab, reads and prunes its own document
//!
//! Every request names an action and gets exactly one response, either a
//! `{"success": true, ...}` payload or a `{"success": false, "error": ...}`
//! failure. Unknown actions are rejected with `{"error": "Unknown action"}`.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use page_relay::{
//!     ActionKind, Background, ContentScript, MessageBus, MessageSender, ContextKind,
//!     RelayOptions, Request, Result, SimulatedBrowser, dom::Document,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let options = RelayOptions::new();
//!     let browser = SimulatedBrowser::new();
//!     let bus = MessageBus::new(&options);
//!     Background::new(Arc::new(browser.clone()), bus.clone(), options.capture).start();
//!
//!     let tab = browser.open_tab(Document::from_json(PAGE_JSON)?);
//!     let document = browser.document(tab).expect("tab is open");
//!     ContentScript::new(tab, document, bus.clone()).start();
//!
//!     let response = bus
//!         .send_tab_message(
//!             MessageSender::new(ContextKind::Popup),
//!             tab,
//!             Request::new(ActionKind::GetPageContent),
//!         )
//!         .await?;
//!     println!("{}", response.to_value()?);
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`api`] | Chatbot backend client: prompts, image upload, sign-in |
//! | [`bus`] | [`MessageBus`], [`Router`], [`Responder`] |
//! | [`config`] | [`RelayOptions`] and defaults |
//! | [`context`] | [`Popup`], [`Background`], [`ContentScript`] |
//! | [`dom`] | Snapshot [`Document`] with CSS selectors and text rendering |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`extract`] | Page content, links, page info, injected summary |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`platform`] | [`TabsApi`] and [`IdentityApi`] seams, [`SimulatedBrowser`] |
//! | [`protocol`] | Action names, requests, responses, payloads |

// ============================================================================
// Modules
// ============================================================================

/// Chatbot backend client.
///
/// Cookie-based sessions; see [`ApiClient`].
pub mod api;

/// Cross-context message bus.
///
/// Routes runtime messages to the background and tab messages to content
/// scripts, with per-request timeouts and a pending-request cap.
pub mod bus;

/// Relay configuration.
pub mod config;

/// Popup, background and content-script contexts.
pub mod context;

/// Document snapshots.
///
/// Content scripts post their page as a node tree; [`Document`] answers
/// selector queries and renders `innerText`/`textContent` over it.
pub mod dom;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Page extraction operations.
pub mod extract;

/// Type-safe identifiers.
pub mod identifiers;

/// Browser platform seams.
pub mod platform;

/// Message protocol types.
pub mod protocol;

// ============================================================================
// Re-exports
// ============================================================================

// API client
pub use api::ApiClient;

// Bus types
pub use bus::{ChannelState, ContextKind, MessageBus, MessageSender, Responder, Router};

// Configuration
pub use config::RelayOptions;

// Contexts
pub use context::{Background, ChatMessage, ContentScript, Popup, Role};

// Document types
pub use dom::{Document, Selector};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{RequestId, TabId, WindowId};

// Platform types
pub use platform::{IdentityApi, PlatformError, SimulatedBrowser, TabsApi};

// Protocol types
pub use protocol::{ActionKind, Payload, Request, Response};
