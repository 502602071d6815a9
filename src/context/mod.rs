//! Execution contexts.
//!
//! Each context owns its own [`Router`](crate::bus::Router) and talks to the
//! others only through the [`MessageBus`](crate::bus::MessageBus).
//!
//! # Modules
//!
//! | Module | Actions handled |
//! |--------|-----------------|
//! | `background` | `captureScreen`, `getTabInfo`, `getPageContent` (injected) |
//! | `content` | `getPageContent`, `extractLinks`, `getPageInfo`, `getDivText`, `captureScreen` (relay) |
//! | `popup` | none; sends requests on user commands |

// ============================================================================
// Submodules
// ============================================================================

mod background;
mod content;
mod popup;

// ============================================================================
// Re-exports
// ============================================================================

pub use background::Background;
pub use content::ContentScript;
pub use popup::{ChatMessage, Popup, Role};
