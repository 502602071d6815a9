//! Document snapshots.
//!
//! Content-script handlers never touch ambient page state; they receive a
//! [`Document`] and read (or, for pruning, mutate) it explicitly.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `document` | Arena-backed [`Document`] and [`DocumentSnapshot`] |
//! | `node` | [`Element`]/[`Node`] trees used to build documents |
//! | `selector` | Compound CSS [`Selector`] lists |
//! | `text` | `innerText` / `textContent` rendering |

// ============================================================================
// Submodules
// ============================================================================

mod document;
mod node;
mod selector;
mod text;

// ============================================================================
// Re-exports
// ============================================================================

pub use document::{Document, DocumentSnapshot, ElementData, NodeId};
pub use node::{Element, Node};
pub use selector::Selector;
