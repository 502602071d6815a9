//! Browser platform capabilities.
//!
//! The relay never talks to a browser directly. Tab queries, screen capture,
//! script injection and identity tokens go through the [`TabsApi`] and
//! [`IdentityApi`] traits, which every embedding implements.
//! [`SimulatedBrowser`] is an in-process implementation backed by
//! [`Document`] snapshots.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `simulated` | In-memory tabs, capture and identity |

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use thiserror::Error;

use crate::dom::Document;
use crate::identifiers::{TabId, WindowId};
use crate::protocol::{InjectedPage, TabDescriptor};

// ============================================================================
// Submodules
// ============================================================================

mod simulated;

// ============================================================================
// Re-exports
// ============================================================================

pub use simulated::{SharedDocument, SimulatedBrowser};

// ============================================================================
// PlatformError
// ============================================================================

/// Failure reported by a platform capability.
///
/// Displays as the platform's own message so it can be forwarded to callers
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct PlatformError {
    message: String,
}

impl PlatformError {
    /// Creates a platform error.
    #[inline]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the platform message.
    #[inline]
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Result of every platform call.
pub type PlatformResult<T> = Result<T, PlatformError>;

// ============================================================================
// Capture Options
// ============================================================================

/// Encoding of a captured screenshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImageFormat {
    /// Lossless PNG.
    #[default]
    Png,
    /// JPEG; honours [`CaptureOptions::quality`].
    Jpeg,
}

impl ImageFormat {
    /// MIME type of the encoded image.
    #[inline]
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }
}

/// Visible-tab capture parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureOptions {
    /// Image encoding.
    pub format: ImageFormat,
    /// Quality 0-100.
    pub quality: u8,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            format: ImageFormat::Png,
            quality: 90,
        }
    }
}

// ============================================================================
// Capability Traits
// ============================================================================

/// Extraction function injected into a tab.
pub type InjectedFn = fn(&Document) -> InjectedPage;

/// Tab capabilities.
#[async_trait]
pub trait TabsApi: Send + Sync {
    /// Active tab of the current window, if any.
    async fn query_active_tab(&self) -> PlatformResult<Option<TabDescriptor>>;

    /// Captures the visible area of a window as a data URI.
    ///
    /// `None` targets the current window. `Ok(None)` means the platform
    /// returned no image data.
    async fn capture_visible_tab(
        &self,
        window: Option<WindowId>,
        options: CaptureOptions,
    ) -> PlatformResult<Option<String>>;

    /// Runs `function` against the document of `tab`, one result per frame.
    async fn execute_script(
        &self,
        tab: TabId,
        function: InjectedFn,
    ) -> PlatformResult<Vec<InjectedPage>>;
}

/// Identity capabilities.
#[async_trait]
pub trait IdentityApi: Send + Sync {
    /// OAuth token for `scopes`. `Ok(None)` means the user granted nothing.
    async fn get_auth_token(
        &self,
        interactive: bool,
        scopes: &[&str],
    ) -> PlatformResult<Option<String>>;

    /// Drops every cached token.
    async fn clear_all_cached_auth_tokens(&self) -> PlatformResult<()>;
}

// ============================================================================
// Tests
// ============================================================================
