//! In-process browser backed by document snapshots.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::dom::Document;
use crate::identifiers::{TabId, WindowId};
use crate::protocol::{DataUri, InjectedPage, TabDescriptor, TabStatus};

use super::{CaptureOptions, IdentityApi, InjectedFn, PlatformError, PlatformResult, TabsApi};

// ============================================================================
// Types
// ============================================================================

/// Document shared between a tab's content script and injected scripts.
pub type SharedDocument = Arc<Mutex<Document>>;

/// Bytes served by default captures: a PNG signature.
const PLACEHOLDER_IMAGE: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// What the next visible-tab capture returns.
#[derive(Debug, Clone)]
enum CaptureBehavior {
    Image(Vec<u8>),
    Empty,
    Fail(String),
}

struct SimulatedTab {
    descriptor: TabDescriptor,
    document: SharedDocument,
}

struct BrowserState {
    next_tab_id: u32,
    window: WindowId,
    tabs: FxHashMap<TabId, SimulatedTab>,
    active: Option<TabId>,
    capture: CaptureBehavior,
    identity: PlatformResult<Option<String>>,
    token_clears: usize,
}

// ============================================================================
// SimulatedBrowser
// ============================================================================

/// A single-window browser held in memory.
///
/// Cloning shares state, so tests can keep a handle while the relay owns
/// another.
#[derive(Clone)]
pub struct SimulatedBrowser {
    inner: Arc<RwLock<BrowserState>>,
}

impl Default for SimulatedBrowser {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedBrowser {
    /// Creates a browser with one empty window.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(BrowserState {
                next_tab_id: 1,
                window: WindowId::new(1),
                tabs: FxHashMap::default(),
                active: None,
                capture: CaptureBehavior::Image(PLACEHOLDER_IMAGE.to_vec()),
                identity: Ok(None),
                token_clears: 0,
            })),
        }
    }

    /// Opens a loaded tab showing `document` and makes it active.
    pub fn open_tab(&self, document: Document) -> TabId {
        let mut state = self.inner.write();
        let id = TabId::new(state.next_tab_id).unwrap_or(TabId::MIN);
        state.next_tab_id += 1;

        let descriptor = TabDescriptor {
            id,
            url: document.location().to_string(),
            title: document.title(),
            fav_icon_url: None,
            status: Some(TabStatus::Complete),
        };
        state.tabs.insert(
            id,
            SimulatedTab {
                descriptor,
                document: Arc::new(Mutex::new(document)),
            },
        );
        state.active = Some(id);

        debug!(tab_id = %id, "Tab opened");
        id
    }

    /// Closes `tab`. Closing the active tab leaves no tab active.
    pub fn close_tab(&self, tab: TabId) -> bool {
        let mut state = self.inner.write();
        if state.active == Some(tab) {
            state.active = None;
        }
        state.tabs.remove(&tab).is_some()
    }

    /// Makes `tab` active. Returns `false` for unknown tabs.
    pub fn activate(&self, tab: TabId) -> bool {
        let mut state = self.inner.write();
        if state.tabs.contains_key(&tab) {
            state.active = Some(tab);
            true
        } else {
            false
        }
    }

    /// Shared document of `tab`.
    #[must_use]
    pub fn document(&self, tab: TabId) -> Option<SharedDocument> {
        self.inner
            .read()
            .tabs
            .get(&tab)
            .map(|t| Arc::clone(&t.document))
    }

    /// The window every tab lives in.
    #[must_use]
    pub fn window(&self) -> WindowId {
        self.inner.read().window
    }

    /// Captures return `bytes`.
    pub fn set_capture_image(&self, bytes: impl Into<Vec<u8>>) {
        self.inner.write().capture = CaptureBehavior::Image(bytes.into());
    }

    /// Captures succeed without image data.
    pub fn set_capture_empty(&self) {
        self.inner.write().capture = CaptureBehavior::Empty;
    }

    /// Captures fail with `message`.
    pub fn set_capture_error(&self, message: impl Into<String>) {
        self.inner.write().capture = CaptureBehavior::Fail(message.into());
    }

    /// Token returned by [`IdentityApi::get_auth_token`].
    pub fn set_identity_token(&self, token: Option<String>) {
        self.inner.write().identity = Ok(token);
    }

    /// Identity requests fail with `message`.
    pub fn set_identity_error(&self, message: impl Into<String>) {
        self.inner.write().identity = Err(PlatformError::new(message));
    }

    /// Number of times cached tokens were cleared.
    #[must_use]
    pub fn token_clears(&self) -> usize {
        self.inner.read().token_clears
    }
}

// ============================================================================
// Capabilities
// ============================================================================

#[async_trait]
impl TabsApi for SimulatedBrowser {
    async fn query_active_tab(&self) -> PlatformResult<Option<TabDescriptor>> {
        let state = self.inner.read();
        Ok(state
            .active
            .and_then(|id| state.tabs.get(&id))
            .map(|tab| tab.descriptor.clone()))
    }

    async fn capture_visible_tab(
        &self,
        window: Option<WindowId>,
        options: CaptureOptions,
    ) -> PlatformResult<Option<String>> {
        let state = self.inner.read();
        if let Some(window) = window
            && window != state.window
        {
            return Err(PlatformError::new(format!("No window with id: {window}.")));
        }
        if state.active.is_none() {
            return Err(PlatformError::new("No active tab"));
        }

        match &state.capture {
            CaptureBehavior::Image(bytes) => {
                Ok(Some(DataUri::encode(options.format.mime_type(), bytes)))
            }
            CaptureBehavior::Empty => Ok(None),
            CaptureBehavior::Fail(message) => Err(PlatformError::new(message.clone())),
        }
    }

    async fn execute_script(
        &self,
        tab: TabId,
        function: InjectedFn,
    ) -> PlatformResult<Vec<InjectedPage>> {
        let document = self
            .document(tab)
            .ok_or_else(|| PlatformError::new(format!("No tab with id: {tab}.")))?;
        let result = function(&document.lock());
        Ok(vec![result])
    }
}

#[async_trait]
impl IdentityApi for SimulatedBrowser {
    async fn get_auth_token(
        &self,
        _interactive: bool,
        _scopes: &[&str],
    ) -> PlatformResult<Option<String>> {
        self.inner.read().identity.clone()
    }

    async fn clear_all_cached_auth_tokens(&self) -> PlatformResult<()> {
        self.inner.write().token_clears += 1;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
