//! Background context: privileged tab operations.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::bus::{Handler, MessageBus, MessageSender, Router};
use crate::error::Result;
use crate::extract::extract_injected;
use crate::platform::{CaptureOptions, TabsApi};
use crate::protocol::{ActionKind, Payload, Request, Response};

// ============================================================================
// Constants
// ============================================================================

const NO_SCREENSHOT_DATA: &str = "No screenshot data received";
const NO_ACTIVE_TAB: &str = "No active tab found";
const NO_TARGET_TAB: &str = "No target tab for content extraction";
const EXTRACTION_FAILED: &str = "Failed to extract page content";

// ============================================================================
// Background
// ============================================================================

/// The background relay.
///
/// Handles `captureScreen`, `getTabInfo` and `getPageContent` through a
/// [`TabsApi`]. Each call is single-shot with no retry.
#[derive(Clone)]
pub struct Background {
    tabs: Arc<dyn TabsApi>,
    bus: MessageBus,
    capture: CaptureOptions,
}

impl Background {
    /// Creates the background relay.
    #[must_use]
    pub fn new(tabs: Arc<dyn TabsApi>, bus: MessageBus, capture: CaptureOptions) -> Self {
        Self { tabs, bus, capture }
    }

    /// Router with every background handler registered.
    #[must_use]
    pub fn router(&self) -> Router {
        Router::new()
            .with_handler(
                ActionKind::CaptureScreen,
                CaptureHandler {
                    tabs: Arc::clone(&self.tabs),
                    options: self.capture,
                },
            )
            .with_handler(
                ActionKind::GetTabInfo,
                TabInfoHandler(Arc::clone(&self.tabs)),
            )
            .with_handler(
                ActionKind::GetPageContent,
                InjectionHandler(Arc::clone(&self.tabs)),
            )
    }

    /// Attaches to the bus as the runtime endpoint and serves requests.
    pub fn start(self) -> JoinHandle<()> {
        info!("Background relay ready");
        let inbox = self.bus.attach_background();
        self.router().serve(inbox)
    }
}

// ============================================================================
// Handlers
// ============================================================================

struct CaptureHandler {
    tabs: Arc<dyn TabsApi>,
    options: CaptureOptions,
}

#[async_trait]
impl Handler for CaptureHandler {
    async fn handle(&self, _request: Request, _sender: MessageSender) -> Result<Response> {
        debug!(quality = self.options.quality, "Capturing visible tab");
        Ok(match self.tabs.capture_visible_tab(None, self.options).await {
            Ok(Some(image)) if !image.is_empty() => {
                debug!(bytes = image.len(), "Screenshot captured");
                Response::success(Payload::Screenshot { image })
            }
            Ok(_) => {
                error!("No screenshot data received");
                Response::failure(NO_SCREENSHOT_DATA)
            }
            Err(e) => {
                error!(error = %e, "Screenshot capture failed");
                Response::failure(e.message())
            }
        })
    }
}

struct TabInfoHandler(Arc<dyn TabsApi>);

#[async_trait]
impl Handler for TabInfoHandler {
    async fn handle(&self, _request: Request, _sender: MessageSender) -> Result<Response> {
        Ok(match self.0.query_active_tab().await? {
            Some(tab) => {
                debug!(tab_id = %tab.id, title = %tab.title, "Tab info retrieved");
                Response::success(Payload::Tab { tab })
            }
            None => Response::failure(NO_ACTIVE_TAB),
        })
    }
}

/// Injects [`extract_injected`] into the sender's tab.
struct InjectionHandler(Arc<dyn TabsApi>);

#[async_trait]
impl Handler for InjectionHandler {
    async fn handle(&self, _request: Request, sender: MessageSender) -> Result<Response> {
        let Some(tab) = sender.tab else {
            return Ok(Response::failure(NO_TARGET_TAB));
        };

        let results = self.0.execute_script(tab, extract_injected).await?;
        Ok(match results.into_iter().next() {
            Some(content) => {
                debug!(tab_id = %tab, "Page content extracted by injection");
                Response::success(Payload::Injected { content })
            }
            None => Response::failure(EXTRACTION_FAILED),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::bus::ContextKind;
    use crate::dom::{Document, Element};
    use crate::identifiers::{TabId, WindowId};
    use crate::platform::{InjectedFn, PlatformResult, SimulatedBrowser};
    use crate::protocol::{InjectedPage, TabDescriptor};

    fn page() -> Document {
        let root = Element::new("html").children([
            Element::new("head").child(Element::new("title").text("Shop")),
            Element::new("body").child(Element::new("h2").text("Deals")),
        ]);
        Document::new("https://shop.example/", root).expect("valid document")
    }

    fn start(browser: &SimulatedBrowser) -> MessageBus {
        let bus = MessageBus::default();
        Background::new(
            Arc::new(browser.clone()),
            bus.clone(),
            CaptureOptions::default(),
        )
        .start();
        bus
    }

    fn popup() -> MessageSender {
        MessageSender::new(ContextKind::Popup)
    }

    async fn ask(bus: &MessageBus, sender: MessageSender, action: ActionKind) -> serde_json::Value {
        bus.send_runtime_message(sender, Request::new(action))
            .await
            .expect("reply")
            .to_value()
            .expect("json")
    }

    #[tokio::test]
    async fn test_capture_success() {
        let browser = SimulatedBrowser::new();
        browser.open_tab(page());
        browser.set_capture_image(vec![0xFF]);
        let bus = start(&browser);

        let reply = ask(&bus, popup(), ActionKind::CaptureScreen).await;
        assert_eq!(
            reply,
            json!({"success": true, "image": "data:image/png;base64,/w=="})
        );
    }

    #[tokio::test]
    async fn test_capture_without_active_tab() {
        let bus = start(&SimulatedBrowser::new());
        let reply = ask(&bus, popup(), ActionKind::CaptureScreen).await;
        assert_eq!(reply, json!({"success": false, "error": "No active tab"}));
    }

    #[tokio::test]
    async fn test_capture_empty() {
        let browser = SimulatedBrowser::new();
        browser.open_tab(page());
        browser.set_capture_empty();
        let bus = start(&browser);

        let reply = ask(&bus, popup(), ActionKind::CaptureScreen).await;
        assert_eq!(reply["error"], json!("No screenshot data received"));
    }

    #[tokio::test]
    async fn test_tab_info() {
        let browser = SimulatedBrowser::new();
        let bus = start(&browser);
        let reply = ask(&bus, popup(), ActionKind::GetTabInfo).await;
        assert_eq!(
            reply,
            json!({"success": false, "error": "No active tab found"})
        );

        let tab = browser.open_tab(page());
        let reply = ask(&bus, popup(), ActionKind::GetTabInfo).await;
        assert_eq!(reply["success"], json!(true));
        assert_eq!(reply["tab"]["id"], json!(tab.as_u32()));
        assert_eq!(reply["tab"]["title"], json!("Shop"));
        assert_eq!(reply["tab"]["status"], json!("complete"));
    }

    #[tokio::test]
    async fn test_injected_content_uses_sender_tab() {
        let browser = SimulatedBrowser::new();
        let tab = browser.open_tab(page());
        let bus = start(&browser);

        let reply = ask(
            &bus,
            MessageSender::content_script(tab),
            ActionKind::GetPageContent,
        )
        .await;
        assert_eq!(reply["success"], json!(true));
        assert_eq!(reply["content"]["headings"], json!(["Deals"]));

        let reply = ask(&bus, popup(), ActionKind::GetPageContent).await;
        assert_eq!(
            reply["error"],
            json!("No target tab for content extraction")
        );

        let gone = TabId::new(42).expect("non-zero");
        let reply = ask(
            &bus,
            MessageSender::content_script(gone),
            ActionKind::GetPageContent,
        )
        .await;
        assert_eq!(reply["error"], json!("No tab with id: 42."));
    }

    struct NoFrames;

    #[async_trait]
    impl TabsApi for NoFrames {
        async fn query_active_tab(&self) -> PlatformResult<Option<TabDescriptor>> {
            Ok(None)
        }

        async fn capture_visible_tab(
            &self,
            _window: Option<WindowId>,
            _options: CaptureOptions,
        ) -> PlatformResult<Option<String>> {
            Ok(Some(String::new()))
        }

        async fn execute_script(
            &self,
            _tab: TabId,
            _function: InjectedFn,
        ) -> PlatformResult<Vec<InjectedPage>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_empty_platform_results() {
        let bus = MessageBus::default();
        Background::new(Arc::new(NoFrames), bus.clone(), CaptureOptions::default()).start();

        let tab = TabId::new(1).expect("non-zero");
        let reply = ask(
            &bus,
            MessageSender::content_script(tab),
            ActionKind::GetPageContent,
        )
        .await;
        assert_eq!(reply["error"], json!("Failed to extract page content"));

        let reply = ask(&bus, popup(), ActionKind::CaptureScreen).await;
        assert_eq!(reply["error"], json!("No screenshot data received"));
    }

    #[tokio::test]
    async fn test_content_only_action_rejected() {
        let bus = start(&SimulatedBrowser::new());
        let reply = ask(&bus, popup(), ActionKind::ExtractLinks).await;
        assert_eq!(reply, json!({"error": "Unknown action"}));
    }
}
