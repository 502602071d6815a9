//! Popup context: chat transcript and page tools.
//!
//! Every command appends to the transcript and never fails outright; bus,
//! platform and network errors become bot messages.

// ============================================================================
// Imports
// ============================================================================

use std::fmt::Write as _;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api::ApiClient;
use crate::bus::{ContextKind, MessageBus, MessageSender};
use crate::identifiers::TabId;
use crate::platform::TabsApi;
use crate::protocol::{
    ActionKind, DataUri, LinkReport, PageContent, PageInfo, Payload, Request, Response,
};

// ============================================================================
// Messages
// ============================================================================

const PROMPT_FAILED: &str = "Sorry, I couldn't process your request. Please try again.";

const SUMMARIZING: &str = "Summarizing current page...";
const SUMMARY_UNREACHABLE: &str =
    "Could not access page content. Please refresh the page and try again.";
const SUMMARY_NO_CONTENT: &str = "Could not extract page content.";
const SUMMARY_FAILED: &str = "Sorry, I couldn't generate a summary. Please try again.";
const SUMMARY_ERROR: &str = "Error summarizing page. Please try again.";

const EXTRACTING_LINKS: &str = "Extracting links from page...";
const PAGE_UNREACHABLE: &str = "Could not access page. Please refresh and try again.";
const LINKS_FAILED: &str = "Could not extract links from page.";
const LINKS_ERROR: &str = "Error extracting links. Please try again.";

const GETTING_INFO: &str = "Getting page information...";
const INFO_FAILED: &str = "Could not get page information.";
const INFO_ERROR: &str = "Error getting page information. Please try again.";

const SCREENSHOT_TAKEN: &str = "📷 Screenshot taken";
const SCREENSHOT_FAILED: &str = "Sorry, couldn't capture screenshot. Please try again.";
const SCREENSHOT_NO_DESCRIPTION: &str =
    "Sorry, I couldn't analyze the screenshot. Please try again.";
const SCREENSHOT_ERROR: &str = "Sorry, something went wrong analyzing the screenshot.";

const UPLOAD_NO_DESCRIPTION: &str = "Sorry, I couldn't analyze the image. Please try again.";
const UPLOAD_ERROR: &str = "Sorry, something went wrong analyzing the image.";

const SCREENSHOT_FILE_NAME: &str = "screenshot.png";

/// Domains listed in a link summary.
const MAX_LISTED_DOMAINS: usize = 10;

// ============================================================================
// Transcript
// ============================================================================

/// Author of a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Typed or triggered by the user.
    User,
    /// Produced by the assistant or the tools.
    Bot,
}

/// One transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who wrote the entry.
    pub role: Role,
    /// Entry text.
    pub text: String,
}

// ============================================================================
// Popup
// ============================================================================

/// The popup controller.
pub struct Popup {
    bus: MessageBus,
    tabs: Arc<dyn TabsApi>,
    api: ApiClient,
    transcript: Vec<ChatMessage>,
}

impl Popup {
    /// Creates a popup with an empty transcript.
    #[must_use]
    pub fn new(bus: MessageBus, tabs: Arc<dyn TabsApi>, api: ApiClient) -> Self {
        Self {
            bus,
            tabs,
            api,
            transcript: Vec::new(),
        }
    }

    /// Transcript, oldest first.
    #[inline]
    #[must_use]
    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    /// Most recent entry.
    #[inline]
    #[must_use]
    pub fn last_message(&self) -> Option<&ChatMessage> {
        self.transcript.last()
    }

    /// Backend client.
    #[inline]
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    fn push(&mut self, role: Role, text: impl Into<String>) {
        self.transcript.push(ChatMessage {
            role,
            text: text.into(),
        });
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Sends a chat prompt. Blank input is ignored.
    pub async fn send_prompt(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        self.push(Role::User, text);

        let reply = self.ask_chatbot(text).await;
        self.push(Role::Bot, reply.as_deref().unwrap_or(PROMPT_FAILED));
    }

    /// Summarizes the active tab through the chatbot.
    pub async fn summarize_page(&mut self) {
        let Some(tab) = self.announce(SUMMARIZING, SUMMARY_ERROR).await else {
            return;
        };

        let reply = match self.send_to_tab(tab, ActionKind::GetPageContent).await {
            None => SUMMARY_UNREACHABLE.to_string(),
            Some(Response::Success(Payload::PageContent(page))) => self
                .ask_chatbot(&summary_prompt(&page))
                .await
                .unwrap_or_else(|| SUMMARY_FAILED.to_string()),
            Some(_) => SUMMARY_NO_CONTENT.to_string(),
        };
        self.push(Role::Bot, reply);
    }

    /// Lists the active tab's links by domain.
    pub async fn extract_links(&mut self) {
        let Some(tab) = self.announce(EXTRACTING_LINKS, LINKS_ERROR).await else {
            return;
        };

        let reply = match self.send_to_tab(tab, ActionKind::ExtractLinks).await {
            None => PAGE_UNREACHABLE.to_string(),
            Some(Response::Success(Payload::Links(report))) => render_links(&report),
            Some(_) => LINKS_FAILED.to_string(),
        };
        self.push(Role::Bot, reply);
    }

    /// Shows the active tab's page statistics.
    pub async fn page_info(&mut self) {
        let Some(tab) = self.announce(GETTING_INFO, INFO_ERROR).await else {
            return;
        };

        let reply = match self.send_to_tab(tab, ActionKind::GetPageInfo).await {
            None => PAGE_UNREACHABLE.to_string(),
            Some(Response::Success(Payload::PageInfo { page_info })) => {
                render_page_info(&page_info)
            }
            Some(_) => INFO_FAILED.to_string(),
        };
        self.push(Role::Bot, reply);
    }

    /// Captures the visible tab and asks the backend to describe it.
    pub async fn capture_and_describe(&mut self) {
        let Some(image) = self.capture().await else {
            self.push(Role::Bot, SCREENSHOT_FAILED);
            return;
        };
        self.push(Role::User, SCREENSHOT_TAKEN);

        let reply = match self
            .api
            .describe_image(SCREENSHOT_FILE_NAME, &image.mime_type, image.bytes)
            .await
        {
            Ok(Some(text)) => text,
            Ok(None) => SCREENSHOT_NO_DESCRIPTION.to_string(),
            Err(e) => {
                warn!(error = %e, "Screenshot analysis failed");
                SCREENSHOT_ERROR.to_string()
            }
        };
        self.push(Role::Bot, reply);
    }

    /// Uploads a user-chosen image and asks the backend to describe it.
    pub async fn describe_upload(&mut self, file_name: &str, bytes: Vec<u8>) {
        self.push(Role::User, format!("📎 Uploaded: {file_name}"));

        let reply = match self
            .api
            .describe_image(file_name, mime_for(file_name), bytes)
            .await
        {
            Ok(Some(text)) => text,
            Ok(None) => UPLOAD_NO_DESCRIPTION.to_string(),
            Err(e) => {
                warn!(error = %e, file_name, "Upload analysis failed");
                UPLOAD_ERROR.to_string()
            }
        };
        self.push(Role::Bot, reply);
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn sender() -> MessageSender {
        MessageSender::new(ContextKind::Popup)
    }

    /// Queries the active tab, then announces the command.
    ///
    /// A failed query reports `error` alone. A query with no tab still
    /// announces first, then reports `error`.
    async fn announce(&mut self, announce: &str, error: &str) -> Option<TabId> {
        let tab = match self.tabs.query_active_tab().await {
            Ok(tab) => tab,
            Err(e) => {
                warn!(error = %e, "Active tab query failed");
                self.push(Role::Bot, error);
                return None;
            }
        };
        self.push(Role::User, announce);

        if tab.is_none() {
            warn!("No active tab");
            self.push(Role::Bot, error);
        }
        tab.map(|tab| tab.id)
    }

    /// `None` when the tab could not be reached.
    async fn send_to_tab(&self, tab: TabId, action: ActionKind) -> Option<Response> {
        match self
            .bus
            .send_tab_message(Self::sender(), tab, Request::new(action))
            .await
        {
            Ok(response) => Some(response),
            Err(e) => {
                warn!(tab_id = %tab, %action, error = %e, "Tab unreachable");
                None
            }
        }
    }

    /// Chatbot reply, `None` on any failure or empty reply.
    async fn ask_chatbot(&self, prompt: &str) -> Option<String> {
        match self.api.prompt(prompt).await {
            Ok(text) => text.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(error = %e, "Chatbot request failed");
                None
            }
        }
    }

    async fn capture(&self) -> Option<DataUri> {
        let response = self
            .bus
            .send_runtime_message(Self::sender(), Request::new(ActionKind::CaptureScreen))
            .await;

        match response {
            Ok(Response::Success(Payload::Screenshot { image })) => match DataUri::parse(&image) {
                Ok(uri) => Some(uri),
                Err(e) => {
                    warn!(error = %e, "Screenshot is not a data URI");
                    None
                }
            },
            Ok(other) => {
                warn!(error = ?other.error_message(), "Screenshot capture failed");
                None
            }
            Err(e) => {
                warn!(error = %e, "Background unreachable");
                None
            }
        }
    }
}

// ============================================================================
// Rendering
// ============================================================================

fn summary_prompt(page: &PageContent) -> String {
    format!(
        "Please provide a comprehensive summary of this webpage:\n\n\
         Title: {}\nURL: {}\n\nContent:\n{}\n\n\
         Provide a clear, structured summary highlighting the main points.",
        page.metadata.title, page.metadata.url, page.content
    )
}

fn render_links(report: &LinkReport) -> String {
    let mut out = format!("**Found {} links on this page**\n\n", report.total_links);
    out.push_str("**Links by domain:**\n");
    for (domain, links) in report.links_by_domain.iter().take(MAX_LISTED_DOMAINS) {
        let count = links.len();
        let plural = if count > 1 { "s" } else { "" };
        let _ = writeln!(out, "* {domain}: {count} link{plural}");
    }
    if report.total_links > MAX_LISTED_DOMAINS {
        let _ = write!(
            out,
            "\n*Showing top {MAX_LISTED_DOMAINS} domains. Total: {} links found.*",
            report.total_links
        );
    }
    debug!(domains = report.links_by_domain.len(), "Rendered link summary");
    out
}

fn render_page_info(info: &PageInfo) -> String {
    let mut out = String::from("**Page Information**\n\n");
    let _ = writeln!(out, "**Title:** {}", info.title);
    let _ = writeln!(out, "**URL:** {}", info.url);
    let _ = writeln!(out, "**Domain:** {}", info.domain);
    let _ = writeln!(out, "**Language:** {}\n", info.language);
    out.push_str("**Content Stats:**\n");
    let _ = writeln!(out, "* Words: {}", info.word_count);
    let _ = writeln!(out, "* Links: {}", info.link_count);
    let _ = writeln!(out, "* Images: {}", info.image_count);
    let _ = writeln!(out, "* Videos: {}\n", info.video_count);
    out.push_str("**Headings:**\n");
    let _ = writeln!(
        out,
        "* H1: {}, H2: {}, H3: {}\n",
        info.headings.h1, info.headings.h2, info.headings.h3
    );
    if !info.description.is_empty() && info.description != "No description" {
        let _ = writeln!(out, "**Description:** {}", info.description);
    }
    out
}

/// MIME type guessed from a file extension.
fn mime_for(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::{Mock, MockServer, ResponseTemplate, matchers};

    use super::*;
    use crate::config::RelayOptions;
    use crate::context::{Background, ContentScript};
    use crate::dom::{Document, Element};
    use crate::identifiers::WindowId;
    use crate::platform::{
        CaptureOptions, InjectedFn, PlatformError, PlatformResult, SimulatedBrowser,
    };
    use crate::protocol::{ExtractedLink, InjectedPage, TabDescriptor};

    struct Harness {
        popup: Popup,
        browser: SimulatedBrowser,
        bus: MessageBus,
        server: MockServer,
    }

    async fn harness() -> Harness {
        let server = MockServer::start().await;
        let options = RelayOptions::new().with_api_base_url(server.uri());
        let browser = SimulatedBrowser::new();
        let bus = MessageBus::new(&options);
        Background::new(Arc::new(browser.clone()), bus.clone(), options.capture).start();

        let api = ApiClient::new(&options).expect("client");
        let popup = Popup::new(bus.clone(), Arc::new(browser.clone()), api);
        Harness {
            popup,
            browser,
            bus,
            server,
        }
    }

    fn blog() -> Document {
        let root = Element::new("html").attr("lang", "fr").children([
            Element::new("head").children([
                Element::new("title").text("Blog"),
                Element::new("meta")
                    .attr("name", "description")
                    .attr("content", "Thoughts"),
            ]),
            Element::new("body").child(Element::new("main").children([
                Element::new("h1").text("Hello"),
                Element::new("p").text("Short post"),
                Element::new("a")
                    .attr("href", "https://a.example/1")
                    .text("one"),
                Element::new("a")
                    .attr("href", "https://a.example/2")
                    .text("two"),
                Element::new("a")
                    .attr("href", "https://b.example/")
                    .text("three"),
            ])),
        ]);
        Document::new("https://blog.example/post", root).expect("valid document")
    }

    impl Harness {
        fn open_with_content_script(&self, document: Document) -> TabId {
            let tab = self.browser.open_tab(document);
            let shared = self.browser.document(tab).expect("document");
            ContentScript::new(tab, shared, self.bus.clone()).start();
            tab
        }

        fn texts(&self) -> Vec<(Role, &str)> {
            self.popup
                .transcript()
                .iter()
                .map(|m| (m.role, m.text.as_str()))
                .collect()
        }
    }

    #[tokio::test]
    async fn test_send_prompt() {
        let mut h = harness().await;
        Mock::given(matchers::path("/api/chatbot"))
            .and(matchers::body_json(json!({"prompt": "hi"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"text": "hello!"})))
            .mount(&h.server)
            .await;

        h.popup.send_prompt("   ").await;
        assert!(h.popup.transcript().is_empty());

        h.popup.send_prompt(" hi ").await;
        assert_eq!(h.texts(), [(Role::User, "hi"), (Role::Bot, "hello!")]);
    }

    #[tokio::test]
    async fn test_send_prompt_fallback() {
        let mut h = harness().await;
        Mock::given(matchers::path("/api/chatbot"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&h.server)
            .await;

        h.popup.send_prompt("hi").await;
        assert_eq!(
            h.popup.last_message().map(|m| m.text.as_str()),
            Some(PROMPT_FAILED)
        );
    }

    #[tokio::test]
    async fn test_summarize_page() {
        let mut h = harness().await;
        h.open_with_content_script(blog());
        Mock::given(matchers::path("/api/chatbot"))
            .and(matchers::body_string_contains("Title: Blog\\nURL: https://blog.example/post"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"text": "A post."})))
            .expect(1)
            .mount(&h.server)
            .await;

        h.popup.summarize_page().await;
        assert_eq!(
            h.texts(),
            [(Role::User, SUMMARIZING), (Role::Bot, "A post.")]
        );
    }

    #[tokio::test]
    async fn test_summarize_without_content_script() {
        let mut h = harness().await;
        h.browser.open_tab(blog());

        h.popup.summarize_page().await;
        assert_eq!(
            h.popup.last_message().map(|m| m.text.as_str()),
            Some(SUMMARY_UNREACHABLE)
        );
    }

    #[tokio::test]
    async fn test_commands_without_active_tab() {
        let mut h = harness().await;
        h.popup.summarize_page().await;
        h.popup.extract_links().await;
        h.popup.page_info().await;

        assert_eq!(
            h.texts(),
            [
                (Role::User, SUMMARIZING),
                (Role::Bot, SUMMARY_ERROR),
                (Role::User, EXTRACTING_LINKS),
                (Role::Bot, LINKS_ERROR),
                (Role::User, GETTING_INFO),
                (Role::Bot, INFO_ERROR),
            ]
        );
    }

    struct BrokenTabs;

    #[async_trait::async_trait]
    impl TabsApi for BrokenTabs {
        async fn query_active_tab(&self) -> PlatformResult<Option<TabDescriptor>> {
            Err(PlatformError::new("Tabs unavailable"))
        }

        async fn capture_visible_tab(
            &self,
            _window: Option<WindowId>,
            _options: CaptureOptions,
        ) -> PlatformResult<Option<String>> {
            Err(PlatformError::new("Tabs unavailable"))
        }

        async fn execute_script(
            &self,
            _tab: TabId,
            _function: InjectedFn,
        ) -> PlatformResult<Vec<InjectedPage>> {
            Err(PlatformError::new("Tabs unavailable"))
        }
    }

    #[tokio::test]
    async fn test_failed_tab_query_skips_announcement() {
        let h = harness().await;
        let mut popup = Popup::new(h.bus.clone(), Arc::new(BrokenTabs), h.popup.api().clone());

        popup.summarize_page().await;
        popup.page_info().await;

        let texts: Vec<_> = popup
            .transcript()
            .iter()
            .map(|m| (m.role, m.text.as_str()))
            .collect();
        assert_eq!(texts, [(Role::Bot, SUMMARY_ERROR), (Role::Bot, INFO_ERROR)]);
    }

    #[tokio::test]
    async fn test_extract_links_rendering() {
        let mut h = harness().await;
        h.open_with_content_script(blog());

        h.popup.extract_links().await;
        let expected = "**Found 3 links on this page**\n\n\
                        **Links by domain:**\n\
                        * a.example: 2 links\n\
                        * b.example: 1 link\n";
        assert_eq!(
            h.popup.last_message().map(|m| m.text.as_str()),
            Some(expected)
        );
    }

    #[test]
    fn test_render_links_footer() {
        let links = (0..12)
            .map(|i| ExtractedLink {
                text: format!("l{i}"),
                url: format!("https://d{i}.example/"),
                domain: format!("d{i}.example"),
            })
            .collect();
        let rendered = render_links(&LinkReport::new(links));

        assert_eq!(rendered.matches("* d").count(), 10);
        assert!(rendered.ends_with("\n*Showing top 10 domains. Total: 12 links found.*"));
    }

    #[tokio::test]
    async fn test_page_info_rendering() {
        let mut h = harness().await;
        h.open_with_content_script(blog());

        h.popup.page_info().await;
        let text = &h.popup.last_message().expect("reply").text;
        assert!(text.starts_with("**Page Information**\n\n**Title:** Blog\n"));
        assert!(text.contains("**Domain:** blog.example\n**Language:** fr\n\n"));
        assert!(text.contains("* Links: 3\n"));
        assert!(text.contains("* H1: 1, H2: 0, H3: 0\n\n"));
        assert!(text.ends_with("**Description:** Thoughts\n"));
    }

    #[tokio::test]
    async fn test_capture_and_describe() {
        let mut h = harness().await;
        h.browser.open_tab(blog());
        h.browser.set_capture_image(vec![9, 9, 9]);
        Mock::given(matchers::path("/api/image/describe"))
            .and(matchers::body_string_contains("filename=\"screenshot.png\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"text": "A blog page"})))
            .expect(1)
            .mount(&h.server)
            .await;

        h.popup.capture_and_describe().await;
        assert_eq!(
            h.texts(),
            [(Role::User, SCREENSHOT_TAKEN), (Role::Bot, "A blog page")]
        );
    }

    #[tokio::test]
    async fn test_capture_failure() {
        let mut h = harness().await;
        h.popup.capture_and_describe().await;
        assert_eq!(h.texts(), [(Role::Bot, SCREENSHOT_FAILED)]);
    }

    #[tokio::test]
    async fn test_describe_upload() {
        let mut h = harness().await;
        Mock::given(matchers::path("/api/image/describe"))
            .and(matchers::body_string_contains("filename=\"cat.JPG\""))
            .respond_with(ResponseTemplate::new(500).set_body_string("down"))
            .mount(&h.server)
            .await;

        h.popup.describe_upload("cat.JPG", vec![1]).await;
        assert_eq!(
            h.texts(),
            [(Role::User, "📎 Uploaded: cat.JPG"), (Role::Bot, UPLOAD_ERROR)]
        );
    }

    #[test]
    fn test_mime_for() {
        assert_eq!(mime_for("a.png"), "image/png");
        assert_eq!(mime_for("b.JPEG"), "image/jpeg");
        assert_eq!(mime_for("noext"), "application/octet-stream");
    }
}
