//! Client for the chatbot backend.
//!
//! Sessions are cookie based: the client keeps a cookie store and sends it
//! with every request. Endpoint paths are resolved under the base URL, so a
//! base of `https://host/backend` posts to `https://host/backend/api/...`.
//!
//! # Endpoints
//!
//! | Method | Path | Body | Reply |
//! |--------|------|------|-------|
//! | `prompt` | `POST /api/chatbot` | `{prompt}` | `{text}` |
//! | `describe_image` | `POST /api/image/describe` | multipart `file` | `{text}` |
//! | `sign_in` | `POST /api/auth/signin` | `{email, password}` | user |
//! | `check_auth` | `POST /api/auth/checkauth` | none | status only |
//! | `sign_in_with_google` | `POST /api/auth/google` | `{token, source}` | user |
//! | `logout` | `POST /api/logout` | none | status only |

// ============================================================================
// Imports
// ============================================================================

use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::config::RelayOptions;
use crate::error::Result;

// ============================================================================
// Submodules
// ============================================================================

mod auth;

// ============================================================================
// Re-exports
// ============================================================================

pub use auth::{GOOGLE_SCOPES, UserData};

// ============================================================================
// Constants
// ============================================================================

// Resolved under the base URL path.
const CHATBOT_PATH: &str = "api/chatbot";
const IMAGE_DESCRIBE_PATH: &str = "api/image/describe";

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Serialize)]
struct PromptBody<'a> {
    prompt: &'a str,
}

/// `{text}` reply of the chat endpoints.
#[derive(Deserialize)]
struct TextReply {
    #[serde(default)]
    text: Option<String>,
}

// ============================================================================
// ApiClient
// ============================================================================

/// HTTP client for the chatbot backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
}

impl ApiClient {
    /// Creates a client with its own cookie store.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`](crate::Error::Config) if the options are invalid
    /// - [`Error::Http`](crate::Error::Http) if the HTTP client cannot be built
    pub fn new(options: &RelayOptions) -> Result<Self> {
        options.validate()?;
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(options.http_timeout)
            .build()?;

        let mut base = options.api_base()?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self { http, base })
    }

    /// Backend base URL, always ending in `/`.
    #[inline]
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(path)?)
    }

    // ========================================================================
    // Chat
    // ========================================================================

    /// Sends a chat prompt and returns the model's reply.
    ///
    /// `Ok(None)` means the backend answered without text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`](crate::Error::Http) if the request fails or the
    /// reply is not JSON.
    pub async fn prompt(&self, prompt: &str) -> Result<Option<String>> {
        debug!(chars = prompt.chars().count(), "Sending prompt");
        let reply: TextReply = self
            .http
            .post(self.endpoint(CHATBOT_PATH)?)
            .json(&PromptBody { prompt })
            .send()
            .await?
            .json()
            .await?;

        if reply.text.is_none() {
            warn!("Chatbot reply had no text");
        }
        Ok(reply.text)
    }

    /// Uploads an image and returns its description.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`](crate::Error::Http) if the MIME type is
    /// invalid, the request fails, or the reply is not JSON.
    pub async fn describe_image(
        &self,
        file_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<Option<String>> {
        debug!(file_name, bytes = bytes.len(), "Uploading image");
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime_type)?;

        let reply: TextReply = self
            .http
            .post(self.endpoint(IMAGE_DESCRIBE_PATH)?)
            .multipart(Form::new().part("file", part))
            .send()
            .await?
            .json()
            .await?;
        Ok(reply.text)
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

    pub(super) fn client(server: &MockServer) -> ApiClient {
        ApiClient::new(&RelayOptions::new().with_api_base_url(server.uri())).expect("client")
    }

    #[tokio::test]
    async fn test_base_path_prefix_is_kept() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/backend/api/chatbot"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"text": "prefixed"})))
            .expect(1)
            .mount(&server)
            .await;

        let options = RelayOptions::new().with_api_base_url(format!("{}/backend", server.uri()));
        let api = ApiClient::new(&options).expect("client");
        assert_eq!(api.base_url().path(), "/backend/");

        let reply = api.prompt("hello").await.expect("prompt");
        assert_eq!(reply.as_deref(), Some("prefixed"));
    }

    #[test]
    fn test_rejects_invalid_options() {
        let options = RelayOptions::new().with_api_base_url("not a url");
        assert!(ApiClient::new(&options).is_err());
    }

    #[tokio::test]
    async fn test_prompt() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/api/chatbot"))
            .and(matchers::body_json(json!({"prompt": "hello"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"text": "hi there"})))
            .expect(1)
            .mount(&server)
            .await;

        let reply = client(&server).prompt("hello").await.expect("prompt");
        assert_eq!(reply.as_deref(), Some("hi there"));
    }

    #[tokio::test]
    async fn test_prompt_without_text() {
        let server = MockServer::start().await;
        Mock::given(matchers::path("/api/chatbot"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "quota"})))
            .mount(&server)
            .await;

        assert_eq!(client(&server).prompt("x").await.expect("prompt"), None);
    }

    #[tokio::test]
    async fn test_prompt_non_json_is_http_error() {
        let server = MockServer::start().await;
        Mock::given(matchers::path("/api/chatbot"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let err = client(&server).prompt("x").await.expect_err("not json");
        assert!(matches!(err, crate::Error::Http(_)));
    }

    #[tokio::test]
    async fn test_describe_image_multipart() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/api/image/describe"))
            .and(matchers::body_string_contains("name=\"file\""))
            .and(matchers::body_string_contains("filename=\"screenshot.png\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"text": "a chart"})))
            .expect(1)
            .mount(&server)
            .await;

        let reply = client(&server)
            .describe_image("screenshot.png", "image/png", vec![1, 2, 3])
            .await
            .expect("describe");
        assert_eq!(reply.as_deref(), Some("a chart"));
    }
}
