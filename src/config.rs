//! Relay configuration.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use page_relay::RelayOptions;
//!
//! let options = RelayOptions::new()
//!     .with_api_base_url("http://localhost:3000")
//!     .with_request_timeout(Duration::from_secs(5))
//!     .with_max_pending_requests(16);
//!
//! options.validate()?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};
use crate::platform::{CaptureOptions, ImageFormat};

// ============================================================================
// Constants
// ============================================================================

/// Default chatbot backend.
pub const DEFAULT_API_BASE_URL: &str = "https://chat-bot-extension-backend.vercel.app";

/// Default time a bus caller waits for a response.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default cap on outstanding bus requests.
pub const DEFAULT_MAX_PENDING_REQUESTS: usize = 100;

/// Default timeout for remote API calls.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(60);

// ============================================================================
// RelayOptions
// ============================================================================

/// Settings shared by the bus, the contexts and the API client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayOptions {
    /// Base URL of the chatbot backend.
    pub api_base_url: String,

    /// Bus request timeout.
    pub request_timeout: Duration,

    /// Maximum outstanding bus requests.
    pub max_pending_requests: usize,

    /// Remote API timeout.
    pub http_timeout: Duration,

    /// Visible-tab capture parameters.
    pub capture: CaptureOptions,
}

impl Default for RelayOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl RelayOptions {
    /// Creates options with the default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_pending_requests: DEFAULT_MAX_PENDING_REQUESTS,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            capture: CaptureOptions::default(),
        }
    }

    /// Sets the backend base URL.
    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Sets the bus request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the outstanding request cap.
    #[must_use]
    pub fn with_max_pending_requests(mut self, max: usize) -> Self {
        self.max_pending_requests = max;
        self
    }

    /// Sets the remote API timeout.
    #[must_use]
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// Sets the capture encoding and quality.
    #[must_use]
    pub fn with_capture(mut self, format: ImageFormat, quality: u8) -> Self {
        self.capture = CaptureOptions { format, quality };
        self
    }

    /// Parsed base URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Url`] if the base URL does not parse.
    pub fn api_base(&self) -> Result<Url> {
        Ok(Url::parse(&self.api_base_url)?)
    }

    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] on a zero timeout, a zero pending limit, a
    /// quality above 100, or a base URL that is not http(s).
    pub fn validate(&self) -> Result<()> {
        if self.request_timeout.is_zero() {
            return Err(Error::config("Request timeout must be greater than zero"));
        }
        if self.http_timeout.is_zero() {
            return Err(Error::config("HTTP timeout must be greater than zero"));
        }
        if self.max_pending_requests == 0 {
            return Err(Error::config("Pending request limit must be greater than zero"));
        }
        if self.capture.quality > 100 {
            return Err(Error::config(format!(
                "Capture quality must be 0-100, got {}",
                self.capture.quality
            )));
        }

        let base = self
            .api_base()
            .map_err(|e| Error::config(format!("Invalid API base URL: {e}")))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "API base URL must be http(s), got {}",
                base.scheme()
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use tokio_test::{assert_err, assert_ok};

    use super::*;

    #[test]
    fn test_defaults() {
        let options = RelayOptions::new();
        assert_eq!(options.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(options.request_timeout, Duration::from_secs(30));
        assert_eq!(options.max_pending_requests, 100);
        assert_eq!(options.http_timeout, Duration::from_secs(60));
        assert_eq!(options.capture.quality, 90);
        assert_ok!(options.validate());
    }

    #[test]
    fn test_builder_chain() {
        let options = RelayOptions::new()
            .with_api_base_url("http://localhost:3000")
            .with_request_timeout(Duration::from_millis(250))
            .with_max_pending_requests(4)
            .with_capture(ImageFormat::Jpeg, 70);

        assert_eq!(options.api_base_url, "http://localhost:3000");
        assert_eq!(options.request_timeout, Duration::from_millis(250));
        assert_eq!(options.max_pending_requests, 4);
        assert_eq!(options.capture.format, ImageFormat::Jpeg);
        assert_ok!(options.validate());
    }

    #[test]
    fn test_validate_zero_timeout() {
        let options = RelayOptions::new().with_request_timeout(Duration::ZERO);
        assert!(matches!(options.validate(), Err(Error::Config { .. })));
    }

    #[test]
    fn test_validate_zero_pending() {
        let options = RelayOptions::new().with_max_pending_requests(0);
        assert_err!(options.validate());
    }

    #[test]
    fn test_validate_bad_base_url() {
        assert_err!(RelayOptions::new().with_api_base_url("not a url").validate());
        assert_err!(RelayOptions::new().with_api_base_url("ftp://files.example").validate());
    }

    #[test]
    fn test_validate_quality() {
        let options = RelayOptions::new().with_capture(ImageFormat::Jpeg, 101);
        assert_err!(options.validate());
    }
}
