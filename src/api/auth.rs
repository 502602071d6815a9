//! Session sign-in, checks and logout.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::platform::IdentityApi;

use super::ApiClient;

// ============================================================================
// Constants
// ============================================================================

const SIGN_IN_PATH: &str = "api/auth/signin";
const CHECK_AUTH_PATH: &str = "api/auth/checkauth";
const GOOGLE_PATH: &str = "api/auth/google";
const LOGOUT_PATH: &str = "api/logout";

/// OAuth scopes requested for Google sign-in.
pub const GOOGLE_SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/userinfo.email",
    "https://www.googleapis.com/auth/userinfo.profile",
];

const TOKEN_SOURCE: &str = "chrome_extension";
const MISSING_CREDENTIALS: &str = "Please enter both email and password";
const LOGIN_FAILED: &str = "Login failed!";
const NO_AUTH_TOKEN: &str = "Failed to get auth token";

/// User record returned by the backend. Its shape is backend-defined.
pub type UserData = Value;

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct GoogleToken<'a> {
    token: &'a str,
    source: &'a str,
}

// ============================================================================
// ApiClient - Auth
// ============================================================================

impl ApiClient {
    /// Signs in with email and password. Both are trimmed first.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if either field is blank
    /// - [`Error::Auth`] with the backend's `error`, or `"Login failed!"`
    /// - [`Error::Http`] on network failure
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<UserData> {
        let (email, password) = (email.trim(), password.trim());
        if email.is_empty() || password.is_empty() {
            return Err(Error::invalid_argument(MISSING_CREDENTIALS));
        }

        debug!(email, "Signing in");
        let response = self
            .http
            .post(self.endpoint(SIGN_IN_PATH)?)
            .json(&Credentials { email, password })
            .send()
            .await?;

        if response.status().is_success() {
            info!(email, "Signed in");
            return Ok(response.json().await?);
        }

        let body: Value = response.json().await.unwrap_or(Value::Null);
        let message = body
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or(LOGIN_FAILED);
        warn!(email, error = message, "Sign-in rejected");
        Err(Error::auth(message))
    }

    /// Returns `true` if the session cookie is still accepted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on network failure.
    pub async fn check_auth(&self) -> Result<bool> {
        let response = self
            .http
            .post(self.endpoint(CHECK_AUTH_PATH)?)
            .send()
            .await?;
        let authenticated = response.status().is_success();
        debug!(authenticated, "Session checked");
        Ok(authenticated)
    }

    /// Signs in with a Google token obtained from `identity`.
    ///
    /// Any failure clears every cached identity token before returning.
    ///
    /// # Errors
    ///
    /// - [`Error::Platform`] if the identity API fails
    /// - [`Error::Auth`] if no token was granted or the backend rejects it
    /// - [`Error::Http`] on network failure
    pub async fn sign_in_with_google(&self, identity: &dyn IdentityApi) -> Result<UserData> {
        match self.google_flow(identity).await {
            Ok(user) => Ok(user),
            Err(e) => {
                warn!(error = %e, "Google sign-in failed");
                if let Err(clear) = identity.clear_all_cached_auth_tokens().await {
                    warn!(error = %clear, "Failed to clear cached auth tokens");
                }
                Err(e)
            }
        }
    }

    async fn google_flow(&self, identity: &dyn IdentityApi) -> Result<UserData> {
        let token = identity
            .get_auth_token(true, &GOOGLE_SCOPES)
            .await?
            .filter(|token| !token.is_empty())
            .ok_or_else(|| Error::auth(NO_AUTH_TOKEN))?;

        let response = self
            .http
            .post(self.endpoint(GOOGLE_PATH)?)
            .json(&GoogleToken {
                token: &token,
                source: TOKEN_SOURCE,
            })
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            info!("Signed in with Google");
            return Ok(response.json().await?);
        }

        let body: Value = response.json().await.unwrap_or(Value::Null);
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .map_or_else(
                || format!("Authentication failed: {}", status.as_u16()),
                str::to_string,
            );
        Err(Error::auth(message))
    }

    /// Ends the backend session. Returns `true` if the backend accepted it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on network failure.
    pub async fn logout(&self) -> Result<bool> {
        let response = self.http.post(self.endpoint(LOGOUT_PATH)?).send().await?;
        let ok = response.status().is_success();
        if !ok {
            warn!(status = response.status().as_u16(), "Logout rejected");
        }
        Ok(ok)
    }
}

// ============================================================================
// Tests
// ============================================================================
