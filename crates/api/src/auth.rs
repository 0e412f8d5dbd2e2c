//! Browser-based login.
//!
//! Login runs in the user's browser: the server redirects to the OAuth
//! provider, which redirects back to `/auth/callback`. Whatever hosts the
//! browser hands that callback URL to [`BrowserAuth::complete`], which
//! replays it through the [`ApiClient`] so the session cookie ends up in the
//! client's jar.

use std::io;
use std::sync::Mutex;

use reqwest::Url;
use tracing::{debug, info, warn};

use vidrelay_protocol::AuthStatus;

use crate::client::ApiClient;
use crate::error::{ApiError, AuthError};

/// Called once with the outcome of a login.
pub type AuthCallback = Box<dyn FnOnce(&Result<AuthStatus, ApiError>) + Send>;

/// Starts a login and reports its result.
pub trait AuthProvider: Send + Sync {
    /// Opens the login page.
    fn begin_auth(&self) -> Result<(), AuthError>;

    /// Registers `callback` for the result of the current login. A later
    /// registration replaces an earlier one.
    fn on_auth_result(&self, callback: AuthCallback);
}

/// Query parameters of an `/auth/callback` redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackParams {
    pub code: String,
    pub state: Option<String>,
}

impl CallbackParams {
    /// Parses `url`, which must point at `expected` (same origin and path).
    pub fn parse(url: &str, expected: &Url) -> Result<Self, AuthError> {
        let parsed: Url = url
            .parse()
            .map_err(|_| AuthError::NotCallback(url.to_string()))?;
        if !is_callback(&parsed, expected) {
            return Err(AuthError::NotCallback(url.to_string()));
        }

        let mut code = None;
        let mut state = None;
        for (key, value) in parsed.query_pairs() {
            match key.as_ref() {
                "code" if !value.is_empty() => code = Some(value.into_owned()),
                "state" if !value.is_empty() => state = Some(value.into_owned()),
                _ => {}
            }
        }

        Ok(Self {
            code: code.ok_or(AuthError::MissingCode)?,
            state,
        })
    }
}

fn is_callback(url: &Url, expected: &Url) -> bool {
    url.scheme() == expected.scheme()
        && url.host_str() == expected.host_str()
        && url.port_or_known_default() == expected.port_or_known_default()
        && url.path().trim_end_matches('/') == expected.path().trim_end_matches('/')
}

type Opener = Box<dyn Fn(&str) -> io::Result<()> + Send + Sync>;

/// Login through the system browser.
pub struct BrowserAuth {
    client: ApiClient,
    opener: Opener,
    pending: Mutex<Option<AuthCallback>>,
}

impl BrowserAuth {
    pub fn new(client: ApiClient) -> Self {
        Self::with_opener(client, |url| open::that(url))
    }

    /// Uses `opener` instead of the system browser.
    pub fn with_opener<F>(client: ApiClient, opener: F) -> Self
    where
        F: Fn(&str) -> io::Result<()> + Send + Sync + 'static,
    {
        Self {
            client,
            opener: Box::new(opener),
            pending: Mutex::new(None),
        }
    }

    /// Finishes the login with the callback URL the browser reached, then
    /// reports the result to the registered callback.
    pub async fn complete(&self, callback_url: &str) -> Result<AuthStatus, ApiError> {
        let result = self.client.complete_auth(callback_url).await;
        match &result {
            Ok(status) => info!(message = %status.message, "login finished"),
            Err(e) => warn!(error = %e, "login failed"),
        }

        let callback = self.pending.lock().ok().and_then(|mut p| p.take());
        match callback {
            Some(callback) => callback(&result),
            None => debug!("no auth result callback registered"),
        }
        result
    }
}

impl AuthProvider for BrowserAuth {
    fn begin_auth(&self) -> Result<(), AuthError> {
        let url = self.client.auth_url();
        info!(%url, "opening login page");
        (self.opener)(url.as_str())?;
        Ok(())
    }

    fn on_auth_result(&self, callback: AuthCallback) {
        if let Ok(mut pending) = self.pending.lock() {
            *pending = Some(callback);
        }
    }
}
