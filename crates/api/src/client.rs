//! HTTP client for the download server.
//!
//! The server identifies a session by its `client_id` cookie. The client
//! keeps every cookie the server sets in a shared jar so that auth checks,
//! profile lookups and download requests all carry it, and so the progress
//! socket handshake can reuse it.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use vidrelay_protocol::constants::{
    self, AUTH_CALLBACK_PATH, AUTH_CHECK_PATH, AUTH_PATH, PROFILE_PATH, SESSION_COOKIE,
    START_DOWNLOAD_PATH,
};
use vidrelay_protocol::{AuthStatus, DownloadRequest, DownloadResponse, UserProfile};

use crate::auth::CallbackParams;
use crate::error::{ApiError, AuthError};

const USER_AGENT_VALUE: &str = concat!("vidrelay/", env!("CARGO_PKG_VERSION"));

/// Client for the download server's HTTP API.
///
/// Cheap to clone; clones share the connection pool and cookie jar.
#[derive(Clone)]
pub struct ApiClient {
    base: Url,
    http: Client,
    jar: Arc<Jar>,
}

impl ApiClient {
    /// Creates a client for the server at `server_url` with an empty jar.
    pub fn new(server_url: &str) -> Result<Self, ApiError> {
        let base: Url = server_url
            .parse()
            .map_err(|e| ApiError::InvalidUrl(format!("{server_url}: {e}")))?;
        if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
            return Err(ApiError::InvalidUrl(server_url.to_string()));
        }

        let jar = Arc::new(Jar::default());
        let http = Client::builder()
            .cookie_provider(jar.clone())
            .user_agent(USER_AGENT_VALUE)
            .build()?;

        Ok(Self { base, http, jar })
    }

    /// Base URL of the server.
    pub fn server_url(&self) -> &Url {
        &self.base
    }

    /// Page that starts the OAuth flow in a browser.
    pub fn auth_url(&self) -> Url {
        self.endpoint(AUTH_PATH)
    }

    /// URL of the progress WebSocket on the same server.
    pub fn progress_url(&self) -> String {
        constants::progress_url(self.base.as_str())
    }

    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        let joined = format!("{}{path}", self.base.path().trim_end_matches('/'));
        url.set_path(&joined);
        url.set_query(None);
        url
    }

    /// Returns `true` if the server accepts the current session cookie.
    #[instrument(skip(self))]
    pub async fn check_auth(&self) -> Result<bool, ApiError> {
        let response = self.http.get(self.endpoint(AUTH_CHECK_PATH)).send().await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            debug!("auth check: not authenticated");
            return Ok(false);
        }
        let status: AuthStatus = parse_json(response).await?;
        debug!(status = %status.status, message = %status.message, "auth check");
        Ok(status.is_success())
    }

    /// Finishes a login by replaying the provider's redirect to
    /// `/auth/callback`. On success the server sets the session cookie,
    /// which lands in this client's jar.
    #[instrument(skip(self, callback_url))]
    pub async fn complete_auth(&self, callback_url: &str) -> Result<AuthStatus, ApiError> {
        let params = CallbackParams::parse(callback_url, &self.endpoint(AUTH_CALLBACK_PATH))?;

        let mut url = self.endpoint(AUTH_CALLBACK_PATH);
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("code", &params.code);
            if let Some(state) = &params.state {
                query.append_pair("state", state);
            }
        }

        let response = self.http.get(url).send().await?;
        let status: AuthStatus = parse_json(response).await?;
        if self.session_cookie().is_none() {
            warn!("auth callback succeeded but no session cookie was set");
        }
        info!(message = %status.message, "authentication completed");
        Ok(status)
    }

    /// Polls [`check_auth`](Self::check_auth) until it succeeds or
    /// `max_attempts` checks have failed. Errors count as "not yet".
    pub async fn wait_for_auth(
        &self,
        interval: Duration,
        max_attempts: u32,
    ) -> Result<(), ApiError> {
        for attempt in 1..=max_attempts {
            match self.check_auth().await {
                Ok(true) => {
                    debug!(attempt, "authenticated");
                    return Ok(());
                }
                Ok(false) => {}
                Err(e) => debug!(attempt, error = %e, "auth check failed"),
            }
            if attempt < max_attempts {
                tokio::time::sleep(interval).await;
            }
        }
        Err(AuthError::TimedOut {
            attempts: max_attempts,
        }
        .into())
    }

    /// Fetches the signed-in user's profile.
    #[instrument(skip(self))]
    pub async fn fetch_profile(&self) -> Result<UserProfile, ApiError> {
        let response = self.http.get(self.endpoint(PROFILE_PATH)).send().await?;
        parse_json(response).await
    }

    /// Validates `request` and asks the server to download the matching
    /// videos into its folder. The server answers once every download has
    /// finished; progress arrives on the WebSocket meanwhile.
    #[instrument(skip(self, request), fields(folder = %request.folder))]
    pub async fn start_download(
        &self,
        request: &DownloadRequest,
    ) -> Result<DownloadResponse, ApiError> {
        let request = request.clone().normalized();
        request.validate()?;

        info!(count = request.num_videos, "starting download");
        let response = self
            .http
            .post(self.endpoint(START_DOWNLOAD_PATH))
            .json(&request)
            .send()
            .await?;
        parse_json(response).await
    }

    /// Value of the `client_id` session cookie, if the server set one.
    pub fn session_cookie(&self) -> Option<String> {
        let header = self.cookie_header()?;
        header.split(';').find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == SESSION_COOKIE).then(|| value.to_string())
        })
    }

    /// Every cookie the jar holds for the server, formatted as a `Cookie`
    /// header value.
    pub fn cookie_header(&self) -> Option<String> {
        let value = self.jar.cookies(&self.base)?;
        value.to_str().ok().map(str::to_string)
    }

    /// Restores a previously saved session cookie.
    pub fn set_session_cookie(&self, value: &str) {
        self.jar
            .add_cookie_str(&format!("{SESSION_COOKIE}={value}; Path=/"), &self.base);
        debug!("session cookie restored");
    }
}

/// Maps error statuses to [`ApiError`] and decodes the body otherwise.
async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized);
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::Status {
            status: status.as_u16(),
            message: error_message(&body),
        });
    }
    Ok(response.json().await?)
}

/// Pulls the human-readable message out of an error body.
///
/// The server answers with either `{"detail": ...}` or `{"status": "error",
/// "message": ...}`; anything else is returned as-is.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("detail")
                .or_else(|| v.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}
