use std::time::Duration;

/// Base URL of the download server when nothing is configured.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";

/// WebSocket endpoint streaming [`ProgressEvent`](crate::ProgressEvent) frames.
pub const PROGRESS_PATH: &str = "/progress";

/// Browser entry point of the server-side OAuth flow.
pub const AUTH_PATH: &str = "/auth";

/// Redirect target of the OAuth provider; sets the session cookie.
pub const AUTH_CALLBACK_PATH: &str = "/auth/callback";

/// Reports whether the session cookie maps to valid credentials.
pub const AUTH_CHECK_PATH: &str = "/auth/check";

/// Profile of the authenticated user.
pub const PROFILE_PATH: &str = "/user/profile";

/// Starts a batch download on the server.
pub const START_DOWNLOAD_PATH: &str = "/start-download";

/// Name of the cookie identifying the client session.
pub const SESSION_COOKIE: &str = "client_id";

/// Fixed delay between reconnect attempts.
pub const RECONNECT_INTERVAL: Duration = Duration::from_secs(5);

/// Consecutive reconnect attempts allowed without inbound data.
pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Upper bound for `numVideos` in a download request.
pub const MAX_VIDEOS: u32 = 50;

/// Maximum accepted size of a single progress frame (1 MiB).
pub const WS_MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Delay between `/auth/check` polls while waiting for login.
pub const AUTH_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Number of `/auth/check` polls before login is considered timed out.
pub const AUTH_POLL_MAX_ATTEMPTS: u32 = 30;

/// Derives the progress socket URL from the server's HTTP base URL.
///
/// `http` maps to `ws` and `https` to `wss`; any other scheme is kept.
pub fn progress_url(server_url: &str) -> String {
    let base = server_url.trim_end_matches('/');
    let base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base.to_string()
    };
    format!("{base}{PROGRESS_PATH}")
}
