use vidrelay_protocol::ValidationError;

/// Errors from the download server's HTTP API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid server URL: {0}")]
    InvalidUrl(String),

    #[error("not authenticated")]
    Unauthorized,

    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("invalid download request: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Errors from the login flow.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("not an auth callback URL: {0}")]
    NotCallback(String),

    #[error("callback URL has no authorization code")]
    MissingCode,

    #[error("login not completed after {attempts} checks")]
    TimedOut { attempts: u32 },

    #[error("could not open browser: {0}")]
    Browser(#[from] std::io::Error),
}

/// Errors from the persisted session cookie.
#[derive(Debug, thiserror::Error)]
pub enum CookieStoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
