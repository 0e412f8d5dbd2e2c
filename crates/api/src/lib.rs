//! HTTP side of the vidrelay client: authentication, profile and download
//! requests against the download server, plus the persisted session cookie.

pub mod auth;
pub mod client;
pub mod cookies;
pub mod error;

pub use auth::{AuthCallback, AuthProvider, BrowserAuth, CallbackParams};
pub use client::ApiClient;
pub use cookies::SessionStore;
pub use error::{ApiError, AuthError, CookieStoreError};
