//! Wire types shared by the vidrelay connection manager, API client and shell.

pub mod constants;
pub mod messages;
pub mod progress;

pub use messages::{AuthStatus, DownloadRequest, DownloadResponse, UserProfile, ValidationError};
pub use progress::ProgressEvent;
