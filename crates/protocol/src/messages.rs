use serde::{Deserialize, Serialize};

use crate::constants::MAX_VIDEOS;

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

/// Body of `/auth/check` and `/auth/callback`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
}

impl AuthStatus {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Profile of the signed-in user (`/user/profile`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub picture: String,
    #[serde(default)]
    pub email: String,
}

impl UserProfile {
    /// Name to show, falling back to `"User"` when the server sent none.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            "User"
        } else {
            &self.name
        }
    }
}

// ---------------------------------------------------------------------------
// Downloads
// ---------------------------------------------------------------------------

/// Rejections raised before a download request leaves the client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("please select a folder first")]
    NoFolder,

    #[error("please enter a valid number of videos (1-{max}), got {count}")]
    InvalidVideoCount { count: u32, max: u32 },

    #[error("please enter a search query or select at least one video source")]
    NoSource,
}

/// Body of `POST /start-download`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub num_videos: u32,
    pub folder: String,
    #[serde(default)]
    pub use_recommended: bool,
    #[serde(default)]
    pub use_watch_later: bool,
    #[serde(default)]
    pub use_unwatched: bool,
}

impl DownloadRequest {
    /// Trims the query and category, dropping them when blank.
    pub fn normalized(mut self) -> Self {
        self.query = non_blank(self.query);
        self.category = non_blank(self.category);
        self.folder = self.folder.trim().to_string();
        self
    }

    /// Checks the request the same way the server's form expects it.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.folder.trim().is_empty() {
            return Err(ValidationError::NoFolder);
        }
        if self.num_videos == 0 || self.num_videos > MAX_VIDEOS {
            return Err(ValidationError::InvalidVideoCount {
                count: self.num_videos,
                max: MAX_VIDEOS,
            });
        }
        let has_query = self.query.as_deref().is_some_and(|q| !q.trim().is_empty());
        if !has_query && !self.use_recommended && !self.use_watch_later && !self.use_unwatched {
            return Err(ValidationError::NoSource);
        }
        Ok(())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Response of `POST /start-download`, sent once every download settled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DownloadResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub total_videos: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> DownloadRequest {
        DownloadRequest {
            query: Some("rust async".into()),
            num_videos: 5,
            folder: "/tmp/videos".into(),
            ..Default::default()
        }
    }

    #[test]
    fn valid_request_passes() {
        assert_eq!(request().validate(), Ok(()));
    }

    #[test]
    fn missing_folder_rejected() {
        let req = DownloadRequest {
            folder: "  ".into(),
            ..request()
        };
        assert_eq!(req.validate(), Err(ValidationError::NoFolder));
    }

    #[test]
    fn video_count_bounds() {
        for count in [0, MAX_VIDEOS + 1] {
            let req = DownloadRequest {
                num_videos: count,
                ..request()
            };
            assert!(matches!(
                req.validate(),
                Err(ValidationError::InvalidVideoCount { .. })
            ));
        }
        let req = DownloadRequest {
            num_videos: MAX_VIDEOS,
            ..request()
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn needs_query_or_source() {
        let req = DownloadRequest {
            query: Some("   ".into()),
            ..request()
        };
        assert_eq!(req.validate(), Err(ValidationError::NoSource));

        let req = DownloadRequest {
            query: None,
            use_watch_later: true,
            ..request()
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn normalized_drops_blank_fields() {
        let req = DownloadRequest {
            query: Some("  cats  ".into()),
            category: Some(" ".into()),
            ..request()
        }
        .normalized();
        assert_eq!(req.query.as_deref(), Some("cats"));
        assert!(req.category.is_none());
    }

    #[test]
    fn download_request_wire_names() {
        let json = serde_json::to_value(request()).unwrap();
        assert_eq!(json["numVideos"], 5);
        assert_eq!(json["useWatchLater"], false);
        assert_eq!(json["query"], "rust async");
        assert!(json.get("category").is_none());
    }

    #[test]
    fn auth_status_success() {
        let ok: AuthStatus =
            serde_json::from_str(r#"{"status":"success","message":"Authenticated"}"#).unwrap();
        assert!(ok.is_success());
        let err: AuthStatus = serde_json::from_str(r#"{"status":"error"}"#).unwrap();
        assert!(!err.is_success());
    }

    #[test]
    fn profile_display_name_fallback() {
        assert_eq!(UserProfile::default().display_name(), "User");
        let p: UserProfile = serde_json::from_str(r#"{"name":"Ada","picture":""}"#).unwrap();
        assert_eq!(p.display_name(), "Ada");
    }

    #[test]
    fn download_response_parses_snake_case() {
        let resp: DownloadResponse =
            serde_json::from_str(r#"{"message":"Downloads completed","total_videos":3}"#)
                .unwrap();
        assert_eq!(resp.total_videos, 3);
    }
}
