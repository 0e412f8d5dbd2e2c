//! Progress frames pushed by the server over the `/progress` socket.

use serde::{Deserialize, Serialize};

/// A download status update, tagged on the `status` field.
///
/// Only the fields the server is known to send are modelled; anything else
/// in the frame is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ProgressEvent {
    /// A video is transferring.
    Downloading {
        #[serde(default)]
        video_id: String,
        /// Percent complete, 0–100.
        #[serde(default)]
        progress: f64,
        /// Transfer rate in bytes per second.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        speed: Option<f64>,
        /// Estimated seconds remaining.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        eta: Option<f64>,
    },
    /// A video finished downloading.
    Finished {
        #[serde(default)]
        video_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        progress: Option<f64>,
    },
    /// The server failed to download a video.
    Error {
        #[serde(default)]
        video_id: String,
        #[serde(default, alias = "message")]
        error: String,
    },
}

impl ProgressEvent {
    /// Parses a single text frame.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Identifier of the video this update refers to.
    pub fn video_id(&self) -> &str {
        match self {
            Self::Downloading { video_id, .. }
            | Self::Finished { video_id, .. }
            | Self::Error { video_id, .. } => video_id,
        }
    }

    /// Percent complete, clamped to 0–100. `None` for errors.
    pub fn percent(&self) -> Option<f64> {
        match self {
            Self::Downloading { progress, .. } => Some(progress.clamp(0.0, 100.0)),
            Self::Finished { .. } => Some(100.0),
            Self::Error { .. } => None,
        }
    }

    /// Returns `true` once no further updates are expected for the video.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Downloading { .. })
    }

    /// Human-readable status line for the shell.
    pub fn status_line(&self) -> String {
        match self {
            Self::Downloading {
                video_id,
                speed,
                eta,
                ..
            } => {
                let mut line = format!("Downloading video {video_id}...");
                if let Some(bps) = speed.filter(|s| *s > 0.0) {
                    line.push_str(&format!(" Speed: {:.2} MB/s", bps / 1024.0 / 1024.0));
                }
                if let Some(secs) = eta.filter(|e| *e > 0.0) {
                    line.push_str(&format!(" ETA: {secs:.0}s"));
                }
                line
            }
            Self::Finished { .. } => "Download Complete!".to_string(),
            Self::Error { error, .. } => format!("Error - {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_downloading_frame() {
        let ev = ProgressEvent::from_json(
            r#"{"video_id":"video_1","status":"downloading","progress":42.5,"speed":2097152,"eta":12}"#,
        )
        .unwrap();
        assert_eq!(
            ev,
            ProgressEvent::Downloading {
                video_id: "video_1".into(),
                progress: 42.5,
                speed: Some(2_097_152.0),
                eta: Some(12.0),
            }
        );
        assert_eq!(ev.percent(), Some(42.5));
        assert!(!ev.is_terminal());
    }

    #[test]
    fn parse_downloading_with_null_speed() {
        let ev = ProgressEvent::from_json(
            r#"{"video_id":"video_2","status":"downloading","progress":3.0,"speed":null,"eta":null}"#,
        )
        .unwrap();
        assert_eq!(ev.status_line(), "Downloading video video_2...");
    }

    #[test]
    fn parse_finished_frame() {
        let ev =
            ProgressEvent::from_json(r#"{"video_id":"video_3","status":"finished","progress":100}"#)
                .unwrap();
        assert_eq!(ev.video_id(), "video_3");
        assert_eq!(ev.percent(), Some(100.0));
        assert!(ev.is_terminal());
        assert_eq!(ev.status_line(), "Download Complete!");
    }

    #[test]
    fn parse_error_frame_accepts_message_alias() {
        let ev = ProgressEvent::from_json(r#"{"status":"error","message":"disk full"}"#).unwrap();
        assert_eq!(
            ev,
            ProgressEvent::Error {
                video_id: String::new(),
                error: "disk full".into(),
            }
        );
        assert_eq!(ev.percent(), None);
        assert_eq!(ev.status_line(), "Error - disk full");
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(ProgressEvent::from_json(r#"{"status":"paused"}"#).is_err());
        assert!(ProgressEvent::from_json(r#"{"progress":10}"#).is_err());
        assert!(ProgressEvent::from_json("not json").is_err());
    }

    #[test]
    fn status_line_includes_speed_and_eta() {
        let ev = ProgressEvent::Downloading {
            video_id: "video_1".into(),
            progress: 50.0,
            speed: Some(1_572_864.0),
            eta: Some(30.0),
        };
        assert_eq!(
            ev.status_line(),
            "Downloading video video_1... Speed: 1.50 MB/s ETA: 30s"
        );
    }

    #[test]
    fn percent_is_clamped() {
        let ev = ProgressEvent::Downloading {
            video_id: "v".into(),
            progress: 100.4,
            speed: None,
            eta: None,
        };
        assert_eq!(ev.percent(), Some(100.0));
    }

    #[test]
    fn serialize_uses_status_tag() {
        let ev = ProgressEvent::Finished {
            video_id: "video_9".into(),
            progress: None,
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["status"], "finished");
        assert_eq!(json["video_id"], "video_9");
        assert!(json.get("progress").is_none());
    }
}
