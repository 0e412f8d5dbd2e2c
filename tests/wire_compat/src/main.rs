fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use vidrelay_protocol::{
        AuthStatus, DownloadRequest, DownloadResponse, ProgressEvent, UserProfile,
    };

    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    fn load_fixture(name: &str) -> serde_json::Value {
        let path = fixtures_dir().join(name);
        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
    }

    /// Normalizes numbers so that `14` and `14.0` compare equal.
    ///
    /// The server's JSON encoder writes whole floats as integers; serde
    /// writes `f64` fields with a fraction.
    fn normalize_value(v: &serde_json::Value) -> serde_json::Value {
        match v {
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) => serde_json::json!(f),
                None => v.clone(),
            },
            serde_json::Value::Object(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), normalize_value(v)))
                    .collect(),
            ),
            serde_json::Value::Array(arr) => {
                serde_json::Value::Array(arr.iter().map(normalize_value).collect())
            }
            _ => v.clone(),
        }
    }

    /// Deserializes a fixture, re-serializes it, and compares the JSON
    /// values (order-independent, float-normalized).
    fn roundtrip_test<T>(name: &str) -> T
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));

        assert_eq!(
            normalize_value(&fixture),
            normalize_value(&reserialized),
            "roundtrip mismatch for {name}:\n  server: {fixture}\n  client: {reserialized}"
        );
        parsed
    }

    // --- Progress socket frames ---

    #[test]
    fn fixture_progress_downloading() {
        let event = roundtrip_test::<ProgressEvent>("progress_downloading.json");
        assert_eq!(event.video_id(), "video_1");
        assert_eq!(event.percent(), Some(37.25));
        assert!(!event.is_terminal());
    }

    #[test]
    fn fixture_progress_finished() {
        let event = roundtrip_test::<ProgressEvent>("progress_finished.json");
        assert!(event.is_terminal());
        assert_eq!(event.status_line(), "Download Complete!");
    }

    #[test]
    fn fixture_progress_error() {
        let event = roundtrip_test::<ProgressEvent>("progress_error.json");
        assert_eq!(
            event.status_line(),
            "Error - ERROR: [youtube] abc123: Video unavailable"
        );
    }

    #[test]
    fn progress_frame_with_zero_speed_and_eta() {
        // yt-dlp reports 0 before the first sample arrives.
        let json = r#"{"video_id":"video_4","status":"downloading","progress":0.5,"speed":0,"eta":0}"#;
        let event = ProgressEvent::from_json(json).unwrap();
        assert_eq!(event.status_line(), "Downloading video video_4...");
    }

    #[test]
    fn progress_frame_with_null_speed() {
        let json = r#"{"video_id":"video_5","status":"downloading","progress":12.0,"speed":null,"eta":null}"#;
        let event = ProgressEvent::from_json(json).unwrap();
        assert_eq!(event.percent(), Some(12.0));
    }

    #[test]
    fn unknown_status_is_rejected() {
        let json = r#"{"video_id":"video_1","status":"paused"}"#;
        assert!(ProgressEvent::from_json(json).is_err());
    }

    // --- HTTP bodies ---

    #[test]
    fn fixture_auth_status() {
        assert!(roundtrip_test::<AuthStatus>("auth_status_success.json").is_success());
        assert!(!roundtrip_test::<AuthStatus>("auth_status_error.json").is_success());
    }

    #[test]
    fn fixture_user_profile() {
        let profile = roundtrip_test::<UserProfile>("user_profile.json");
        assert_eq!(profile.display_name(), "Ada Lovelace");
    }

    #[test]
    fn unknown_user_profile() {
        let json = r#"{"name":"","picture":"","email":""}"#;
        let profile: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.display_name(), "User");
    }

    #[test]
    fn fixture_download_request() {
        let request = roundtrip_test::<DownloadRequest>("download_request.json");
        assert_eq!(request.num_videos, 10);
        assert!(request.use_watch_later);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn download_request_omits_blank_query() {
        let request = DownloadRequest {
            query: Some("   ".into()),
            num_videos: 5,
            folder: "/videos".into(),
            use_recommended: true,
            ..DownloadRequest::default()
        }
        .normalized();
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("query").is_none());
        assert_eq!(json["numVideos"], 5);
        assert_eq!(json["useRecommended"], true);
    }

    #[test]
    fn fixture_download_response() {
        let response = roundtrip_test::<DownloadResponse>("download_response.json");
        assert_eq!(response.total_videos, 12);
    }
}
