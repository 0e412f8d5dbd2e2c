//! Client configuration.
//!
//! Stored as JSON in `<config dir>/vidrelay/config.json`. The saved session
//! cookie lives next to it in `session.json`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use vidrelay_progress_connection::ReconnectConfig;
use vidrelay_protocol::constants::{
    self, DEFAULT_SERVER_URL, MAX_RECONNECT_ATTEMPTS, RECONNECT_INTERVAL,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP base URL of the download server.
    pub server_url: String,

    /// Progress socket URL. Derived from `server_url` when empty.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub progress_url: String,

    pub reconnect_interval_secs: u64,

    pub max_reconnect_attempts: u32,

    /// Folder used by `download` when none is given.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub download_folder: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.into(),
            progress_url: String::new(),
            reconnect_interval_secs: RECONNECT_INTERVAL.as_secs(),
            max_reconnect_attempts: MAX_RECONNECT_ATTEMPTS,
            download_folder: String::new(),
        }
    }
}

impl AppConfig {
    /// Loads the config file, falling back to defaults when it is missing
    /// or unreadable.
    pub fn load() -> anyhow::Result<Self> {
        Ok(Self::load_from(&config_path()?))
    }

    pub fn load_from(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to read config, using defaults"
                );
                return Self::default();
            }
        };
        match serde_json::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config, using defaults"
                );
                Self::default()
            }
        }
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        set_permissions_0600(path);
        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    /// The progress socket URL to connect to.
    pub fn progress_url(&self) -> String {
        if self.progress_url.is_empty() {
            constants::progress_url(&self.server_url)
        } else {
            self.progress_url.clone()
        }
    }

    pub fn reconnect_config(&self) -> ReconnectConfig {
        ReconnectConfig {
            interval: Duration::from_secs(self.reconnect_interval_secs),
            max_attempts: self.max_reconnect_attempts,
        }
    }
}

fn set_permissions_0600(path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600));
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
}

pub fn config_path() -> anyhow::Result<PathBuf> {
    Ok(config_base_dir()?.join("vidrelay").join("config.json"))
}

/// Where the session cookie is persisted.
pub fn session_path() -> anyhow::Result<PathBuf> {
    Ok(config_base_dir()?.join("vidrelay").join("session.json"))
}

fn config_base_dir() -> anyhow::Result<PathBuf> {
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(xdg));
    }

    #[cfg(target_os = "windows")]
    {
        let appdata = std::env::var("APPDATA")
            .map_err(|_| anyhow::anyhow!("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata))
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME is not set"))?;
        Ok(PathBuf::from(home).join(".config"))
    }
}
