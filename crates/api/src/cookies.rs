//! Persisted session cookie.
//!
//! The server keeps credentials keyed by the `client_id` cookie, so saving
//! the cookie is enough to stay signed in across runs.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::ApiClient;
use crate::error::CookieStoreError;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct SessionFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    client_id: Option<String>,
}

/// JSON file holding the session cookie, cached in memory.
pub struct SessionStore {
    path: PathBuf,
    session: RwLock<SessionFile>,
}

impl SessionStore {
    /// Opens the store at `path`, loading the saved cookie if the file exists.
    pub fn open(path: PathBuf) -> Result<Self, CookieStoreError> {
        let session = load_session(&path)?;
        Ok(Self {
            path,
            session: RwLock::new(session),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The saved cookie value, if any.
    pub fn cookie(&self) -> Option<String> {
        self.session.read().ok()?.client_id.clone()
    }

    /// Replaces the saved cookie and writes the file.
    pub fn save(&self, cookie: &str) -> Result<(), CookieStoreError> {
        if let Ok(mut session) = self.session.write() {
            session.client_id = Some(cookie.to_string());
        }
        self.persist()
    }

    /// Forgets the cookie (sign out).
    pub fn clear(&self) -> Result<(), CookieStoreError> {
        if let Ok(mut session) = self.session.write() {
            session.client_id = None;
        }
        self.persist()
    }

    /// Loads the saved cookie into `client`. Returns `false` if none was saved.
    pub fn restore_into(&self, client: &ApiClient) -> bool {
        match self.cookie() {
            Some(cookie) => {
                client.set_session_cookie(&cookie);
                true
            }
            None => false,
        }
    }

    /// Saves the cookie currently held by `client`. Returns `false` if the
    /// client has none.
    pub fn save_from(&self, client: &ApiClient) -> Result<bool, CookieStoreError> {
        match client.session_cookie() {
            Some(cookie) => {
                self.save(&cookie)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn persist(&self) -> Result<(), CookieStoreError> {
        let session = self
            .session
            .read()
            .map(|s| s.clone())
            .unwrap_or_default();
        let json = serde_json::to_string_pretty(&session)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, json)?;
        restrict_permissions(&self.path)?;
        debug!(path = ?self.path, saved = session.client_id.is_some(), "persisted session");
        Ok(())
    }
}

fn load_session(path: &Path) -> Result<SessionFile, CookieStoreError> {
    if !path.exists() {
        return Ok(SessionFile::default());
    }
    let data = std::fs::read_to_string(path)?;
    let session: SessionFile = serde_json::from_str(&data)?;
    debug!(path = ?path, saved = session.client_id.is_some(), "loaded session");
    Ok(session)
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
