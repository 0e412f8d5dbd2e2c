use std::sync::Arc;

use tokio::sync::watch;

use vidrelay_api::{ApiClient, SessionStore};
use vidrelay_progress_connection::{ConnectionManager, WsConnector};

use crate::config::{self, AppConfig};

/// Everything a command needs: config, HTTP client and session.
pub struct AppState {
    pub config: AppConfig,
    pub client: ApiClient,
    pub sessions: Option<SessionStore>,
    /// Whether the user is signed in; gates progress reconnects.
    session_tx: watch::Sender<bool>,
}

impl AppState {
    /// Loads the config, applies `server` as an override and restores the
    /// saved session cookie into the client.
    pub fn init(server: Option<String>) -> anyhow::Result<Self> {
        let mut config = AppConfig::load().unwrap_or_default();
        if let Some(server) = server {
            // An explicit server also moves the progress socket.
            config.server_url = server;
            config.progress_url.clear();
        }

        let client = ApiClient::new(&config.server_url)?;

        let sessions = config::session_path().ok().and_then(|path| {
            SessionStore::open(path)
                .map_err(|e| tracing::warn!("failed to load saved session: {e}"))
                .ok()
        });
        if let Some(store) = &sessions {
            if store.restore_into(&client) {
                tracing::debug!("restored saved session");
            }
        }

        let (session_tx, _) = watch::channel(false);
        Ok(Self {
            config,
            client,
            sessions,
            session_tx,
        })
    }

    pub fn set_authenticated(&self, active: bool) {
        self.session_tx.send_replace(active);
    }

    /// Saves the client's current session cookie, if it has one.
    pub fn persist_session(&self) {
        let Some(store) = &self.sessions else {
            return;
        };
        match store.save_from(&self.client) {
            Ok(true) => tracing::debug!(path = %store.path().display(), "session saved"),
            Ok(false) => tracing::warn!("server did not set a session cookie"),
            Err(e) => tracing::warn!("failed to save session: {e}"),
        }
    }

    /// Creates a manager for the progress socket that sends the client's
    /// cookies with every handshake.
    pub fn progress_connection(&self) -> ConnectionManager {
        let client = self.client.clone();
        let connector = WsConnector::new().with_cookies(Arc::new(move || client.cookie_header()));
        ConnectionManager::with_connector(
            self.config.progress_url(),
            self.session_tx.subscribe(),
            Arc::new(connector),
            self.config.reconnect_config(),
        )
    }
}
