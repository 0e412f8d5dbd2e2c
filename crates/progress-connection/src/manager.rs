//! Handle to the progress connection.
//!
//! The manager itself holds no connection state; it forwards commands to
//! the event loop task and exposes the status it publishes.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc, oneshot, watch};
use tracing::debug;

use crate::connector::{Connector, WsConnector};
use crate::event_loop::{Command, EventLoop};
use crate::session::SessionSignal;
use crate::types::{ConnectionEvent, ConnectionStatus, ReconnectConfig};

/// Capacity of the event channel handed out by [`take_events`](ConnectionManager::take_events).
const EVENT_QUEUE: usize = 256;

/// Connection manager for the `/progress` WebSocket.
///
/// Dropping the manager stops the event loop and closes the socket.
pub struct ConnectionManager {
    url: String,
    commands: mpsc::UnboundedSender<Command>,
    status_rx: watch::Receiver<ConnectionStatus>,
    events_rx: Mutex<Option<mpsc::Receiver<ConnectionEvent>>>,
}

impl ConnectionManager {
    /// Creates a manager using the real WebSocket connector and the default
    /// reconnect policy. Must be called within a Tokio runtime.
    pub fn new(url: impl Into<String>, session: impl SessionSignal) -> Self {
        Self::with_connector(
            url,
            session,
            Arc::new(WsConnector::new()),
            ReconnectConfig::default(),
        )
    }

    /// Creates a manager with an explicit connector and reconnect policy.
    pub fn with_connector(
        url: impl Into<String>,
        session: impl SessionSignal,
        connector: Arc<dyn Connector>,
        config: ReconnectConfig,
    ) -> Self {
        let url = url.into();
        let (commands, commands_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE);
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::default());

        let event_loop = EventLoop::new(
            url.clone(),
            config,
            connector,
            Box::new(session),
            events_tx,
            status_tx,
        );
        tokio::spawn(event_loop.run(commands_rx));

        Self {
            url,
            commands,
            status_rx,
            events_rx: Mutex::new(Some(events_rx)),
        }
    }

    /// Opens the socket, replacing any existing one, and restores the full
    /// retry budget. Also the way out of [`Failed`](crate::ConnectionState::Failed).
    pub fn connect(&self) {
        self.send(Command::Connect);
    }

    /// Like [`connect`](Self::connect), but does nothing while a socket is
    /// already open or opening.
    pub fn ensure_connected(&self) {
        self.send(Command::EnsureConnected);
    }

    /// Closes the socket, cancels any pending reconnect and resets the retry
    /// count. Returns once the loop has done so.
    pub async fn disconnect(&self) {
        let (ack, done) = oneshot::channel();
        self.send(Command::Disconnect(ack));
        let _ = done.await;
    }

    /// Disconnects and stops the event loop. Later commands are ignored.
    pub async fn shutdown(&self) {
        let (ack, done) = oneshot::channel();
        self.send(Command::Shutdown(ack));
        let _ = done.await;
    }

    /// Current state and retry count.
    pub fn status(&self) -> ConnectionStatus {
        *self.status_rx.borrow()
    }

    /// Receiver notified on every status change.
    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status_rx.clone()
    }

    /// Takes the event receiver. Can only be called once.
    pub async fn take_events(&self) -> Option<mpsc::Receiver<ConnectionEvent>> {
        self.events_rx.lock().await.take()
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn send(&self, cmd: Command) {
        if self.commands.send(cmd).is_err() {
            debug!(url = %self.url, "connection loop already stopped");
        }
    }
}
