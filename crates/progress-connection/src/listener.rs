//! Listener-style consumption of [`ConnectionEvent`]s.

use tokio::sync::mpsc;

use vidrelay_protocol::ProgressEvent;

use crate::types::{ConnectionEvent, ConnectionState};

/// Receives what the connection manager reports.
///
/// Only [`on_message`](Self::on_message) is required; the other hooks
/// default to doing nothing.
pub trait ProgressListener: Send {
    /// A parsed progress frame.
    fn on_message(&mut self, event: ProgressEvent);

    /// A non-fatal transport error.
    fn on_error(&mut self, _error: &str) {}

    /// The socket closed.
    fn on_close(&mut self) {}

    fn on_state(&mut self, _state: ConnectionState) {}

    fn on_reconnecting(&mut self, _attempt: u32, _next_retry_secs: f64) {}

    /// The retry budget ran out. Terminal until the next explicit connect.
    fn on_failed(&mut self, _attempts: u32) {}
}

/// Routes one event to the matching listener hook.
pub fn dispatch<L: ProgressListener + ?Sized>(listener: &mut L, event: ConnectionEvent) {
    match event {
        ConnectionEvent::Progress(ev) => listener.on_message(ev),
        ConnectionEvent::TransportError(e) => listener.on_error(&e),
        ConnectionEvent::Closed => listener.on_close(),
        ConnectionEvent::StateChanged(state) => listener.on_state(state),
        ConnectionEvent::Reconnecting {
            attempt,
            next_retry_secs,
        } => listener.on_reconnecting(attempt, next_retry_secs),
        ConnectionEvent::Failed { attempts } => listener.on_failed(attempts),
    }
}

/// Feeds every event from `events` to `listener` until the manager goes
/// away, then hands the listener back.
pub async fn run_listener<L: ProgressListener>(
    mut events: mpsc::Receiver<ConnectionEvent>,
    mut listener: L,
) -> L {
    while let Some(event) = events.recv().await {
        dispatch(&mut listener, event);
    }
    listener
}
