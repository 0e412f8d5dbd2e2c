//! A single open progress socket.
//!
//! Runs the read and write pumps for one WebSocket and reports what the
//! socket sees through a callback. The manager owns at most one of these.

use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;

use vidrelay_protocol::ProgressEvent;

use crate::connector::{FrameSink, FrameStream};

/// Errors from opening the progress socket.
#[derive(Debug, thiserror::Error)]
pub enum WsError {
    #[error("WebSocket error: {0}")]
    Ws(#[from] tungstenite::Error),

    #[error("invalid cookie header: {0}")]
    InvalidCookie(String),
}

/// What the read pump observed on the socket.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SocketEvent {
    /// A text frame parsed as a progress update.
    Progress(ProgressEvent),
    /// The transport reported an error. A `Closed` always follows.
    Error(String),
    /// The socket closed on its own (remote close, stream end, or error).
    Closed,
}

/// Callback receiving socket events.
pub(crate) type EventCallback = Box<dyn Fn(SocketEvent) + Send + Sync>;

/// Capacity of the outbound frame queue.
const WRITE_QUEUE: usize = 16;

/// An open progress socket with its pumps running.
///
/// Closing (or dropping) the client never produces a
/// [`SocketEvent::Closed`]; only closures the client did not ask for do.
pub struct WsClient {
    cancel: CancellationToken,
    _read_handle: tokio::task::JoinHandle<()>,
}

impl WsClient {
    /// Starts the pumps on an already-open socket.
    pub(crate) fn spawn(sink: FrameSink, stream: FrameStream, on_event: EventCallback) -> Self {
        let (write_tx, write_rx) = mpsc::channel::<tungstenite::Message>(WRITE_QUEUE);
        let cancel = CancellationToken::new();

        // The write pump is left to finish on its own so the close frame
        // still goes out after the client is dropped.
        tokio::spawn(crate::pumps::write::write_pump(
            sink,
            write_rx,
            cancel.clone(),
        ));

        let read_handle = tokio::spawn(crate::pumps::read::read_pump(
            stream,
            on_event,
            write_tx,
            cancel.clone(),
        ));

        Self {
            cancel,
            _read_handle: read_handle,
        }
    }

    /// Closes the socket. Sends a single close frame; idempotent.
    pub fn close(&self) {
        self.cancel.cancel();
    }
}

impl Drop for WsClient {
    fn drop(&mut self) {
        self.cancel.cancel();
        self._read_handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fake_socket;

    #[test]
    fn ws_error_display() {
        let err = WsError::InvalidCookie("bad byte".into());
        assert_eq!(err.to_string(), "invalid cookie header: bad byte");
    }

    #[tokio::test]
    async fn close_sends_one_close_frame() {
        let (sink, stream, mut remote) = fake_socket();
        let client = WsClient::spawn(sink, stream, Box::new(|_| {}));

        client.close();
        client.close();
        drop(client);

        let mut closes = 0;
        while let Some(msg) = remote.outbound.recv().await {
            if matches!(msg, tungstenite::Message::Close(_)) {
                closes += 1;
            }
        }
        assert_eq!(closes, 1);
    }

    #[tokio::test]
    async fn forwards_progress_and_remote_close() {
        let (sink, stream, mut remote) = fake_socket();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _client = WsClient::spawn(
            sink,
            stream,
            Box::new(move |ev| {
                let _ = tx.send(ev);
            }),
        );

        remote.send_text(r#"{"status":"finished","video_id":"video_1"}"#);
        remote.close_remote();

        assert_eq!(
            rx.recv().await,
            Some(SocketEvent::Progress(ProgressEvent::Finished {
                video_id: "video_1".into(),
                progress: None,
            }))
        );
        assert_eq!(rx.recv().await, Some(SocketEvent::Closed));
    }
}
