//! Inbound side of the progress socket: parses progress frames and reports socket events.

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use vidrelay_protocol::ProgressEvent;
use vidrelay_protocol::constants::WS_MAX_MESSAGE_SIZE;

use crate::ws_client::{EventCallback, SocketEvent};

/// Reads frames until the socket closes or the pump is cancelled.
///
/// An organic end (close frame, stream end, read error) is reported as
/// [`SocketEvent::Closed`]. Cancellation is a deliberate close and reports
/// nothing.
pub(crate) async fn read_pump<S>(
    mut read: S,
    on_event: EventCallback,
    write_tx: mpsc::Sender<tungstenite::Message>,
    cancel: CancellationToken,
) where
    S: StreamExt<Item = Result<tungstenite::Message, tungstenite::Error>> + Unpin,
{
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,

            msg = read.next() => {
                match msg {
                    Some(Ok(msg)) => match msg {
                        tungstenite::Message::Text(text) => {
                            handle_text_message(&text, &on_event);
                        }
                        tungstenite::Message::Ping(data) => {
                            trace!("received ping, sending pong");
                            let _ = write_tx.send(tungstenite::Message::Pong(data)).await;
                        }
                        tungstenite::Message::Pong(_) => {
                            trace!("received pong");
                        }
                        tungstenite::Message::Close(frame) => {
                            debug!(?frame, "received close frame");
                            break;
                        }
                        // The server only sends text.
                        _ => {}
                    },
                    Some(Err(e)) => {
                        warn!("progress socket read error: {e}");
                        on_event(SocketEvent::Error(e.to_string()));
                        break;
                    }
                    None => {
                        debug!("progress socket stream ended");
                        break;
                    }
                }
            }
        }
    }

    on_event(SocketEvent::Closed);
}

/// Parses a text frame and forwards it. Malformed and oversized frames are
/// logged and dropped.
fn handle_text_message(text: &str, on_event: &EventCallback) {
    if text.len() > WS_MAX_MESSAGE_SIZE {
        warn!("progress frame too large ({} bytes), dropping", text.len());
        return;
    }

    match ProgressEvent::from_json(text) {
        Ok(event) => {
            trace!(video = %event.video_id(), "received progress frame");
            on_event(SocketEvent::Progress(event));
        }
        Err(e) => warn!("failed to parse progress frame: {e}"),
    }
}
