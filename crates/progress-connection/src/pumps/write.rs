//! Outbound side of the progress socket.
//!
//! The client never sends data of its own; the only frames written are pong
//! replies queued by the read pump and the final close frame.

use futures_util::SinkExt;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::connector::FrameSink;

/// Writes queued frames until cancelled or every sender is gone, then sends
/// exactly one close frame.
pub(crate) async fn write_pump(
    mut sink: FrameSink,
    mut outbound: mpsc::Receiver<Message>,
    cancel: CancellationToken,
) {
    loop {
        let frame = tokio::select! {
            _ = cancel.cancelled() => break,
            frame = outbound.recv() => frame,
        };
        let Some(frame) = frame else {
            break;
        };
        if let Err(e) = sink.send(frame).await {
            warn!(error = %e, "progress socket write failed");
            break;
        }
    }

    match sink.send(Message::Close(None)).await {
        Ok(()) => trace!("close frame sent"),
        Err(e) => debug!(error = %e, "close frame not sent"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fake_socket;

    #[tokio::test]
    async fn cancel_sends_close_and_releases_sink() {
        let (sink, _stream, mut remote) = fake_socket();
        let (_tx, outbound) = mpsc::channel(4);
        let cancel = CancellationToken::new();

        let pump = tokio::spawn(write_pump(sink, outbound, cancel.clone()));
        cancel.cancel();
        pump.await.unwrap();

        assert!(matches!(remote.outbound.recv().await, Some(Message::Close(None))));
        // The sink was dropped with the pump.
        assert!(remote.outbound.recv().await.is_none());
    }

    #[tokio::test]
    async fn queued_pong_goes_out_before_close() {
        let (sink, _stream, mut remote) = fake_socket();
        let (tx, outbound) = mpsc::channel(4);
        tx.send(Message::Pong(vec![9u8].into())).await.unwrap();
        drop(tx);

        write_pump(sink, outbound, CancellationToken::new()).await;

        assert!(matches!(remote.outbound.recv().await, Some(Message::Pong(_))));
        assert_eq!(remote.count_close_frames().await, 1);
    }
}
