//! In-memory sockets and connector for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures_util::future::BoxFuture;
use futures_util::{StreamExt, sink, stream};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite;

use crate::connector::{Connector, FrameSink, FrameStream};
use crate::ws_client::WsError;

type Frame = Result<tungstenite::Message, tungstenite::Error>;

/// The server's end of a fake socket.
pub(crate) struct RemoteEnd {
    frames: Option<mpsc::UnboundedSender<Frame>>,
    /// Everything the client wrote, including the close frame.
    pub(crate) outbound: mpsc::UnboundedReceiver<tungstenite::Message>,
    pub(crate) opened_at: Instant,
}

impl RemoteEnd {
    pub(crate) fn send_text(&self, text: &str) {
        if let Some(frames) = &self.frames {
            let _ = frames.send(Ok(tungstenite::Message::Text(text.to_string().into())));
        }
    }

    pub(crate) fn send_error(&self) {
        if let Some(frames) = &self.frames {
            let _ = frames.send(Err(tungstenite::Error::ConnectionClosed));
        }
    }

    /// Ends the inbound stream, as when the server goes away.
    pub(crate) fn close_remote(&mut self) {
        self.frames = None;
    }

    /// Returns how many close frames the client sent, waiting until the
    /// client's write side is gone.
    pub(crate) async fn count_close_frames(&mut self) -> usize {
        let mut closes = 0;
        while let Some(msg) = self.outbound.recv().await {
            if matches!(msg, tungstenite::Message::Close(_)) {
                closes += 1;
            }
        }
        closes
    }
}

/// Builds a connected sink/stream pair and the remote end driving it.
pub(crate) fn fake_socket() -> (FrameSink, FrameStream, RemoteEnd) {
    let (frames_tx, frames_rx) = mpsc::unbounded_channel::<Frame>();
    let (out_tx, out_rx) = mpsc::unbounded_channel::<tungstenite::Message>();

    let stream = stream::unfold(frames_rx, |mut rx| async move {
        rx.recv().await.map(|frame| (frame, rx))
    })
    .boxed();

    let sink: FrameSink = Box::pin(sink::unfold(
        out_tx,
        |tx, msg: tungstenite::Message| async move {
            let _ = tx.send(msg);
            Ok::<_, tungstenite::Error>(tx)
        },
    ));

    let remote = RemoteEnd {
        frames: Some(frames_tx),
        outbound: out_rx,
        opened_at: Instant::now(),
    };
    (sink, stream, remote)
}

/// Connector handing every accepted socket's remote end to the test.
pub(crate) struct FakeConnector {
    remotes: mpsc::UnboundedSender<RemoteEnd>,
    refuse: AtomicUsize,
    attempts: Mutex<Vec<Instant>>,
}

impl FakeConnector {
    pub(crate) fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<RemoteEnd>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let connector = Arc::new(Self {
            remotes: tx,
            refuse: AtomicUsize::new(0),
            attempts: Mutex::new(Vec::new()),
        });
        (connector, rx)
    }

    /// Makes the next `n` handshakes fail.
    pub(crate) fn refuse_next(&self, n: usize) {
        self.refuse.store(n, Ordering::SeqCst);
    }

    /// Times of every handshake, accepted or refused.
    pub(crate) fn attempt_times(&self) -> Vec<Instant> {
        self.attempts.lock().unwrap().clone()
    }

    pub(crate) fn attempts(&self) -> usize {
        self.attempts.lock().unwrap().len()
    }
}

impl Connector for FakeConnector {
    fn connect(&self, _url: &str) -> BoxFuture<'static, Result<(FrameSink, FrameStream), WsError>> {
        self.attempts.lock().unwrap().push(Instant::now());

        let refused = self
            .refuse
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refused {
            return Box::pin(async { Err(WsError::Ws(tungstenite::Error::ConnectionClosed)) });
        }

        let (sink, stream, remote) = fake_socket();
        let _ = self.remotes.send(remote);
        Box::pin(async move { Ok((sink, stream)) })
    }
}
