//! Opening the progress socket.
//!
//! The manager only sees a [`Connector`], so the transport can be swapped
//! (tests use an in-memory one). [`WsConnector`] is the tokio-tungstenite
//! implementation and can relay the HTTP session cookie into the handshake.

use std::pin::Pin;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;
use futures_util::{Sink, StreamExt};
use tokio_tungstenite::tungstenite;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{HeaderValue, header};
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tracing::debug;

use vidrelay_protocol::constants::WS_MAX_MESSAGE_SIZE;

use crate::ws_client::WsError;

/// Outbound half of an open socket.
pub type FrameSink = Pin<Box<dyn Sink<tungstenite::Message, Error = tungstenite::Error> + Send>>;

/// Inbound half of an open socket.
pub type FrameStream = BoxStream<'static, Result<tungstenite::Message, tungstenite::Error>>;

/// Supplies the `Cookie` header value for the handshake, if any.
pub type CookieSource = Arc<dyn Fn() -> Option<String> + Send + Sync>;

/// Opens sockets to the progress endpoint.
pub trait Connector: Send + Sync + 'static {
    /// Performs the handshake and returns the split socket.
    fn connect(&self, url: &str) -> BoxFuture<'static, Result<(FrameSink, FrameStream), WsError>>;
}

/// WebSocket connector backed by tokio-tungstenite.
#[derive(Clone, Default)]
pub struct WsConnector {
    cookies: Option<CookieSource>,
}

impl WsConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches the session cookie from `source` to every handshake.
    pub fn with_cookies(mut self, source: CookieSource) -> Self {
        self.cookies = Some(source);
        self
    }
}

impl Connector for WsConnector {
    fn connect(&self, url: &str) -> BoxFuture<'static, Result<(FrameSink, FrameStream), WsError>> {
        let url = url.to_string();
        let cookie = self.cookies.as_ref().and_then(|source| source());

        Box::pin(async move {
            let mut request = url.as_str().into_client_request()?;
            if let Some(cookie) = cookie {
                let value = HeaderValue::from_str(&cookie)
                    .map_err(|e| WsError::InvalidCookie(e.to_string()))?;
                request.headers_mut().insert(header::COOKIE, value);
            }

            let mut ws_config = WebSocketConfig::default();
            ws_config.max_message_size = Some(WS_MAX_MESSAGE_SIZE);
            ws_config.max_frame_size = Some(WS_MAX_MESSAGE_SIZE);

            let (ws_stream, response) =
                tokio_tungstenite::connect_async_with_config(request, Some(ws_config), false)
                    .await?;
            debug!(url = %url, status = %response.status(), "progress socket handshake done");

            let (write, read) = ws_stream.split();
            let sink: FrameSink = Box::pin(write);
            Ok((sink, read.boxed()))
        })
    }
}
