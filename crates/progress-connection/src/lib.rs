//! Connection manager for the download server's progress socket.
//!
//! Owns a single WebSocket to the `/progress` endpoint, forwards parsed
//! progress frames to a listener, and reconnects after unexpected closure
//! with a fixed delay and a bounded retry budget.

pub mod connector;
mod event_loop;
pub mod listener;
pub mod manager;
mod pumps;
pub(crate) mod reconnection;
pub mod session;
pub mod types;
pub mod ws_client;

#[cfg(test)]
pub(crate) mod testing;

pub use connector::{Connector, CookieSource, FrameSink, FrameStream, WsConnector};
pub use listener::{ProgressListener, run_listener};
pub use manager::ConnectionManager;
pub use session::SessionSignal;
pub use types::{ConnectionEvent, ConnectionState, ConnectionStatus, ReconnectConfig};
pub use ws_client::WsError;
