//! Public types for the progress connection manager.

use std::time::Duration;

use vidrelay_protocol::ProgressEvent;
use vidrelay_protocol::constants::{MAX_RECONNECT_ATTEMPTS, RECONNECT_INTERVAL};

/// Lifecycle state of the progress socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No socket and no pending reconnect.
    Disconnected,
    /// WebSocket handshake in progress.
    Connecting,
    /// Socket open and streaming.
    Connected,
    /// Connection lost, a reconnect attempt is scheduled.
    Reconnecting { attempt: u32 },
    /// Retry budget exhausted. Only an explicit connect leaves this state.
    Failed,
}

impl ConnectionState {
    /// Returns `true` while a socket is open or being opened.
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Connecting | Self::Connected)
    }
}

/// Snapshot of the manager published on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    /// Consecutive reconnect attempts since the last inbound message.
    pub retry_count: u32,
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            retry_count: 0,
        }
    }
}

/// Events emitted by the connection manager.
#[derive(Debug, Clone)]
pub enum ConnectionEvent {
    /// The connection state changed.
    StateChanged(ConnectionState),
    /// A progress frame was received and parsed.
    Progress(ProgressEvent),
    /// Non-fatal transport error; the state changes only on the following close.
    TransportError(String),
    /// The socket closed (or could not be opened).
    Closed,
    /// A reconnect attempt was scheduled.
    Reconnecting { attempt: u32, next_retry_secs: f64 },
    /// The retry budget is exhausted; a manual retry is required.
    Failed { attempts: u32 },
}

/// Reconnection policy: fixed delay, bounded attempts.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before each reconnect attempt.
    pub interval: Duration,
    /// Consecutive attempts allowed without inbound data.
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            interval: RECONNECT_INTERVAL,
            max_attempts: MAX_RECONNECT_ATTEMPTS,
        }
    }
}

impl ReconnectConfig {
    /// Delay before the given attempt (1-based). The delay is the same for
    /// every attempt.
    pub fn delay_for_attempt(&self, _attempt: u32) -> Duration {
        self.interval
    }
}
