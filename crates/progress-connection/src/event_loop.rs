//! The task that owns the progress socket and runs the state machine.
//!
//! Commands from [`ConnectionManager`](crate::ConnectionManager) and
//! everything the socket, handshake and reconnect timer report arrive here
//! and are handled one at a time. Socket-side inputs carry the generation
//! they were started under; anything from a socket, handshake or timer that
//! has since been replaced is dropped.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::connector::{Connector, FrameSink, FrameStream};
use crate::reconnection::{ReconnectTimer, RetryBudget};
use crate::session::SessionSignal;
use crate::types::{ConnectionEvent, ConnectionState, ConnectionStatus, ReconnectConfig};
use crate::ws_client::{SocketEvent, WsClient};

/// Requests from the manager handle.
pub(crate) enum Command {
    Connect,
    EnsureConnected,
    Disconnect(oneshot::Sender<()>),
    Shutdown(oneshot::Sender<()>),
}

/// Inputs produced by tasks the loop spawned.
enum Internal {
    Opened {
        generation: u64,
        sink: FrameSink,
        stream: FrameStream,
    },
    ConnectFailed {
        generation: u64,
        error: String,
    },
    Socket {
        generation: u64,
        event: SocketEvent,
    },
    TimerFired {
        generation: u64,
    },
}

pub(crate) struct EventLoop {
    url: String,
    config: ReconnectConfig,
    connector: Arc<dyn Connector>,
    session: Box<dyn SessionSignal>,
    events_tx: mpsc::Sender<ConnectionEvent>,
    status_tx: watch::Sender<ConnectionStatus>,
    inbox_tx: mpsc::UnboundedSender<Internal>,
    inbox_rx: mpsc::UnboundedReceiver<Internal>,

    state: ConnectionState,
    retries: RetryBudget,
    /// Bumped whenever the current socket or handshake is abandoned.
    generation: u64,
    client: Option<WsClient>,
    handshake: Option<JoinHandle<()>>,
    timer: Option<ReconnectTimer>,
    timer_generation: u64,
}

impl EventLoop {
    pub(crate) fn new(
        url: String,
        config: ReconnectConfig,
        connector: Arc<dyn Connector>,
        session: Box<dyn SessionSignal>,
        events_tx: mpsc::Sender<ConnectionEvent>,
        status_tx: watch::Sender<ConnectionStatus>,
    ) -> Self {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let retries = RetryBudget::new(config.max_attempts);
        Self {
            url,
            config,
            connector,
            session,
            events_tx,
            status_tx,
            inbox_tx,
            inbox_rx,
            state: ConnectionState::Disconnected,
            retries,
            generation: 0,
            client: None,
            handshake: None,
            timer: None,
            timer_generation: 0,
        }
    }

    /// Runs until shutdown or until the manager handle is dropped.
    pub(crate) async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        loop {
            tokio::select! {
                cmd = commands.recv() => match cmd {
                    Some(Command::Shutdown(ack)) => {
                        self.disconnect();
                        let _ = ack.send(());
                        break;
                    }
                    Some(cmd) => self.handle_command(cmd),
                    None => {
                        self.disconnect();
                        break;
                    }
                },
                Some(input) = self.inbox_rx.recv() => self.handle_internal(input),
            }
        }
        debug!(url = %self.url, "progress connection loop stopped");
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Connect => {
                self.retries.reset();
                self.start_connect();
            }
            Command::EnsureConnected => {
                if self.state.is_live() {
                    trace!(state = ?self.state, "already connected, nothing to do");
                } else {
                    self.retries.reset();
                    self.start_connect();
                }
            }
            Command::Disconnect(ack) => {
                self.disconnect();
                let _ = ack.send(());
            }
            // Handled by `run`, which also stops the loop.
            Command::Shutdown(ack) => {
                self.disconnect();
                let _ = ack.send(());
            }
        }
    }

    fn handle_internal(&mut self, input: Internal) {
        match input {
            Internal::Opened {
                generation,
                sink,
                stream,
            } => {
                if generation != self.generation {
                    debug!(generation, "dropping socket from an abandoned handshake");
                    return;
                }
                self.handshake = None;
                let inbox = self.inbox_tx.clone();
                self.client = Some(WsClient::spawn(
                    sink,
                    stream,
                    Box::new(move |event| {
                        let _ = inbox.send(Internal::Socket { generation, event });
                    }),
                ));
                info!(url = %self.url, "progress socket connected");
                self.set_state(ConnectionState::Connected);
            }
            Internal::ConnectFailed { generation, error } => {
                if generation != self.generation {
                    return;
                }
                self.handshake = None;
                warn!(url = %self.url, error = %error, "progress socket connect failed");
                self.emit(ConnectionEvent::TransportError(error));
                self.on_closed();
            }
            Internal::Socket { generation, event } => {
                if generation != self.generation {
                    trace!(generation, "ignoring event from a replaced socket");
                    return;
                }
                match event {
                    SocketEvent::Progress(progress) => {
                        // Live traffic proves the connection; restore the budget.
                        self.retries.reset();
                        self.publish_status();
                        self.emit(ConnectionEvent::Progress(progress));
                    }
                    SocketEvent::Error(error) => {
                        self.emit(ConnectionEvent::TransportError(error));
                    }
                    SocketEvent::Closed => {
                        self.client = None;
                        self.generation += 1;
                        info!(url = %self.url, "progress socket closed");
                        self.on_closed();
                    }
                }
            }
            Internal::TimerFired { generation } => {
                let current = self.timer.as_ref().map(ReconnectTimer::generation);
                if current != Some(generation) {
                    trace!(generation, "ignoring stale reconnect timer");
                    return;
                }
                self.timer = None;
                if matches!(self.state, ConnectionState::Reconnecting { .. }) {
                    self.start_connect();
                }
            }
        }
    }

    /// Replaces whatever socket exists with a fresh handshake.
    fn start_connect(&mut self) {
        self.cancel_timer();
        self.teardown_socket();
        self.set_state(ConnectionState::Connecting);

        let generation = self.generation;
        let connector = self.connector.clone();
        let url = self.url.clone();
        let inbox = self.inbox_tx.clone();
        info!(url = %url, attempt = self.retries.attempts(), "connecting to progress endpoint");

        self.handshake = Some(tokio::spawn(async move {
            let input = match connector.connect(&url).await {
                Ok((sink, stream)) => Internal::Opened {
                    generation,
                    sink,
                    stream,
                },
                Err(e) => Internal::ConnectFailed {
                    generation,
                    error: e.to_string(),
                },
            };
            let _ = inbox.send(input);
        }));
    }

    /// Socket closed or never opened: decide between reconnecting, giving
    /// up, or going idle.
    fn on_closed(&mut self) {
        self.emit(ConnectionEvent::Closed);

        if !self.session.is_active() {
            debug!("session inactive, not reconnecting");
            self.retries.reset();
            self.set_state(ConnectionState::Disconnected);
            return;
        }

        match self.retries.next_attempt() {
            Some(attempt) => {
                let delay = self.config.delay_for_attempt(attempt);
                let delay_secs = delay.as_secs_f64();
                self.schedule_reconnect(delay);
                self.set_state(ConnectionState::Reconnecting { attempt });
                self.emit(ConnectionEvent::Reconnecting {
                    attempt,
                    next_retry_secs: delay_secs,
                });
                info!(
                    attempt,
                    max = self.retries.max(),
                    delay_secs = format_args!("{delay_secs:.1}"),
                    "reconnecting"
                );
            }
            None => {
                let attempts = self.retries.attempts();
                warn!(attempts, url = %self.url, "giving up on progress endpoint");
                self.set_state(ConnectionState::Failed);
                self.emit(ConnectionEvent::Failed { attempts });
            }
        }
    }

    fn schedule_reconnect(&mut self, delay: std::time::Duration) {
        self.cancel_timer();
        self.timer_generation += 1;
        let generation = self.timer_generation;
        let inbox = self.inbox_tx.clone();
        self.timer = Some(ReconnectTimer::schedule(generation, delay, move || {
            let _ = inbox.send(Internal::TimerFired { generation });
        }));
    }

    fn disconnect(&mut self) {
        self.cancel_timer();
        self.teardown_socket();
        self.retries.reset();
        self.set_state(ConnectionState::Disconnected);
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            trace!(generation = timer.generation(), "cancelling reconnect timer");
            timer.cancel();
        }
    }

    /// Closes the current socket (once) and abandons any handshake.
    fn teardown_socket(&mut self) {
        if let Some(handshake) = self.handshake.take() {
            handshake.abort();
        }
        if let Some(client) = self.client.take() {
            debug!(url = %self.url, "closing progress socket");
            client.close();
        }
        self.generation += 1;
    }

    fn set_state(&mut self, state: ConnectionState) {
        if self.state != state {
            trace!(from = ?self.state, to = ?state, "connection state change");
            self.state = state;
            self.emit(ConnectionEvent::StateChanged(state));
        }
        self.publish_status();
    }

    fn publish_status(&self) {
        self.status_tx.send_replace(ConnectionStatus {
            state: self.state,
            retry_count: self.retries.attempts(),
        });
    }

    fn emit(&self, event: ConnectionEvent) {
        match self.events_tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(event)) => {
                warn!(?event, "event queue full, dropping connection event");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }
}
