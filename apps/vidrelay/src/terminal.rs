//! Prints connection events as status lines.

use std::collections::BTreeMap;
use std::io::Write;

use vidrelay_progress_connection::{ConnectionState, ProgressListener};
use vidrelay_protocol::ProgressEvent;

/// Per-video outcome counts gathered while printing.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Tally {
    pub finished: usize,
    pub failed: usize,
}

/// [`ProgressListener`] writing one line per event to `out`.
pub struct TerminalListener<W: Write + Send> {
    out: W,
    /// Last terminal event per video; the server may repeat `finished`.
    outcomes: BTreeMap<String, bool>,
    gave_up: bool,
}

impl<W: Write + Send> TerminalListener<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            outcomes: BTreeMap::new(),
            gave_up: false,
        }
    }

    pub fn tally(&self) -> Tally {
        let finished = self.outcomes.values().filter(|ok| **ok).count();
        Tally {
            finished,
            failed: self.outcomes.len() - finished,
        }
    }

    /// Returns `true` once the connection ran out of retries.
    pub fn gave_up(&self) -> bool {
        self.gave_up
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        let _ = writeln!(self.out, "Status: {text}");
        let _ = self.out.flush();
    }
}

impl<W: Write + Send> ProgressListener for TerminalListener<W> {
    fn on_message(&mut self, event: ProgressEvent) {
        let line = match event.percent() {
            Some(pct) => format!("[{}] {pct:5.1}% {}", event.video_id(), event.status_line()),
            None => format!("[{}] {}", event.video_id(), event.status_line()),
        };
        if event.is_terminal() {
            let ok = matches!(event, ProgressEvent::Finished { .. });
            self.outcomes.insert(event.video_id().to_string(), ok);
        }
        self.line(&line);
    }

    fn on_error(&mut self, error: &str) {
        tracing::debug!(error, "progress socket error");
    }

    fn on_state(&mut self, state: ConnectionState) {
        match state {
            ConnectionState::Connected => self.line("Connected to progress updates"),
            ConnectionState::Disconnected => self.line("Disconnected"),
            ConnectionState::Connecting | ConnectionState::Reconnecting { .. } => {}
            ConnectionState::Failed => {}
        }
    }

    fn on_reconnecting(&mut self, attempt: u32, next_retry_secs: f64) {
        self.line(&format!(
            "Connection lost, retrying in {next_retry_secs:.0}s (attempt {attempt})"
        ));
    }

    fn on_failed(&mut self, attempts: u32) {
        self.gave_up = true;
        self.line(&format!(
            "Failed to establish WebSocket connection after {attempts} attempts"
        ));
    }
}
