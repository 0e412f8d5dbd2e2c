//! Reconnect policy pieces: the retry budget and the single pending timer.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Counts consecutive reconnect attempts against a ceiling.
///
/// Inbound data resets the count; a socket merely opening does not.
#[derive(Debug, Clone)]
pub(crate) struct RetryBudget {
    attempts: u32,
    max: u32,
}

impl RetryBudget {
    pub(crate) fn new(max: u32) -> Self {
        Self { attempts: 0, max }
    }

    pub(crate) fn attempts(&self) -> u32 {
        self.attempts
    }

    pub(crate) fn max(&self) -> u32 {
        self.max
    }

    pub(crate) fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Claims the next attempt number, or `None` once the ceiling is reached.
    pub(crate) fn next_attempt(&mut self) -> Option<u32> {
        if self.attempts >= self.max {
            return None;
        }
        self.attempts += 1;
        Some(self.attempts)
    }
}

/// A scheduled reconnect. Cancelled explicitly; the generation lets the
/// event loop ignore a firing that raced with cancellation.
pub(crate) struct ReconnectTimer {
    generation: u64,
    cancel: CancellationToken,
}

impl ReconnectTimer {
    /// Runs `on_fire` after `delay` unless cancelled first.
    pub(crate) fn schedule<F>(generation: u64, delay: Duration, on_fire: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    trace!(generation, "reconnect timer cancelled");
                }
                _ = tokio::time::sleep(delay) => on_fire(),
            }
        });
        Self { generation, cancel }
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn cancel(self) {
        self.cancel.cancel();
    }
}
