//! The "session active" signal consulted when the socket closes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

/// Tells the manager whether the user is signed in and expects live
/// updates. Reconnects are only scheduled while this is `true`.
pub trait SessionSignal: Send + Sync + 'static {
    fn is_active(&self) -> bool;
}

impl SessionSignal for watch::Receiver<bool> {
    fn is_active(&self) -> bool {
        *self.borrow()
    }
}

impl SessionSignal for Arc<AtomicBool> {
    fn is_active(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

/// A fixed signal, for shells that manage the session elsewhere.
impl SessionSignal for bool {
    fn is_active(&self) -> bool {
        *self
    }
}
