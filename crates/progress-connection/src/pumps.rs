//! Per-socket tasks moving frames between the WebSocket and the manager.

pub(crate) mod read;
pub(crate) mod write;
