//! Subcommand implementations.

pub mod auth;
pub mod download;
pub mod watch;

use anyhow::bail;

use crate::state::AppState;

/// Fails unless the saved session is accepted by the server.
pub(crate) async fn require_auth(state: &AppState) -> anyhow::Result<()> {
    if !state.client.check_auth().await? {
        state.set_authenticated(false);
        bail!("not signed in; run `vidrelay login` first");
    }
    state.set_authenticated(true);
    Ok(())
}
