use vidrelay_progress_connection::{ConnectionState, run_listener};

use crate::commands::require_auth;
use crate::state::AppState;
use crate::terminal::TerminalListener;

/// Prints progress until Ctrl-C or until the connection gives up.
pub async fn watch(state: &AppState) -> anyhow::Result<()> {
    require_auth(state).await?;

    let manager = state.progress_connection();
    let Some(events) = manager.take_events().await else {
        anyhow::bail!("event stream already taken");
    };
    let printer = tokio::spawn(run_listener(
        events,
        TerminalListener::new(std::io::stdout()),
    ));

    let mut status = manager.watch_status();
    manager.connect();
    tracing::info!(url = manager.url(), "watching progress");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = status.wait_for(|s| s.state == ConnectionState::Failed) => {}
    }

    manager.shutdown().await;
    drop(manager);
    let listener = printer.await?;
    if listener.gave_up() {
        anyhow::bail!("progress connection failed");
    }
    Ok(())
}
