use std::time::Duration;

use tracing::{debug, warn};
use vidrelay_progress_connection::{ConnectionManager, ConnectionState, run_listener};

use crate::cli::DownloadArgs;
use crate::commands::require_auth;
use crate::state::AppState;
use crate::terminal::TerminalListener;

/// How long a download waits for the progress socket before posting.
const CONNECT_WAIT: Duration = Duration::from_secs(5);

/// Starts a batch on the server and follows its progress until the server
/// answers.
pub async fn download(state: &AppState, args: DownloadArgs) -> anyhow::Result<()> {
    let request = args.to_request(&state.config.download_folder);
    request.validate()?;
    require_auth(state).await?;

    let manager = state.progress_connection();
    let Some(events) = manager.take_events().await else {
        anyhow::bail!("event stream already taken");
    };
    let printer = tokio::spawn(run_listener(
        events,
        TerminalListener::new(std::io::stdout()),
    ));
    manager.ensure_connected();
    // The server only reports to sockets it already knows about.
    if wait_until_settled(&manager, CONNECT_WAIT).await {
        debug!("progress socket ready");
    } else {
        warn!("progress socket not connected; early updates may be missed");
    }

    let result = tokio::select! {
        result = state.client.start_download(&request) => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };

    manager.shutdown().await;
    drop(manager);
    let tally = printer.await?.tally();

    match result {
        Some(Ok(response)) => {
            println!(
                "{} ({} video(s); {} finished, {} failed)",
                response.message, response.total_videos, tally.finished, tally.failed
            );
            Ok(())
        }
        Some(Err(e)) => Err(e.into()),
        None => {
            println!("Interrupted; the server keeps downloading in the background.");
            Ok(())
        }
    }
}

/// Waits until the first handshake has either succeeded or failed. Returns
/// `true` if the socket is connected.
async fn wait_until_settled(manager: &ConnectionManager, limit: Duration) -> bool {
    let mut status = manager.watch_status();
    let settled = status.wait_for(|s| {
        !matches!(
            s.state,
            ConnectionState::Disconnected | ConnectionState::Connecting
        )
    });
    match tokio::time::timeout(limit, settled).await {
        Ok(Ok(current)) => current.state == ConnectionState::Connected,
        _ => false,
    }
}
