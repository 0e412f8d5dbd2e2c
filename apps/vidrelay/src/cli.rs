use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

use vidrelay_protocol::DownloadRequest;

/// Drive the vidrelay download server from the terminal.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Server base URL (overrides the config file).
    #[arg(long, global = true, value_name = "URL")]
    pub server: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Sign in through the browser.
    Login(LoginArgs),
    /// Forget the saved session.
    Logout,
    /// Show whether the saved session is valid.
    Status,
    /// Print download progress until interrupted.
    Watch,
    /// Ask the server to download videos and follow their progress.
    Download(DownloadArgs),
}

#[derive(Debug, Clone, Args)]
pub struct LoginArgs {
    /// Callback URL the browser landed on. Read from stdin when omitted.
    #[arg(long, value_name = "URL")]
    pub callback_url: Option<String>,

    /// Do not open a browser; only print the login URL.
    #[arg(long, action = ArgAction::SetTrue)]
    pub no_browser: bool,
}

#[derive(Debug, Clone, Args)]
pub struct DownloadArgs {
    /// Destination folder on the server host.
    #[arg(short, long, value_hint = ValueHint::DirPath)]
    pub folder: Option<PathBuf>,

    /// Search query.
    #[arg(short, long)]
    pub query: Option<String>,

    /// Video category ID to restrict the search to.
    #[arg(long)]
    pub category: Option<String>,

    /// Number of videos per source.
    #[arg(short = 'n', long, default_value_t = 5)]
    pub count: u32,

    /// Include recommended videos.
    #[arg(long, action = ArgAction::SetTrue)]
    pub recommended: bool,

    /// Include the Watch Later playlist.
    #[arg(long, action = ArgAction::SetTrue)]
    pub watch_later: bool,

    /// Include unwatched uploads from subscriptions.
    #[arg(long, action = ArgAction::SetTrue)]
    pub unwatched: bool,
}

impl DownloadArgs {
    /// Builds the request, taking the folder from `default_folder` when the
    /// flag is absent.
    pub fn to_request(&self, default_folder: &str) -> DownloadRequest {
        let folder = self
            .folder
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|| default_folder.to_string());
        DownloadRequest {
            query: self.query.clone(),
            category: self.category.clone(),
            num_videos: self.count,
            folder,
            use_recommended: self.recommended,
            use_watch_later: self.watch_later,
            use_unwatched: self.unwatched,
        }
        .normalized()
    }
}
