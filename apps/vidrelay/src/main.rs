mod cli;
mod commands;
mod config;
mod state;
mod terminal;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,vidrelay=debug")),
        )
        .init();

    let cli = Cli::parse();
    let state = AppState::init(cli.server)?;

    match cli.command {
        Command::Login(args) => commands::auth::login(&state, args).await,
        Command::Logout => commands::auth::logout(&state),
        Command::Status => commands::auth::status(&state).await,
        Command::Watch => commands::watch::watch(&state).await,
        Command::Download(args) => commands::download::download(&state, args).await,
    }
}
