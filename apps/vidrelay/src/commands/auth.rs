//! `login`, `logout` and `status`.

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};

use vidrelay_api::{ApiError, AuthProvider, BrowserAuth};
use vidrelay_protocol::AuthStatus;
use vidrelay_protocol::constants::{AUTH_POLL_INTERVAL, AUTH_POLL_MAX_ATTEMPTS};

use crate::cli::LoginArgs;
use crate::state::AppState;

pub async fn login(state: &AppState, args: LoginArgs) -> anyhow::Result<()> {
    let auth = BrowserAuth::new(state.client.clone());
    auth.on_auth_result(Box::new(|result: &Result<AuthStatus, ApiError>| match result {
        Ok(status) => tracing::debug!(message = %status.message, "auth callback accepted"),
        Err(e) => tracing::debug!(error = %e, "auth callback rejected"),
    }));

    let login_url = state.client.auth_url();
    if args.no_browser {
        println!("Open this URL to sign in:\n  {login_url}");
    } else if let Err(e) = auth.begin_auth() {
        tracing::warn!("{e}");
        println!("Could not open a browser. Open this URL to sign in:\n  {login_url}");
    } else {
        println!("Continue signing in in your browser.");
    }

    let callback_url = match args.callback_url {
        Some(url) => url,
        None => {
            println!("Paste the URL the browser ended on (…/auth/callback?code=…):");
            read_line().await?
        }
    };

    auth.complete(callback_url.trim())
        .await
        .context("login failed")?;

    state
        .client
        .wait_for_auth(AUTH_POLL_INTERVAL, AUTH_POLL_MAX_ATTEMPTS)
        .await
        .context("server did not confirm the login")?;
    state.set_authenticated(true);
    state.persist_session();

    let profile = state.client.fetch_profile().await?;
    println!("Signed in as {}", profile.display_name());
    Ok(())
}

pub fn logout(state: &AppState) -> anyhow::Result<()> {
    state.set_authenticated(false);
    if let Some(store) = &state.sessions {
        store.clear()?;
    }
    println!("Signed out.");
    Ok(())
}

pub async fn status(state: &AppState) -> anyhow::Result<()> {
    println!("Server: {}", state.client.server_url());
    if !state.client.check_auth().await? {
        println!("Not signed in.");
        return Ok(());
    }

    match state.client.fetch_profile().await {
        Ok(profile) if profile.email.is_empty() => {
            println!("Signed in as {}", profile.display_name());
        }
        Ok(profile) => {
            println!("Signed in as {} <{}>", profile.display_name(), profile.email);
        }
        Err(ApiError::Unauthorized) => println!("Not signed in."),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

async fn read_line() -> anyhow::Result<String> {
    let mut line = String::new();
    let mut stdin = BufReader::new(tokio::io::stdin());
    let n = stdin.read_line(&mut line).await?;
    if n == 0 {
        anyhow::bail!("no callback URL given");
    }
    Ok(line)
}
