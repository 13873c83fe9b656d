//! Refresh token command implementation.

use anyhow::{Result, bail};
use clap::Args;
use colored::Colorize;

use coursedesk_core::TokenStore;

use crate::context::AppContext;
use crate::output;

#[derive(Args, Debug)]
pub struct RefreshTokenArgs {}

pub async fn run(_args: RefreshTokenArgs, ctx: &mut AppContext) -> Result<()> {
    if ctx.client().store().refresh_token().is_none() {
        bail!("No active session. Run 'coursedesk auth login' first.");
    }

    eprintln!("{}", "Refreshing session...".dimmed());

    if !ctx.session.refresh().await {
        bail!("Failed to refresh session. Run 'coursedesk auth login' to sign in again.");
    }

    output::success("Session refreshed successfully");
    if let Some(identity) = ctx.session.identity() {
        output::field("User", &identity.username);
    }

    Ok(())
}
