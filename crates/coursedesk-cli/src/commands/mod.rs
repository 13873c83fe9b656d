//! Subcommand implementations.

pub mod auth;
pub mod catalog;
pub mod profile;

use anyhow::{Result, bail};

use coursedesk_core::Identity;

use crate::cli::Commands;
use crate::context::AppContext;

pub async fn handle(command: Commands, ctx: &mut AppContext) -> Result<()> {
    match command {
        Commands::Auth(cmd) => auth::handle(cmd, ctx).await,
        Commands::Profile(cmd) => profile::handle(cmd, ctx).await,
        Commands::Category(cmd) => catalog::handle_category(cmd, ctx).await,
        Commands::Course(cmd) => catalog::handle_course(cmd, ctx).await,
    }
}

/// Restore the stored session, failing if nobody is logged in.
pub(crate) async fn require_session(ctx: &AppContext) -> Result<Identity> {
    match ctx.session.initialize().await.identity() {
        Some(identity) => Ok(identity.clone()),
        None => bail!("No active session. Run 'coursedesk auth login' first."),
    }
}
