//! Profile commands.

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};

use coursedesk_core::ProfileUpdate;

use crate::commands::require_session;
use crate::context::AppContext;
use crate::output;

#[derive(Args, Debug)]
pub struct ProfileCommand {
    #[command(subcommand)]
    pub command: ProfileSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum ProfileSubcommand {
    /// Fetch the full profile from the server
    Show(ShowArgs),

    /// Change profile fields
    Update(UpdateArgs),
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Print the profile as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub first_name: Option<String>,

    #[arg(long)]
    pub last_name: Option<String>,
}

pub async fn handle(cmd: ProfileCommand, ctx: &mut AppContext) -> Result<()> {
    match cmd.command {
        ProfileSubcommand::Show(args) => show(args, ctx).await,
        ProfileSubcommand::Update(args) => update(args, ctx).await,
    }
}

async fn show(args: ShowArgs, ctx: &mut AppContext) -> Result<()> {
    require_session(ctx).await?;

    // A failed fetch ends the session; the login hint follows.
    let profile = ctx
        .session
        .get_user_profile()
        .await
        .context("Failed to load profile")?;

    if args.json {
        output::json_pretty(&profile)?;
    } else {
        output::identity(&profile);
    }

    Ok(())
}

async fn update(args: UpdateArgs, ctx: &mut AppContext) -> Result<()> {
    let changes = ProfileUpdate {
        email: args.email,
        first_name: args.first_name,
        last_name: args.last_name,
    };
    if changes.is_empty() {
        bail!("Nothing to update. Pass --email, --first-name or --last-name.");
    }

    require_session(ctx).await?;

    if !ctx.session.update_user_profile(&changes).await {
        bail!("Profile update was rejected (use -v for details).");
    }

    output::success("Profile updated");
    if let Some(identity) = ctx.session.identity() {
        output::identity(&identity);
    }

    Ok(())
}
