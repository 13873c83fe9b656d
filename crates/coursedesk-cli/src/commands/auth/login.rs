//! Login command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use coursedesk_core::Credentials;

use crate::context::AppContext;
use crate::output;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account username
    #[arg(long)]
    pub username: String,

    /// Account password
    #[arg(long, env = "COURSEDESK_PASSWORD", hide_env_values = true)]
    pub password: String,
}

pub async fn run(args: LoginArgs, ctx: &mut AppContext) -> Result<()> {
    eprintln!("{}", "Logging in...".dimmed());

    let identity = ctx
        .session
        .try_login(&Credentials::new(args.username, args.password))
        .await
        .context("Login failed")?;

    output::success("Logged in successfully");
    println!();
    output::identity(&identity);

    Ok(())
}
