//! Register command implementation.
//!
//! Creates the account, then logs in with the same credentials.

use anyhow::{Result, bail};
use clap::Args;
use colored::Colorize;

use coursedesk_core::Registration;

use crate::context::AppContext;
use crate::output;

#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// Username for the new account
    #[arg(long)]
    pub username: String,

    /// Email address
    #[arg(long)]
    pub email: String,

    /// Password
    #[arg(long, env = "COURSEDESK_PASSWORD", hide_env_values = true)]
    pub password: String,

    #[arg(long)]
    pub first_name: Option<String>,

    #[arg(long)]
    pub last_name: Option<String>,
}

pub async fn run(args: RegisterArgs, ctx: &mut AppContext) -> Result<()> {
    let registration = Registration::new(args.username, args.email, args.password)
        .with_name(args.first_name, args.last_name);

    eprintln!("{}", "Creating account...".dimmed());

    if !ctx.session.register(&registration).await {
        bail!("Registration failed (use -v for details).");
    }

    output::success("Account created and logged in");
    println!();
    if let Some(identity) = ctx.session.identity() {
        output::identity(&identity);
    }

    Ok(())
}
