//! Auth subcommand implementations.

mod login;
mod logout;
mod refresh_token;
mod register;
mod whoami;

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::context::AppContext;

#[derive(Args, Debug)]
pub struct AuthCommand {
    #[command(subcommand)]
    pub command: AuthSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum AuthSubcommand {
    /// Log in and store the session tokens
    Login(login::LoginArgs),

    /// Create an account and log in with it
    Register(register::RegisterArgs),

    /// Forget the stored session
    Logout(logout::LogoutArgs),

    /// Display the identity carried by the stored session
    Whoami(whoami::WhoamiArgs),

    /// Renew the session tokens now
    RefreshToken(refresh_token::RefreshTokenArgs),
}

pub async fn handle(cmd: AuthCommand, ctx: &mut AppContext) -> Result<()> {
    match cmd.command {
        AuthSubcommand::Login(args) => login::run(args, ctx).await,
        AuthSubcommand::Register(args) => register::run(args, ctx).await,
        AuthSubcommand::Logout(args) => logout::run(args, ctx),
        AuthSubcommand::Whoami(args) => whoami::run(args, ctx).await,
        AuthSubcommand::RefreshToken(args) => refresh_token::run(args, ctx).await,
    }
}
