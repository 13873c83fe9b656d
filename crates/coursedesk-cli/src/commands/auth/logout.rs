//! Logout command implementation.

use anyhow::Result;
use clap::Args;

use crate::context::AppContext;
use crate::output;

#[derive(Args, Debug)]
pub struct LogoutArgs {}

pub fn run(_args: LogoutArgs, ctx: &mut AppContext) -> Result<()> {
    ctx.session.logout();
    ctx.discard_signals();

    output::success("Logged out");

    Ok(())
}
