//! Whoami command implementation.

use anyhow::Result;
use clap::Args;

use crate::commands::require_session;
use crate::context::AppContext;
use crate::output;

#[derive(Args, Debug)]
pub struct WhoamiArgs {
    /// Print the identity as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: WhoamiArgs, ctx: &mut AppContext) -> Result<()> {
    let identity = require_session(ctx).await?;

    if args.json {
        output::json(&identity)?;
    } else {
        output::identity(&identity);
        output::field("API", ctx.client().config().base_url().as_str());
    }

    Ok(())
}
