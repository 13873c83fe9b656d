//! CLI argument definitions.

use clap::{Parser, Subcommand};

use coursedesk_http::DEFAULT_API_URL;

use crate::commands::auth::AuthCommand;
use crate::commands::catalog::{CategoryCommand, CourseCommand};
use crate::commands::profile::ProfileCommand;

/// Command-line client for the coursedesk REST API.
#[derive(Parser, Debug)]
#[command(name = "coursedesk")]
#[command(author, version = env!("COURSEDESK_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Base URL of the REST API
    #[arg(long, global = true, env = "COURSEDESK_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in, register, and inspect the stored session
    Auth(AuthCommand),

    /// Show or edit the signed-in user's profile
    Profile(ProfileCommand),

    /// Manage course categories
    Category(CategoryCommand),

    /// Manage courses
    Course(CourseCommand),
}
