//! Output formatting helpers.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use coursedesk_core::Identity;

/// Print a success message.
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print an error message.
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a labeled field.
pub fn field(label: &str, value: &str) {
    println!("{}: {}", label.dimmed(), value);
}

/// Print a labeled field, skipping empty values.
pub fn optional_field(label: &str, value: &str) {
    if !value.is_empty() {
        field(label, value);
    }
}

/// Print a value as compact JSON.
pub fn json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string(value)?;
    println!("{}", json);
    Ok(())
}

/// Print a value as pretty-printed JSON.
pub fn json_pretty<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// Print the fields of a user identity.
pub fn identity(identity: &Identity) {
    field("User", &identity.username);
    field("ID", &identity.id.to_string());
    optional_field("Email", &identity.email);
    let name = identity.display_name();
    if name != identity.username {
        field("Name", &name);
    }
}

/// Tell the user the session is gone.
pub fn login_hint() {
    error("Your session has ended. Run 'coursedesk auth login' to sign in again.");
}
