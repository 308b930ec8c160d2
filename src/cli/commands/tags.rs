//! `lockbox tags`: list every tag attached to at least one entry.

use crate::cli::output;
use crate::cli::{open_locked, Cli};
use crate::errors::Result;

/// Execute the `tags` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let session = open_locked(cli)?;
    let tags = session.repo().list_all_tags()?;

    if tags.is_empty() {
        output::info("No tags in use.");
        return Ok(());
    }
    for tag in tags {
        println!("{tag}");
    }
    Ok(())
}
