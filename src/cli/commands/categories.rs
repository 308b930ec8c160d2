//! `lockbox categories`: list every non-empty category.

use crate::cli::output;
use crate::cli::{open_locked, Cli};
use crate::errors::Result;

/// Execute the `categories` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let session = open_locked(cli)?;
    let categories = session.repo().list_categories()?;

    if categories.is_empty() {
        output::info("No categories in use.");
        return Ok(());
    }
    for category in categories {
        println!("{category}");
    }
    Ok(())
}
