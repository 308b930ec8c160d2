//! `lockbox delete`: remove an entry from the vault.

use crate::cli::output;
use crate::cli::{confirm, open_unlocked, Cli};
use crate::errors::Result;

/// Execute the `delete` command.
pub fn execute(cli: &Cli, id: i64, force: bool) -> Result<()> {
    let session = open_unlocked(cli)?;
    let repo = session.repo();

    // Load first so a wrong id fails before the prompt.
    let title = repo.load_entry(id)?.entry.title.clone();

    // Unless --force is set, ask for confirmation before deleting.
    if !force && !confirm(&format!("Delete entry {id} '{title}'?"))? {
        output::info("Cancelled.");
        return Ok(());
    }

    repo.delete_entry(id)?;
    output::success(&format!("Deleted entry {id} '{title}'"));

    Ok(())
}
