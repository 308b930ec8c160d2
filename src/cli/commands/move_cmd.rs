//! `lockbox move`: put an entry in another group.

use crate::cli::output;
use crate::cli::{open_unlocked, resolve_group, Cli};
use crate::errors::Result;

/// Execute the `move` command.
pub fn execute(cli: &Cli, id: i64, group: &str) -> Result<()> {
    let session = open_unlocked(cli)?;
    let repo = session.repo();

    let group_id = resolve_group(&repo, group)?;
    repo.move_entry_to_group(id, group_id)?;

    let groups = repo.group_tree()?;
    output::success(&format!("Moved entry {id} to '{}'", groups.path_of(group_id)));

    Ok(())
}
