//! `lockbox group`: list, create, rename and delete groups.

use std::collections::HashMap;

use crate::cli::output;
use crate::cli::{open_locked, open_unlocked, resolve_group, Cli};
use crate::errors::Result;
use crate::import::path_segments;
use crate::repository::Repository;
use crate::store::ROOT_GROUP_ID;

/// Execute `group list`: print the tree with per-group entry counts.
pub fn execute_list(cli: &Cli) -> Result<()> {
    let session = open_locked(cli)?;
    let repo = session.repo();

    let groups = repo.group_tree()?;
    let mut counts: HashMap<i64, usize> = HashMap::new();
    for entry in repo.list_entries()? {
        *counts.entry(entry.group_id).or_default() += 1;
    }

    output::print_group_tree(&groups, |id| counts.get(&id).copied().unwrap_or(0));
    Ok(())
}

/// Execute `group create`: create every missing segment of `path`.
pub fn execute_create(cli: &Cli, path: &str) -> Result<()> {
    let session = open_unlocked(cli)?;
    let repo = session.repo();

    let (id, created) = create_path(&repo, path)?;
    if created == 0 {
        output::info(&format!("Group '{path}' already exists"));
    } else {
        output::success(&format!("Created group '{}' (id {id})", repo.group_tree()?.path_of(id)));
    }
    Ok(())
}

/// Execute `group rename`.
pub fn execute_rename(cli: &Cli, path: &str, new_name: &str) -> Result<()> {
    let session = open_unlocked(cli)?;
    let repo = session.repo();

    let id = resolve_group(&repo, path)?;
    repo.rename_group(id, new_name)?;
    output::success(&format!("Renamed '{path}' to '{}'", new_name.trim()));
    Ok(())
}

/// Execute `group delete`. Only empty groups can be removed.
pub fn execute_delete(cli: &Cli, path: &str) -> Result<()> {
    let session = open_unlocked(cli)?;
    let repo = session.repo();

    let id = resolve_group(&repo, path)?;
    repo.delete_group(id)?;
    output::success(&format!("Deleted group '{path}'"));
    Ok(())
}

/// Walk `path` from the root, creating missing groups. Returns the leaf
/// id and how many groups were created.
fn create_path(repo: &Repository<'_>, path: &str) -> Result<(i64, usize)> {
    let mut current = ROOT_GROUP_ID;
    let mut created = 0;
    for segment in path_segments(path) {
        current = match repo.find_group(current, segment)? {
            Some(id) => id,
            None => {
                created += 1;
                repo.create_group(current, segment)?
            }
        };
    }
    Ok((current, created))
}
