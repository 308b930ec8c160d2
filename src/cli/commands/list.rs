//! `lockbox list`: display entries in a table, optionally filtered.

use std::collections::HashSet;

use crate::cli::output;
use crate::cli::{open_locked, resolve_group, Cli};
use crate::errors::Result;
use crate::repository::{EntryType, PasswordEntry};

/// Entry filters. Every set field must match.
#[derive(Debug, Default)]
pub struct Filter<'a> {
    pub group: Option<&'a str>,
    pub category: Option<&'a str>,
    pub tag: Option<&'a str>,
    pub entry_type: Option<EntryType>,
}

/// Execute the `list` command.
///
/// Only index metadata is shown, so the vault stays locked.
pub fn execute(cli: &Cli, filter: &Filter<'_>) -> Result<()> {
    let session = open_locked(cli)?;
    let repo = session.repo();

    let groups = repo.group_tree()?;
    let group_ids = match filter.group {
        Some(path) => Some(groups.descendant_ids(resolve_group(&repo, path)?)),
        None => None,
    };

    let entries = apply(repo.list_entries()?, filter, group_ids.as_deref());

    output::info(&format!("{} entries", entries.len()));
    output::print_entries_table(&entries, &groups);

    Ok(())
}

/// Keep the entries matching `filter`. `group_ids` is the selected group
/// plus its descendants.
fn apply(
    entries: Vec<PasswordEntry>,
    filter: &Filter<'_>,
    group_ids: Option<&[i64]>,
) -> Vec<PasswordEntry> {
    let groups: Option<HashSet<i64>> = group_ids.map(|ids| ids.iter().copied().collect());

    entries
        .into_iter()
        .filter(|e| groups.as_ref().map_or(true, |g| g.contains(&e.group_id)))
        .filter(|e| {
            filter
                .category
                .map_or(true, |c| e.category.trim().eq_ignore_ascii_case(c.trim()))
        })
        .filter(|e| {
            filter
                .tag
                .map_or(true, |t| e.tags.iter().any(|x| x.eq_ignore_ascii_case(t.trim())))
        })
        .filter(|e| filter.entry_type.map_or(true, |t| e.entry_type == t))
        .collect()
}
