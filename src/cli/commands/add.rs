//! `lockbox add`: store a new password entry.

use crate::cli::output;
use crate::cli::{open_unlocked, prompt_secret, resolve_group, Cli, EntryFields};
use crate::errors::Result;
use crate::repository::{split_tags, PasswordEntry, PasswordEntrySecrets};
use crate::store::ROOT_GROUP_ID;

/// Execute the `add` command.
pub fn execute(cli: &Cli, title: &str, group: Option<&str>, fields: &EntryFields) -> Result<()> {
    let session = open_unlocked(cli)?;
    let repo = session.repo();

    let group_id = match group {
        Some(path) => resolve_group(&repo, path)?,
        None => ROOT_GROUP_ID,
    };

    let password = prompt_secret(&format!("Password for '{title}'"))?;

    let entry = PasswordEntry {
        group_id,
        entry_type: fields.entry_type.unwrap_or_default(),
        title: title.to_string(),
        username: fields.username.clone().unwrap_or_default(),
        url: fields.url.clone().unwrap_or_default(),
        category: fields.category.clone().unwrap_or_default(),
        tags: fields.tags.as_deref().map(split_tags).unwrap_or_default(),
        ..PasswordEntry::default()
    };
    let secrets = PasswordEntrySecrets::new(
        entry,
        password.as_str(),
        fields.notes.clone().unwrap_or_default(),
    );

    let id = repo.add_entry(&secrets)?;
    output::success(&format!("Added entry {id} '{title}'"));

    Ok(())
}
