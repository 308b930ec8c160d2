//! `lockbox update`: edit an existing entry in place.

use crate::cli::output;
use crate::cli::{open_unlocked, prompt_secret, Cli, EntryFields};
use crate::errors::Result;
use crate::repository::{split_tags, PasswordEntrySecrets};

/// Execute the `update` command.
pub fn execute(
    cli: &Cli,
    id: i64,
    title: Option<&str>,
    new_password: bool,
    fields: &EntryFields,
) -> Result<()> {
    let session = open_unlocked(cli)?;
    let repo = session.repo();

    let mut secrets = repo.load_entry(id)?;
    if new_password {
        let password = prompt_secret("New password")?;
        secrets.password = password.as_str().to_owned();
    }
    apply_fields(&mut secrets, title, fields);

    repo.update_entry(&secrets)?;
    output::success(&format!("Updated entry {id} '{}'", secrets.entry.title));

    Ok(())
}

/// Overwrite the fields that were given on the command line.
fn apply_fields(secrets: &mut PasswordEntrySecrets, title: Option<&str>, fields: &EntryFields) {
    let entry = &mut secrets.entry;
    if let Some(title) = title {
        entry.title = title.to_string();
    }
    if let Some(username) = &fields.username {
        entry.username = username.clone();
    }
    if let Some(url) = &fields.url {
        entry.url = url.clone();
    }
    if let Some(category) = &fields.category {
        entry.category = category.clone();
    }
    if let Some(tags) = &fields.tags {
        entry.tags = split_tags(tags);
    }
    if let Some(entry_type) = fields.entry_type {
        entry.entry_type = entry_type;
    }
    if let Some(notes) = &fields.notes {
        secrets.notes = notes.clone();
    }
}
