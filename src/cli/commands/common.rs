//! `lockbox common`: manage account-less common passwords.

use crate::cli::output;
use crate::cli::{confirm, copy_to_clipboard, open_locked, open_unlocked, prompt_secret, Cli};
use crate::errors::{LockboxError, Result};
use crate::repository::{CommonPasswordSecrets, Repository};

/// Execute `common list`.
pub fn execute_list(cli: &Cli) -> Result<()> {
    let session = open_locked(cli)?;
    let items = session.repo().list_common_passwords()?;
    output::print_common_table(&items);
    Ok(())
}

/// Execute `common add`.
pub fn execute_add(cli: &Cli, name: &str, notes: Option<&str>) -> Result<()> {
    let session = open_unlocked(cli)?;
    let repo = session.repo();

    let password = prompt_secret(&format!("Password for '{name}'"))?;
    let secrets = CommonPasswordSecrets::new(name, password.as_str(), notes.unwrap_or_default());
    let id = repo.add_common_password(&secrets)?;

    output::success(&format!("Added common password '{}' (id {id})", name.trim()));
    Ok(())
}

/// Execute `common get`.
pub fn execute_get(cli: &Cli, name: &str, show: bool, copy: bool) -> Result<()> {
    let session = open_unlocked(cli)?;
    let repo = session.repo();

    let secrets = repo.load_common_password(lookup(&repo, name)?)?;
    if show {
        println!("{}", secrets.password);
    } else {
        println!("{}", output::mask(&secrets.password));
    }
    if !secrets.notes.is_empty() {
        println!("{}", secrets.notes);
    }

    if copy {
        copy_to_clipboard(&secrets.password)?;
        output::success("Password copied to clipboard");
    }
    Ok(())
}

/// Execute `common delete`.
pub fn execute_delete(cli: &Cli, name: &str, force: bool) -> Result<()> {
    let session = open_unlocked(cli)?;
    let repo = session.repo();

    let id = lookup(&repo, name)?;
    if !force && !confirm(&format!("Delete common password '{name}'?"))? {
        output::info("Cancelled.");
        return Ok(());
    }

    repo.delete_common_password(id)?;
    output::success(&format!("Deleted common password '{name}'"));
    Ok(())
}

fn lookup(repo: &Repository<'_>, name: &str) -> Result<i64> {
    repo.find_common_password(name)?
        .ok_or_else(|| LockboxError::NotFound(format!("common password '{name}'")))
}
