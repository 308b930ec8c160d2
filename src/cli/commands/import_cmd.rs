//! `lockbox import`: import entries from a Chrome, KeePassXC or Lockbox CSV.
//!
//! The header row decides the format. Rows are applied on a background
//! worker while this thread draws progress.

use std::fs;
use std::path::Path;

use console::Term;

use crate::cli::output;
use crate::cli::{open_unlocked, resolve_group, Cli};
use crate::errors::{LockboxError, Result};
use crate::import::{spawn_import, DuplicatePolicy, ImportEvent, ImportOptions};
use crate::repository::EntryType;
use crate::store::ROOT_GROUP_ID;

/// Command-line overrides for the `[import]` settings.
#[derive(Debug, Default)]
pub struct ImportFlags<'a> {
    pub group: Option<&'a str>,
    pub update: bool,
    pub create_groups: bool,
    pub entry_type: Option<EntryType>,
}

/// Execute the `import` command.
pub fn execute(cli: &Cli, file: &Path, flags: &ImportFlags<'_>) -> Result<()> {
    let data = fs::read(file).map_err(|e| {
        LockboxError::CommandFailed(format!("cannot read {}: {e}", file.display()))
    })?;

    let session = open_unlocked(cli)?;
    let repo = session.repo();

    let base_group_id = match flags.group {
        Some(path) => resolve_group(&repo, path)?,
        None => ROOT_GROUP_ID,
    };
    let options = merge_options(session.settings.import_options()?, flags);

    let key = session.vault.key()?.clone();
    let handle = spawn_import(&session.store, key, data, base_group_id, options)?;

    let term = Term::stderr();
    let mut total = 0;
    let result = handle.wait(|event| match event {
        ImportEvent::ProgressRange(n) => total = *n,
        ImportEvent::ProgressValue(done) if term.is_term() => {
            let _ = term.clear_line();
            let _ = term.write_str(&format!("Importing {done}/{total}"));
        }
        _ => {}
    });
    if term.is_term() {
        let _ = term.clear_line();
    }

    let summary = result?;
    output::print_import_summary(&summary);
    Ok(())
}

/// Flags win over the settings file; absent flags keep the configured value.
fn merge_options(mut options: ImportOptions, flags: &ImportFlags<'_>) -> ImportOptions {
    if flags.update {
        options.duplicate_policy = DuplicatePolicy::Update;
    }
    if flags.create_groups {
        options.create_groups_from_category_path = true;
    }
    if let Some(entry_type) = flags.entry_type {
        options.default_entry_type = entry_type;
    }
    options
}
