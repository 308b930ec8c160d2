//! `lockbox restore`: bring groups and entries back from a backup file.

use std::fs;
use std::path::Path;

use crate::backup::import_backup;
use crate::cli::output;
use crate::cli::{open_unlocked, prompt_backup_passphrase, Cli};
use crate::errors::{LockboxError, Result};

/// Execute the `restore` command.
///
/// Restored entries are added next to existing ones; nothing is replaced.
pub fn execute(cli: &Cli, file: &Path) -> Result<()> {
    let data = fs::read(file).map_err(|e| {
        LockboxError::CommandFailed(format!("cannot read {}: {e}", file.display()))
    })?;

    let session = open_unlocked(cli)?;
    let repo = session.repo();

    let passphrase = prompt_backup_passphrase(false)?;
    let summary = import_backup(&repo, &data, &passphrase)?;

    output::print_restore_summary(&summary);
    Ok(())
}
