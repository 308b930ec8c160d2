//! `lockbox backup`: write a passphrase-sealed backup file.

use std::path::Path;

use crate::backup::{export_backup, write_private_file};
use crate::cli::output;
use crate::cli::{open_unlocked, prompt_backup_passphrase, Cli};
use crate::errors::Result;

/// Execute the `backup` command.
pub fn execute(cli: &Cli, output_path: &Path) -> Result<()> {
    let session = open_unlocked(cli)?;
    let repo = session.repo();

    output::info("Choose a passphrase for the backup file.");
    let passphrase = prompt_backup_passphrase(true)?;

    let data = export_backup(&repo, &passphrase, session.settings.backup_kdf_iterations)?;
    write_private_file(output_path, &data)?;

    output::success(&format!("Backup written to {}", output_path.display()));
    output::tip("Keep the passphrase safe: the backup cannot be opened without it.");
    Ok(())
}
