//! `lockbox export`: write every entry as plaintext CSV.
//!
//! The output uses the native Lockbox header, so it can be imported back
//! with `lockbox import`. Passwords and notes are in the clear.

use std::io::Write;
use std::path::Path;

use crate::backup::write_private_file;
use crate::cli::output;
use crate::cli::{confirm, open_unlocked, Cli};
use crate::errors::{LockboxError, Result};
use crate::import::export_csv;

/// Execute the `export` command.
pub fn execute(cli: &Cli, output_path: Option<&Path>, force: bool) -> Result<()> {
    // Safety: refuse to overwrite the vault database.
    if let Some(dest) = output_path {
        if dest.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("sqlite3")) {
            return Err(LockboxError::CommandFailed(
                "refusing to export over a .sqlite3 file".into(),
            ));
        }
    }

    if !force {
        output::warning("The export contains every password in plain text.");
        if !confirm("Continue?")? {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    let session = open_unlocked(cli)?;
    let repo = session.repo();

    let entries = repo
        .list_entries()?
        .iter()
        .map(|e| repo.load_entry(e.id))
        .collect::<Result<Vec<_>>>()?;
    let data = zeroize::Zeroizing::new(export_csv(&entries)?);

    match output_path {
        Some(dest) => {
            write_private_file(dest, &data)?;
            output::success(&format!(
                "Exported {} entries to {}",
                entries.len(),
                dest.display()
            ));
        }
        None => {
            // Write to stdout (no success message, just raw output).
            std::io::stdout().write_all(&data)?;
        }
    }

    Ok(())
}
