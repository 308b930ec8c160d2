//! `lockbox init`: create a new vault in the vault directory.

use std::fs;

use crate::cli::output;
use crate::cli::{prompt_new_password, vault_dir, Cli};
use crate::config::Settings;
use crate::errors::{LockboxError, Result};
use crate::store::Store;
use crate::vault::Vault;

/// Execute the `init` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let dir = vault_dir(cli)?;

    // 1. Create the vault directory if it doesn't exist.
    if !dir.exists() {
        fs::create_dir_all(&dir)?;
        restrict_dir_permissions(&dir)?;
        output::info(&format!("Created vault directory: {}", dir.display()));
    }

    // 2. Refuse to overwrite an existing vault.
    let settings = Settings::load(&dir)?;
    let db_path = settings.database_path(&dir);
    let store = Store::open(&db_path)?;
    let mut vault = Vault::load(&store, settings.kdf_params())?;
    if vault.is_initialized() {
        output::tip("Use `lockbox add <TITLE>` to add entries to the existing vault.");
        return Err(LockboxError::AlreadyInitialized);
    }

    // 3. Prompt for a new password (with confirmation) and derive the key.
    let password = prompt_new_password("LOCKBOX_PASSWORD")?;
    vault.create_vault(&store, &password)?;

    output::success(&format!("Vault created at {}", db_path.display()));
    output::tip("Run `lockbox add <TITLE>` to add an entry.");
    output::tip("Run `lockbox import <FILE>` to bring in a browser or KeePassXC export.");

    Ok(())
}

#[cfg(unix)]
fn restrict_dir_permissions(dir: &std::path::Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(dir, fs::Permissions::from_mode(0o700))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_dir_permissions(_dir: &std::path::Path) -> Result<()> {
    Ok(())
}
