//! `lockbox rotate-key`: change the vault master password.
//!
//! Every sealed field is re-encrypted under a key derived from the new
//! password with a fresh salt, in one transaction.

use crate::cli::output;
use crate::cli::{open_unlocked, prompt_new_password, Cli};
use crate::errors::Result;

/// Execute the `rotate-key` command.
pub fn execute(cli: &Cli) -> Result<()> {
    // 1. Unlock with the current password.
    output::info("Enter your current master password.");
    let mut session = open_unlocked(cli)?;

    // 2. Prompt for the new password.
    output::info("Choose your new master password.");
    let new_password = prompt_new_password("LOCKBOX_NEW_PASSWORD")?;

    // 3. Re-seal everything and swap the key.
    let resealed = session
        .vault
        .change_master_password(&session.store, &new_password)?;

    output::success(&format!(
        "Master password changed ({resealed} records re-encrypted)"
    ));
    Ok(())
}
