//! `lockbox completions`: print a shell completion script.
//!
//! Usage:
//!   lockbox completions bash > ~/.local/share/bash-completion/completions/lockbox
//!   lockbox completions zsh > "${fpath[1]}/_lockbox"
//!   lockbox completions fish > ~/.config/fish/completions/lockbox.fish

use std::io::{self, Write};

use clap::CommandFactory;
use clap_complete::{generate, Shell};

use crate::cli::Cli;
use crate::errors::{LockboxError, Result};

/// Execute the `completions` command.
pub fn execute(shell: &str) -> Result<()> {
    write_script(parse_shell(shell)?, &mut io::stdout())
}

fn write_script(shell: Shell, out: &mut dyn Write) -> Result<()> {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "lockbox", out);
    Ok(())
}

/// Map a shell name to a generator; `ps` is accepted for PowerShell.
fn parse_shell(name: &str) -> Result<Shell> {
    match name.trim().to_lowercase().as_str() {
        "bash" => Ok(Shell::Bash),
        "zsh" => Ok(Shell::Zsh),
        "fish" => Ok(Shell::Fish),
        "powershell" | "ps" => Ok(Shell::PowerShell),
        "elvish" => Ok(Shell::Elvish),
        other => Err(LockboxError::InvalidArgument(format!(
            "unknown shell '{other}' (supported: bash, zsh, fish, powershell, elvish)"
        ))),
    }
}
