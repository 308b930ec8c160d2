//! CLI module: Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::Parser;
use zeroize::Zeroizing;

use crate::config::Settings;
use crate::errors::{LockboxError, Result};
use crate::repository::{EntryType, Repository};
use crate::store::{Store, ROOT_GROUP_ID};
use crate::vault::Vault;

/// Minimum master password length to prevent trivially weak passwords.
const MIN_PASSWORD_LEN: usize = 8;

/// Lockbox CLI: encrypted local credential vault.
#[derive(Parser)]
#[command(name = "lockbox", about = "Encrypted local credential vault", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Vault directory (default: the platform data directory)
    #[arg(long, env = "LOCKBOX_DIR", global = true)]
    pub vault_dir: Option<PathBuf>,

    /// Print debug diagnostics to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Entry fields shared by `add` and `update`.
#[derive(clap::Args, Default)]
pub struct EntryFields {
    /// Login name
    #[arg(short, long)]
    pub username: Option<String>,

    /// Website or endpoint
    #[arg(long)]
    pub url: Option<String>,

    /// Free-form category
    #[arg(short, long)]
    pub category: Option<String>,

    /// Comma-separated tags (replaces existing tags)
    #[arg(short, long)]
    pub tags: Option<String>,

    /// Entry type: web-login, desktop-client, api-key, database, server-ssh, device-wifi
    #[arg(long = "type")]
    pub entry_type: Option<EntryType>,

    /// Notes (stored encrypted)
    #[arg(short, long)]
    pub notes: Option<String>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a new vault
    Init,

    /// Add a password entry
    Add {
        /// Entry title
        title: String,

        /// Group path, e.g. Work/Servers (default: root)
        #[arg(short, long)]
        group: Option<String>,

        #[command(flatten)]
        fields: EntryFields,
    },

    /// Show one entry
    Get {
        /// Entry id
        id: i64,

        /// Print the password instead of masking it
        #[arg(long)]
        show: bool,

        /// Copy the password to the clipboard
        #[arg(long)]
        copy: bool,
    },

    /// List entries
    List {
        /// Only entries in this group or its subgroups
        #[arg(short, long)]
        group: Option<String>,

        /// Only entries with this category
        #[arg(short, long)]
        category: Option<String>,

        /// Only entries carrying this tag
        #[arg(short, long)]
        tag: Option<String>,

        /// Only entries of this type
        #[arg(long = "type")]
        entry_type: Option<EntryType>,
    },

    /// Edit an entry
    Update {
        /// Entry id
        id: i64,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// Prompt for a new password
        #[arg(short, long)]
        password: bool,

        #[command(flatten)]
        fields: EntryFields,
    },

    /// Move an entry to another group
    Move {
        /// Entry id
        id: i64,
        /// Target group path
        group: String,
    },

    /// Delete an entry
    Delete {
        /// Entry id
        id: i64,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Manage groups
    Group {
        #[command(subcommand)]
        action: GroupAction,
    },

    /// List every tag in use
    Tags,

    /// List every category in use
    Categories,

    /// Manage reusable common passwords
    Common {
        #[command(subcommand)]
        action: CommonAction,
    },

    /// Import entries from a Chrome, KeePassXC or Lockbox CSV file
    Import {
        /// CSV file to read
        file: PathBuf,

        /// Group to import into (default: root)
        #[arg(short, long)]
        group: Option<String>,

        /// Overwrite matching entries instead of skipping them
        #[arg(long)]
        update: bool,

        /// Create groups from the category column
        #[arg(long)]
        create_groups: bool,

        /// Entry type for rows that do not carry one
        #[arg(long = "type")]
        entry_type: Option<EntryType>,
    },

    /// Export all entries as plaintext CSV
    Export {
        /// Output file path (prints to stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip the plaintext warning prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Write an encrypted backup file
    Backup {
        /// Destination path
        output: PathBuf,
    },

    /// Restore entries and groups from a backup file
    Restore {
        /// Backup file to read
        file: PathBuf,
    },

    /// Change the vault's master password
    RotateKey,

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell)
        shell: String,
    },
}

/// Group subcommands.
#[derive(clap::Subcommand)]
pub enum GroupAction {
    /// Show the group tree
    List,

    /// Create a group (parents are created as needed)
    Create {
        /// Group path, e.g. Work/Servers
        path: String,
    },

    /// Rename a group
    Rename {
        /// Existing group path
        path: String,
        /// New name
        new_name: String,
    },

    /// Delete an empty group
    Delete {
        /// Group path
        path: String,
    },
}

/// Common-password subcommands.
#[derive(clap::Subcommand)]
pub enum CommonAction {
    /// List common passwords
    List,

    /// Add a common password
    Add {
        /// Unique name
        name: String,
        /// Notes (stored encrypted)
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Show a common password
    Get {
        /// Name
        name: String,
        /// Print the password instead of masking it
        #[arg(long)]
        show: bool,
        /// Copy the password to the clipboard
        #[arg(long)]
        copy: bool,
    },

    /// Delete a common password
    Delete {
        /// Name
        name: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// An opened vault: settings, database handle and master-key owner.
pub struct Session {
    pub dir: PathBuf,
    pub settings: Settings,
    pub store: Store,
    pub vault: Vault,
}

impl Session {
    pub fn repo(&self) -> Repository<'_> {
        Repository::new(&self.store, &self.vault)
    }
}

/// Resolve the vault directory from `--vault-dir` / `LOCKBOX_DIR`, falling
/// back to `<data dir>/lockbox`.
pub fn vault_dir(cli: &Cli) -> Result<PathBuf> {
    if let Some(dir) = &cli.vault_dir {
        return Ok(dir.clone());
    }
    dirs::data_dir()
        .map(|d| d.join("lockbox"))
        .ok_or_else(|| LockboxError::Config("no data directory, pass --vault-dir".into()))
}

/// Open the store without unlocking. Fails if no vault exists yet.
pub fn open_locked(cli: &Cli) -> Result<Session> {
    let dir = vault_dir(cli)?;
    let settings = Settings::load(&dir)?;
    let db_path = settings.database_path(&dir);
    if !db_path.exists() {
        return Err(LockboxError::NotInitialized);
    }

    let store = Store::open(&db_path)?;
    let vault = Vault::load(&store, settings.kdf_params())?;
    if !vault.is_initialized() {
        return Err(LockboxError::NotInitialized);
    }
    Ok(Session {
        dir,
        settings,
        store,
        vault,
    })
}

/// Open the store and unlock it with the master password.
pub fn open_unlocked(cli: &Cli) -> Result<Session> {
    let mut session = open_locked(cli)?;
    let password = prompt_password()?;
    session.vault.unlock(&session.store, &password)?;
    Ok(session)
}

/// Get the master password, trying in order:
/// 1. `LOCKBOX_PASSWORD` env var (scripts)
/// 2. Interactive prompt
///
/// Returns `Zeroizing<String>` so the password is wiped from memory on drop.
pub fn prompt_password() -> Result<Zeroizing<String>> {
    if let Ok(pw) = std::env::var("LOCKBOX_PASSWORD") {
        if !pw.is_empty() {
            return Ok(Zeroizing::new(pw));
        }
    }

    let pw = dialoguer::Password::new()
        .with_prompt("Master password")
        .interact()
        .map_err(|e| LockboxError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Prompt for a new master password with confirmation (used by `init`
/// and `rotate-key`).
///
/// `env_var` lets scripts supply the value; a minimum length is enforced
/// either way.
pub fn prompt_new_password(env_var: &str) -> Result<Zeroizing<String>> {
    if let Ok(pw) = std::env::var(env_var) {
        if !pw.is_empty() {
            if pw.chars().count() < MIN_PASSWORD_LEN {
                return Err(LockboxError::CommandFailed(format!(
                    "password must be at least {MIN_PASSWORD_LEN} characters"
                )));
            }
            return Ok(Zeroizing::new(pw));
        }
    }

    loop {
        let password = dialoguer::Password::new()
            .with_prompt("Choose master password")
            .with_confirmation(
                "Confirm master password",
                "Passwords do not match, try again",
            )
            .interact()
            .map_err(|e| LockboxError::CommandFailed(format!("password prompt: {e}")))?;

        if password.chars().count() < MIN_PASSWORD_LEN {
            output::warning(&format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters. Try again."
            ));
            continue;
        }

        return Ok(Zeroizing::new(password));
    }
}

/// Prompt for an entry or common-password secret.
///
/// Respects `LOCKBOX_ENTRY_PASSWORD` for scripted usage.
pub fn prompt_secret(prompt: &str) -> Result<Zeroizing<String>> {
    if let Ok(pw) = std::env::var("LOCKBOX_ENTRY_PASSWORD") {
        if !pw.is_empty() {
            return Ok(Zeroizing::new(pw));
        }
    }

    let pw = dialoguer::Password::new()
        .with_prompt(prompt)
        .with_confirmation("Confirm", "Values do not match, try again")
        .interact()
        .map_err(|e| LockboxError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Get the backup passphrase from `LOCKBOX_BACKUP_PASSWORD` or a prompt.
/// `confirm` asks twice, for writing new backups.
pub fn prompt_backup_passphrase(confirm: bool) -> Result<Zeroizing<String>> {
    if let Ok(pw) = std::env::var("LOCKBOX_BACKUP_PASSWORD") {
        if !pw.is_empty() {
            return Ok(Zeroizing::new(pw));
        }
    }

    let mut prompt = dialoguer::Password::new();
    prompt = prompt.with_prompt("Backup passphrase");
    if confirm {
        prompt = prompt.with_confirmation(
            "Confirm backup passphrase",
            "Passphrases do not match, try again",
        );
    }
    let pw = prompt
        .interact()
        .map_err(|e| LockboxError::CommandFailed(format!("passphrase prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Ask a yes/no question, defaulting to no.
pub fn confirm(prompt: &str) -> Result<bool> {
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| LockboxError::CommandFailed(format!("failed to read confirmation: {e}")))
}

/// Resolve a group path such as `Work/Servers` to an id.
///
/// An empty path, `/`, or the root's own name means the root group. A
/// leading root name (`All/Work`) is accepted too.
pub fn resolve_group(repo: &Repository<'_>, path: &str) -> Result<i64> {
    let mut segments: Vec<&str> = crate::import::path_segments(path).collect();
    if segments
        .first()
        .is_some_and(|s| s.eq_ignore_ascii_case(crate::store::ROOT_GROUP_NAME))
    {
        segments.remove(0);
    }

    let mut current = ROOT_GROUP_ID;
    for segment in segments {
        current = repo
            .find_group(current, segment)?
            .ok_or_else(|| LockboxError::NotFound(format!("group '{path}'")))?;
    }
    Ok(current)
}

/// Copy `text` to the system clipboard.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut clipboard = arboard::Clipboard::new()
        .map_err(|e| LockboxError::CommandFailed(format!("clipboard unavailable: {e}")))?;
    clipboard
        .set_text(text.to_owned())
        .map_err(|e| LockboxError::CommandFailed(format!("clipboard write failed: {e}")))
}
