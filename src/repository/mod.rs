//! Repository: typed CRUD over the store.
//!
//! Every secret column (entry passwords and notes, common-password
//! passwords and notes) is sealed with the vault's active key before it
//! touches the database. Index metadata (titles, usernames, URLs,
//! categories, tags, groups) stays in the clear so it can be listed
//! without unlocking anything.
//!
//! Multi-statement writes run inside one transaction; an error anywhere
//! rolls the whole operation back.

pub mod common;
pub mod entries;
pub mod groups;
pub mod model;
pub mod tags;

use zeroize::Zeroize;

use crate::crypto::encryption::{open, seal};
use crate::errors::{LockboxError, Result};
use crate::store::Store;
use crate::vault::Vault;

pub use groups::GroupTree;
pub use model::{
    CommonPassword, CommonPasswordSecrets, EntryType, Group, PasswordEntry, PasswordEntrySecrets,
};
pub use tags::{normalize_tags, split_tags};

/// Borrowed view of a store plus the vault whose key seals its secrets.
pub struct Repository<'a> {
    store: &'a Store,
    vault: &'a Vault,
}

impl<'a> Repository<'a> {
    pub fn new(store: &'a Store, vault: &'a Vault) -> Self {
        Self { store, vault }
    }

    pub fn store(&self) -> &'a Store {
        self.store
    }

    pub fn vault(&self) -> &'a Vault {
        self.vault
    }

    /// Seal a required secret.
    fn seal_text(&self, plaintext: &str) -> Result<Vec<u8>> {
        let key = self.vault.key()?;
        seal(key.as_bytes(), plaintext.as_bytes())
    }

    /// Seal an optional secret; empty text is stored as an empty blob.
    fn seal_optional(&self, plaintext: &str) -> Result<Vec<u8>> {
        if plaintext.is_empty() {
            Ok(Vec::new())
        } else {
            self.seal_text(plaintext)
        }
    }

    /// Open a sealed blob back into text. Empty or missing blobs are "".
    fn open_text(&self, blob: Option<&[u8]>) -> Result<String> {
        let blob = match blob {
            Some(b) if !b.is_empty() => b,
            _ => return Ok(String::new()),
        };
        let key = self.vault.key()?;
        let plain = open(key.as_bytes(), blob)?;
        String::from_utf8(plain).map_err(|e| {
            e.into_bytes().zeroize();
            LockboxError::DecryptionFailed
        })
    }
}

/// True when a statement failed on a UNIQUE (or other) constraint.
pub(crate) fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}
