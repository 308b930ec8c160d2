//! Master-key lifecycle: create, unlock, lock, rotate.
//!
//! The vault is either **Uninitialized** (no metadata row), **Locked**
//! (metadata present, no key in memory) or **Unlocked** (holds the
//! derived key). Callers hand `&Vault` to the repository, which only
//! ever borrows the key for the duration of one call.

use rusqlite::params;
use zeroize::Zeroize;

use crate::crypto::encryption::{open, seal};
use crate::crypto::kdf::{derive_key, generate_salt, KdfParams};
use crate::crypto::keys::MasterKey;
use crate::errors::{LockboxError, Result};
use crate::store::Store;

use super::meta::{self, VaultMetadata};

/// Observable state of a vault handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultState {
    Uninitialized,
    Locked,
    Unlocked,
}

/// The master-key owner.
pub struct Vault {
    meta: Option<VaultMetadata>,
    key: Option<MasterKey>,
    params: KdfParams,
}

impl Vault {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Read persisted metadata and start Locked (or Uninitialized).
    ///
    /// `params` only affects vaults created or rotated through this
    /// handle; unlocking always uses the stored iteration count.
    pub fn load(store: &Store, params: KdfParams) -> Result<Self> {
        let meta = meta::read(store.conn())?;
        Ok(Self {
            meta,
            key: None,
            params,
        })
    }

    /// Build an unlocked handle around a key that was already verified
    /// elsewhere (e.g. a copy handed to a background import).
    pub fn with_key(key: MasterKey) -> Self {
        Self {
            meta: None,
            key: Some(key),
            params: KdfParams::default(),
        }
    }

    // ------------------------------------------------------------------
    // State
    // ------------------------------------------------------------------

    pub fn state(&self) -> VaultState {
        if self.key.is_some() {
            VaultState::Unlocked
        } else if self.meta.is_some() {
            VaultState::Locked
        } else {
            VaultState::Uninitialized
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.meta.is_some() || self.key.is_some()
    }

    pub fn is_unlocked(&self) -> bool {
        self.key.is_some()
    }

    /// Borrow the active key. Fails with `NotUnlocked` while locked.
    pub fn key(&self) -> Result<&MasterKey> {
        self.key.as_ref().ok_or(LockboxError::NotUnlocked)
    }

    pub fn metadata(&self) -> Option<&VaultMetadata> {
        self.meta.as_ref()
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// Initialize a brand-new vault and leave it Unlocked.
    pub fn create_vault(&mut self, store: &Store, master_password: &str) -> Result<()> {
        if self.meta.is_some() || meta::read(store.conn())?.is_some() {
            return Err(LockboxError::AlreadyInitialized);
        }
        if master_password.trim().is_empty() {
            return Err(LockboxError::EmptyInput("master password"));
        }

        let (new_meta, key) = fresh_metadata(master_password, self.params)?;
        meta::write(store.conn(), &new_meta)?;

        self.meta = Some(new_meta);
        self.key = Some(key);
        tracing::info!(iterations = self.params.iterations, "vault created");
        Ok(())
    }

    /// Derive a key from the stored salt/iterations and check it against
    /// the verifier. On mismatch nothing changes.
    pub fn unlock(&mut self, store: &Store, master_password: &str) -> Result<()> {
        if self.meta.is_none() {
            self.meta = meta::read(store.conn())?;
        }
        let stored = self.meta.as_ref().ok_or(LockboxError::NotInitialized)?;

        let candidate = derive_key(master_password.as_bytes(), &stored.salt, stored.iterations)?;
        if !candidate.matches_verifier(&stored.verifier) {
            tracing::warn!("unlock rejected: wrong master password");
            return Err(LockboxError::WrongPassword);
        }

        self.replace_key(candidate);
        tracing::info!("vault unlocked");
        Ok(())
    }

    /// Zero the held key and go to Locked. Idempotent.
    pub fn lock(&mut self) {
        if let Some(mut key) = self.key.take() {
            key.zeroize();
            tracing::info!("vault locked");
        }
    }

    /// Re-key the whole vault under a new master password.
    ///
    /// Every entry and common password is re-sealed from the old key to
    /// a freshly derived one inside a single transaction; the new
    /// metadata is written last. Any failure rolls everything back and
    /// the old key stays active. Returns the number of re-sealed rows.
    pub fn change_master_password(&mut self, store: &Store, new_password: &str) -> Result<usize> {
        let old_key = self.key()?;
        if new_password.trim().is_empty() {
            return Err(LockboxError::EmptyInput("new master password"));
        }

        let (new_meta, new_key) = fresh_metadata(new_password, self.params)?;

        let tx = store.transaction()?;
        let mut resealed = 0;
        for table in ["password_entries", "common_passwords"] {
            let rows: Vec<(i64, Vec<u8>, Option<Vec<u8>>)> = {
                let mut stmt =
                    tx.prepare(&format!("SELECT id, password_enc, notes_enc FROM {table}"))?;
                let mapped = stmt.query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))?;
                mapped.collect::<std::result::Result<_, _>>()?
            };

            for (id, password_enc, notes_enc) in rows {
                let password_enc = reseal(old_key, &new_key, &password_enc).map_err(|e| {
                    tracing::error!(table, id, "rotation aborted: password blob did not open");
                    e
                })?;
                let notes_enc = match notes_enc.filter(|b| !b.is_empty()) {
                    Some(blob) => reseal(old_key, &new_key, &blob).map_err(|e| {
                        tracing::error!(table, id, "rotation aborted: notes blob did not open");
                        e
                    })?,
                    None => Vec::new(),
                };

                tx.execute(
                    &format!("UPDATE {table} SET password_enc = ?1, notes_enc = ?2 WHERE id = ?3"),
                    params![password_enc, notes_enc, id],
                )?;
                resealed += 1;
            }
        }

        meta::write(&tx, &new_meta)?;
        tx.commit()
            .map_err(|e| LockboxError::StoreUnavailable(format!("commit rotation: {e}")))?;

        self.meta = Some(new_meta);
        self.replace_key(new_key);
        tracing::info!(rows = resealed, "master password rotated");
        Ok(resealed)
    }

    fn replace_key(&mut self, key: MasterKey) {
        self.lock();
        self.key = Some(key);
    }
}

impl Drop for Vault {
    fn drop(&mut self) {
        self.lock();
    }
}

/// Fresh salt + policy iterations, the derived key, and its verifier.
fn fresh_metadata(password: &str, params: KdfParams) -> Result<(VaultMetadata, MasterKey)> {
    let salt = generate_salt();
    let key = derive_key(password.as_bytes(), &salt, params.iterations)?;
    let meta = VaultMetadata {
        salt: salt.to_vec(),
        iterations: params.iterations,
        verifier: key.verifier(),
    };
    Ok((meta, key))
}

fn reseal(old_key: &MasterKey, new_key: &MasterKey, blob: &[u8]) -> Result<Vec<u8>> {
    let mut plain = open(old_key.as_bytes(), blob)?;
    let sealed = seal(new_key.as_bytes(), &plain);
    plain.zeroize();
    sealed
}
