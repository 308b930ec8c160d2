//! Password-based key derivation using PBKDF2-HMAC-SHA256.
//!
//! The iteration count is chosen once when a vault (or backup) is
//! created and stored next to the salt, so it can be raised later
//! without breaking older vaults.

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;

use super::keys::{MasterKey, KEY_LEN};
use crate::errors::{LockboxError, Result};

/// Length of the salt in bytes (128 bits).
pub const SALT_LEN: usize = 16;

/// Default PBKDF2 iteration count for new vaults and backups.
pub const DEFAULT_ITERATIONS: u32 = 120_000;

/// Lowest iteration count we are willing to derive with.
pub const MIN_ITERATIONS: u32 = 1_000;

/// PBKDF2 cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    pub iterations: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

/// Derive a 32-byte key from a password, salt and iteration count.
///
/// The same inputs always produce the same key.
pub fn derive_key(password: &[u8], salt: &[u8], iterations: u32) -> Result<MasterKey> {
    if iterations < MIN_ITERATIONS {
        return Err(LockboxError::KeyDerivationFailed(format!(
            "PBKDF2 iterations must be at least {MIN_ITERATIONS} (got {iterations})"
        )));
    }
    if salt.is_empty() {
        return Err(LockboxError::KeyDerivationFailed("salt is empty".into()));
    }

    let mut out = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut out);
    Ok(MasterKey::new(out))
}

/// Generate a cryptographically random salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    salt
}
