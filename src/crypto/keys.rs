//! Master key wrapper and verifier.
//!
//! The vault never stores its key. It stores `SHA-256(key)` (the
//! verifier) and compares a candidate key against it in constant time.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Length of derived keys (256 bits, for AES-256).
pub const KEY_LEN: usize = 32;

/// A 32-byte symmetric key that zeroes its memory when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey {
    bytes: [u8; KEY_LEN],
}

impl MasterKey {
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Access the raw key bytes (e.g. to pass to `seal` / `open`).
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }

    /// One-way digest of the key, persisted in place of the key itself.
    pub fn verifier(&self) -> Vec<u8> {
        Sha256::digest(self.bytes).to_vec()
    }

    /// Constant-time check of this key against a stored verifier.
    pub fn matches_verifier(&self, expected: &[u8]) -> bool {
        self.verifier().as_slice().ct_eq(expected).into()
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MasterKey(<redacted>)")
    }
}
